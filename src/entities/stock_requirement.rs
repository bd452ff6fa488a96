use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum RequirementTier {
    #[sea_orm(string_value = "critical")]
    Critical,
    #[sea_orm(string_value = "shortage")]
    Shortage,
    #[sea_orm(string_value = "sufficient")]
    Sufficient,
}

/// Derived coverage row for one (sales order, item) pair. Superseded in place
/// on every recompute, never versioned.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_requirements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub sales_order_id: i64,
    pub item_id: i64,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub required_qty: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub available_qty: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub shortfall_qty: Decimal,
    pub status: RequirementTier,
    pub has_open_requisition: bool,
    pub computed_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::item::Entity",
        from = "Column::ItemId",
        to = "super::item::Column::Id"
    )]
    Item,
}

impl Related<super::item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Item.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
