use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ItemStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "inactive")]
    Inactive,
    #[sea_orm(string_value = "discontinued")]
    Discontinued,
}

/// Catalog item. On-hand stock is mutated by goods receipt/issue elsewhere;
/// this crate only reads it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub sku: String,
    pub name: String,
    pub uom_code: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub on_hand_quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub reorder_level: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub unit_price: Decimal,
    pub is_assembly: bool,
    pub status: ItemStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bom_line::Entity")]
    BomLinesAsComponent,
    #[sea_orm(has_many = "super::sales_order_line::Entity")]
    SalesOrderLines,
    #[sea_orm(has_many = "super::stock_requirement::Entity")]
    StockRequirements,
    #[sea_orm(has_many = "super::purchase_requisition::Entity")]
    PurchaseRequisitions,
}

impl Related<super::bom_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BomLinesAsComponent.def()
    }
}

impl Related<super::sales_order_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SalesOrderLines.def()
    }
}

impl Related<super::stock_requirement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockRequirements.def()
    }
}

impl Related<super::purchase_requisition::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseRequisitions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
