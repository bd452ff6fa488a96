use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Directed edge of the BOM graph: one parent consumes `quantity_per_unit`
/// of one component per assembled unit. A component may appear under many
/// parents; cycles are invalid data and are detected at read time.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bom_lines")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub parent_item_id: i64,
    pub component_item_id: i64,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity_per_unit: Decimal,
    pub bom_version: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::item::Entity",
        from = "Column::ParentItemId",
        to = "super::item::Column::Id"
    )]
    ParentItem,
    #[sea_orm(
        belongs_to = "super::item::Entity",
        from = "Column::ComponentItemId",
        to = "super::item::Column::Id"
    )]
    ComponentItem,
}

impl Related<super::item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ComponentItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
