use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum RequisitionStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "converted")]
    Converted,
}

impl RequisitionStatus {
    /// Rejected and converted requisitions admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Converted)
    }

    /// Open requisitions block creation of another one for the same
    /// (item, source) pair.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Pending | Self::Approved)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Converted => "converted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum Urgency {
    #[sea_orm(string_value = "critical")]
    Critical,
    #[sea_orm(string_value = "high")]
    High,
    #[sea_orm(string_value = "medium")]
    Medium,
    #[sea_orm(string_value = "low")]
    Low,
}

impl Urgency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// What triggered a requisition. Together with `source_id` this forms the
/// structured deduplication context: at most one open requisition may exist
/// per (item_id, source_type, source_id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum RequisitionSource {
    #[sea_orm(string_value = "sales_order")]
    SalesOrder,
    #[sea_orm(string_value = "assembly")]
    Assembly,
}

impl RequisitionSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SalesOrder => "sales_order",
            Self::Assembly => "assembly",
        }
    }
}

/// Internal request to procure a shortfall quantity. Created only by the
/// requisition generator; status moves only through the lifecycle manager.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_requisitions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Year-scoped sequential number, `PR-<year>-<6-digit-seq>`.
    pub number: String,
    pub item_id: i64,
    pub sales_order_id: Option<i64>,
    pub source_type: RequisitionSource,
    pub source_id: i64,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub required_qty: Decimal,
    pub requested_by: String,
    pub status: RequisitionStatus,
    pub urgency: Urgency,
    pub reason: String,
    pub rejection_reason: Option<String>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
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
