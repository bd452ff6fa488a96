use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Year-scoped requisition sequence. The row is read and bumped inside the
/// same transaction as the requisition insert, so concurrent generators
/// serialize on it instead of colliding on a process-local counter.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "requisition_counters")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub year: i32,
    pub last_value: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
