use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ConnectionTrait};

use crate::{entities::audit_entry, errors::ServiceError};

pub const MODULE: &str = "procurement";

/// Appends one audit entry on the caller's connection. Runs inside the same
/// transaction as the mutation it records, so an entry is never observable
/// without its requisition and vice versa.
pub async fn record<C: ConnectionTrait>(
    conn: &C,
    actor: &str,
    action: &str,
    description: String,
) -> Result<(), ServiceError> {
    audit_entry::ActiveModel {
        actor: Set(actor.to_string()),
        module: Set(MODULE.to_string()),
        action: Set(action.to_string()),
        description: Set(description),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(())
}
