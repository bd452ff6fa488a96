use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, TransactionTrait,
};
use tracing::{error, info, instrument};

use crate::{
    auth::{Actor, ApprovalPolicy},
    entities::purchase_requisition::{
        self, Entity as PurchaseRequisitionEntity, RequisitionStatus,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::audit,
};

/// Requisition state machine.
///
/// `pending -> approved`, `pending -> rejected`, `approved -> converted`;
/// rejected and converted are terminal. Every transition re-reads the current
/// status inside its transaction, so racing approval and conversion resolve
/// to exactly one winner.
#[derive(Clone)]
pub struct LifecycleService {
    db: Arc<DatabaseConnection>,
    events: EventSender,
    policy: Arc<dyn ApprovalPolicy>,
}

impl LifecycleService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        events: EventSender,
        policy: Arc<dyn ApprovalPolicy>,
    ) -> Self {
        Self { db, events, policy }
    }

    /// Approves a pending requisition. Does not create a purchase order;
    /// conversion is a separate step driven by the PO workflow.
    #[instrument(skip(self, actor))]
    pub async fn approve(
        &self,
        id: i64,
        actor: &Actor,
    ) -> Result<purchase_requisition::Model, ServiceError> {
        let updated = self
            .transition(id, actor, RequisitionStatus::Approved, None)
            .await?;
        self.events
            .emit(Event::RequisitionApproved {
                requisition_id: updated.id,
                approver: actor.name.clone(),
            })
            .await;
        Ok(updated)
    }

    /// Rejects a pending requisition, optionally recording a reason.
    #[instrument(skip(self, actor))]
    pub async fn reject(
        &self,
        id: i64,
        actor: &Actor,
        reason: Option<&str>,
    ) -> Result<purchase_requisition::Model, ServiceError> {
        if let Some(r) = reason {
            if r.trim().is_empty() {
                return Err(ServiceError::Validation(
                    "Rejection reason must not be blank".into(),
                ));
            }
        }
        let updated = self
            .transition(id, actor, RequisitionStatus::Rejected, reason)
            .await?;
        self.events
            .emit(Event::RequisitionRejected {
                requisition_id: updated.id,
                reason: reason.unwrap_or_default().to_string(),
            })
            .await;
        Ok(updated)
    }

    /// Marks an approved requisition converted. Called by the purchase-order
    /// creation workflow after it has produced the PO.
    #[instrument(skip(self, actor))]
    pub async fn convert(
        &self,
        id: i64,
        actor: &Actor,
    ) -> Result<purchase_requisition::Model, ServiceError> {
        let updated = self
            .transition(id, actor, RequisitionStatus::Converted, None)
            .await?;
        self.events
            .emit(Event::RequisitionConverted {
                requisition_id: updated.id,
            })
            .await;
        Ok(updated)
    }

    async fn transition(
        &self,
        id: i64,
        actor: &Actor,
        target: RequisitionStatus,
        reason: Option<&str>,
    ) -> Result<purchase_requisition::Model, ServiceError> {
        let txn = self.db.begin().await?;
        match transition_in(&txn, self.policy.as_ref(), id, actor, target, reason).await {
            Ok(updated) => {
                txn.commit().await?;
                Ok(updated)
            }
            Err(e) => {
                error!(requisition_id = id, "transition failed, rolling back: {}", e);
                let _ = txn.rollback().await;
                Err(e)
            }
        }
    }
}

fn action_name(target: RequisitionStatus) -> &'static str {
    match target {
        RequisitionStatus::Approved => "requisition_approved",
        RequisitionStatus::Rejected => "requisition_rejected",
        RequisitionStatus::Converted => "requisition_converted",
        RequisitionStatus::Pending => "requisition_reopened",
    }
}

/// Transition core on the caller's connection: load, check the state machine,
/// check authority, update, audit.
async fn transition_in<C: ConnectionTrait>(
    conn: &C,
    policy: &dyn ApprovalPolicy,
    id: i64,
    actor: &Actor,
    target: RequisitionStatus,
    reason: Option<&str>,
) -> Result<purchase_requisition::Model, ServiceError> {
    let requisition = PurchaseRequisitionEntity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Requisition {} not found", id)))?;

    let from = requisition.status;
    let allowed = matches!(
        (from, target),
        (RequisitionStatus::Pending, RequisitionStatus::Approved)
            | (RequisitionStatus::Pending, RequisitionStatus::Rejected)
            | (RequisitionStatus::Approved, RequisitionStatus::Converted)
    );
    if !allowed {
        return Err(ServiceError::InvalidTransition { from, to: target });
    }

    if !policy.can_transition(actor, &requisition, target) {
        return Err(ServiceError::InsufficientAuthority(format!(
            "{} may not move requisition {} to {}",
            actor.name,
            requisition.number,
            target.as_str()
        )));
    }

    let number = requisition.number.clone();
    let now = Utc::now();
    let mut active = requisition.into_active_model();
    active.status = Set(target);
    active.updated_at = Set(now);
    match target {
        RequisitionStatus::Approved => {
            active.approved_by = Set(Some(actor.name.clone()));
            active.approved_at = Set(Some(now));
        }
        RequisitionStatus::Rejected => {
            active.rejection_reason = Set(reason.map(str::to_string));
        }
        _ => {}
    }
    let updated = active.update(conn).await?;

    audit::record(
        conn,
        &actor.name,
        action_name(target),
        match reason {
            Some(r) => format!("Requisition {} moved to {}: {}", number, target.as_str(), r),
            None => format!("Requisition {} moved to {}", number, target.as_str()),
        },
    )
    .await?;

    info!(
        requisition_id = updated.id,
        number = %number,
        from = from.as_str(),
        to = target.as_str(),
        "requisition transitioned"
    );
    Ok(updated)
}
