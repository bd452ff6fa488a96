use std::sync::Arc;

use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, IntoActiveModel, QueryFilter, TransactionTrait,
};
use serde::Serialize;
use tracing::{error, info, instrument};
use validator::Validate;

use crate::{
    entities::{
        purchase_requisition::{
            self, Entity as PurchaseRequisitionEntity, RequisitionSource, RequisitionStatus,
            Urgency,
        },
        requisition_counter::{self, Entity as RequisitionCounterEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::audit,
};

/// Input to the requisition generator.
#[derive(Debug, Clone, Validate)]
pub struct NewRequisition {
    pub item_id: i64,
    pub quantity: Decimal,
    pub source_type: RequisitionSource,
    /// Sales order id for demand-driven requisitions, assembly item id for
    /// BOM-driven ones. With `source_type` this is the deduplication context.
    pub source_id: i64,
    pub sales_order_id: Option<i64>,
    pub urgency: Urgency,
    #[validate(length(min = 1))]
    pub reason: String,
    #[validate(length(min = 1))]
    pub requested_by: String,
}

/// Structured result of a generation attempt. A duplicate open requisition
/// is expected behavior on repeated sweeps, not an error.
#[derive(Debug, Clone, Serialize)]
pub enum GenerateOutcome {
    Created {
        requisition_id: i64,
        number: String,
        urgency: Urgency,
    },
    /// An open (pending or approved) requisition already covers this
    /// (item, source) pair.
    AlreadyOpen {
        requisition_id: i64,
        number: String,
    },
    /// Current stock covers the demand; there is nothing to procure.
    NotNeeded,
}

impl GenerateOutcome {
    pub fn created(&self) -> bool {
        matches!(self, GenerateOutcome::Created { .. })
    }
}

pub fn format_number(year: i32, seq: i64) -> String {
    format!("PR-{}-{:06}", year, seq)
}

/// Open requisition lookup for one (item, source) pair. The same query backs
/// the generator's idempotence check and the `has_open_requisition` flag on
/// stock requirements.
pub async fn find_open<C: ConnectionTrait>(
    conn: &C,
    item_id: i64,
    source_type: RequisitionSource,
    source_id: i64,
) -> Result<Option<purchase_requisition::Model>, ServiceError> {
    PurchaseRequisitionEntity::find()
        .filter(purchase_requisition::Column::ItemId.eq(item_id))
        .filter(purchase_requisition::Column::SourceType.eq(source_type))
        .filter(purchase_requisition::Column::SourceId.eq(source_id))
        .filter(
            purchase_requisition::Column::Status
                .is_in([RequisitionStatus::Pending, RequisitionStatus::Approved]),
        )
        .one(conn)
        .await
        .map_err(ServiceError::db_error)
}

/// Next year-scoped sequence value. The counter row is read and bumped on the
/// caller's connection, inside the same transaction as the requisition insert;
/// two concurrent generators serialize on the row instead of colliding.
async fn next_sequence<C: ConnectionTrait>(conn: &C, year: i32) -> Result<i64, ServiceError> {
    match RequisitionCounterEntity::find_by_id(year).one(conn).await? {
        Some(counter) => {
            let next = counter.last_value + 1;
            let mut active = counter.into_active_model();
            active.last_value = Set(next);
            active.update(conn).await?;
            Ok(next)
        }
        None => {
            requisition_counter::ActiveModel {
                year: Set(year),
                last_value: Set(1),
            }
            .insert(conn)
            .await?;
            Ok(1)
        }
    }
}

/// The generator core. Runs entirely on the caller's connection so the full
/// sweep can drive it inside one catalog-wide transaction. Sequence:
/// existence check, number assignment, insert, audit entry. Any `DbErr`
/// unwinds to the enclosing transaction and rolls the whole sequence back.
pub async fn generate_in<C: ConnectionTrait>(
    conn: &C,
    input: &NewRequisition,
) -> Result<GenerateOutcome, ServiceError> {
    if let Some(open) = find_open(conn, input.item_id, input.source_type, input.source_id).await? {
        info!(
            item_id = input.item_id,
            number = %open.number,
            "open requisition already covers this context"
        );
        return Ok(GenerateOutcome::AlreadyOpen {
            requisition_id: open.id,
            number: open.number,
        });
    }

    let now = Utc::now();
    let year = now.year();
    let seq = next_sequence(conn, year).await?;
    let number = format_number(year, seq);

    let created = purchase_requisition::ActiveModel {
        number: Set(number.clone()),
        item_id: Set(input.item_id),
        sales_order_id: Set(input.sales_order_id),
        source_type: Set(input.source_type),
        source_id: Set(input.source_id),
        required_qty: Set(input.quantity),
        requested_by: Set(input.requested_by.clone()),
        status: Set(RequisitionStatus::Pending),
        urgency: Set(input.urgency),
        reason: Set(input.reason.clone()),
        rejection_reason: Set(None),
        approved_by: Set(None),
        approved_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    audit::record(
        conn,
        &input.requested_by,
        "requisition_created",
        format!(
            "Requisition {} created for item {} (qty {}, urgency {})",
            number,
            input.item_id,
            input.quantity,
            input.urgency.as_str()
        ),
    )
    .await?;

    info!(
        requisition_id = created.id,
        number = %number,
        item_id = input.item_id,
        "requisition created"
    );

    Ok(GenerateOutcome::Created {
        requisition_id: created.id,
        number,
        urgency: input.urgency,
    })
}

/// Requisition generator with its own unit of work per call.
#[derive(Clone)]
pub struct RequisitionService {
    db: Arc<DatabaseConnection>,
    events: EventSender,
}

impl RequisitionService {
    pub fn new(db: Arc<DatabaseConnection>, events: EventSender) -> Self {
        Self { db, events }
    }

    /// Generates one requisition inside its own transaction. Idempotent per
    /// (item, source) context.
    #[instrument(skip(self))]
    pub async fn generate(&self, input: NewRequisition) -> Result<GenerateOutcome, ServiceError> {
        input.validate()?;
        if input.quantity <= Decimal::ZERO {
            return Err(ServiceError::Validation(format!(
                "Requisition quantity must be positive, got {}",
                input.quantity
            )));
        }

        let txn = self.db.begin().await?;
        let outcome = match generate_in(&txn, &input).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("requisition generation failed, rolling back: {}", e);
                let _ = txn.rollback().await;
                return Err(e);
            }
        };
        txn.commit().await?;

        if let GenerateOutcome::Created {
            requisition_id,
            number,
            ..
        } = &outcome
        {
            self.events
                .emit(Event::RequisitionCreated {
                    requisition_id: *requisition_id,
                    number: number.clone(),
                })
                .await;
        }
        Ok(outcome)
    }

    /// Fetches a requisition or fails with `NotFound`.
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<purchase_requisition::Model, ServiceError> {
        PurchaseRequisitionEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Requisition {} not found", id)))
    }

    /// All open requisitions for one item, across contexts.
    #[instrument(skip(self))]
    pub async fn list_open_for_item(
        &self,
        item_id: i64,
    ) -> Result<Vec<purchase_requisition::Model>, ServiceError> {
        PurchaseRequisitionEntity::find()
            .filter(purchase_requisition::Column::ItemId.eq(item_id))
            .filter(
                purchase_requisition::Column::Status
                    .is_in([RequisitionStatus::Pending, RequisitionStatus::Approved]),
            )
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)
    }
}
