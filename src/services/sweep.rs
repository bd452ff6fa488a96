use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, EntityTrait, IntoActiveModel, QueryFilter, TransactionTrait,
};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    config::MrpConfig,
    entities::{
        purchase_requisition::{RequisitionSource, Urgency},
        stock_requirement::{self, Entity as StockRequirementEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        catalog, explosion,
        requisition::{self, GenerateOutcome, NewRequisition},
        shortage,
    },
};

/// One requisition produced by a sweep or batch run.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedRequisition {
    pub requisition_id: i64,
    pub number: String,
    pub item_id: i64,
    pub urgency: Urgency,
}

/// Aggregate result of a full-catalog sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub assemblies_scanned: usize,
    pub shortages_found: usize,
    pub created: Vec<CreatedRequisition>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub requirement_id: i64,
    pub item_id: i64,
    pub error: String,
}

/// Partitioned result of a per-order batch run. `skipped` counts lines where
/// nothing had to be done (already covered, or an open requisition exists).
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub succeeded: Vec<CreatedRequisition>,
    pub failed: Vec<BatchFailure>,
    pub skipped: usize,
}

/// Drives the catalog sweep and the sales-order recompute paths.
///
/// The two paths deliberately differ in failure policy: the nightly sweep is
/// all-or-nothing inside one transaction, while the interactive batch path
/// commits per line and reports a partitioned success/failure list.
#[derive(Clone)]
pub struct SweepService {
    db: Arc<DatabaseConnection>,
    config: MrpConfig,
    events: EventSender,
}

impl SweepService {
    pub fn new(db: Arc<DatabaseConnection>, config: MrpConfig, events: EventSender) -> Self {
        Self { db, config, events }
    }

    /// Scans every active assembly for bottleneck components and generates
    /// requisitions for remaining shortfalls. The whole scan shares one
    /// transaction: a persistence failure anywhere rolls back everything
    /// created in this run.
    #[instrument(skip(self))]
    pub async fn run_full_sweep(&self) -> Result<SweepReport, ServiceError> {
        let txn = self.db.begin().await?;
        let report = match self.sweep_in(&txn).await {
            Ok(report) => report,
            Err(e) => {
                error!("full sweep aborted, rolling back: {}", e);
                let _ = txn.rollback().await;
                return Err(e);
            }
        };
        txn.commit().await?;

        info!(
            assemblies = report.assemblies_scanned,
            shortages = report.shortages_found,
            created = report.created.len(),
            "full sweep committed"
        );
        self.events
            .emit(Event::SweepCompleted {
                assemblies_scanned: report.assemblies_scanned,
                shortages_found: report.shortages_found,
                requisitions_created: report.created.len(),
            })
            .await;
        Ok(report)
    }

    async fn sweep_in(&self, txn: &DatabaseTransaction) -> Result<SweepReport, ServiceError> {
        let assemblies = catalog::list_assemblies(txn).await?;
        let mut report = SweepReport::default();

        for assembly in assemblies {
            report.assemblies_scanned += 1;

            match catalog::assert_acyclic(txn, assembly.id, self.config.max_bom_depth).await {
                Ok(()) => {}
                Err(ServiceError::BomCycle(msg)) => {
                    warn!(item_id = assembly.id, "skipping cyclic BOM: {}", msg);
                    continue;
                }
                Err(e) => return Err(e),
            }

            let components = catalog::get_assembly_components(txn, assembly.id).await?;
            if components.is_empty() {
                continue;
            }

            let analysis = explosion::analyze_build(&components);
            let target =
                shortage::target_build_quantity(assembly.reorder_level, self.config.minimum_batch_size);

            for bottleneck in &analysis.bottlenecks {
                let total_required = bottleneck.required_per_unit * target;
                let gap = shortage::classify_with_reorder(
                    total_required,
                    bottleneck.available,
                    bottleneck.reorder_level,
                );
                if gap.shortfall <= Decimal::ZERO {
                    continue;
                }
                report.shortages_found += 1;

                let input = NewRequisition {
                    item_id: bottleneck.component_id,
                    quantity: gap.shortfall,
                    source_type: RequisitionSource::Assembly,
                    source_id: assembly.id,
                    sales_order_id: None,
                    urgency: shortage::bom_urgency(bottleneck.available),
                    reason: format!(
                        "Component {} short {} for assembly {} (target build {})",
                        bottleneck.sku, gap.shortfall, assembly.name, target
                    ),
                    requested_by: self.config.system_actor.clone(),
                };
                match requisition::generate_in(txn, &input).await? {
                    GenerateOutcome::Created {
                        requisition_id,
                        number,
                        urgency,
                    } => report.created.push(CreatedRequisition {
                        requisition_id,
                        number,
                        item_id: bottleneck.component_id,
                        urgency,
                    }),
                    GenerateOutcome::AlreadyOpen { number, .. } => {
                        debug!(
                            item_id = bottleneck.component_id,
                            number = %number,
                            "shortage already covered by open requisition"
                        );
                    }
                    GenerateOutcome::NotNeeded => {}
                }
            }
        }
        Ok(report)
    }

    /// Recomputes coverage rows for every line of one sales order against
    /// current stock. Rows are superseded in place, one per (order, item).
    #[instrument(skip(self))]
    pub async fn recalculate_stock_requirements(
        &self,
        sales_order_id: i64,
    ) -> Result<Vec<stock_requirement::Model>, ServiceError> {
        let lines = catalog::get_order_lines(&*self.db, sales_order_id).await?;

        let txn = self.db.begin().await?;
        let rows = match recalc_in(&txn, sales_order_id, &lines).await {
            Ok(rows) => rows,
            Err(e) => {
                error!(sales_order_id, "recompute failed, rolling back: {}", e);
                let _ = txn.rollback().await;
                return Err(e);
            }
        };
        txn.commit().await?;

        self.events
            .emit(Event::StockRequirementsRecalculated {
                sales_order_id,
                lines: rows.len(),
            })
            .await;
        Ok(rows)
    }

    /// Generates one requisition for a previously computed stock requirement.
    /// Stock is re-read first; when it now covers the demand the requirement
    /// row is refreshed and `NotNeeded` is returned.
    #[instrument(skip(self))]
    pub async fn generate_for_requirement(
        &self,
        requirement_id: i64,
        actor: &str,
    ) -> Result<GenerateOutcome, ServiceError> {
        let txn = self.db.begin().await?;
        let outcome = match generate_for_requirement_in(&txn, requirement_id, actor).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(requirement_id, "generation failed, rolling back: {}", e);
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

    /// Generates requisitions for every shortfall line of one sales order.
    /// Each line runs in its own transaction; individual failures are
    /// recorded and the batch continues. Only an unreachable store fails the
    /// batch as a whole.
    #[instrument(skip(self))]
    pub async fn batch_generate(
        &self,
        sales_order_id: i64,
        actor: &str,
    ) -> Result<BatchOutcome, ServiceError> {
        let requirements = StockRequirementEntity::find()
            .filter(stock_requirement::Column::SalesOrderId.eq(sales_order_id))
            .all(&*self.db)
            .await?;
        if requirements.is_empty() {
            return Err(ServiceError::NotFound(format!(
                "No stock requirements computed for sales order {}",
                sales_order_id
            )));
        }

        let mut outcome = BatchOutcome::default();
        for requirement in requirements {
            if requirement.shortfall_qty <= Decimal::ZERO {
                outcome.skipped += 1;
                continue;
            }
            match self.generate_for_requirement(requirement.id, actor).await {
                Ok(GenerateOutcome::Created {
                    requisition_id,
                    number,
                    urgency,
                }) => outcome.succeeded.push(CreatedRequisition {
                    requisition_id,
                    number,
                    item_id: requirement.item_id,
                    urgency,
                }),
                Ok(_) => outcome.skipped += 1,
                Err(e) => {
                    error!(
                        requirement_id = requirement.id,
                        item_id = requirement.item_id,
                        "batch line failed: {}",
                        e
                    );
                    outcome.failed.push(BatchFailure {
                        requirement_id: requirement.id,
                        item_id: requirement.item_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            sales_order_id,
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            skipped = outcome.skipped,
            "batch generation finished"
        );
        Ok(outcome)
    }
}

async fn recalc_in(
    txn: &DatabaseTransaction,
    sales_order_id: i64,
    lines: &[crate::entities::sales_order_line::Model],
) -> Result<Vec<stock_requirement::Model>, ServiceError> {
    let mut rows = Vec::with_capacity(lines.len());
    for line in lines {
        let item = catalog::get_item(txn, line.item_id).await?;
        let gap = shortage::classify(line.quantity_ordered, item.on_hand_quantity);
        let has_open = requisition::find_open(
            txn,
            line.item_id,
            RequisitionSource::SalesOrder,
            sales_order_id,
        )
        .await?
        .is_some();

        let existing = StockRequirementEntity::find()
            .filter(stock_requirement::Column::SalesOrderId.eq(sales_order_id))
            .filter(stock_requirement::Column::ItemId.eq(line.item_id))
            .one(txn)
            .await?;

        let now = Utc::now();
        let model = match existing {
            Some(row) => {
                let mut active = row.into_active_model();
                active.required_qty = Set(line.quantity_ordered);
                active.available_qty = Set(item.on_hand_quantity);
                active.shortfall_qty = Set(gap.shortfall);
                active.status = Set(gap.tier);
                active.has_open_requisition = Set(has_open);
                active.computed_at = Set(now);
                active.update(txn).await?
            }
            None => {
                stock_requirement::ActiveModel {
                    sales_order_id: Set(sales_order_id),
                    item_id: Set(line.item_id),
                    required_qty: Set(line.quantity_ordered),
                    available_qty: Set(item.on_hand_quantity),
                    shortfall_qty: Set(gap.shortfall),
                    status: Set(gap.tier),
                    has_open_requisition: Set(has_open),
                    computed_at: Set(now),
                    ..Default::default()
                }
                .insert(txn)
                .await?
            }
        };
        rows.push(model);
    }
    Ok(rows)
}

async fn generate_for_requirement_in<C: ConnectionTrait>(
    conn: &C,
    requirement_id: i64,
    actor: &str,
) -> Result<GenerateOutcome, ServiceError> {
    let requirement = StockRequirementEntity::find_by_id(requirement_id)
        .one(conn)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("Stock requirement {} not found", requirement_id))
        })?;

    let item = catalog::get_item(conn, requirement.item_id).await?;
    let gap = shortage::classify(requirement.required_qty, item.on_hand_quantity);

    let now = Utc::now();
    if gap.shortfall <= Decimal::ZERO {
        // Stock caught up since the last recompute; refresh the row only.
        let mut active = requirement.into_active_model();
        active.available_qty = Set(item.on_hand_quantity);
        active.shortfall_qty = Set(gap.shortfall);
        active.status = Set(gap.tier);
        active.computed_at = Set(now);
        active.update(conn).await?;
        return Ok(GenerateOutcome::NotNeeded);
    }

    let input = NewRequisition {
        item_id: requirement.item_id,
        quantity: gap.shortfall,
        source_type: RequisitionSource::SalesOrder,
        source_id: requirement.sales_order_id,
        sales_order_id: Some(requirement.sales_order_id),
        urgency: shortage::tier_urgency(gap.tier),
        reason: format!(
            "Stock shortfall of {} for item {} on sales order {}",
            gap.shortfall, item.sku, requirement.sales_order_id
        ),
        requested_by: actor.to_string(),
    };
    let outcome = requisition::generate_in(conn, &input).await?;

    let mut active = requirement.into_active_model();
    active.available_qty = Set(item.on_hand_quantity);
    active.shortfall_qty = Set(gap.shortfall);
    active.status = Set(gap.tier);
    active.has_open_requisition = Set(true);
    active.computed_at = Set(now);
    active.update(conn).await?;

    Ok(outcome)
}
