use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    auth::{Actor, ApprovalPolicy, RoleApprovalPolicy},
    config::MrpConfig,
    entities::{purchase_requisition, stock_requirement},
    errors::ServiceError,
    events::EventSender,
    services::{
        explosion::{BuildAnalysis, ExplosionService},
        lifecycle::LifecycleService,
        requisition::{GenerateOutcome, RequisitionService},
        sweep::{BatchOutcome, SweepReport, SweepService},
    },
};

/// The engine facade: one database pool, one event channel, one policy,
/// wired into the individual services. Embedding applications construct this
/// once and call the operation methods below.
#[derive(Clone)]
pub struct MrpEngine {
    pub explosion: ExplosionService,
    pub requisitions: RequisitionService,
    pub lifecycle: LifecycleService,
    pub sweep: SweepService,
}

impl MrpEngine {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: MrpConfig,
        events: EventSender,
        policy: Arc<dyn ApprovalPolicy>,
    ) -> Self {
        Self {
            explosion: ExplosionService::new(db.clone(), config.clone()),
            requisitions: RequisitionService::new(db.clone(), events.clone()),
            lifecycle: LifecycleService::new(db.clone(), events.clone(), policy),
            sweep: SweepService::new(db, config, events),
        }
    }

    /// Convenience constructor with the default role-based approval policy.
    pub fn with_default_policy(
        db: Arc<DatabaseConnection>,
        config: MrpConfig,
        events: EventSender,
    ) -> Self {
        Self::new(db, config, events, Arc::new(RoleApprovalPolicy))
    }

    /// Recomputes coverage rows for one sales order against current stock.
    pub async fn recalculate_stock_requirement(
        &self,
        sales_order_id: i64,
    ) -> Result<Vec<stock_requirement::Model>, ServiceError> {
        self.sweep.recalculate_stock_requirements(sales_order_id).await
    }

    /// Generates a requisition for one computed stock requirement.
    pub async fn generate_requisition(
        &self,
        requirement_id: i64,
        actor: &str,
    ) -> Result<GenerateOutcome, ServiceError> {
        self.sweep.generate_for_requirement(requirement_id, actor).await
    }

    /// Generates requisitions for all shortfall lines of one sales order,
    /// tolerating individual failures.
    pub async fn batch_generate_requisitions(
        &self,
        sales_order_id: i64,
        actor: &str,
    ) -> Result<BatchOutcome, ServiceError> {
        self.sweep.batch_generate(sales_order_id, actor).await
    }

    /// Full-catalog shortage sweep; all-or-nothing.
    pub async fn run_full_sweep(&self) -> Result<SweepReport, ServiceError> {
        self.sweep.run_full_sweep().await
    }

    /// Current buildability of one assembly.
    pub async fn analyze_assembly(&self, item_id: i64) -> Result<BuildAnalysis, ServiceError> {
        self.explosion.analyze_assembly(item_id).await
    }

    pub async fn approve_requisition(
        &self,
        id: i64,
        actor: &Actor,
    ) -> Result<purchase_requisition::Model, ServiceError> {
        self.lifecycle.approve(id, actor).await
    }

    pub async fn reject_requisition(
        &self,
        id: i64,
        actor: &Actor,
        reason: Option<&str>,
    ) -> Result<purchase_requisition::Model, ServiceError> {
        self.lifecycle.reject(id, actor, reason).await
    }

    pub async fn convert_requisition(
        &self,
        id: i64,
        actor: &Actor,
    ) -> Result<purchase_requisition::Model, ServiceError> {
        self.lifecycle.convert(id, actor).await
    }
}
