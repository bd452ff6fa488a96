//! Material requirements and procurement resolution engine.
//!
//! Given present on-hand stock, a multi-level bill of materials, and
//! outstanding sales-order demand, this crate computes coverage, classifies
//! shortfalls, and deterministically generates purchase requisitions to close
//! the gaps. Repeated or overlapping invocations never duplicate a
//! requisition: the generator's existence check, number assignment, insert
//! and audit entry share one transaction.
//!
//! Transport, authentication, rendering and delivery live in the embedding
//! application; the integration surface is [`services::factory::MrpEngine`]
//! plus the [`events::Event`] channel.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod logging;
pub mod services;

/// Commonly used types for embedding applications.
pub mod prelude {
    pub use crate::auth::{Actor, ApprovalPolicy, Role, RoleApprovalPolicy};
    pub use crate::config::MrpConfig;
    pub use crate::db::{connect, DbConfig, DbPool};
    pub use crate::entities::purchase_requisition::{
        RequisitionSource, RequisitionStatus, Urgency,
    };
    pub use crate::entities::stock_requirement::RequirementTier;
    pub use crate::errors::{ErrorCategory, ServiceError};
    pub use crate::events::{Event, EventSender};
    pub use crate::services::explosion::{analyze_build, BuildAnalysis};
    pub use crate::services::factory::MrpEngine;
    pub use crate::services::requisition::{GenerateOutcome, NewRequisition};
    pub use crate::services::sweep::{BatchOutcome, SweepReport};
}
