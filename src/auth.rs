use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::entities::purchase_requisition::{self, RequisitionStatus};

/// Role set understood by the default approval policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Admin,
    ProcurementManager,
    Purchasing,
    Viewer,
}

/// Authenticated principal acting on a requisition. Produced by the
/// surrounding application's auth layer; this crate only consults roles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub name: String,
    pub roles: Vec<Role>,
}

impl Actor {
    pub fn new(id: Uuid, name: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            id,
            name: name.into(),
            roles,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role) || self.roles.contains(&Role::Admin)
    }
}

/// Capability seam for lifecycle transitions. One policy object is injected
/// into the lifecycle manager instead of per-call-site role lists.
pub trait ApprovalPolicy: Send + Sync {
    fn can_transition(
        &self,
        actor: &Actor,
        requisition: &purchase_requisition::Model,
        target: RequisitionStatus,
    ) -> bool;
}

/// Default policy: approval and rejection require procurement authority,
/// conversion requires purchasing authority. Admin passes everything.
#[derive(Debug, Default, Clone)]
pub struct RoleApprovalPolicy;

impl ApprovalPolicy for RoleApprovalPolicy {
    fn can_transition(
        &self,
        actor: &Actor,
        _requisition: &purchase_requisition::Model,
        target: RequisitionStatus,
    ) -> bool {
        match target {
            RequisitionStatus::Approved | RequisitionStatus::Rejected => {
                actor.has_role(Role::ProcurementManager)
            }
            RequisitionStatus::Converted => actor.has_role(Role::Purchasing),
            RequisitionStatus::Pending => false,
        }
    }
}
