use rust_decimal::Decimal;
use serde::Serialize;

use crate::entities::{purchase_requisition::Urgency, stock_requirement::RequirementTier};

/// Classified gap between demand and stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Shortfall {
    /// `max(0, required - available)`, never negative.
    pub shortfall: Decimal,
    pub tier: RequirementTier,
}

/// Classifies a required/available pair. Zero stock is always `Critical`,
/// even when nothing is required.
pub fn classify(required: Decimal, available: Decimal) -> Shortfall {
    let shortfall = (required - available).max(Decimal::ZERO);
    let tier = if available <= Decimal::ZERO {
        RequirementTier::Critical
    } else if shortfall > Decimal::ZERO {
        RequirementTier::Shortage
    } else {
        RequirementTier::Sufficient
    };
    Shortfall { shortfall, tier }
}

/// BOM-driven variant: stock at or below the component's reorder level is a
/// shortage even when it still covers the stated requirement.
pub fn classify_with_reorder(
    required: Decimal,
    available: Decimal,
    reorder_level: Decimal,
) -> Shortfall {
    let mut result = classify(required, available);
    if result.tier == RequirementTier::Sufficient && available <= reorder_level {
        result.tier = RequirementTier::Shortage;
    }
    result
}

/// Assembly-level gating quantity. Bottlenecks are evaluated against
/// `required_per_unit x target` rather than a single unit, so fast-moving
/// assemblies do not produce one-unit requisitions.
pub fn target_build_quantity(reorder_level: Decimal, minimum_batch_size: u32) -> Decimal {
    reorder_level.max(Decimal::from(minimum_batch_size))
}

/// Urgency of a BOM-driven gap. A component at exactly zero blocks the whole
/// assembly outright; anything else still blocks future builds and is never
/// classified below `High`.
pub fn bom_urgency(available: Decimal) -> Urgency {
    if available <= Decimal::ZERO {
        Urgency::Critical
    } else {
        Urgency::High
    }
}

/// Urgency of a sales-order-driven gap mirrors the classifier tier.
pub fn tier_urgency(tier: RequirementTier) -> Urgency {
    match tier {
        RequirementTier::Critical => Urgency::Critical,
        RequirementTier::Shortage => Urgency::High,
        RequirementTier::Sufficient => Urgency::Low,
    }
}
