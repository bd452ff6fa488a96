use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::{
    config::MrpConfig,
    errors::ServiceError,
    services::catalog::{self, ComponentStock},
};

/// A component whose stock constrains the assembly right now: either it
/// cannot cover even one more unit, or it has fallen to its reorder level.
#[derive(Debug, Clone, Serialize)]
pub struct Bottleneck {
    pub component_id: i64,
    pub sku: String,
    pub required_per_unit: Decimal,
    pub available: Decimal,
    pub reorder_level: Decimal,
    /// Whole units of the parent this component alone could still supply.
    pub can_build: Decimal,
}

/// Result of exploding one assembly against current component stock.
#[derive(Debug, Clone, Serialize)]
pub struct BuildAnalysis {
    /// `None` when the assembly has no constraining components (nothing
    /// limits production).
    pub max_buildable: Option<Decimal>,
    pub bottlenecks: Vec<Bottleneck>,
}

impl BuildAnalysis {
    pub fn is_constrained(&self) -> bool {
        !self.bottlenecks.is_empty()
    }
}

/// Computes the maximum buildable quantity and bottleneck set for one
/// assembly. Pure; operates only on the supplied snapshot.
pub fn analyze_build(components: &[ComponentStock]) -> BuildAnalysis {
    let mut max_buildable: Option<Decimal> = None;
    let mut bottlenecks = Vec::new();

    for component in components {
        // A non-positive per-unit quantity cannot constrain the build.
        if component.required_per_unit <= Decimal::ZERO {
            continue;
        }

        let can_build = (component.available / component.required_per_unit).floor();
        max_buildable = Some(match max_buildable {
            None => can_build,
            Some(current) => current.min(can_build),
        });

        if component.available < component.required_per_unit
            || component.available <= component.reorder_level
        {
            bottlenecks.push(Bottleneck {
                component_id: component.component_id,
                sku: component.sku.clone(),
                required_per_unit: component.required_per_unit,
                available: component.available,
                reorder_level: component.reorder_level,
                can_build,
            });
        }
    }

    BuildAnalysis {
        max_buildable,
        bottlenecks,
    }
}

/// Loads an assembly's component snapshot and runs the build analysis on it.
#[derive(Clone)]
pub struct ExplosionService {
    db: Arc<DatabaseConnection>,
    config: MrpConfig,
}

impl ExplosionService {
    pub fn new(db: Arc<DatabaseConnection>, config: MrpConfig) -> Self {
        Self { db, config }
    }

    /// Analyzes one assembly against current component stock. Fails with
    /// `BomCycle` on corrupt BOM data and `Validation` when the item carries
    /// no BOM at all.
    #[instrument(skip(self))]
    pub async fn analyze_assembly(&self, item_id: i64) -> Result<BuildAnalysis, ServiceError> {
        let db = &*self.db;
        let item = catalog::get_item(db, item_id).await?;
        if !item.is_assembly {
            return Err(ServiceError::Validation(format!(
                "Item {} ({}) is not an assembly",
                item.id, item.sku
            )));
        }

        catalog::assert_acyclic(db, item_id, self.config.max_bom_depth).await?;
        let components = catalog::get_assembly_components(db, item_id).await?;
        let analysis = analyze_build(&components);
        debug!(
            item_id,
            bottlenecks = analysis.bottlenecks.len(),
            "assembly analyzed"
        );
        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn component(id: i64, required: Decimal, available: Decimal, reorder: Decimal) -> ComponentStock {
        ComponentStock {
            component_id: id,
            sku: format!("CMP-{}", id),
            required_per_unit: required,
            available,
            reorder_level: reorder,
        }
    }

    #[test]
    fn max_buildable_is_min_over_components() {
        // A: 10 on hand at 2/unit -> 5; B: 3 on hand at 1/unit -> 3.
        let analysis = analyze_build(&[
            component(1, dec!(2), dec!(10), dec!(0)),
            component(2, dec!(1), dec!(3), dec!(0)),
        ]);
        assert_eq!(analysis.max_buildable, Some(dec!(3)));
        assert!(analysis.bottlenecks.is_empty());
    }

    #[test]
    fn component_below_one_unit_is_a_bottleneck() {
        let analysis = analyze_build(&[
            component(1, dec!(4), dec!(3), dec!(0)),
            component(2, dec!(1), dec!(50), dec!(0)),
        ]);
        assert_eq!(analysis.max_buildable, Some(dec!(0)));
        assert_eq!(analysis.bottlenecks.len(), 1);
        assert_eq!(analysis.bottlenecks[0].component_id, 1);
        assert_eq!(analysis.bottlenecks[0].can_build, dec!(0));
    }

    #[test]
    fn component_at_reorder_level_is_a_bottleneck() {
        let analysis = analyze_build(&[component(7, dec!(1), dec!(12), dec!(12))]);
        assert_eq!(analysis.max_buildable, Some(dec!(12)));
        assert_eq!(analysis.bottlenecks.len(), 1);
    }

    #[test]
    fn non_positive_per_unit_quantity_does_not_constrain() {
        let analysis = analyze_build(&[
            component(1, dec!(0), dec!(0), dec!(0)),
            component(2, dec!(2), dec!(9), dec!(0)),
        ]);
        assert_eq!(analysis.max_buildable, Some(dec!(4)));
        assert!(analysis.bottlenecks.is_empty());
    }

    #[test]
    fn no_components_means_unconstrained() {
        let analysis = analyze_build(&[]);
        assert_eq!(analysis.max_buildable, None);
        assert!(!analysis.is_constrained());
    }

    #[test]
    fn fractional_division_floors() {
        let analysis = analyze_build(&[component(1, dec!(3), dec!(10), dec!(0))]);
        assert_eq!(analysis.max_buildable, Some(dec!(3)));
    }
}
