//! Tests for the full-catalog sweep: bottleneck detection against the batch
//! target, requisition creation inside the shared transaction, cyclic BOM
//! skipping, and all-or-nothing failure behavior.

use assert_matches::assert_matches;
use chrono::{Datelike, Utc};
use rust_decimal_macros::dec;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
use std::sync::Arc;

use mrp_core::{
    config::MrpConfig,
    entities::{
        audit_entry, bom_line, item,
        purchase_requisition::{self, RequisitionStatus, RequisitionSource, Urgency},
        requisition_counter,
    },
    errors::ServiceError,
    events::EventSender,
    services::sweep::SweepService,
};

fn assembly(id: i64, reorder_level: rust_decimal::Decimal) -> item::Model {
    item::Model {
        id,
        sku: format!("ASM-{}", id),
        name: "Pump Unit".to_string(),
        uom_code: Some("EA".to_string()),
        on_hand_quantity: dec!(0),
        reorder_level,
        unit_price: dec!(120),
        is_assembly: true,
        status: item::ItemStatus::Active,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn component(id: i64, on_hand: rust_decimal::Decimal) -> item::Model {
    item::Model {
        id,
        sku: format!("CMP-{}", id),
        name: format!("Component {}", id),
        uom_code: Some("EA".to_string()),
        on_hand_quantity: on_hand,
        reorder_level: dec!(0),
        unit_price: dec!(4),
        is_assembly: false,
        status: item::ItemStatus::Active,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn edge(id: i64, parent: i64, child: i64, qty: rust_decimal::Decimal) -> bom_line::Model {
    bom_line::Model {
        id,
        parent_item_id: parent,
        component_item_id: child,
        quantity_per_unit: qty,
        bom_version: Some("1.0".to_string()),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn created_requisition(number: &str) -> purchase_requisition::Model {
    purchase_requisition::Model {
        id: 1,
        number: number.to_string(),
        item_id: 2,
        sales_order_id: None,
        source_type: RequisitionSource::Assembly,
        source_id: 1,
        required_qty: dec!(20),
        requested_by: "mrp-engine".to_string(),
        status: RequisitionStatus::Pending,
        urgency: Urgency::Critical,
        reason: "Component CMP-2 short 20 for assembly Pump Unit (target build 10)".to_string(),
        rejection_reason: None,
        approved_by: None,
        approved_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn audit_model() -> audit_entry::Model {
    audit_entry::Model {
        id: 1,
        actor: "mrp-engine".to_string(),
        module: "procurement".to_string(),
        action: "requisition_created".to_string(),
        description: "Requisition created".to_string(),
        created_at: Utc::now(),
    }
}

fn service(db: DatabaseConnection) -> SweepService {
    mrp_core::logging::init("warn");
    let (events, _rx) = EventSender::channel(16);
    SweepService::new(Arc::new(db), MrpConfig::default(), events)
}

#[tokio::test]
async fn sweep_creates_requisition_for_bottleneck_component() {
    let year = Utc::now().year();
    let number = format!("PR-{}-000001", year);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        // assemblies to scan
        .append_query_results(vec![vec![assembly(1, dec!(10))]])
        // cycle check: children of assembly 1, then of component 2
        .append_query_results(vec![vec![edge(1, 1, 2, dec!(2))]])
        .append_query_results(vec![Vec::<bom_line::Model>::new()])
        // component snapshot: edges, then component items
        .append_query_results(vec![vec![edge(1, 1, 2, dec!(2))]])
        .append_query_results(vec![vec![component(2, dec!(0))]])
        // generator: no open requisition, no counter row yet
        .append_query_results(vec![Vec::<purchase_requisition::Model>::new()])
        .append_query_results(vec![Vec::<requisition_counter::Model>::new()])
        .append_query_results(vec![vec![requisition_counter::Model {
            year,
            last_value: 1,
        }]])
        .append_query_results(vec![vec![created_requisition(&number)]])
        .append_query_results(vec![vec![audit_model()]])
        .append_exec_results(vec![
            MockExecResult {
                last_insert_id: 1,
                rows_affected: 1,
            };
            3
        ])
        .into_connection();

    let report = service(db).run_full_sweep().await.unwrap();

    assert_eq!(report.assemblies_scanned, 1);
    assert_eq!(report.shortages_found, 1);
    assert_eq!(report.created.len(), 1);
    assert_eq!(report.created[0].number, number);
    assert_eq!(report.created[0].item_id, 2);
    // component at zero stock blocks the assembly outright
    assert_eq!(report.created[0].urgency, Urgency::Critical);
}

#[tokio::test]
async fn sweep_skips_covered_shortage_without_creating_duplicate() {
    let year = Utc::now().year();
    let open = created_requisition(&format!("PR-{}-000031", year));

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![assembly(1, dec!(10))]])
        .append_query_results(vec![vec![edge(1, 1, 2, dec!(2))]])
        .append_query_results(vec![Vec::<bom_line::Model>::new()])
        .append_query_results(vec![vec![edge(1, 1, 2, dec!(2))]])
        .append_query_results(vec![vec![component(2, dec!(0))]])
        // generator finds the shortage already covered
        .append_query_results(vec![vec![open]])
        .into_connection();

    let report = service(db).run_full_sweep().await.unwrap();

    assert_eq!(report.shortages_found, 1);
    assert!(report.created.is_empty());
}

#[tokio::test]
async fn sweep_of_empty_catalog_reports_zeroes() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![Vec::<item::Model>::new()])
        .into_connection();

    let report = service(db).run_full_sweep().await.unwrap();

    assert_eq!(report.assemblies_scanned, 0);
    assert_eq!(report.shortages_found, 0);
    assert!(report.created.is_empty());
}

#[tokio::test]
async fn cyclic_bom_is_skipped_not_fatal() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![assembly(1, dec!(10))]])
        // 1 -> 2 -> 1: the walk revisits the root
        .append_query_results(vec![vec![edge(1, 1, 2, dec!(2))]])
        .append_query_results(vec![vec![edge(2, 2, 1, dec!(1))]])
        .into_connection();

    let report = service(db).run_full_sweep().await.unwrap();

    assert_eq!(report.assemblies_scanned, 1);
    assert_eq!(report.shortages_found, 0);
    assert!(report.created.is_empty());
}

#[tokio::test]
async fn store_failure_mid_sweep_aborts_the_whole_run() {
    // The store dies after the assembly listing; nothing from this run may
    // survive, so the error propagates instead of a partial report.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![assembly(1, dec!(10))]])
        .into_connection();

    let err = service(db).run_full_sweep().await.unwrap_err();
    assert_matches!(err, ServiceError::PersistenceFailure(_));
}
