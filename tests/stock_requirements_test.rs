//! Tests for the sales-order path: requirement recompute, single
//! requisition generation with stock re-read, and batch tolerance of
//! per-line failures.

use assert_matches::assert_matches;
use chrono::{Datelike, Utc};
use rust_decimal_macros::dec;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
use std::sync::Arc;

use mrp_core::{
    config::MrpConfig,
    entities::{
        audit_entry, item,
        purchase_requisition::{self, RequisitionSource, RequisitionStatus, Urgency},
        requisition_counter, sales_order_line,
        stock_requirement::{self, RequirementTier},
    },
    errors::ServiceError,
    events::EventSender,
    services::{requisition::GenerateOutcome, sweep::SweepService},
};

const ORDER_ID: i64 = 500;

fn order_line(id: i64, item_id: i64, qty: rust_decimal::Decimal) -> sales_order_line::Model {
    sales_order_line::Model {
        id,
        sales_order_id: ORDER_ID,
        item_id,
        quantity_ordered: qty,
        order_date: Some(Utc::now()),
        installation_date: None,
        customer_ref: Some("CUST-77".to_string()),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn stock_item(id: i64, on_hand: rust_decimal::Decimal) -> item::Model {
    item::Model {
        id,
        sku: format!("WID-{}", id),
        name: format!("Widget {}", id),
        uom_code: Some("EA".to_string()),
        on_hand_quantity: on_hand,
        reorder_level: dec!(0),
        unit_price: dec!(9),
        is_assembly: false,
        status: item::ItemStatus::Active,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn requirement(
    id: i64,
    item_id: i64,
    required: rust_decimal::Decimal,
    available: rust_decimal::Decimal,
    shortfall: rust_decimal::Decimal,
    tier: RequirementTier,
) -> stock_requirement::Model {
    stock_requirement::Model {
        id,
        sales_order_id: ORDER_ID,
        item_id,
        required_qty: required,
        available_qty: available,
        shortfall_qty: shortfall,
        status: tier,
        has_open_requisition: false,
        computed_at: Utc::now(),
    }
}

fn requisition_model(id: i64, item_id: i64, number: &str) -> purchase_requisition::Model {
    purchase_requisition::Model {
        id,
        number: number.to_string(),
        item_id,
        sales_order_id: Some(ORDER_ID),
        source_type: RequisitionSource::SalesOrder,
        source_id: ORDER_ID,
        required_qty: dec!(6),
        requested_by: "casey".to_string(),
        status: RequisitionStatus::Pending,
        urgency: Urgency::High,
        reason: "Stock shortfall".to_string(),
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
        actor: "casey".to_string(),
        module: "procurement".to_string(),
        action: "requisition_created".to_string(),
        description: "Requisition created".to_string(),
        created_at: Utc::now(),
    }
}

fn service(db: DatabaseConnection) -> SweepService {
    let (events, _rx) = EventSender::channel(16);
    SweepService::new(Arc::new(db), MrpConfig::default(), events)
}

#[tokio::test]
async fn recompute_classifies_each_line_against_current_stock() {
    // 10 required, 4 on hand: shortfall 6.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![order_line(1, 2, dec!(10))]])
        .append_query_results(vec![vec![stock_item(2, dec!(4))]])
        // no open requisition for (item, order)
        .append_query_results(vec![Vec::<purchase_requisition::Model>::new()])
        // no prior requirement row
        .append_query_results(vec![Vec::<stock_requirement::Model>::new()])
        // insert of the fresh row
        .append_query_results(vec![vec![requirement(
            1,
            2,
            dec!(10),
            dec!(4),
            dec!(6),
            RequirementTier::Shortage,
        )]])
        .append_exec_results(vec![MockExecResult {
            last_insert_id: 1,
            rows_affected: 1,
        }])
        .into_connection();

    let rows = service(db)
        .recalculate_stock_requirements(ORDER_ID)
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].shortfall_qty, dec!(6));
    assert_eq!(rows[0].status, RequirementTier::Shortage);
    assert!(!rows[0].has_open_requisition);
}

#[tokio::test]
async fn recompute_of_unknown_order_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![Vec::<sales_order_line::Model>::new()])
        .into_connection();

    let err = service(db)
        .recalculate_stock_requirements(ORDER_ID)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn generation_is_skipped_when_stock_caught_up() {
    // The requirement recorded a shortfall, but a goods receipt landed in
    // the meantime; the re-read finds stock covering demand.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![requirement(
            1,
            2,
            dec!(10),
            dec!(4),
            dec!(6),
            RequirementTier::Shortage,
        )]])
        .append_query_results(vec![vec![stock_item(2, dec!(50))]])
        // refresh of the requirement row
        .append_query_results(vec![vec![requirement(
            1,
            2,
            dec!(10),
            dec!(50),
            dec!(0),
            RequirementTier::Sufficient,
        )]])
        .append_exec_results(vec![MockExecResult {
            last_insert_id: 1,
            rows_affected: 1,
        }])
        .into_connection();

    let outcome = service(db)
        .generate_for_requirement(1, "casey")
        .await
        .unwrap();
    assert_matches!(outcome, GenerateOutcome::NotNeeded);
}

#[tokio::test]
async fn batch_continues_past_a_failing_line() {
    let year = Utc::now().year();
    let number = format!("PR-{}-000001", year);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        // two shortfall requirements on the order
        .append_query_results(vec![vec![
            requirement(1, 2, dec!(10), dec!(4), dec!(6), RequirementTier::Shortage),
            requirement(2, 3, dec!(5), dec!(0), dec!(5), RequirementTier::Critical),
        ]])
        // line 1: full generation sequence
        .append_query_results(vec![vec![requirement(
            1,
            2,
            dec!(10),
            dec!(4),
            dec!(6),
            RequirementTier::Shortage,
        )]])
        .append_query_results(vec![vec![stock_item(2, dec!(4))]])
        .append_query_results(vec![Vec::<purchase_requisition::Model>::new()])
        .append_query_results(vec![Vec::<requisition_counter::Model>::new()])
        .append_query_results(vec![vec![requisition_counter::Model {
            year,
            last_value: 1,
        }]])
        .append_query_results(vec![vec![requisition_model(11, 2, &number)]])
        .append_query_results(vec![vec![audit_model()]])
        .append_query_results(vec![vec![requirement(
            1,
            2,
            dec!(10),
            dec!(4),
            dec!(6),
            RequirementTier::Shortage,
        )]])
        .append_exec_results(vec![
            MockExecResult {
                last_insert_id: 11,
                rows_affected: 1,
            };
            4
        ])
        // line 2: the store runs dry; that line fails, the batch does not
        .into_connection();

    let outcome = service(db).batch_generate(ORDER_ID, "casey").await.unwrap();

    assert_eq!(outcome.succeeded.len(), 1);
    assert_eq!(outcome.succeeded[0].number, number);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].requirement_id, 2);
    assert_eq!(outcome.failed[0].item_id, 3);
}

#[tokio::test]
async fn batch_on_order_without_requirements_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![Vec::<stock_requirement::Model>::new()])
        .into_connection();

    let err = service(db).batch_generate(ORDER_ID, "casey").await.unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn covered_lines_are_skipped_not_failed() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![requirement(
            1,
            2,
            dec!(10),
            dec!(25),
            dec!(0),
            RequirementTier::Sufficient,
        )]])
        .into_connection();

    let outcome = service(db).batch_generate(ORDER_ID, "casey").await.unwrap();

    assert!(outcome.succeeded.is_empty());
    assert!(outcome.failed.is_empty());
    assert_eq!(outcome.skipped, 1);
}
