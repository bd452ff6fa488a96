use std::collections::HashMap;

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use crate::{
    entities::{
        bom_line::{self, Entity as BomLineEntity},
        item::{self, Entity as ItemEntity, ItemStatus},
        sales_order_line::{self, Entity as SalesOrderLineEntity},
    },
    errors::ServiceError,
};

/// One direct component edge of an assembly, joined with the component's
/// current stock position. The snapshot the explosion calculator runs on.
#[derive(Debug, Clone)]
pub struct ComponentStock {
    pub component_id: i64,
    pub sku: String,
    pub required_per_unit: Decimal,
    pub available: Decimal,
    pub reorder_level: Decimal,
}

/// Fetches a catalog item or fails with `NotFound`.
pub async fn get_item<C: ConnectionTrait>(
    conn: &C,
    item_id: i64,
) -> Result<item::Model, ServiceError> {
    ItemEntity::find_by_id(item_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Item {} not found", item_id)))
}

/// All active assembly items, the population of a full sweep.
pub async fn list_assemblies<C: ConnectionTrait>(
    conn: &C,
) -> Result<Vec<item::Model>, ServiceError> {
    ItemEntity::find()
        .filter(item::Column::IsAssembly.eq(true))
        .filter(item::Column::Status.eq(ItemStatus::Active))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)
}

/// Direct component edges of an assembly joined with current stock.
///
/// Stock is re-read on every call; goods receipt/issue mutates it elsewhere
/// and the engine must never work from a cached quantity.
pub async fn get_assembly_components<C: ConnectionTrait>(
    conn: &C,
    item_id: i64,
) -> Result<Vec<ComponentStock>, ServiceError> {
    let edges = BomLineEntity::find()
        .filter(bom_line::Column::ParentItemId.eq(item_id))
        .all(conn)
        .await?;

    if edges.is_empty() {
        return Ok(Vec::new());
    }

    let component_ids: Vec<i64> = edges.iter().map(|e| e.component_item_id).collect();
    let components: HashMap<i64, item::Model> = ItemEntity::find()
        .filter(item::Column::Id.is_in(component_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();

    let mut stocks = Vec::with_capacity(edges.len());
    for edge in edges {
        let component = components.get(&edge.component_item_id).ok_or_else(|| {
            ServiceError::NotFound(format!(
                "Component item {} referenced by BOM of item {} not found",
                edge.component_item_id, item_id
            ))
        })?;
        stocks.push(ComponentStock {
            component_id: component.id,
            sku: component.sku.clone(),
            required_per_unit: edge.quantity_per_unit,
            available: component.on_hand_quantity,
            reorder_level: component.reorder_level,
        });
    }
    Ok(stocks)
}

/// Whether the item has any direct component edges.
pub async fn has_components<C: ConnectionTrait>(
    conn: &C,
    item_id: i64,
) -> Result<bool, ServiceError> {
    Ok(BomLineEntity::find()
        .filter(bom_line::Column::ParentItemId.eq(item_id))
        .one(conn)
        .await?
        .is_some())
}

/// Outstanding demand lines of one sales order; `NotFound` when the order
/// has none.
pub async fn get_order_lines<C: ConnectionTrait>(
    conn: &C,
    sales_order_id: i64,
) -> Result<Vec<sales_order_line::Model>, ServiceError> {
    let lines = SalesOrderLineEntity::find()
        .filter(sales_order_line::Column::SalesOrderId.eq(sales_order_id))
        .all(conn)
        .await?;

    if lines.is_empty() {
        return Err(ServiceError::NotFound(format!(
            "Sales order {} has no lines",
            sales_order_id
        )));
    }
    Ok(lines)
}

/// Validates that no BOM path starting at `root` revisits an item or exceeds
/// `max_depth` levels. BOM data is written outside this crate, so cycles are
/// detected here at read time and surfaced as `BomCycle`.
pub async fn assert_acyclic<C: ConnectionTrait>(
    conn: &C,
    root: i64,
    max_depth: u32,
) -> Result<(), ServiceError> {
    let mut path = Vec::new();
    walk(conn, root, max_depth, &mut path).await
}

async fn walk<C: ConnectionTrait>(
    conn: &C,
    node: i64,
    remaining: u32,
    path: &mut Vec<i64>,
) -> Result<(), ServiceError> {
    if path.contains(&node) {
        return Err(ServiceError::BomCycle(format!(
            "item {} is reachable from itself via {:?}",
            node, path
        )));
    }
    if remaining == 0 {
        return Err(ServiceError::BomCycle(format!(
            "BOM depth limit reached under item {}",
            node
        )));
    }

    path.push(node);
    let edges = BomLineEntity::find()
        .filter(bom_line::Column::ParentItemId.eq(node))
        .all(conn)
        .await?;
    for edge in edges {
        Box::pin(walk(conn, edge.component_item_id, remaining - 1, path)).await?;
    }
    path.pop();
    Ok(())
}
