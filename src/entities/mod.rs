pub mod audit_entry;
pub mod bom_line;
pub mod item;
pub mod purchase_requisition;
pub mod requisition_counter;
pub mod sales_order_line;
pub mod stock_requirement;

pub use audit_entry::Entity as AuditEntry;
pub use bom_line::Entity as BomLine;
pub use item::Entity as Item;
pub use purchase_requisition::Entity as PurchaseRequisition;
pub use requisition_counter::Entity as RequisitionCounter;
pub use sales_order_line::Entity as SalesOrderLine;
pub use stock_requirement::Entity as StockRequirement;
