use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Items::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Items::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Items::Sku).string().not_null().unique_key())
                    .col(ColumnDef::new(Items::Name).string().not_null())
                    .col(ColumnDef::new(Items::UomCode).string())
                    .col(
                        ColumnDef::new(Items::OnHandQuantity)
                            .decimal_len(19, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Items::ReorderLevel)
                            .decimal_len(19, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Items::UnitPrice)
                            .decimal_len(19, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Items::IsAssembly)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Items::Status).string_len(20).not_null())
                    .col(
                        ColumnDef::new(Items::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Items::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BomLines::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BomLines::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BomLines::ParentItemId).big_integer().not_null())
                    .col(
                        ColumnDef::new(BomLines::ComponentItemId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BomLines::QuantityPerUnit)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(ColumnDef::new(BomLines::BomVersion).string())
                    .col(
                        ColumnDef::new(BomLines::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BomLines::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bom_lines_parent_item")
                            .from(BomLines::Table, BomLines::ParentItemId)
                            .to(Items::Table, Items::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bom_lines_component_item")
                            .from(BomLines::Table, BomLines::ComponentItemId)
                            .to(Items::Table, Items::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bom_lines_parent")
                    .table(BomLines::Table)
                    .col(BomLines::ParentItemId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SalesOrderLines::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SalesOrderLines::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SalesOrderLines::SalesOrderId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SalesOrderLines::ItemId).big_integer().not_null())
                    .col(
                        ColumnDef::new(SalesOrderLines::QuantityOrdered)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(ColumnDef::new(SalesOrderLines::OrderDate).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(SalesOrderLines::InstallationDate)
                            .timestamp_with_time_zone(),
                    )
                    .col(ColumnDef::new(SalesOrderLines::CustomerRef).string())
                    .col(
                        ColumnDef::new(SalesOrderLines::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SalesOrderLines::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sales_order_lines_item")
                            .from(SalesOrderLines::Table, SalesOrderLines::ItemId)
                            .to(Items::Table, Items::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sales_order_lines_order")
                    .table(SalesOrderLines::Table)
                    .col(SalesOrderLines::SalesOrderId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StockRequirements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StockRequirements::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(StockRequirements::SalesOrderId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockRequirements::ItemId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockRequirements::RequiredQty)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockRequirements::AvailableQty)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockRequirements::ShortfallQty)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockRequirements::Status)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockRequirements::HasOpenRequisition)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(StockRequirements::ComputedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // One coverage row per (order, item); recomputes supersede in place.
        manager
            .create_index(
                Index::create()
                    .name("idx_stock_requirements_order_item")
                    .table(StockRequirements::Table)
                    .col(StockRequirements::SalesOrderId)
                    .col(StockRequirements::ItemId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PurchaseRequisitions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PurchaseRequisitions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PurchaseRequisitions::Number)
                            .string_len(20)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(PurchaseRequisitions::ItemId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PurchaseRequisitions::SalesOrderId).big_integer())
                    .col(
                        ColumnDef::new(PurchaseRequisitions::SourceType)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseRequisitions::SourceId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseRequisitions::RequiredQty)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseRequisitions::RequestedBy)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseRequisitions::Status)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseRequisitions::Urgency)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PurchaseRequisitions::Reason).text().not_null())
                    .col(ColumnDef::new(PurchaseRequisitions::RejectionReason).text())
                    .col(ColumnDef::new(PurchaseRequisitions::ApprovedBy).string())
                    .col(
                        ColumnDef::new(PurchaseRequisitions::ApprovedAt)
                            .timestamp_with_time_zone(),
                    )
                    .col(
                        ColumnDef::new(PurchaseRequisitions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseRequisitions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_requisitions_item")
                            .from(PurchaseRequisitions::Table, PurchaseRequisitions::ItemId)
                            .to(Items::Table, Items::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_purchase_requisitions_item_source")
                    .table(PurchaseRequisitions::Table)
                    .col(PurchaseRequisitions::ItemId)
                    .col(PurchaseRequisitions::SourceType)
                    .col(PurchaseRequisitions::SourceId)
                    .to_owned(),
            )
            .await?;

        // Race backstop for the generator's check-then-insert: at most one
        // open requisition per (item, source) even under concurrent writers.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX idx_purchase_requisitions_open_unique \
                 ON purchase_requisitions (item_id, source_type, source_id) \
                 WHERE status IN ('pending', 'approved')",
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RequisitionCounters::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RequisitionCounters::Year)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RequisitionCounters::LastValue)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AuditEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuditEntries::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AuditEntries::Actor).string().not_null())
                    .col(ColumnDef::new(AuditEntries::Module).string().not_null())
                    .col(ColumnDef::new(AuditEntries::Action).string().not_null())
                    .col(ColumnDef::new(AuditEntries::Description).text().not_null())
                    .col(
                        ColumnDef::new(AuditEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuditEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RequisitionCounters::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PurchaseRequisitions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(StockRequirements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SalesOrderLines::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BomLines::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Items::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Items {
    Table,
    Id,
    Sku,
    Name,
    UomCode,
    OnHandQuantity,
    ReorderLevel,
    UnitPrice,
    IsAssembly,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum BomLines {
    Table,
    Id,
    ParentItemId,
    ComponentItemId,
    QuantityPerUnit,
    BomVersion,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum SalesOrderLines {
    Table,
    Id,
    SalesOrderId,
    ItemId,
    QuantityOrdered,
    OrderDate,
    InstallationDate,
    CustomerRef,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum StockRequirements {
    Table,
    Id,
    SalesOrderId,
    ItemId,
    RequiredQty,
    AvailableQty,
    ShortfallQty,
    Status,
    HasOpenRequisition,
    ComputedAt,
}

#[derive(DeriveIden)]
enum PurchaseRequisitions {
    Table,
    Id,
    Number,
    ItemId,
    SalesOrderId,
    SourceType,
    SourceId,
    RequiredQty,
    RequestedBy,
    Status,
    Urgency,
    Reason,
    RejectionReason,
    ApprovedBy,
    ApprovedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum RequisitionCounters {
    Table,
    Year,
    LastValue,
}

#[derive(DeriveIden)]
enum AuditEntries {
    Table,
    Id,
    Actor,
    Module,
    Action,
    Description,
    CreatedAt,
}
