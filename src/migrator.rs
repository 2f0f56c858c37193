use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_warehouses_table::Migration),
            Box::new(m20260301_000002_create_stock_records_table::Migration),
            Box::new(m20260301_000003_create_case_lines_table::Migration),
            Box::new(m20260301_000004_create_transfer_requests_table::Migration),
            Box::new(m20260301_000005_create_transfer_request_items_table::Migration),
            Box::new(m20260301_000006_create_stock_reservations_table::Migration),
            Box::new(m20260301_000007_create_component_units_table::Migration),
        ]
    }
}

mod m20260301_000001_create_warehouses_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260301_000001_create_warehouses_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Warehouses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Warehouses::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Warehouses::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(Warehouses::ServiceCenterId).uuid().null())
                        .col(ColumnDef::new(Warehouses::Name).string().not_null())
                        .col(
                            ColumnDef::new(Warehouses::Priority)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Warehouses::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Warehouses::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_warehouses_company_priority")
                        .table(Warehouses::Table)
                        .col(Warehouses::CompanyId)
                        .col(Warehouses::Priority)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Warehouses::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum Warehouses {
        Table,
        Id,
        CompanyId,
        ServiceCenterId,
        Name,
        Priority,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20260301_000002_create_stock_records_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260301_000002_create_stock_records_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockRecords::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockRecords::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockRecords::WarehouseId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockRecords::TypeComponentId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockRecords::QuantityInStock)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockRecords::QuantityReserved)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockRecords::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockRecords::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            // One stock row per component type per warehouse
            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_records_warehouse_type")
                        .table(StockRecords::Table)
                        .col(StockRecords::WarehouseId)
                        .col(StockRecords::TypeComponentId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockRecords::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum StockRecords {
        Table,
        Id,
        WarehouseId,
        TypeComponentId,
        QuantityInStock,
        QuantityReserved,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20260301_000003_create_case_lines_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260301_000003_create_case_lines_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(CaseLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CaseLines::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CaseLines::Status).string().not_null())
                        .col(ColumnDef::new(CaseLines::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(CaseLines::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CaseLines::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum CaseLines {
        Table,
        Id,
        Status,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20260301_000004_create_transfer_requests_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260301_000004_create_transfer_requests_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockTransferRequests::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockTransferRequests::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransferRequests::RequestingWarehouseId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransferRequests::CompanyId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransferRequests::RequestedBy)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransferRequests::Status)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransferRequests::EstimatedDeliveryDate)
                                .timestamp()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockTransferRequests::RejectionReason)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockTransferRequests::CancellationReason)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockTransferRequests::ApprovedBy)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockTransferRequests::ReceivedBy)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockTransferRequests::RejectedBy)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockTransferRequests::CancelledBy)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockTransferRequests::ApprovedAt)
                                .timestamp()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockTransferRequests::ShippedAt)
                                .timestamp()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockTransferRequests::ReceivedAt)
                                .timestamp()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockTransferRequests::RejectedAt)
                                .timestamp()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockTransferRequests::CancelledAt)
                                .timestamp()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockTransferRequests::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransferRequests::UpdatedAt)
                                .timestamp()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_transfer_requests_company_status")
                        .table(StockTransferRequests::Table)
                        .col(StockTransferRequests::CompanyId)
                        .col(StockTransferRequests::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockTransferRequests::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum StockTransferRequests {
        Table,
        Id,
        RequestingWarehouseId,
        CompanyId,
        RequestedBy,
        Status,
        EstimatedDeliveryDate,
        RejectionReason,
        CancellationReason,
        ApprovedBy,
        ReceivedBy,
        RejectedBy,
        CancelledBy,
        ApprovedAt,
        ShippedAt,
        ReceivedAt,
        RejectedAt,
        CancelledAt,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20260301_000005_create_transfer_request_items_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260301_000005_create_transfer_request_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockTransferRequestItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockTransferRequestItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransferRequestItems::RequestId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransferRequestItems::TypeComponentId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransferRequestItems::QuantityRequested)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransferRequestItems::CaseLineId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockTransferRequestItems::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_transfer_request_items_request")
                        .table(StockTransferRequestItems::Table)
                        .col(StockTransferRequestItems::RequestId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(
                    Table::drop()
                        .table(StockTransferRequestItems::Table)
                        .to_owned(),
                )
                .await
        }
    }

    #[derive(Iden)]
    pub enum StockTransferRequestItems {
        Table,
        Id,
        RequestId,
        TypeComponentId,
        QuantityRequested,
        CaseLineId,
        CreatedAt,
    }
}

mod m20260301_000006_create_stock_reservations_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260301_000006_create_stock_reservations_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockReservations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockReservations::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockReservations::StockRecordId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockReservations::TransferItemId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockReservations::QuantityReserved)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockReservations::Status)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockReservations::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockReservations::UpdatedAt)
                                .timestamp()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_reservations_item")
                        .table(StockReservations::Table)
                        .col(StockReservations::TransferItemId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_reservations_stock_status")
                        .table(StockReservations::Table)
                        .col(StockReservations::StockRecordId)
                        .col(StockReservations::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockReservations::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum StockReservations {
        Table,
        Id,
        StockRecordId,
        TransferItemId,
        QuantityReserved,
        Status,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20260301_000007_create_component_units_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260301_000007_create_component_units_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ComponentUnits::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ComponentUnits::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ComponentUnits::SerialNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(ComponentUnits::TypeComponentId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ComponentUnits::Status).string().not_null())
                        .col(ColumnDef::new(ComponentUnits::WarehouseId).uuid().null())
                        .col(ColumnDef::new(ComponentUnits::VehicleVin).string().null())
                        .col(
                            ColumnDef::new(ComponentUnits::TransferItemId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ComponentUnits::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ComponentUnits::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_component_units_warehouse_type_status")
                        .table(ComponentUnits::Table)
                        .col(ComponentUnits::WarehouseId)
                        .col(ComponentUnits::TypeComponentId)
                        .col(ComponentUnits::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_component_units_transfer_item")
                        .table(ComponentUnits::Table)
                        .col(ComponentUnits::TransferItemId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ComponentUnits::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum ComponentUnits {
        Table,
        Id,
        SerialNumber,
        TypeComponentId,
        Status,
        WarehouseId,
        VehicleVin,
        TransferItemId,
        CreatedAt,
        UpdatedAt,
    }
}
