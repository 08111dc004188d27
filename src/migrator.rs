use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_inventory_table::Migration),
            Box::new(m20240301_000002_create_shelves_table::Migration),
            Box::new(m20240301_000003_create_bin_inventory_table::Migration),
            Box::new(m20240301_000004_create_inventory_movements_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240301_000001_create_inventory_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_inventory_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Inventory::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Inventory::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Inventory::ProductId).uuid().not_null())
                        .col(ColumnDef::new(Inventory::SiteId).uuid().not_null())
                        .col(
                            ColumnDef::new(Inventory::Quantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Inventory::ReservedQuantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Inventory::AvailableQuantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Inventory::MinStockLevel).integer().null())
                        .col(ColumnDef::new(Inventory::MaxStockLevel).integer().null())
                        .col(ColumnDef::new(Inventory::ReorderPoint).integer().null())
                        .col(
                            ColumnDef::new(Inventory::Version)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Inventory::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Inventory::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx-inventory-product-site")
                        .table(Inventory::Table)
                        .col(Inventory::ProductId)
                        .col(Inventory::SiteId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Inventory::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Inventory {
        Table,
        Id,
        ProductId,
        SiteId,
        Quantity,
        ReservedQuantity,
        AvailableQuantity,
        MinStockLevel,
        MaxStockLevel,
        ReorderPoint,
        Version,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000002_create_shelves_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_shelves_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Shelves::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Shelves::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Shelves::SiteId).uuid().not_null())
                        .col(ColumnDef::new(Shelves::Code).string().not_null())
                        .col(ColumnDef::new(Shelves::Name).string().not_null())
                        .col(ColumnDef::new(Shelves::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx-shelves-site-code")
                        .table(Shelves::Table)
                        .col(Shelves::SiteId)
                        .col(Shelves::Code)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Shelves::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Shelves {
        Table,
        Id,
        SiteId,
        Code,
        Name,
        CreatedAt,
    }
}

mod m20240301_000003_create_bin_inventory_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_bin_inventory_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(BinInventory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(BinInventory::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(BinInventory::ShelfId).uuid().not_null())
                        .col(ColumnDef::new(BinInventory::SiteId).uuid().not_null())
                        .col(ColumnDef::new(BinInventory::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(BinInventory::Quantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(BinInventory::ReservedQuantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(BinInventory::AvailableQuantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(BinInventory::IsPrimary)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(BinInventory::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BinInventory::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx-bin-inventory-shelf-product")
                        .table(BinInventory::Table)
                        .col(BinInventory::ShelfId)
                        .col(BinInventory::ProductId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx-bin-inventory-site-product")
                        .table(BinInventory::Table)
                        .col(BinInventory::SiteId)
                        .col(BinInventory::ProductId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(BinInventory::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum BinInventory {
        Table,
        Id,
        ShelfId,
        SiteId,
        ProductId,
        Quantity,
        ReservedQuantity,
        AvailableQuantity,
        IsPrimary,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000004_create_inventory_movements_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_inventory_movements_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryMovements::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::InventoryId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::MovementType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::QuantityBefore)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::QuantityChange)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::QuantityAfter)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryMovements::FromSiteId).uuid().null())
                        .col(ColumnDef::new(InventoryMovements::ToSiteId).uuid().null())
                        .col(ColumnDef::new(InventoryMovements::Reason).string().null())
                        .col(ColumnDef::new(InventoryMovements::Notes).text().null())
                        .col(
                            ColumnDef::new(InventoryMovements::PerformedBy)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx-inventory-movements-inventory-created")
                        .table(InventoryMovements::Table)
                        .col(InventoryMovements::InventoryId)
                        .col(InventoryMovements::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryMovements::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum InventoryMovements {
        Table,
        Id,
        InventoryId,
        MovementType,
        QuantityBefore,
        QuantityChange,
        QuantityAfter,
        FromSiteId,
        ToSiteId,
        Reason,
        Notes,
        PerformedBy,
        CreatedAt,
    }
}
