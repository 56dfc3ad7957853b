use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_hospitals_table::Migration),
            Box::new(m20240601_000002_create_departments_table::Migration),
            Box::new(m20240601_000003_create_items_table::Migration),
            Box::new(m20240601_000004_create_medical_inventory_table::Migration),
        ]
    }
}

#[derive(DeriveIden)]
enum Hospitals {
    Table,
    Id,
    HospitalName,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Departments {
    Table,
    Id,
    Department,
    HospitalId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Items {
    Table,
    ItemId,
    ItemName,
    Supplier,
    UnitPrice,
    Category,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum MedicalInventory {
    Table,
    Id,
    DepartmentId,
    HospitalId,
    ItemId,
    BatchNumber,
    ExpiryDate,
    Quantity,
    CreatedAt,
    UpdatedAt,
}

mod m20240601_000001_create_hospitals_table {
    use super::Hospitals;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000001_create_hospitals_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Hospitals::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Hospitals::Id).uuid().not_null().primary_key())
                        .col(
                            ColumnDef::new(Hospitals::HospitalName)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Hospitals::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Hospitals::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Hospitals::Table).to_owned())
                .await
        }
    }
}

mod m20240601_000002_create_departments_table {
    use super::{Departments, Hospitals};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000002_create_departments_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Departments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Departments::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Departments::Department).string().not_null())
                        .col(ColumnDef::new(Departments::HospitalId).uuid().not_null())
                        .col(
                            ColumnDef::new(Departments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_departments_hospital_id")
                                .from(Departments::Table, Departments::HospitalId)
                                .to(Hospitals::Table, Hospitals::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_departments_department_hospital")
                        .table(Departments::Table)
                        .col(Departments::Department)
                        .col(Departments::HospitalId)
                        .unique()
                        .if_not_exists()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Departments::Table).to_owned())
                .await
        }
    }
}

mod m20240601_000003_create_items_table {
    use super::Items;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000003_create_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Items::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Items::ItemId).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Items::ItemName).string().not_null())
                        .col(ColumnDef::new(Items::Supplier).string().not_null())
                        .col(
                            ColumnDef::new(Items::UnitPrice)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Items::Category).string().not_null())
                        .col(ColumnDef::new(Items::Description).text())
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

            // Upserts resolve catalog entries through this pair.
            manager
                .create_index(
                    Index::create()
                        .name("idx_items_item_name_supplier")
                        .table(Items::Table)
                        .col(Items::ItemName)
                        .col(Items::Supplier)
                        .unique()
                        .if_not_exists()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Items::Table).to_owned())
                .await
        }
    }
}

mod m20240601_000004_create_medical_inventory_table {
    use super::{Departments, Hospitals, Items, MedicalInventory};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000004_create_medical_inventory_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(MedicalInventory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MedicalInventory::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(MedicalInventory::DepartmentId).uuid().not_null())
                        .col(ColumnDef::new(MedicalInventory::HospitalId).uuid().not_null())
                        .col(ColumnDef::new(MedicalInventory::ItemId).uuid().not_null())
                        .col(
                            ColumnDef::new(MedicalInventory::BatchNumber)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MedicalInventory::ExpiryDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MedicalInventory::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(MedicalInventory::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MedicalInventory::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_medical_inventory_department_id")
                                .from(MedicalInventory::Table, MedicalInventory::DepartmentId)
                                .to(Departments::Table, Departments::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_medical_inventory_hospital_id")
                                .from(MedicalInventory::Table, MedicalInventory::HospitalId)
                                .to(Hospitals::Table, Hospitals::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_medical_inventory_item_id")
                                .from(MedicalInventory::Table, MedicalInventory::ItemId)
                                .to(Items::Table, Items::ItemId),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_medical_inventory_hospital_id")
                        .table(MedicalInventory::Table)
                        .col(MedicalInventory::HospitalId)
                        .if_not_exists()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(MedicalInventory::Table).to_owned())
                .await
        }
    }
}
