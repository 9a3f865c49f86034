use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Registros::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Registros::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Registros::UserId).uuid().not_null())
                    .col(ColumnDef::new(Registros::Fecha).date().null())
                    .col(ColumnDef::new(Registros::Obra).string().null())
                    .col(
                        ColumnDef::new(Registros::TotalCantidad)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Registros::TotalCobrar)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Registros::TotalPagado)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Registros::Status)
                            .string()
                            .not_null()
                            .default("pendiente"),
                    )
                    // JSON text blobs: line-item arrays stored as opaque serialized lists.
                    .col(ColumnDef::new(Registros::ClientesAdicionales).text().null())
                    .col(ColumnDef::new(Registros::Detalles).text().null())
                    .col(
                        ColumnDef::new(Registros::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_registros_user")
                            .from(Registros::Table, Registros::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_registros_user_fecha")
                    .table(Registros::Table)
                    .col(Registros::UserId)
                    .col(Registros::Fecha)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Registros::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Registros {
    Table,
    Id,
    UserId,
    Fecha,
    Obra,
    TotalCantidad,
    TotalCobrar,
    TotalPagado,
    Status,
    ClientesAdicionales,
    Detalles,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
