use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Clientes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Clientes::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Clientes::UserId).uuid().not_null())
                    .col(ColumnDef::new(Clientes::Nombre).string().not_null())
                    .col(ColumnDef::new(Clientes::Cedula).string().null())
                    // Free text on purpose: clientes are associated to an obra by
                    // name, not by foreign key (the obra may not exist as a row).
                    .col(ColumnDef::new(Clientes::Obra).string().null())
                    .col(
                        ColumnDef::new(Clientes::Estado)
                            .string()
                            .not_null()
                            .default("activo"),
                    )
                    .col(ColumnDef::new(Clientes::Fecha).date().null())
                    .col(
                        ColumnDef::new(Clientes::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_clientes_user")
                            .from(Clientes::Table, Clientes::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Clientes::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Clientes {
    Table,
    Id,
    UserId,
    Nombre,
    Cedula,
    Obra,
    Estado,
    Fecha,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
