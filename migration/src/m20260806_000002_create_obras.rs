use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Obras::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Obras::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Obras::UserId).uuid().not_null())
                    .col(ColumnDef::new(Obras::Nombre).string().not_null())
                    .col(ColumnDef::new(Obras::Ubicacion).string().null())
                    .col(
                        ColumnDef::new(Obras::Estado)
                            .string()
                            .not_null()
                            .default("activa"),
                    )
                    .col(
                        ColumnDef::new(Obras::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_obras_user")
                            .from(Obras::Table, Obras::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Obras::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Obras {
    Table,
    Id,
    UserId,
    Nombre,
    Ubicacion,
    Estado,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
