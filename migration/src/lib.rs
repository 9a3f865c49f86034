pub use sea_orm_migration::prelude::*;

mod m20260806_000001_create_users;
mod m20260806_000002_create_obras;
mod m20260806_000003_create_clientes;
mod m20260806_000004_create_productos;
mod m20260806_000005_create_registros;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260806_000001_create_users::Migration),
            Box::new(m20260806_000002_create_obras::Migration),
            Box::new(m20260806_000003_create_clientes::Migration),
            Box::new(m20260806_000004_create_productos::Migration),
            Box::new(m20260806_000005_create_registros::Migration),
        ]
    }
}
