use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    #[sea_orm(unique)]
    pub username: String,
    pub birthdate: Date,
    pub password_hash: String,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::obra::Entity")]
    Obra,
    #[sea_orm(has_many = "super::cliente::Entity")]
    Cliente,
    #[sea_orm(has_many = "super::producto::Entity")]
    Producto,
    #[sea_orm(has_many = "super::registro::Entity")]
    Registro,
}

impl Related<super::obra::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Obra.def()
    }
}

impl Related<super::cliente::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cliente.def()
    }
}

impl Related<super::producto::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Producto.def()
    }
}

impl Related<super::registro::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Registro.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
