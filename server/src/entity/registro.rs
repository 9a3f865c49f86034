use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "registros")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub fecha: Option<Date>,
    /// Free-text association to an obra by name, not a foreign key.
    pub obra: Option<String>,
    pub total_cantidad: i32,
    pub total_cobrar: f64,
    pub total_pagado: f64,
    pub status: String,
    /// JSON text: extra per-client charges, stored as an opaque serialized list.
    pub clientes_adicionales: Option<String>,
    /// JSON text: line-item detail rows, stored as an opaque serialized list.
    pub detalles: Option<String>,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
