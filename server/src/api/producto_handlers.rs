use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::entity::producto;

use super::{
    AppState, ApiErr,
    dto::{
        CreateProductoRequest, ListQuery, PaginatedResponse, ProductoResponse,
        UpdateProductoRequest,
    },
    jwt::AuthClaims,
};

async fn find_owned(
    db: &DatabaseConnection,
    user_id: Uuid,
    id: Uuid,
) -> Result<producto::Model, ApiErr> {
    producto::Entity::find_by_id(id)
        .filter(producto::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(ApiErr::internal)?
        .ok_or_else(|| ApiErr::not_found("Producto not found"))
}

/// Shared by the create handler and the bulk import endpoint.
pub(super) async fn insert(
    db: &DatabaseConnection,
    user_id: Uuid,
    body: CreateProductoRequest,
) -> Result<producto::Model, ApiErr> {
    producto::ActiveModel {
        id: Set(Uuid::now_v7()),
        user_id: Set(user_id),
        nombre: Set(body.nombre),
        precio: Set(body.precio),
        created_at: Set(Utc::now().naive_utc()),
    }
    .insert(db)
    .await
    .map_err(super::map_insert_err)
}

// ---------- GET /productos ----------

pub async fn list_productos(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<PaginatedResponse<ProductoResponse>>, ApiErr> {
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params.page_size.unwrap_or(20).min(100);

    let mut query = producto::Entity::find().filter(producto::Column::UserId.eq(claims.sub));

    if let Some(ref search) = params.search
        && !search.is_empty()
    {
        query = query.filter(producto::Column::Nombre.contains(search.as_str()));
    }

    let paginator = query
        .order_by_desc(producto::Column::CreatedAt)
        .paginate(&state.db, page_size);

    let total = paginator.num_items().await.map_err(ApiErr::internal)?;
    let productos = paginator
        .fetch_page(page - 1)
        .await
        .map_err(ApiErr::internal)?;

    Ok(Json(PaginatedResponse {
        data: productos.into_iter().map(ProductoResponse::from).collect(),
        total,
        page,
        page_size,
    }))
}

// ---------- POST /productos ----------

pub async fn create_producto(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Json(body): Json<CreateProductoRequest>,
) -> Result<(StatusCode, Json<ProductoResponse>), ApiErr> {
    let model = insert(&state.db, claims.sub, body).await?;
    Ok((StatusCode::CREATED, Json(ProductoResponse::from(model))))
}

// ---------- GET /productos/{id} ----------

pub async fn get_producto(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductoResponse>, ApiErr> {
    let model = find_owned(&state.db, claims.sub, id).await?;
    Ok(Json(ProductoResponse::from(model)))
}

// ---------- PUT /productos/{id} ----------

pub async fn update_producto(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateProductoRequest>,
) -> Result<Json<ProductoResponse>, ApiErr> {
    let model = find_owned(&state.db, claims.sub, id).await?;

    let mut active: producto::ActiveModel = model.into();
    if let Some(nombre) = body.nombre {
        active.nombre = Set(nombre);
    }
    if let Some(precio) = body.precio {
        active.precio = Set(precio);
    }

    let updated = active.update(&state.db).await.map_err(ApiErr::internal)?;
    Ok(Json(ProductoResponse::from(updated)))
}

// ---------- DELETE /productos/{id} ----------

pub async fn delete_producto(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiErr> {
    let model = find_owned(&state.db, claims.sub, id).await?;

    let active: producto::ActiveModel = model.into();
    active.delete(&state.db).await.map_err(ApiErr::internal)?;

    Ok(StatusCode::NO_CONTENT)
}
