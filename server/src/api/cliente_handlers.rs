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

use crate::entity::cliente;

use super::{
    AppState, ApiErr,
    dto::{
        ClienteResponse, CreateClienteRequest, ListQuery, PaginatedResponse, UpdateClienteRequest,
    },
    jwt::AuthClaims,
};

async fn find_owned(
    db: &DatabaseConnection,
    user_id: Uuid,
    id: Uuid,
) -> Result<cliente::Model, ApiErr> {
    cliente::Entity::find_by_id(id)
        .filter(cliente::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(ApiErr::internal)?
        .ok_or_else(|| ApiErr::not_found("Cliente not found"))
}

/// Shared by the create handler and the bulk import endpoint.
pub(super) async fn insert(
    db: &DatabaseConnection,
    user_id: Uuid,
    body: CreateClienteRequest,
) -> Result<cliente::Model, ApiErr> {
    cliente::ActiveModel {
        id: Set(Uuid::now_v7()),
        user_id: Set(user_id),
        nombre: Set(body.nombre),
        cedula: Set(body.cedula),
        obra: Set(body.obra),
        estado: Set(body.estado.unwrap_or_else(|| "activo".to_string())),
        fecha: Set(body.fecha),
        created_at: Set(Utc::now().naive_utc()),
    }
    .insert(db)
    .await
    .map_err(super::map_insert_err)
}

// ---------- GET /clientes ----------

pub async fn list_clientes(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<PaginatedResponse<ClienteResponse>>, ApiErr> {
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params.page_size.unwrap_or(20).min(100);

    let mut query = cliente::Entity::find().filter(cliente::Column::UserId.eq(claims.sub));

    if let Some(ref search) = params.search
        && !search.is_empty()
    {
        query = query.filter(cliente::Column::Nombre.contains(search.as_str()));
    }

    let paginator = query
        .order_by_desc(cliente::Column::CreatedAt)
        .paginate(&state.db, page_size);

    let total = paginator.num_items().await.map_err(ApiErr::internal)?;
    let clientes = paginator
        .fetch_page(page - 1)
        .await
        .map_err(ApiErr::internal)?;

    Ok(Json(PaginatedResponse {
        data: clientes.into_iter().map(ClienteResponse::from).collect(),
        total,
        page,
        page_size,
    }))
}

// ---------- POST /clientes ----------

pub async fn create_cliente(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Json(body): Json<CreateClienteRequest>,
) -> Result<(StatusCode, Json<ClienteResponse>), ApiErr> {
    let model = insert(&state.db, claims.sub, body).await?;
    Ok((StatusCode::CREATED, Json(ClienteResponse::from(model))))
}

// ---------- GET /clientes/{id} ----------

pub async fn get_cliente(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClienteResponse>, ApiErr> {
    let model = find_owned(&state.db, claims.sub, id).await?;
    Ok(Json(ClienteResponse::from(model)))
}

// ---------- PUT /clientes/{id} ----------

pub async fn update_cliente(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateClienteRequest>,
) -> Result<Json<ClienteResponse>, ApiErr> {
    let model = find_owned(&state.db, claims.sub, id).await?;

    let mut active: cliente::ActiveModel = model.into();
    if let Some(nombre) = body.nombre {
        active.nombre = Set(nombre);
    }
    if let Some(cedula) = body.cedula {
        active.cedula = Set(Some(cedula));
    }
    if let Some(obra) = body.obra {
        active.obra = Set(Some(obra));
    }
    if let Some(estado) = body.estado {
        active.estado = Set(estado);
    }
    if let Some(fecha) = body.fecha {
        active.fecha = Set(Some(fecha));
    }

    let updated = active.update(&state.db).await.map_err(ApiErr::internal)?;
    Ok(Json(ClienteResponse::from(updated)))
}

// ---------- DELETE /clientes/{id} ----------

pub async fn delete_cliente(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiErr> {
    let model = find_owned(&state.db, claims.sub, id).await?;

    let active: cliente::ActiveModel = model.into();
    active.delete(&state.db).await.map_err(ApiErr::internal)?;

    Ok(StatusCode::NO_CONTENT)
}
