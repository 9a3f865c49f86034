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

use crate::entity::obra;

use super::{
    AppState, ApiErr,
    dto::{CreateObraRequest, ListQuery, ObraResponse, PaginatedResponse, UpdateObraRequest},
    jwt::AuthClaims,
};

async fn find_owned(db: &DatabaseConnection, user_id: Uuid, id: Uuid) -> Result<obra::Model, ApiErr> {
    obra::Entity::find_by_id(id)
        .filter(obra::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(ApiErr::internal)?
        .ok_or_else(|| ApiErr::not_found("Obra not found"))
}

/// Shared by the create handler and the bulk import endpoint.
pub(super) async fn insert(
    db: &DatabaseConnection,
    user_id: Uuid,
    body: CreateObraRequest,
) -> Result<obra::Model, ApiErr> {
    obra::ActiveModel {
        id: Set(Uuid::now_v7()),
        user_id: Set(user_id),
        nombre: Set(body.nombre),
        ubicacion: Set(body.ubicacion),
        estado: Set(body.estado.unwrap_or_else(|| "activa".to_string())),
        created_at: Set(Utc::now().naive_utc()),
    }
    .insert(db)
    .await
    .map_err(super::map_insert_err)
}

// ---------- GET /obras ----------

pub async fn list_obras(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<PaginatedResponse<ObraResponse>>, ApiErr> {
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params.page_size.unwrap_or(20).min(100);

    let mut query = obra::Entity::find().filter(obra::Column::UserId.eq(claims.sub));

    if let Some(ref search) = params.search
        && !search.is_empty()
    {
        query = query.filter(obra::Column::Nombre.contains(search.as_str()));
    }

    let paginator = query
        .order_by_desc(obra::Column::CreatedAt)
        .paginate(&state.db, page_size);

    let total = paginator.num_items().await.map_err(ApiErr::internal)?;
    let obras = paginator
        .fetch_page(page - 1)
        .await
        .map_err(ApiErr::internal)?;

    Ok(Json(PaginatedResponse {
        data: obras.into_iter().map(ObraResponse::from).collect(),
        total,
        page,
        page_size,
    }))
}

// ---------- POST /obras ----------

pub async fn create_obra(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Json(body): Json<CreateObraRequest>,
) -> Result<(StatusCode, Json<ObraResponse>), ApiErr> {
    let model = insert(&state.db, claims.sub, body).await?;
    Ok((StatusCode::CREATED, Json(ObraResponse::from(model))))
}

// ---------- GET /obras/{id} ----------

pub async fn get_obra(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ObraResponse>, ApiErr> {
    let model = find_owned(&state.db, claims.sub, id).await?;
    Ok(Json(ObraResponse::from(model)))
}

// ---------- PUT /obras/{id} ----------

pub async fn update_obra(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateObraRequest>,
) -> Result<Json<ObraResponse>, ApiErr> {
    let model = find_owned(&state.db, claims.sub, id).await?;

    let mut active: obra::ActiveModel = model.into();
    if let Some(nombre) = body.nombre {
        active.nombre = Set(nombre);
    }
    if let Some(ubicacion) = body.ubicacion {
        active.ubicacion = Set(Some(ubicacion));
    }
    if let Some(estado) = body.estado {
        active.estado = Set(estado);
    }

    let updated = active.update(&state.db).await.map_err(ApiErr::internal)?;
    Ok(Json(ObraResponse::from(updated)))
}

// ---------- DELETE /obras/{id} ----------

pub async fn delete_obra(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiErr> {
    let model = find_owned(&state.db, claims.sub, id).await?;

    let active: obra::ActiveModel = model.into();
    active.delete(&state.db).await.map_err(ApiErr::internal)?;

    Ok(StatusCode::NO_CONTENT)
}
