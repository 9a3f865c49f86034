use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Select, Set,
};
use serde_json::Value;
use uuid::Uuid;

use crate::entity::registro;

use super::{
    AppState, ApiErr,
    dto::{
        CreateRegistroRequest, PaginatedResponse, RegistroListQuery, RegistroResponse,
        UpdateRegistroRequest,
    },
    jwt::AuthClaims,
};

const STATUSES: [&str; 3] = ["pendiente", "parcial", "pagado"];

fn validate_status(status: &str) -> Result<(), ApiErr> {
    if !STATUSES.contains(&status) {
        return Err(ApiErr::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Invalid status: {status}"),
        ));
    }
    Ok(())
}

/// Serialize a line-item array for storage. Absent, null or empty input is
/// stored as NULL; anything that is not an array is rejected.
fn encode_items(value: Option<&Value>) -> Result<Option<String>, ApiErr> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v @ Value::Array(items)) => {
            if items.is_empty() {
                Ok(None)
            } else {
                Ok(Some(serde_json::to_string(v).map_err(ApiErr::internal)?))
            }
        }
        Some(_) => Err(ApiErr::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "clientesAdicionales and detalles must be JSON arrays",
        )),
    }
}

/// Base query for a user's registros with the optional obra / date-range
/// filters. Also used by the reportes endpoint so both see the same rows.
pub(super) fn filtered(
    user_id: Uuid,
    obra: Option<&str>,
    fecha_inicio: Option<NaiveDate>,
    fecha_fin: Option<NaiveDate>,
) -> Select<registro::Entity> {
    let mut query = registro::Entity::find().filter(registro::Column::UserId.eq(user_id));

    if let Some(obra) = obra
        && !obra.is_empty()
    {
        query = query.filter(registro::Column::Obra.eq(obra));
    }
    if let Some(desde) = fecha_inicio {
        query = query.filter(registro::Column::Fecha.gte(desde));
    }
    if let Some(hasta) = fecha_fin {
        query = query.filter(registro::Column::Fecha.lte(hasta));
    }

    query
}

async fn find_owned(
    db: &DatabaseConnection,
    user_id: Uuid,
    id: Uuid,
) -> Result<registro::Model, ApiErr> {
    registro::Entity::find_by_id(id)
        .filter(registro::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(ApiErr::internal)?
        .ok_or_else(|| ApiErr::not_found("Registro not found"))
}

/// Shared by the create handler and the bulk import endpoint.
pub(super) async fn insert(
    db: &DatabaseConnection,
    user_id: Uuid,
    body: CreateRegistroRequest,
) -> Result<registro::Model, ApiErr> {
    let status = body.status.unwrap_or_else(|| "pendiente".to_string());
    validate_status(&status)?;

    registro::ActiveModel {
        id: Set(Uuid::now_v7()),
        user_id: Set(user_id),
        fecha: Set(body.fecha),
        obra: Set(body.obra),
        total_cantidad: Set(body.total_cantidad),
        total_cobrar: Set(body.total_cobrar),
        total_pagado: Set(body.total_pagado),
        status: Set(status),
        clientes_adicionales: Set(encode_items(body.clientes_adicionales.as_ref())?),
        detalles: Set(encode_items(body.detalles.as_ref())?),
        created_at: Set(Utc::now().naive_utc()),
    }
    .insert(db)
    .await
    .map_err(super::map_insert_err)
}

// ---------- GET /registros ----------

pub async fn list_registros(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Query(params): Query<RegistroListQuery>,
) -> Result<Json<PaginatedResponse<RegistroResponse>>, ApiErr> {
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params.page_size.unwrap_or(20).min(100);

    let paginator = filtered(
        claims.sub,
        params.obra.as_deref(),
        params.fecha_inicio,
        params.fecha_fin,
    )
    .order_by_desc(registro::Column::Fecha)
    .order_by_desc(registro::Column::CreatedAt)
    .paginate(&state.db, page_size);

    let total = paginator.num_items().await.map_err(ApiErr::internal)?;
    let registros = paginator
        .fetch_page(page - 1)
        .await
        .map_err(ApiErr::internal)?;

    Ok(Json(PaginatedResponse {
        data: registros.into_iter().map(RegistroResponse::from).collect(),
        total,
        page,
        page_size,
    }))
}

// ---------- POST /registros ----------

pub async fn create_registro(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Json(body): Json<CreateRegistroRequest>,
) -> Result<(StatusCode, Json<RegistroResponse>), ApiErr> {
    let model = insert(&state.db, claims.sub, body).await?;
    Ok((StatusCode::CREATED, Json(RegistroResponse::from(model))))
}

// ---------- GET /registros/{id} ----------

pub async fn get_registro(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RegistroResponse>, ApiErr> {
    let model = find_owned(&state.db, claims.sub, id).await?;
    Ok(Json(RegistroResponse::from(model)))
}

// ---------- PUT /registros/{id} ----------

pub async fn update_registro(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateRegistroRequest>,
) -> Result<Json<RegistroResponse>, ApiErr> {
    let model = find_owned(&state.db, claims.sub, id).await?;

    let mut active: registro::ActiveModel = model.into();
    if let Some(fecha) = body.fecha {
        active.fecha = Set(Some(fecha));
    }
    if let Some(obra) = body.obra {
        active.obra = Set(Some(obra));
    }
    if let Some(total_cantidad) = body.total_cantidad {
        active.total_cantidad = Set(total_cantidad);
    }
    if let Some(total_cobrar) = body.total_cobrar {
        active.total_cobrar = Set(total_cobrar);
    }
    if let Some(total_pagado) = body.total_pagado {
        active.total_pagado = Set(total_pagado);
    }
    if let Some(status) = body.status {
        validate_status(&status)?;
        active.status = Set(status);
    }
    if let Some(ref clientes_adicionales) = body.clientes_adicionales {
        active.clientes_adicionales = Set(encode_items(Some(clientes_adicionales))?);
    }
    if let Some(ref detalles) = body.detalles {
        active.detalles = Set(encode_items(Some(detalles))?);
    }

    let updated = active.update(&state.db).await.map_err(ApiErr::internal)?;
    Ok(Json(RegistroResponse::from(updated)))
}

// ---------- DELETE /registros/{id} ----------

pub async fn delete_registro(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiErr> {
    let model = find_owned(&state.db, claims.sub, id).await?;

    let active: registro::ActiveModel = model.into();
    active.delete(&state.db).await.map_err(ApiErr::internal)?;

    Ok(StatusCode::NO_CONTENT)
}
