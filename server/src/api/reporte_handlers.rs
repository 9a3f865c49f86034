use axum::{
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Json},
};
use chrono::Utc;
use sea_orm::QueryOrder;

use crate::entity::registro;
use crate::export::{self, ReportSheet};
use crate::reports;

use super::{
    AppState, ApiErr, auth_handlers,
    dto::{ExportRequest, ReporteQuery, ReporteResponse, RegistroResponse},
    jwt::AuthClaims,
    registro_handlers,
};

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

// ---------- GET /reportes ----------

pub async fn get_reportes(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Query(params): Query<ReporteQuery>,
) -> Result<Json<ReporteResponse>, ApiErr> {
    let rows = registro_handlers::filtered(
        claims.sub,
        params.obra.as_deref(),
        params.fecha_inicio,
        params.fecha_fin,
    )
    .order_by_desc(registro::Column::Fecha)
    .order_by_desc(registro::Column::CreatedAt)
    .all(&state.db)
    .await
    .map_err(ApiErr::internal)?;

    let resumen = reports::aggregate(&rows);

    Ok(Json(ReporteResponse {
        totales: resumen.totales,
        por_obra: resumen.por_obra,
        por_fecha: resumen.por_fecha,
        registros: rows.into_iter().map(RegistroResponse::from).collect(),
    }))
}

// ---------- POST /reportes/export ----------

pub async fn export_reportes(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Json(body): Json<ExportRequest>,
) -> Result<impl IntoResponse, ApiErr> {
    if body.headers.is_empty() {
        return Err(ApiErr::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "headers must not be empty",
        ));
    }

    let user = auth_handlers::current_user(&state, &claims).await?;

    let sheet = ReportSheet {
        username: &user.username,
        title: body.title.as_deref().unwrap_or("Reporte"),
        date_range: body.date_range.as_deref().unwrap_or(""),
        headers: &body.headers,
        rows: &body.rows,
        currency_cols: &body.currency_cols,
        totals: body.totals.as_deref(),
    };

    let bytes = export::build_workbook(&sheet).map_err(ApiErr::internal)?;
    let filename = format!("reportes_{}.xlsx", Utc::now().format("%Y-%m-%d"));

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_MIME.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    ))
}
