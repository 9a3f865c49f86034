use axum::{extract::State, response::Json};

use super::{
    AppState, ApiErr, cliente_handlers,
    dto::{
        CreateClienteRequest, CreateObraRequest, CreateProductoRequest, CreateRegistroRequest,
        ImportBackupRequest, ImportBackupResponse, ImportCounts,
    },
    jwt::AuthClaims,
    obra_handlers, producto_handlers, registro_handlers,
};

// ---------- POST /import-backup ----------

/// Bulk-restore entities from an exported backup. Each item is inserted
/// independently; a malformed or rejected item is logged and skipped so one
/// bad row cannot sink the whole restore.
pub async fn import_backup(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Json(body): Json<ImportBackupRequest>,
) -> Result<Json<ImportBackupResponse>, ApiErr> {
    let mut counts = ImportCounts::default();

    for item in body.clientes {
        match serde_json::from_value::<CreateClienteRequest>(item) {
            Ok(req) => match cliente_handlers::insert(&state.db, claims.sub, req).await {
                Ok(_) => counts.clientes += 1,
                Err(_) => tracing::warn!("skipping cliente rejected by store"),
            },
            Err(e) => tracing::warn!(error = %e, "skipping malformed cliente"),
        }
    }

    for item in body.obras {
        match serde_json::from_value::<CreateObraRequest>(item) {
            Ok(req) => match obra_handlers::insert(&state.db, claims.sub, req).await {
                Ok(_) => counts.obras += 1,
                Err(_) => tracing::warn!("skipping obra rejected by store"),
            },
            Err(e) => tracing::warn!(error = %e, "skipping malformed obra"),
        }
    }

    for item in body.productos {
        match serde_json::from_value::<CreateProductoRequest>(item) {
            Ok(req) => match producto_handlers::insert(&state.db, claims.sub, req).await {
                Ok(_) => counts.productos += 1,
                Err(_) => tracing::warn!("skipping producto rejected by store"),
            },
            Err(e) => tracing::warn!(error = %e, "skipping malformed producto"),
        }
    }

    for item in body.registros {
        match serde_json::from_value::<CreateRegistroRequest>(item) {
            Ok(req) => match registro_handlers::insert(&state.db, claims.sub, req).await {
                Ok(_) => counts.registros += 1,
                Err(_) => tracing::warn!("skipping registro rejected by store"),
            },
            Err(e) => tracing::warn!(error = %e, "skipping malformed registro"),
        }
    }

    tracing::info!(
        clientes = counts.clientes,
        obras = counts.obras,
        productos = counts.productos,
        registros = counts.registros,
        "backup import finished"
    );

    Ok(Json(ImportBackupResponse { imported: counts }))
}
