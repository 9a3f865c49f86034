use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::entity::{cliente, obra, producto, registro, user};

// ---------- auth requests ----------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    /// ISO date, validated in the handler so the caller gets a clear 400.
    pub birthdate: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUsernameRequest {
    pub new_username: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteAccountRequest {
    pub password: String,
}

// ---------- auth responses ----------

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, Clone)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub birthdate: NaiveDate,
    pub created_at: NaiveDateTime,
}

impl From<user::Model> for UserResponse {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            email: m.email,
            username: m.username,
            birthdate: m.birthdate,
            created_at: m.created_at,
        }
    }
}

// ---------- list queries ----------

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegistroListQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub obra: Option<String>,
    pub fecha_inicio: Option<NaiveDate>,
    pub fecha_fin: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ReporteQuery {
    pub obra: Option<String>,
    pub fecha_inicio: Option<NaiveDate>,
    pub fecha_fin: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

// ---------- obra ----------

#[derive(Debug, Deserialize)]
pub struct CreateObraRequest {
    pub nombre: String,
    pub ubicacion: Option<String>,
    pub estado: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateObraRequest {
    pub nombre: Option<String>,
    pub ubicacion: Option<String>,
    pub estado: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ObraResponse {
    pub id: Uuid,
    pub nombre: String,
    pub ubicacion: Option<String>,
    pub estado: String,
    pub created_at: NaiveDateTime,
}

impl From<obra::Model> for ObraResponse {
    fn from(m: obra::Model) -> Self {
        Self {
            id: m.id,
            nombre: m.nombre,
            ubicacion: m.ubicacion,
            estado: m.estado,
            created_at: m.created_at,
        }
    }
}

// ---------- cliente ----------

#[derive(Debug, Deserialize)]
pub struct CreateClienteRequest {
    pub nombre: String,
    pub cedula: Option<String>,
    pub obra: Option<String>,
    pub estado: Option<String>,
    pub fecha: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateClienteRequest {
    pub nombre: Option<String>,
    pub cedula: Option<String>,
    pub obra: Option<String>,
    pub estado: Option<String>,
    pub fecha: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct ClienteResponse {
    pub id: Uuid,
    pub nombre: String,
    pub cedula: Option<String>,
    pub obra: Option<String>,
    pub estado: String,
    pub fecha: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
}

impl From<cliente::Model> for ClienteResponse {
    fn from(m: cliente::Model) -> Self {
        Self {
            id: m.id,
            nombre: m.nombre,
            cedula: m.cedula,
            obra: m.obra,
            estado: m.estado,
            fecha: m.fecha,
            created_at: m.created_at,
        }
    }
}

// ---------- producto ----------

#[derive(Debug, Deserialize)]
pub struct CreateProductoRequest {
    pub nombre: String,
    #[serde(default)]
    pub precio: f64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductoRequest {
    pub nombre: Option<String>,
    pub precio: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ProductoResponse {
    pub id: Uuid,
    pub nombre: String,
    pub precio: f64,
    pub created_at: NaiveDateTime,
}

impl From<producto::Model> for ProductoResponse {
    fn from(m: producto::Model) -> Self {
        Self {
            id: m.id,
            nombre: m.nombre,
            precio: m.precio,
            created_at: m.created_at,
        }
    }
}

// ---------- registro ----------

#[derive(Debug, Deserialize)]
pub struct CreateRegistroRequest {
    pub fecha: Option<NaiveDate>,
    pub obra: Option<String>,
    #[serde(default, rename = "totalCantidad")]
    pub total_cantidad: i32,
    #[serde(default, rename = "totalCobrar")]
    pub total_cobrar: f64,
    #[serde(default, rename = "totalPagado")]
    pub total_pagado: f64,
    pub status: Option<String>,
    #[serde(rename = "clientesAdicionales")]
    pub clientes_adicionales: Option<Value>,
    pub detalles: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRegistroRequest {
    pub fecha: Option<NaiveDate>,
    pub obra: Option<String>,
    #[serde(rename = "totalCantidad")]
    pub total_cantidad: Option<i32>,
    #[serde(rename = "totalCobrar")]
    pub total_cobrar: Option<f64>,
    #[serde(rename = "totalPagado")]
    pub total_pagado: Option<f64>,
    pub status: Option<String>,
    #[serde(rename = "clientesAdicionales")]
    pub clientes_adicionales: Option<Value>,
    pub detalles: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct RegistroResponse {
    pub id: Uuid,
    pub fecha: Option<NaiveDate>,
    pub obra: Option<String>,
    #[serde(rename = "totalCantidad")]
    pub total_cantidad: i32,
    #[serde(rename = "totalCobrar")]
    pub total_cobrar: f64,
    #[serde(rename = "totalPagado")]
    pub total_pagado: f64,
    pub status: String,
    /// Always a JSON array; an absent or corrupt stored blob coalesces to `[]`.
    #[serde(rename = "clientesAdicionales")]
    pub clientes_adicionales: Value,
    pub detalles: Value,
    pub created_at: NaiveDateTime,
}

/// Decode a stored JSON blob, falling back to an empty array.
fn stored_items(raw: Option<&str>) -> Value {
    raw.and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_else(|| Value::Array(Vec::new()))
}

impl From<registro::Model> for RegistroResponse {
    fn from(m: registro::Model) -> Self {
        Self {
            id: m.id,
            fecha: m.fecha,
            obra: m.obra,
            total_cantidad: m.total_cantidad,
            total_cobrar: m.total_cobrar,
            total_pagado: m.total_pagado,
            status: m.status,
            clientes_adicionales: stored_items(m.clientes_adicionales.as_deref()),
            detalles: stored_items(m.detalles.as_deref()),
            created_at: m.created_at,
        }
    }
}

// ---------- reportes ----------

#[derive(Debug, Serialize)]
pub struct ReporteResponse {
    pub totales: crate::reports::Totales,
    #[serde(rename = "porObra")]
    pub por_obra: std::collections::BTreeMap<String, crate::reports::Bucket>,
    #[serde(rename = "porFecha")]
    pub por_fecha: std::collections::BTreeMap<String, crate::reports::Bucket>,
    pub registros: Vec<RegistroResponse>,
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub title: Option<String>,
    pub date_range: Option<String>,
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
    #[serde(default)]
    pub currency_cols: Vec<usize>,
    pub totals: Option<Vec<Value>>,
}

// ---------- bulk import ----------

#[derive(Debug, Deserialize)]
pub struct ImportBackupRequest {
    #[serde(default)]
    pub clientes: Vec<Value>,
    #[serde(default)]
    pub obras: Vec<Value>,
    #[serde(default)]
    pub productos: Vec<Value>,
    #[serde(default)]
    pub registros: Vec<Value>,
}

#[derive(Debug, Default, Serialize)]
pub struct ImportCounts {
    pub clientes: usize,
    pub obras: usize,
    pub productos: usize,
    pub registros: usize,
}

#[derive(Debug, Serialize)]
pub struct ImportBackupResponse {
    pub imported: ImportCounts,
}
