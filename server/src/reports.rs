//! Billing aggregates over registros.
//!
//! A single pass over an already-filtered row set produces the grand totals
//! plus the same sums grouped by obra and by fecha. Rows without an obra or
//! fecha are grouped under the `"Sin obra"` / `"Sin fecha"` buckets.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::entity::registro;

pub const SIN_OBRA: &str = "Sin obra";
pub const SIN_FECHA: &str = "Sin fecha";

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct Totales {
    #[serde(rename = "totalCobrar")]
    pub total_cobrar: f64,
    #[serde(rename = "totalCobrado")]
    pub total_cobrado: f64,
    #[serde(rename = "totalPendiente")]
    pub total_pendiente: f64,
    #[serde(rename = "totalCantidad")]
    pub total_cantidad: i64,
    #[serde(rename = "totalRegistros")]
    pub total_registros: usize,
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct Bucket {
    #[serde(rename = "totalCobrar")]
    pub total_cobrar: f64,
    #[serde(rename = "totalCobrado")]
    pub total_cobrado: f64,
    #[serde(rename = "totalPendiente")]
    pub total_pendiente: f64,
    #[serde(rename = "totalCantidad")]
    pub total_cantidad: i64,
}

impl Bucket {
    fn add(&mut self, row: &registro::Model) {
        self.total_cobrar += row.total_cobrar;
        self.total_cobrado += row.total_pagado;
        self.total_pendiente += row.total_cobrar - row.total_pagado;
        self.total_cantidad += i64::from(row.total_cantidad);
    }
}

#[derive(Debug, Default, Serialize)]
pub struct Resumen {
    pub totales: Totales,
    #[serde(rename = "porObra")]
    pub por_obra: BTreeMap<String, Bucket>,
    #[serde(rename = "porFecha")]
    pub por_fecha: BTreeMap<String, Bucket>,
}

pub fn aggregate(registros: &[registro::Model]) -> Resumen {
    let mut resumen = Resumen {
        totales: Totales {
            total_registros: registros.len(),
            ..Totales::default()
        },
        ..Resumen::default()
    };

    for row in registros {
        resumen.totales.total_cobrar += row.total_cobrar;
        resumen.totales.total_cobrado += row.total_pagado;
        resumen.totales.total_cantidad += i64::from(row.total_cantidad);

        let obra_key = row.obra.clone().unwrap_or_else(|| SIN_OBRA.to_string());
        resumen.por_obra.entry(obra_key).or_default().add(row);

        let fecha_key = row
            .fecha
            .map(|f| f.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| SIN_FECHA.to_string());
        resumen.por_fecha.entry(fecha_key).or_default().add(row);
    }

    resumen.totales.total_pendiente = resumen.totales.total_cobrar - resumen.totales.total_cobrado;
    resumen
}
