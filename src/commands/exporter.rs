// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::{
    categorias::load_categorias, gastos::load_gastos, tags::load_tags, tarjetas::load_tarjetas,
};
use crate::ledger::{CASH_LABEL, gastos_del_mes, installment_number, monthly_amount};
use crate::models::Gasto;
use crate::utils::parse_month;
use anyhow::{Result, anyhow};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("expenses", sub)) => {
            let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
            let out = sub.get_one::<String>("out").unwrap();
            let mes = match sub.get_one::<String>("month") {
                Some(m) => Some(parse_month(m)?),
                None => None,
            };
            let n = export_expenses(conn, &fmt, out, mes.as_deref())?;
            println!("Exported {} expenses to {}", n, out);
            Ok(())
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Serialize)]
pub struct ExportRow {
    pub id: i64,
    pub fecha: String,
    pub descripcion: String,
    pub monto: String,
    pub moneda: String,
    pub cuotas: u32,
    pub cuota: u32,
    pub monto_mensual: String,
    pub mes_facturacion: String,
    pub categoria: String,
    pub tarjeta: String,
    pub fijo: bool,
    pub pagado: bool,
    pub tags: String,
}

/// Build export rows. With `mes`, only the gastos billed that month, with the
/// installment number for that month.
pub fn export_rows(conn: &Connection, mes: Option<&str>) -> Result<Vec<ExportRow>> {
    let gastos = load_gastos(conn)?;
    let categorias: HashMap<i64, String> = load_categorias(conn)?
        .into_iter()
        .map(|c| (c.id, c.nombre))
        .collect();
    let tarjetas: HashMap<i64, String> = load_tarjetas(conn)?
        .into_iter()
        .map(|t| (t.id, t.nombre))
        .collect();
    let tags: HashMap<i64, String> = load_tags(conn)?
        .into_iter()
        .map(|t| (t.id, t.nombre))
        .collect();

    let mut selected: Vec<&Gasto> = match mes {
        Some(m) => gastos_del_mes(&gastos, m)?,
        None => gastos.iter().collect(),
    };
    selected.sort_by(|a, b| a.fecha.cmp(&b.fecha).then(a.id.cmp(&b.id)));

    let mut rows = Vec::with_capacity(selected.len());
    for g in selected {
        let cuota = match mes {
            Some(m) => installment_number(g, m)?,
            None => g.cuota_actual,
        };
        rows.push(ExportRow {
            id: g.id,
            fecha: g.fecha.to_string(),
            descripcion: g.descripcion.clone(),
            monto: g.monto.round_dp(2).to_string(),
            moneda: g.moneda.to_string(),
            cuotas: g.cuotas,
            cuota,
            monto_mensual: monthly_amount(g).round_dp(2).to_string(),
            mes_facturacion: g.mes_facturacion.clone(),
            categoria: g
                .categoria_id
                .and_then(|id| categorias.get(&id).cloned())
                .unwrap_or_default(),
            tarjeta: g
                .tarjeta_id
                .and_then(|id| tarjetas.get(&id).cloned())
                .unwrap_or_else(|| CASH_LABEL.to_string()),
            fijo: g.es_fijo,
            pagado: g.pagado,
            tags: g
                .tag_ids
                .iter()
                .filter_map(|id| tags.get(id).map(String::as_str))
                .collect::<Vec<_>>()
                .join(";"),
        });
    }
    Ok(rows)
}

pub fn export_expenses(conn: &Connection, fmt: &str, out: &str, mes: Option<&str>) -> Result<usize> {
    let rows = export_rows(conn, mes)?;
    match fmt {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            for row in &rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        }
        "json" => {
            std::fs::write(out, serde_json::to_string_pretty(&rows)?)?;
        }
        other => return Err(anyhow!("Unknown format: {} (use csv|json)", other)),
    }
    tracing::debug!(count = rows.len(), out, "exported expenses");
    Ok(rows.len())
}
