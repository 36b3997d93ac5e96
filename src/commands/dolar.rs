// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{
    DOLAR_FALLBACK, get_setting, http_client, parse_decimal, pretty_table, set_setting, today,
};
use anyhow::{Result, anyhow};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Deserialize;

const DOLAR_URL: &str = "https://dolarapi.com/v1/dolares/oficial";

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("fetch", _)) => {
            let rate = fetch_rate(conn)?;
            println!("Official dolar (sell): {:.2}", rate);
        }
        Some(("set", sub)) => {
            let rate = parse_decimal(sub.get_one::<String>("rate").unwrap())?;
            store_rate(conn, rate, "manual")?;
            println!("Dolar set to {:.2}", rate);
        }
        Some(("show", _)) => show(conn)?,
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct DolarQuote {
    #[serde(default)]
    compra: Option<Decimal>,
    venta: Option<Decimal>,
    #[serde(rename = "fechaActualizacion", default)]
    fecha_actualizacion: Option<String>,
}

pub fn store_rate(conn: &Connection, rate: Decimal, source: &str) -> Result<()> {
    if rate <= Decimal::ZERO {
        return Err(anyhow!("Dolar rate must be positive, got {}", rate));
    }
    set_setting(conn, "dolar_venta", &rate.to_string())?;
    set_setting(conn, "dolar_fecha", &today().to_string())?;
    set_setting(conn, "dolar_fuente", source)?;
    Ok(())
}

/// Fetch the official selling rate and cache it.
///
/// Network or parse failures keep whatever rate was cached before (or the
/// fallback) and are only logged.
fn fetch_rate(conn: &Connection) -> Result<Decimal> {
    match request_quote() {
        Ok(q) => match q.venta.filter(|v| *v > Decimal::ZERO) {
            Some(venta) => {
                tracing::info!(%venta, compra = ?q.compra, updated = ?q.fecha_actualizacion, "fetched dolar quote");
                store_rate(conn, venta, "dolarapi")?;
                Ok(venta)
            }
            None => {
                tracing::warn!("dolar quote without a selling price");
                cached_or_fallback(conn)
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "dolar fetch failed");
            cached_or_fallback(conn)
        }
    }
}

fn request_quote() -> Result<DolarQuote> {
    let client = http_client()?;
    let resp = client.get(DOLAR_URL).send()?.error_for_status()?;
    Ok(resp.json()?)
}

fn cached_or_fallback(conn: &Connection) -> Result<Decimal> {
    match get_setting(conn, "dolar_venta")? {
        Some(s) => parse_decimal(&s),
        None => Ok(DOLAR_FALLBACK),
    }
}

fn show(conn: &Connection) -> Result<()> {
    let rate = get_setting(conn, "dolar_venta")?;
    let rows = match rate {
        Some(r) => vec![vec![
            r,
            get_setting(conn, "dolar_fecha")?.unwrap_or_default(),
            get_setting(conn, "dolar_fuente")?.unwrap_or_default(),
        ]],
        None => vec![vec![
            DOLAR_FALLBACK.to_string(),
            String::new(),
            "fallback".to_string(),
        ]],
    };
    println!("{}", pretty_table(&["Sell", "Date", "Source"], rows));
    Ok(())
}
