// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::tarjetas::load_tarjetas;
use crate::ledger::{impuestos_del_mes, sum_impuestos};
use crate::models::{GastosError, Impuesto, Moneda, validate_positive};
use crate::utils::{
    fmt_money, id_for_tarjeta, maybe_print_json, month_arg, month_name, parse_decimal,
    parse_month, pretty_table,
};
use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use std::collections::HashMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("edit", sub)) => edit(conn, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let n = conn.execute("DELETE FROM impuestos WHERE id=?1", params![id])?;
            if n == 0 {
                return Err(anyhow!("Tax {} not found", id));
            }
            println!("Removed tax {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let descripcion = sub.get_one::<String>("desc").unwrap().trim().to_string();
    if descripcion.is_empty() {
        return Err(GastosError::MissingField("description").into());
    }
    let monto = validate_positive(parse_decimal(sub.get_one::<String>("amount").unwrap())?)?;
    let mes = month_arg(conn, sub)?;
    let tarjeta_id = sub
        .get_one::<String>("card")
        .map(|c| id_for_tarjeta(conn, c))
        .transpose()?;
    conn.execute(
        "INSERT INTO impuestos(tarjeta_id, descripcion, monto, mes) VALUES (?1, ?2, ?3, ?4)",
        params![tarjeta_id, descripcion, monto.to_string(), mes],
    )?;
    println!(
        "Recorded tax '{}' {} for {}",
        descripcion,
        fmt_money(&monto, Moneda::Ars),
        mes
    );
    Ok(())
}

fn edit(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let mut imp = load_impuestos(conn)?
        .into_iter()
        .find(|i| i.id == id)
        .with_context(|| format!("Tax {} not found", id))?;
    if let Some(d) = sub.get_one::<String>("desc") {
        let d = d.trim();
        if d.is_empty() {
            return Err(GastosError::MissingField("description").into());
        }
        imp.descripcion = d.to_string();
    }
    if let Some(a) = sub.get_one::<String>("amount") {
        imp.monto = validate_positive(parse_decimal(a)?)?;
    }
    if let Some(m) = sub.get_one::<String>("month") {
        imp.mes = parse_month(m)?;
    }
    if let Some(c) = sub.get_one::<String>("card") {
        imp.tarjeta_id = Some(id_for_tarjeta(conn, c)?);
    }
    if sub.get_flag("no_card") {
        imp.tarjeta_id = None;
    }
    conn.execute(
        "UPDATE impuestos SET tarjeta_id=?1, descripcion=?2, monto=?3, mes=?4 WHERE id=?5",
        params![imp.tarjeta_id, imp.descripcion, imp.monto.to_string(), imp.mes, id],
    )?;
    println!("Updated tax {} '{}'", id, imp.descripcion);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let mes = month_arg(conn, sub)?;
    let all = load_impuestos(conn)?;
    let del_mes = impuestos_del_mes(&all, &mes);
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &del_mes)? {
        return Ok(());
    }
    let tarjetas: HashMap<i64, String> = load_tarjetas(conn)?
        .into_iter()
        .map(|t| (t.id, t.nombre))
        .collect();
    let total: Decimal = sum_impuestos(&del_mes);
    let rows = del_mes
        .iter()
        .map(|i| {
            vec![
                i.id.to_string(),
                i.descripcion.clone(),
                i.tarjeta_id
                    .and_then(|id| tarjetas.get(&id).cloned())
                    .unwrap_or_default(),
                format!("{:.2}", i.monto),
            ]
        })
        .collect();
    println!("Taxes · {}", month_name(&mes)?);
    println!(
        "{}",
        pretty_table(&["ID", "Description", "Card", "Amount (ARS)"], rows)
    );
    println!("Total: {}", fmt_money(&total, Moneda::Ars));
    Ok(())
}

/// Newest first.
pub fn load_impuestos(conn: &Connection) -> Result<Vec<Impuesto>> {
    let mut stmt = conn.prepare(
        "SELECT id, tarjeta_id, descripcion, monto, mes FROM impuestos ORDER BY created_at DESC, id DESC",
    )?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        let id: i64 = r.get(0)?;
        let monto: String = r.get(3)?;
        out.push(Impuesto {
            id,
            tarjeta_id: r.get(1)?,
            descripcion: r.get(2)?,
            monto: monto
                .parse::<Decimal>()
                .with_context(|| format!("Invalid amount '{}' in tax {}", monto, id))?,
            mes: r.get(4)?,
        });
    }
    Ok(out)
}
