// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::meta_percent;
use crate::models::{GastosError, Meta, Moneda, validate_positive};
use crate::utils::{fmt_money, maybe_print_json, parse_decimal, pretty_table};
use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("edit", sub)) => edit(conn, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let n = conn.execute("DELETE FROM metas WHERE id=?1", params![id])?;
            if n == 0 {
                return Err(anyhow!("Goal {} not found", id));
            }
            println!("Removed goal {}", id);
        }
        Some(("contribute", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
            let meta = contribute(conn, id, amount)?;
            println!(
                "{} {}: {} / {} ({:.0}%)",
                meta.icono,
                meta.nombre,
                fmt_money(&meta.progreso, meta.moneda),
                fmt_money(&meta.objetivo, meta.moneda),
                meta_percent(&meta)
            );
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let nombre = sub.get_one::<String>("name").unwrap().trim().to_string();
    if nombre.is_empty() {
        return Err(GastosError::MissingField("goal name").into());
    }
    let objetivo = validate_positive(parse_decimal(sub.get_one::<String>("target").unwrap())?)?;
    let icono = sub.get_one::<String>("icon").unwrap().trim().to_string();
    let moneda: Moneda = sub.get_one::<String>("currency").unwrap().parse()?;
    let progreso = parse_decimal(sub.get_one::<String>("progress").unwrap())?.max(Decimal::ZERO);
    conn.execute(
        "INSERT INTO metas(nombre, icono, objetivo, progreso, moneda, completada) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            nombre,
            icono,
            objetivo.to_string(),
            progreso.to_string(),
            moneda.as_str(),
            progreso >= objetivo
        ],
    )?;
    println!(
        "Added goal {} {} ({})",
        icono,
        nombre,
        fmt_money(&objetivo, moneda)
    );
    Ok(())
}

fn edit(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let mut meta = load_meta(conn, id)?;
    if let Some(n) = sub.get_one::<String>("name") {
        let n = n.trim();
        if n.is_empty() {
            return Err(GastosError::MissingField("goal name").into());
        }
        meta.nombre = n.to_string();
    }
    if let Some(t) = sub.get_one::<String>("target") {
        meta.objetivo = validate_positive(parse_decimal(t)?)?;
    }
    if let Some(i) = sub.get_one::<String>("icon") {
        meta.icono = i.trim().to_string();
    }
    if let Some(c) = sub.get_one::<String>("currency") {
        meta.moneda = c.parse()?;
    }
    if let Some(p) = sub.get_one::<String>("progress") {
        meta.progreso = parse_decimal(p)?.max(Decimal::ZERO);
    }
    // Editing never un-completes a goal.
    meta.completada = meta.completada || meta.progreso >= meta.objetivo;
    save_meta(conn, &meta)?;
    println!("Updated goal {} '{}'", id, meta.nombre);
    Ok(())
}

/// Add `amount` to a goal's progress, completing it once the target is met.
pub fn contribute(conn: &Connection, id: i64, amount: Decimal) -> Result<Meta> {
    let amount = validate_positive(amount)?;
    let mut meta = load_meta(conn, id)?;
    meta.progreso += amount;
    if meta.progreso >= meta.objetivo && !meta.completada {
        meta.completada = true;
        tracing::info!(id, "goal completed");
        println!("🎉 Congratulations! Goal '{}' reached", meta.nombre);
    }
    save_meta(conn, &meta)?;
    Ok(meta)
}

fn save_meta(conn: &Connection, meta: &Meta) -> Result<()> {
    conn.execute(
        "UPDATE metas SET nombre=?1, icono=?2, objetivo=?3, progreso=?4, moneda=?5, completada=?6 WHERE id=?7",
        params![
            meta.nombre,
            meta.icono,
            meta.objetivo.to_string(),
            meta.progreso.to_string(),
            meta.moneda.as_str(),
            meta.completada,
            meta.id
        ],
    )?;
    Ok(())
}

#[derive(Serialize)]
struct MetaRow<'a> {
    #[serde(flatten)]
    meta: &'a Meta,
    pct: Decimal,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let metas = load_metas(conn)?;
    let data: Vec<MetaRow> = metas
        .iter()
        .map(|m| MetaRow {
            meta: m,
            pct: meta_percent(m).round_dp(2),
        })
        .collect();
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        return Ok(());
    }
    let rows = data
        .iter()
        .map(|r| {
            vec![
                r.meta.id.to_string(),
                format!("{} {}", r.meta.icono, r.meta.nombre),
                fmt_money(&r.meta.progreso, r.meta.moneda),
                fmt_money(&r.meta.objetivo, r.meta.moneda),
                format!("{:.0}%", r.pct),
                if r.meta.completada {
                    "🎉".to_string()
                } else {
                    String::new()
                },
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["ID", "Goal", "Saved", "Target", "Progress", "Done"], rows)
    );
    Ok(())
}

fn meta_from_row(r: &rusqlite::Row<'_>) -> Result<Meta> {
    let id: i64 = r.get(0)?;
    let objetivo: String = r.get(3)?;
    let progreso: String = r.get(4)?;
    let moneda: String = r.get(5)?;
    Ok(Meta {
        id,
        nombre: r.get(1)?,
        icono: r.get(2)?,
        objetivo: objetivo
            .parse()
            .with_context(|| format!("Invalid target '{}' in goal {}", objetivo, id))?,
        progreso: progreso
            .parse()
            .with_context(|| format!("Invalid progress '{}' in goal {}", progreso, id))?,
        moneda: moneda.parse()?,
        completada: r.get(6)?,
    })
}

const META_COLUMNS: &str = "id, nombre, icono, objetivo, progreso, moneda, completada";

pub fn load_metas(conn: &Connection) -> Result<Vec<Meta>> {
    let mut stmt = conn.prepare(&format!("SELECT {META_COLUMNS} FROM metas ORDER BY id"))?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        out.push(meta_from_row(r)?);
    }
    Ok(out)
}

fn load_meta(conn: &Connection, id: i64) -> Result<Meta> {
    let mut stmt = conn.prepare(&format!("SELECT {META_COLUMNS} FROM metas WHERE id=?1"))?;
    let mut rows = stmt.query(params![id])?;
    match rows.next()? {
        Some(r) => meta_from_row(r),
        None => Err(anyhow!("Goal {} not found", id)),
    }
}
