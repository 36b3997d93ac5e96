// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{CardKind, GastosError, Tarjeta, validate_cierre, validate_digitos};
use crate::utils::{id_for_tarjeta, maybe_print_json, pretty_table};
use anyhow::{Context, Result};
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("edit", sub)) => edit(conn, sub)?,
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let id = id_for_tarjeta(conn, name)?;
            conn.execute("DELETE FROM tarjetas WHERE id=?1", params![id])?;
            println!("Removed card '{}' (its expenses are now cash)", name);
        }
        _ => {}
    }
    Ok(())
}

fn opt_trimmed(sub: &clap::ArgMatches, id: &str) -> Option<String> {
    sub.get_one::<String>(id)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap().trim().to_string();
    if name.is_empty() {
        return Err(GastosError::MissingField("card name").into());
    }
    let tipo = match sub.get_one::<String>("type") {
        Some(t) => t.parse::<CardKind>()?,
        None => CardKind::Visa,
    };
    let banco = opt_trimmed(sub, "bank");
    let digitos = opt_trimmed(sub, "digits")
        .map(|d| validate_digitos(&d))
        .transpose()?;
    let cierre = sub
        .get_one::<i64>("closing")
        .map(|d| validate_cierre(*d))
        .transpose()?;

    conn.execute(
        "INSERT INTO tarjetas(nombre, tipo, banco, digitos, cierre) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![name, tipo.as_str(), banco, digitos, cierre],
    )
    .with_context(|| format!("Add card '{}'", name))?;
    println!("Added card '{}' ({})", name, tipo.label());
    Ok(())
}

fn edit(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap().trim().to_string();
    let id = id_for_tarjeta(conn, &name)?;
    let mut t = load_tarjetas(conn)?
        .into_iter()
        .find(|t| t.id == id)
        .with_context(|| format!("Card '{}' not found", name))?;

    if let Some(n) = opt_trimmed(sub, "new_name") {
        t.nombre = n;
    }
    if let Some(raw) = sub.get_one::<String>("type") {
        t.tipo = raw.parse()?;
    }
    if let Some(b) = sub.get_one::<String>("bank") {
        let b = b.trim();
        t.banco = (!b.is_empty()).then(|| b.to_string());
    }
    if let Some(d) = sub.get_one::<String>("digits") {
        t.digitos = if d.trim().is_empty() {
            None
        } else {
            Some(validate_digitos(d)?)
        };
    }
    if let Some(c) = sub.get_one::<i64>("closing") {
        t.cierre = Some(validate_cierre(*c)?);
    }
    if sub.get_flag("no_closing") {
        t.cierre = None;
    }

    conn.execute(
        "UPDATE tarjetas SET nombre=?1, tipo=?2, banco=?3, digitos=?4, cierre=?5 WHERE id=?6",
        params![t.nombre, t.tipo.as_str(), t.banco, t.digitos, t.cierre, id],
    )?;
    println!("Updated card '{}'", t.nombre);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = load_tarjetas(conn)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        return Ok(());
    }
    let rows = data
        .into_iter()
        .map(|t| {
            vec![
                t.nombre,
                t.tipo.label().to_string(),
                t.banco.unwrap_or_default(),
                format!("•••• {}", t.digitos.as_deref().unwrap_or("****")),
                t.cierre.map(|c| c.to_string()).unwrap_or_default(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Name", "Type", "Bank", "Number", "Closing day"], rows)
    );
    Ok(())
}

/// Cards in creation order.
pub fn load_tarjetas(conn: &Connection) -> Result<Vec<Tarjeta>> {
    let mut stmt =
        conn.prepare("SELECT id, nombre, tipo, banco, digitos, cierre FROM tarjetas ORDER BY id")?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        let tipo: String = r.get(2)?;
        out.push(Tarjeta {
            id: r.get(0)?,
            nombre: r.get(1)?,
            tipo: tipo.parse()?,
            banco: r.get(3)?,
            digitos: r.get(4)?,
            cierre: r.get(5)?,
        });
    }
    Ok(out)
}
