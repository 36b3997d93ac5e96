// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Categoria, GastosError};
use crate::utils::{id_for_categoria, maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            if name.is_empty() {
                return Err(GastosError::MissingField("category name").into());
            }
            let icon = sub.get_one::<String>("icon").unwrap().trim();
            let color = sub.get_one::<String>("color").unwrap().trim();
            conn.execute(
                "INSERT INTO categorias(nombre, icono, color) VALUES (?1, ?2, ?3)",
                params![name, icon, color],
            )?;
            println!("Added category {} {}", icon, name);
        }
        Some(("list", sub)) => {
            let data = load_categorias(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .into_iter()
                    .map(|c| vec![c.icono, c.nombre, c.color])
                    .collect();
                println!("{}", pretty_table(&["", "Category", "Color"], rows));
            }
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let id = id_for_categoria(conn, name)?;
            conn.execute("DELETE FROM categorias WHERE id=?1", params![id])?;
            println!("Removed category '{}'", name);
        }
        _ => {}
    }
    Ok(())
}

pub fn load_categorias(conn: &Connection) -> Result<Vec<Categoria>> {
    let mut stmt = conn.prepare("SELECT id, nombre, icono, color FROM categorias ORDER BY nombre")?;
    let rows = stmt.query_map([], |r| {
        Ok(Categoria {
            id: r.get(0)?,
            nombre: r.get(1)?,
            icono: r.get(2)?,
            color: r.get(3)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
