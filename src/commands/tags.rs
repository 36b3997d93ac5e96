// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{GastosError, Tag};
use crate::utils::{id_for_tag, maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            if name.is_empty() {
                return Err(GastosError::MissingField("tag name").into());
            }
            conn.execute("INSERT INTO tags(nombre) VALUES (?1)", params![name])?;
            println!("Added tag '{}'", name);
        }
        Some(("list", sub)) => {
            let data = load_tags(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data.into_iter().map(|t| vec![t.nombre]).collect();
                println!("{}", pretty_table(&["Tag"], rows));
            }
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let id = id_for_tag(conn, name)?;
            conn.execute("DELETE FROM tags WHERE id=?1", params![id])?;
            println!("Removed tag '{}'", name);
        }
        _ => {}
    }
    Ok(())
}

pub fn load_tags(conn: &Connection) -> Result<Vec<Tag>> {
    let mut stmt = conn.prepare("SELECT id, nombre FROM tags ORDER BY nombre")?;
    let rows = stmt.query_map([], |r| {
        Ok(Tag {
            id: r.get(0)?,
            nombre: r.get(1)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
