// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::{categorias::load_categorias, impuestos::load_impuestos, tags::load_tags};
use crate::commands::tarjetas::load_tarjetas;
use crate::ledger::{gastos_del_mes, impuestos_del_mes, installment_number, monthly_amount, sum_impuestos};
use crate::models::{Gasto, GastosError, Moneda, validate_cuotas, validate_positive};
use crate::utils::{
    fmt_money, id_for_categoria, id_for_tag, id_for_tarjeta, maybe_print_json, month_arg,
    month_key, month_name, parse_date, parse_decimal, parse_month, pretty_table, today,
};
use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("edit", sub)) => edit(conn, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let n = conn.execute("DELETE FROM gastos WHERE id=?1", params![id])?;
            if n == 0 {
                return Err(anyhow!("Expense {} not found", id));
            }
            println!("Removed expense {}", id);
        }
        Some(("pay", sub)) => toggle(conn, sub, "pagado")?,
        Some(("fix", sub)) => toggle(conn, sub, "es_fijo")?,
        _ => {}
    }
    Ok(())
}

/// Fields of a gasto before it has an id.
#[derive(Debug, Clone)]
pub struct NewGasto {
    pub tarjeta_id: Option<i64>,
    pub categoria_id: Option<i64>,
    pub descripcion: String,
    pub monto: Decimal,
    pub moneda: Moneda,
    pub cuotas: u32,
    pub fecha: NaiveDate,
    pub mes_facturacion: String,
    pub es_fijo: bool,
    pub tag_ids: Vec<i64>,
    pub pagado: bool,
}

pub fn insert_gasto(conn: &Connection, g: &NewGasto) -> Result<i64> {
    conn.execute(
        "INSERT INTO gastos(tarjeta_id, categoria_id, descripcion, monto, moneda, cuotas, cuota_actual, fecha, mes_facturacion, es_fijo, pagado)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?8, ?9, ?10)",
        params![
            g.tarjeta_id,
            g.categoria_id,
            g.descripcion,
            g.monto.to_string(),
            g.moneda.as_str(),
            g.cuotas,
            g.fecha.to_string(),
            g.mes_facturacion,
            g.es_fijo,
            g.pagado
        ],
    )?;
    let id = conn.last_insert_rowid();
    set_tags(conn, id, &g.tag_ids)?;
    Ok(id)
}

fn set_tags(conn: &Connection, gasto_id: i64, tag_ids: &[i64]) -> Result<()> {
    conn.execute("DELETE FROM gasto_tags WHERE gasto_id=?1", params![gasto_id])?;
    for tag_id in tag_ids {
        conn.execute(
            "INSERT OR IGNORE INTO gasto_tags(gasto_id, tag_id) VALUES (?1, ?2)",
            params![gasto_id, tag_id],
        )?;
    }
    Ok(())
}

fn tag_ids_from(conn: &Connection, sub: &clap::ArgMatches) -> Result<Option<Vec<i64>>> {
    match sub.get_many::<String>("tag") {
        Some(names) => {
            let mut ids = Vec::new();
            for n in names {
                ids.push(id_for_tag(conn, n)?);
            }
            Ok(Some(ids))
        }
        None => Ok(None),
    }
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let descripcion = sub.get_one::<String>("desc").unwrap().trim().to_string();
    if descripcion.is_empty() {
        return Err(GastosError::MissingField("description").into());
    }
    let monto = validate_positive(parse_decimal(sub.get_one::<String>("amount").unwrap())?)?;
    let moneda = match sub.get_one::<String>("currency") {
        Some(c) => Moneda::from_str(c)?,
        None => Moneda::Ars,
    };
    let cuotas = validate_cuotas(*sub.get_one::<i64>("installments").unwrap_or(&1))?;
    let fecha = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d)?,
        None => today(),
    };
    let mes_facturacion = match sub.get_one::<String>("billing_month") {
        Some(m) => parse_month(m)?,
        None => month_key(fecha),
    };
    let categoria_id = sub
        .get_one::<String>("category")
        .map(|c| id_for_categoria(conn, c))
        .transpose()?;
    let tarjeta_id = sub
        .get_one::<String>("card")
        .map(|c| id_for_tarjeta(conn, c))
        .transpose()?;
    let tag_ids = tag_ids_from(conn, sub)?.unwrap_or_default();

    let g = NewGasto {
        tarjeta_id,
        categoria_id,
        descripcion,
        monto,
        moneda,
        cuotas,
        fecha,
        mes_facturacion,
        es_fijo: sub.get_flag("fixed"),
        tag_ids,
        pagado: sub.get_flag("paid"),
    };
    let id = insert_gasto(conn, &g)?;
    tracing::debug!(id, mes = %g.mes_facturacion, cuotas = g.cuotas, "expense recorded");
    if g.cuotas > 1 {
        println!(
            "Recorded expense {} '{}' {} in {} installments of {} from {}",
            id,
            g.descripcion,
            fmt_money(&g.monto, g.moneda),
            g.cuotas,
            fmt_money(&(g.monto / Decimal::from(g.cuotas)), g.moneda),
            g.mes_facturacion
        );
    } else {
        println!(
            "Recorded expense {} '{}' {} billed {}",
            id,
            g.descripcion,
            fmt_money(&g.monto, g.moneda),
            g.mes_facturacion
        );
    }
    Ok(())
}

fn edit(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let mut g = load_gasto(conn, id)?;

    if let Some(d) = sub.get_one::<String>("desc") {
        let d = d.trim();
        if d.is_empty() {
            return Err(GastosError::MissingField("description").into());
        }
        g.descripcion = d.to_string();
    }
    if let Some(a) = sub.get_one::<String>("amount") {
        g.monto = validate_positive(parse_decimal(a)?)?;
    }
    if let Some(c) = sub.get_one::<String>("currency") {
        g.moneda = c.parse()?;
    }
    if let Some(n) = sub.get_one::<i64>("installments") {
        g.cuotas = validate_cuotas(*n)?;
    }
    if let Some(d) = sub.get_one::<String>("date") {
        g.fecha = parse_date(d)?;
        g.mes_facturacion = month_key(g.fecha);
    }
    if let Some(m) = sub.get_one::<String>("billing_month") {
        g.mes_facturacion = parse_month(m)?;
    }
    if let Some(c) = sub.get_one::<String>("category") {
        g.categoria_id = Some(id_for_categoria(conn, c)?);
    }
    if sub.get_flag("no_category") {
        g.categoria_id = None;
    }
    if let Some(c) = sub.get_one::<String>("card") {
        g.tarjeta_id = Some(id_for_tarjeta(conn, c)?);
    }
    if sub.get_flag("no_card") {
        g.tarjeta_id = None;
    }

    conn.execute(
        "UPDATE gastos SET tarjeta_id=?1, categoria_id=?2, descripcion=?3, monto=?4, moneda=?5, cuotas=?6, fecha=?7, mes_facturacion=?8 WHERE id=?9",
        params![
            g.tarjeta_id,
            g.categoria_id,
            g.descripcion,
            g.monto.to_string(),
            g.moneda.as_str(),
            g.cuotas,
            g.fecha.to_string(),
            g.mes_facturacion,
            id
        ],
    )?;
    if let Some(tag_ids) = tag_ids_from(conn, sub)? {
        set_tags(conn, id, &tag_ids)?;
    }
    println!("Updated expense {} '{}'", id, g.descripcion);
    Ok(())
}

fn toggle(conn: &Connection, sub: &clap::ArgMatches, column: &str) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let sql = format!("UPDATE gastos SET {column} = 1 - {column} WHERE id=?1");
    let n = conn.execute(&sql, params![id])?;
    if n == 0 {
        return Err(anyhow!("Expense {} not found", id));
    }
    let g = load_gasto(conn, id)?;
    let state = if column == "pagado" { g.pagado } else { g.es_fijo };
    println!("Expense {} '{}': {} = {}", id, g.descripcion, column, state);
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    MontoDesc,
    MontoAsc,
    FechaDesc,
    FechaAsc,
}

impl FromStr for SortKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "monto-desc" => Ok(SortKey::MontoDesc),
            "monto-asc" => Ok(SortKey::MontoAsc),
            "fecha-desc" => Ok(SortKey::FechaDesc),
            "fecha-asc" => Ok(SortKey::FechaAsc),
            other => Err(anyhow!(
                "Unknown sort '{}', expected monto-desc, monto-asc, fecha-desc or fecha-asc",
                other
            )),
        }
    }
}

pub fn sort_gastos(gastos: &mut [&Gasto], key: SortKey) {
    match key {
        SortKey::MontoDesc => gastos.sort_by(|a, b| monthly_amount(b).cmp(&monthly_amount(a))),
        SortKey::MontoAsc => gastos.sort_by_key(|g| monthly_amount(g)),
        SortKey::FechaDesc => gastos.sort_by(|a, b| b.fecha.cmp(&a.fecha).then(b.id.cmp(&a.id))),
        SortKey::FechaAsc => gastos.sort_by(|a, b| a.fecha.cmp(&b.fecha).then(a.id.cmp(&b.id))),
    }
}

#[derive(Serialize)]
pub struct GastoRow {
    pub id: i64,
    pub fecha: String,
    pub descripcion: String,
    pub categoria: String,
    pub tarjeta: String,
    pub cuota: String,
    pub monto: String,
    pub moneda: String,
    pub fijo: bool,
    pub pagado: bool,
    pub tags: String,
}

/// Rows of the month view after filters and sort.
pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<GastoRow>> {
    let mes = month_arg(conn, sub)?;
    let gastos = load_gastos(conn)?;
    let mut del_mes = gastos_del_mes(&gastos, &mes)?;

    if let Some(q) = sub.get_one::<String>("search") {
        let q = q.trim().to_lowercase();
        del_mes.retain(|g| g.descripcion.to_lowercase().contains(&q));
    }
    if let Some(card) = sub.get_one::<String>("card") {
        if card.trim().eq_ignore_ascii_case("efectivo") {
            del_mes.retain(|g| g.tarjeta_id.is_none());
        } else {
            let tid = id_for_tarjeta(conn, card)?;
            del_mes.retain(|g| g.tarjeta_id == Some(tid));
        }
    }
    if let Some(c) = sub.get_one::<String>("currency") {
        let moneda: Moneda = c.parse()?;
        del_mes.retain(|g| g.moneda == moneda);
    }
    if let Some(t) = sub.get_one::<String>("tag") {
        let tag_id = id_for_tag(conn, t)?;
        del_mes.retain(|g| g.tag_ids.contains(&tag_id));
    }
    let key: SortKey = sub.get_one::<String>("sort").unwrap().parse()?;
    sort_gastos(&mut del_mes, key);

    let categorias: HashMap<i64, String> = load_categorias(conn)?
        .into_iter()
        .map(|c| (c.id, format!("{} {}", c.icono, c.nombre)))
        .collect();
    let tarjetas: HashMap<i64, String> = load_tarjetas(conn)?
        .into_iter()
        .map(|t| (t.id, t.nombre))
        .collect();
    let tags: HashMap<i64, String> = load_tags(conn)?
        .into_iter()
        .map(|t| (t.id, t.nombre))
        .collect();

    let mut out = Vec::with_capacity(del_mes.len());
    for g in del_mes {
        let cuota = if g.cuotas > 1 {
            format!("{}/{}", installment_number(g, &mes)?, g.cuotas)
        } else {
            String::new()
        };
        out.push(GastoRow {
            id: g.id,
            fecha: g.fecha.to_string(),
            descripcion: g.descripcion.clone(),
            categoria: g
                .categoria_id
                .and_then(|id| categorias.get(&id).cloned())
                .unwrap_or_else(|| "Sin categoría".to_string()),
            tarjeta: g
                .tarjeta_id
                .and_then(|id| tarjetas.get(&id).cloned())
                .unwrap_or_else(|| crate::ledger::CASH_LABEL.to_string()),
            cuota,
            monto: format!("{:.2}", monthly_amount(g).round_dp(2)),
            moneda: g.moneda.to_string(),
            fijo: g.es_fijo,
            pagado: g.pagado,
            tags: g
                .tag_ids
                .iter()
                .filter_map(|id| tags.get(id).cloned())
                .collect::<Vec<_>>()
                .join(", "),
        });
    }
    Ok(out)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(conn, sub)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        return Ok(());
    }
    let mes = month_arg(conn, sub)?;
    let count = data.len();
    let rows: Vec<Vec<String>> = data
        .into_iter()
        .map(|r| {
            vec![
                r.id.to_string(),
                r.fecha,
                if r.fijo {
                    format!("{} 📌", r.descripcion)
                } else {
                    r.descripcion
                },
                r.categoria,
                r.tarjeta,
                r.cuota,
                format!("{} {}", r.monto, r.moneda),
                if r.pagado { "✔".into() } else { String::new() },
                r.tags,
            ]
        })
        .collect();
    println!("{} · {} expenses", month_name(&mes)?, count);
    println!(
        "{}",
        pretty_table(
            &["ID", "Date", "Description", "Category", "Card", "Inst.", "Amount", "Paid", "Tags"],
            rows,
        )
    );
    let impuestos = load_impuestos(conn)?;
    let total_imp = sum_impuestos(&impuestos_del_mes(&impuestos, &mes));
    if !total_imp.is_zero() {
        println!("Taxes this month: {}", fmt_money(&total_imp, Moneda::Ars));
    }
    Ok(())
}

fn tag_map(conn: &Connection) -> Result<HashMap<i64, Vec<i64>>> {
    let mut stmt = conn.prepare("SELECT gasto_id, tag_id FROM gasto_tags ORDER BY tag_id")?;
    let rows = stmt.query_map([], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, i64>(1)?)))?;
    let mut map: HashMap<i64, Vec<i64>> = HashMap::new();
    for row in rows {
        let (g, t) = row?;
        map.entry(g).or_default().push(t);
    }
    Ok(map)
}

const GASTO_COLUMNS: &str = "id, tarjeta_id, categoria_id, descripcion, monto, moneda, cuotas, cuota_actual, fecha, mes_facturacion, es_fijo, pagado";

fn gasto_from_row(r: &rusqlite::Row<'_>, tags: &mut HashMap<i64, Vec<i64>>) -> Result<Gasto> {
    let id: i64 = r.get(0)?;
    let monto: String = r.get(4)?;
    let moneda: String = r.get(5)?;
    let fecha: String = r.get(8)?;
    Ok(Gasto {
        id,
        tarjeta_id: r.get(1)?,
        categoria_id: r.get(2)?,
        descripcion: r.get(3)?,
        monto: monto
            .parse::<Decimal>()
            .with_context(|| format!("Invalid amount '{}' in expense {}", monto, id))?,
        moneda: moneda.parse()?,
        cuotas: r.get(6)?,
        cuota_actual: r.get(7)?,
        fecha: parse_date(&fecha)?,
        mes_facturacion: r.get(9)?,
        es_fijo: r.get(10)?,
        pagado: r.get(11)?,
        tag_ids: tags.remove(&id).unwrap_or_default(),
    })
}

/// All gastos, newest purchase first.
pub fn load_gastos(conn: &Connection) -> Result<Vec<Gasto>> {
    let mut tags = tag_map(conn)?;
    let sql = format!("SELECT {GASTO_COLUMNS} FROM gastos ORDER BY fecha DESC, id DESC");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        out.push(gasto_from_row(r, &mut tags)?);
    }
    Ok(out)
}

pub fn load_gasto(conn: &Connection, id: i64) -> Result<Gasto> {
    let mut tags = tag_map(conn)?;
    let sql = format!("SELECT {GASTO_COLUMNS} FROM gastos WHERE id=?1");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![id])?;
    match rows.next()? {
        Some(r) => gasto_from_row(r, &mut tags),
        None => Err(anyhow!("Expense {} not found", id)),
    }
}
