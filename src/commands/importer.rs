// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::gastos::{NewGasto, insert_gasto};
use crate::models::{
    CardKind, Moneda, SavingsKind, validate_cierre, validate_cuotas, validate_positive,
};
use crate::ledger::CASH_LABEL;
use crate::utils::{
    http_client, id_for_categoria, id_for_tag, id_for_tarjeta, month_key, parse_bool_cell,
    parse_date, parse_decimal, parse_month, pretty_table,
};
use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv::ReaderBuilder;
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, hash_map::Entry};
use std::path::Path;
use std::str::FromStr;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("expenses", sub)) => {
            let path = sub.get_one::<String>("path").unwrap().trim();
            let n = import_expenses_csv(conn, Path::new(path))?;
            println!("Imported {} expenses from {}", n, path);
        }
        Some(("supabase", sub)) => {
            let url = sub.get_one::<String>("url").unwrap().trim_end_matches('/');
            let key = sub.get_one::<String>("key").unwrap();
            if sub.get_flag("check") {
                let n = check_connection(url, key)?;
                println!("✅ Connected to {}: {} remote gastos", url, n);
                return Ok(());
            }
            let snapshot = fetch_snapshot(url, key)?;
            let report = import_snapshot(conn, &snapshot)?;
            println!("{}", report_table(&report));
        }
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct CsvGasto {
    fecha: String,
    descripcion: String,
    monto: String,
    moneda: Option<String>,
    cuotas: Option<i64>,
    categoria: Option<String>,
    tarjeta: Option<String>,
    fijo: Option<String>,
    tags: Option<String>,
    #[serde(default)]
    mes_facturacion: Option<String>,
    #[serde(default)]
    pagado: Option<String>,
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn cached_id(
    cache: &mut HashMap<String, i64>,
    name: &str,
    lookup: impl FnOnce(&str) -> Result<i64>,
) -> Result<i64> {
    match cache.entry(name.to_string()) {
        Entry::Occupied(entry) => Ok(*entry.get()),
        Entry::Vacant(entry) => {
            let id = lookup(name)?;
            Ok(*entry.insert(id))
        }
    }
}

/// Import gastos from a CSV with the header
/// `fecha,descripcion,monto,moneda,cuotas,categoria,tarjeta,fijo,tags`.
///
/// Optional `mes_facturacion` and `pagado` columns are honoured, so a file
/// written by `export expenses` reads back in. Extra columns are ignored and
/// a `tarjeta` of `Efectivo` means cash.
///
/// Every row goes in one transaction: a bad row aborts the whole file.
pub fn import_expenses_csv(conn: &mut Connection, path: &Path) -> Result<usize> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path.display()))?;

    let tx = conn.transaction()?;
    let mut categorias: HashMap<String, i64> = HashMap::new();
    let mut tarjetas: HashMap<String, i64> = HashMap::new();
    let mut tags: HashMap<String, i64> = HashMap::new();
    let mut count = 0;

    for (line, result) in rdr.deserialize::<CsvGasto>().enumerate() {
        let row = result.with_context(|| format!("CSV row {}", line + 1))?;
        let fecha = parse_date(&row.fecha)?;
        let monto = validate_positive(
            parse_decimal(&row.monto)
                .with_context(|| format!("Invalid amount for '{}'", row.descripcion))?,
        )?;
        let moneda = match non_empty(&row.moneda) {
            Some(m) => Moneda::from_str(m)?,
            None => Moneda::Ars,
        };
        let categoria_id = match non_empty(&row.categoria) {
            Some(n) => Some(cached_id(&mut categorias, n, |n| id_for_categoria(&tx, n))?),
            None => None,
        };
        let tarjeta_id = match non_empty(&row.tarjeta) {
            Some(n) if n.eq_ignore_ascii_case(CASH_LABEL) => None,
            Some(n) => Some(cached_id(&mut tarjetas, n, |n| id_for_tarjeta(&tx, n))?),
            None => None,
        };
        let mut tag_ids = Vec::new();
        if let Some(list) = non_empty(&row.tags) {
            for n in list.split(';').map(str::trim).filter(|s| !s.is_empty()) {
                tag_ids.push(cached_id(&mut tags, n, |n| id_for_tag(&tx, n))?);
            }
        }
        let descripcion = row.descripcion.trim().to_string();
        if descripcion.is_empty() {
            return Err(anyhow!("CSV row {}: description is empty", line + 1));
        }

        let mes_facturacion = match non_empty(&row.mes_facturacion) {
            Some(m) => parse_month(m)?,
            None => month_key(fecha),
        };

        insert_gasto(
            &tx,
            &NewGasto {
                tarjeta_id,
                categoria_id,
                descripcion,
                monto,
                moneda,
                cuotas: validate_cuotas(row.cuotas.unwrap_or(1))?,
                fecha,
                mes_facturacion,
                es_fijo: non_empty(&row.fijo).is_some_and(parse_bool_cell),
                tag_ids,
                pagado: non_empty(&row.pagado).is_some_and(parse_bool_cell),
            },
        )?;
        count += 1;
    }
    tx.commit()?;
    tracing::info!(count, path = %path.display(), "imported expenses from csv");
    Ok(count)
}

// Remote rows keep their uuid ids until they are remapped.

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteTarjeta {
    pub id: String,
    pub nombre: String,
    pub tipo: String,
    pub banco: Option<String>,
    pub digitos: Option<String>,
    pub cierre: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteCategoria {
    pub id: String,
    pub nombre: String,
    pub icono: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteTag {
    pub id: String,
    pub nombre: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteGasto {
    pub id: String,
    pub tarjeta_id: Option<String>,
    pub categoria_id: Option<String>,
    pub descripcion: String,
    pub monto: Decimal,
    pub moneda: String,
    pub cuotas: Option<i64>,
    pub fecha: String,
    pub mes_facturacion: Option<String>,
    #[serde(default)]
    pub es_fijo: bool,
    #[serde(default)]
    pub tag_ids: Vec<String>,
    #[serde(default)]
    pub pagado: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteImpuesto {
    pub id: String,
    pub tarjeta_id: Option<String>,
    pub descripcion: String,
    pub monto: Decimal,
    pub mes: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteMeta {
    pub id: String,
    pub nombre: String,
    pub icono: Option<String>,
    pub objetivo: Decimal,
    #[serde(default)]
    pub progreso: Decimal,
    pub moneda: String,
    #[serde(default)]
    pub completada: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteMovimiento {
    pub id: String,
    pub tipo: String,
    pub monto: Decimal,
    pub descripcion: Option<String>,
    pub fecha: String,
}

/// Every table pulled from the remote backend.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub tarjetas: Vec<RemoteTarjeta>,
    #[serde(default)]
    pub categorias: Vec<RemoteCategoria>,
    #[serde(default)]
    pub tags: Vec<RemoteTag>,
    #[serde(default)]
    pub gastos: Vec<RemoteGasto>,
    #[serde(default)]
    pub impuestos: Vec<RemoteImpuesto>,
    #[serde(default)]
    pub metas: Vec<RemoteMeta>,
    #[serde(default)]
    pub movimientos_ahorro: Vec<RemoteMovimiento>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub tarjetas: usize,
    pub categorias: usize,
    pub tags: usize,
    pub gastos: usize,
    pub impuestos: usize,
    pub metas: usize,
    pub movimientos: usize,
    pub skipped: usize,
}

fn fetch_table<T: serde::de::DeserializeOwned>(
    client: &reqwest::blocking::Client,
    url: &str,
    key: &str,
    table: &str,
) -> Result<Vec<T>> {
    let resp = client
        .get(format!("{}/rest/v1/{}?select=*", url, table))
        .header("apikey", key)
        .bearer_auth(key)
        .send()
        .with_context(|| format!("Fetch {}", table))?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().unwrap_or_default();
        return Err(anyhow!("Failed to fetch {}: {} {}", table, status, body));
    }
    let rows: Vec<T> = resp
        .json()
        .with_context(|| format!("Decode {}", table))?;
    tracing::info!(table, count = rows.len(), "fetched remote table");
    Ok(rows)
}

/// Total row count from a PostgREST `Content-Range` header such as `0-0/42`
/// or `*/0`.
pub fn parse_content_range(header: &str) -> Option<u64> {
    header.rsplit_once('/')?.1.trim().parse().ok()
}

/// Ask the backend for the number of gastos without downloading them.
pub fn check_connection(url: &str, key: &str) -> Result<u64> {
    let client = http_client()?;
    let resp = client
        .get(format!("{}/rest/v1/gastos?select=id&limit=1", url))
        .header("apikey", key)
        .header("Prefer", "count=exact")
        .bearer_auth(key)
        .send()
        .context("Connect to Supabase")?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().unwrap_or_default();
        return Err(anyhow!("Connection check failed: {} {}", status, body));
    }
    let total = resp
        .headers()
        .get("content-range")
        .and_then(|v| v.to_str().ok())
        .and_then(parse_content_range)
        .ok_or_else(|| anyhow!("Response carried no row count"))?;
    tracing::info!(total, "remote connection ok");
    Ok(total)
}

pub fn fetch_snapshot(url: &str, key: &str) -> Result<Snapshot> {
    let client = http_client()?;
    Ok(Snapshot {
        tarjetas: fetch_table(&client, url, key, "tarjetas")?,
        categorias: fetch_table(&client, url, key, "categorias")?,
        tags: fetch_table(&client, url, key, "tags")?,
        gastos: fetch_table(&client, url, key, "gastos")?,
        impuestos: fetch_table(&client, url, key, "impuestos")?,
        metas: fetch_table(&client, url, key, "metas")?,
        movimientos_ahorro: fetch_table(&client, url, key, "movimientos_ahorro")?,
    })
}

/// Accepts `YYYY-MM-DD` or a full timestamp.
fn remote_date(s: &str) -> Result<NaiveDate> {
    parse_date(s.get(..10).unwrap_or(s))
}

/// Remote timestamps in the local `datetime('now')` shape, in UTC.
pub fn normalize_timestamp(s: &str) -> Result<String> {
    const LOCAL: &str = "%Y-%m-%d %H:%M:%S";
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc).format(LOCAL).to_string());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.format(LOCAL).to_string());
        }
    }
    let day = parse_date(s).with_context(|| format!("Invalid timestamp '{}'", s))?;
    Ok(format!("{} 00:00:00", day))
}

fn find_id(tx: &Transaction, sql: &str, nombre: &str) -> Result<Option<i64>> {
    Ok(tx
        .query_row(sql, params![nombre.trim()], |r| r.get(0))
        .optional()?)
}

/// Reuse an existing row found by name, or insert a new one.
fn reuse_or_insert(
    tx: &Transaction,
    existing: Option<i64>,
    insert: impl FnOnce() -> Result<()>,
) -> Result<(i64, bool)> {
    if let Some(id) = existing {
        return Ok((id, false));
    }
    insert()?;
    Ok((tx.last_insert_rowid(), true))
}

fn remap(ids: &HashMap<String, i64>, remote: &Option<String>) -> Option<i64> {
    remote.as_ref().and_then(|r| ids.get(r).copied())
}

/// Insert a remote snapshot into the local database, translating remote ids
/// into local ones. Cards, categories and tags that already exist by name are
/// reused. Rows that fail validation are skipped and counted.
pub fn import_snapshot(conn: &mut Connection, snap: &Snapshot) -> Result<ImportReport> {
    let tx = conn.transaction()?;
    let mut report = ImportReport::default();

    let mut tarjetas: HashMap<String, i64> = HashMap::new();
    for t in &snap.tarjetas {
        let tipo = CardKind::from_str(&t.tipo).unwrap_or(CardKind::Other);
        let cierre = match t.cierre {
            Some(c) => match validate_cierre(c) {
                Ok(c) => Some(c),
                Err(e) => {
                    tracing::warn!(tarjeta = %t.nombre, error = %e, "dropping closing day");
                    None
                }
            },
            None => None,
        };
        let existing = find_id(&tx, "SELECT id FROM tarjetas WHERE nombre=?1", &t.nombre)?;
        let (id, created) = reuse_or_insert(&tx, existing, || {
            tx.execute(
                "INSERT INTO tarjetas(nombre, tipo, banco, digitos, cierre) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![t.nombre.trim(), tipo.as_str(), t.banco, t.digitos, cierre],
            )?;
            Ok(())
        })?;
        if created {
            report.tarjetas += 1;
        }
        tarjetas.insert(t.id.clone(), id);
    }

    let mut categorias: HashMap<String, i64> = HashMap::new();
    for c in &snap.categorias {
        let existing = find_id(&tx, "SELECT id FROM categorias WHERE nombre=?1", &c.nombre)?;
        let (id, created) = reuse_or_insert(&tx, existing, || {
            tx.execute(
                "INSERT INTO categorias(nombre, icono, color) VALUES (?1, ?2, ?3)",
                params![
                    c.nombre.trim(),
                    c.icono.as_deref().unwrap_or("💰"),
                    c.color.as_deref().unwrap_or("#64748b")
                ],
            )?;
            Ok(())
        })?;
        if created {
            report.categorias += 1;
        }
        categorias.insert(c.id.clone(), id);
    }

    let mut tags: HashMap<String, i64> = HashMap::new();
    for t in &snap.tags {
        let existing = find_id(&tx, "SELECT id FROM tags WHERE nombre=?1", &t.nombre)?;
        let (id, created) = reuse_or_insert(&tx, existing, || {
            tx.execute("INSERT INTO tags(nombre) VALUES (?1)", params![t.nombre.trim()])?;
            Ok(())
        })?;
        if created {
            report.tags += 1;
        }
        tags.insert(t.id.clone(), id);
    }

    for g in &snap.gastos {
        match remote_gasto(g, &tarjetas, &categorias, &tags) {
            Ok(new) => {
                insert_gasto(&tx, &new)?;
                report.gastos += 1;
            }
            Err(e) => {
                tracing::warn!(id = %g.id, error = %e, "skipping remote gasto");
                report.skipped += 1;
            }
        }
    }

    for i in &snap.impuestos {
        let mes = match parse_month(&i.mes) {
            Ok(m) if i.monto > Decimal::ZERO => m,
            _ => {
                tracing::warn!(id = %i.id, "skipping remote impuesto");
                report.skipped += 1;
                continue;
            }
        };
        tx.execute(
            "INSERT INTO impuestos(tarjeta_id, descripcion, monto, mes) VALUES (?1, ?2, ?3, ?4)",
            params![remap(&tarjetas, &i.tarjeta_id), i.descripcion, i.monto.to_string(), mes],
        )?;
        report.impuestos += 1;
    }

    for m in &snap.metas {
        let moneda = match Moneda::from_str(&m.moneda) {
            Ok(moneda) if m.objetivo > Decimal::ZERO => moneda,
            _ => {
                tracing::warn!(id = %m.id, "skipping remote meta");
                report.skipped += 1;
                continue;
            }
        };
        let progreso = m.progreso.max(Decimal::ZERO);
        tx.execute(
            "INSERT INTO metas(nombre, icono, objetivo, progreso, moneda, completada) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                m.nombre,
                m.icono.as_deref().unwrap_or("🎯"),
                m.objetivo.to_string(),
                progreso.to_string(),
                moneda.as_str(),
                m.completada || progreso >= m.objetivo
            ],
        )?;
        report.metas += 1;
    }

    for mv in &snap.movimientos_ahorro {
        let (Ok(tipo), Ok(fecha)) = (
            SavingsKind::from_str(&mv.tipo),
            normalize_timestamp(&mv.fecha),
        ) else {
            tracing::warn!(id = %mv.id, "skipping remote movimiento");
            report.skipped += 1;
            continue;
        };
        tx.execute(
            "INSERT INTO movimientos_ahorro(tipo, monto, descripcion, fecha) VALUES (?1, ?2, ?3, ?4)",
            params![tipo.as_str(), mv.monto.to_string(), mv.descripcion, fecha],
        )?;
        report.movimientos += 1;
    }

    tx.commit()?;
    tracing::info!(?report, "imported remote snapshot");
    Ok(report)
}

fn remote_gasto(
    g: &RemoteGasto,
    tarjetas: &HashMap<String, i64>,
    categorias: &HashMap<String, i64>,
    tags: &HashMap<String, i64>,
) -> Result<NewGasto> {
    let fecha = remote_date(&g.fecha)?;
    let mes_facturacion = match &g.mes_facturacion {
        Some(m) if !m.trim().is_empty() => parse_month(m)?,
        _ => month_key(fecha),
    };
    Ok(NewGasto {
        tarjeta_id: remap(tarjetas, &g.tarjeta_id),
        categoria_id: remap(categorias, &g.categoria_id),
        descripcion: g.descripcion.trim().to_string(),
        monto: validate_positive(g.monto)?,
        moneda: Moneda::from_str(&g.moneda)?,
        cuotas: validate_cuotas(g.cuotas.unwrap_or(1))?,
        fecha,
        mes_facturacion,
        es_fijo: g.es_fijo,
        tag_ids: g.tag_ids.iter().filter_map(|t| tags.get(t).copied()).collect(),
        pagado: g.pagado,
    })
}

fn report_table(r: &ImportReport) -> comfy_table::Table {
    let rows = [
        ("tarjetas", r.tarjetas),
        ("categorias", r.categorias),
        ("tags", r.tags),
        ("gastos", r.gastos),
        ("impuestos", r.impuestos),
        ("metas", r.metas),
        ("movimientos_ahorro", r.movimientos),
        ("skipped", r.skipped),
    ]
    .into_iter()
    .map(|(t, n)| vec![t.to_string(), n.to_string()])
    .collect();
    pretty_table(&["Table", "Imported"], rows)
}
