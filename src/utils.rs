// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Moneda, Profile};
use anyhow::{Context, Result, anyhow};
use chrono::{Datelike, NaiveDate};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

const UA: &str = concat!("gastos/", env!("CARGO_PKG_VERSION"));

/// Pesos per dollar used when no rate has been fetched or set.
pub const DOLAR_FALLBACK: Decimal = Decimal::from_parts(1050, 0, 0, false, 0);

const MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

pub fn http_client() -> Result<reqwest::blocking::Client> {
    let c = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .user_agent(UA)
        .build()?;
    Ok(c)
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_month(s: &str) -> Result<String> {
    let s = s.trim();
    NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", s))?;
    if s.len() != 7 {
        return Err(anyhow!("Invalid month '{}', expected YYYY-MM", s));
    }
    Ok(s.to_string())
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn fmt_money(d: &Decimal, moneda: Moneda) -> String {
    let v = format!("{:.2}", d.abs().round_dp(2));
    match moneda {
        Moneda::Usd => format!("U$S {}", v),
        Moneda::Ars => format!("$ {}", v),
    }
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

pub fn id_for_tarjeta(conn: &Connection, nombre: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM tarjetas WHERE nombre=?1")?;
    let id: i64 = stmt
        .query_row(params![nombre.trim()], |r| r.get(0))
        .with_context(|| format!("Card '{}' not found", nombre.trim()))?;
    Ok(id)
}

pub fn id_for_categoria(conn: &Connection, nombre: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM categorias WHERE nombre=?1")?;
    let id: i64 = stmt
        .query_row(params![nombre.trim()], |r| r.get(0))
        .with_context(|| format!("Category '{}' not found", nombre.trim()))?;
    Ok(id)
}

pub fn id_for_tag(conn: &Connection, nombre: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM tags WHERE nombre=?1")?;
    let id: i64 = stmt
        .query_row(params![nombre.trim()], |r| r.get(0))
        .with_context(|| format!("Tag '{}' not found", nombre.trim()))?;
    Ok(id)
}

// Settings
pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![key],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

pub fn clear_setting(conn: &Connection, key: &str) -> Result<()> {
    conn.execute("DELETE FROM settings WHERE key=?1", params![key])?;
    Ok(())
}

pub fn get_setting_decimal(conn: &Connection, key: &str) -> Result<Decimal> {
    match get_setting(conn, key)? {
        Some(s) => s
            .parse::<Decimal>()
            .with_context(|| format!("Invalid decimal '{}' in setting {}", s, key)),
        None => Ok(Decimal::ZERO),
    }
}

pub fn load_profile(conn: &Connection) -> Result<Profile> {
    Ok(Profile {
        nombre: get_setting(conn, "profile_nombre")?.unwrap_or_default(),
        email: get_setting(conn, "profile_email")?.unwrap_or_default(),
        budget_ars: get_setting_decimal(conn, "budget_ars")?,
        budget_usd: get_setting_decimal(conn, "budget_usd")?,
        ahorro_pesos: get_setting_decimal(conn, "ahorro_pesos")?,
        ahorro_usd: get_setting_decimal(conn, "ahorro_usd")?,
    })
}

/// Pesos per dollar: explicit override, else the cached rate, else the fallback.
pub fn dolar_rate(conn: &Connection, override_rate: Option<&String>) -> Result<Decimal> {
    if let Some(raw) = override_rate {
        let rate = parse_decimal(raw)?;
        if rate <= Decimal::ZERO {
            return Err(anyhow!("Dolar rate must be positive, got {}", rate));
        }
        return Ok(rate);
    }
    let cached = get_setting(conn, "dolar_venta")?;
    match cached {
        Some(s) => s
            .parse::<Decimal>()
            .with_context(|| format!("Invalid cached dolar rate '{}'", s)),
        None => Ok(DOLAR_FALLBACK),
    }
}

// Month keys
fn split_month(key: &str) -> Result<(i32, u32)> {
    let (y, m) = key
        .split_once('-')
        .ok_or_else(|| anyhow!("Invalid month '{}'", key))?;
    let y: i32 = y
        .parse()
        .with_context(|| format!("Invalid year in month '{}'", key))?;
    let m: u32 = m
        .parse()
        .with_context(|| format!("Invalid month number in '{}'", key))?;
    if !(1..=12).contains(&m) {
        return Err(anyhow!("Invalid month number {}", m));
    }
    Ok((y, m))
}

pub fn month_key(date: NaiveDate) -> String {
    format!("{}-{:02}", date.year(), date.month())
}

pub fn month_start(key: &str) -> Result<NaiveDate> {
    let (y, m) = split_month(key)?;
    NaiveDate::from_ymd_opt(y, m, 1).ok_or_else(|| anyhow!("Invalid month '{}'", key))
}

pub fn add_months(key: &str, delta: i32) -> Result<String> {
    let (y, m) = split_month(key)?;
    let total = i64::from(y) * 12 + i64::from(m) - 1 + i64::from(delta);
    Ok(format!("{}-{:02}", total.div_euclid(12), total.rem_euclid(12) + 1))
}

/// Signed number of months from `start` to `end`.
pub fn months_between(start: &str, end: &str) -> Result<i32> {
    let (sy, sm) = split_month(start)?;
    let (ey, em) = split_month(end)?;
    Ok((ey - sy) * 12 + em as i32 - sm as i32)
}

pub fn month_name(key: &str) -> Result<String> {
    let (y, m) = split_month(key)?;
    Ok(format!("{} {}", MONTH_NAMES[(m - 1) as usize], y))
}

pub fn current_month(conn: &Connection) -> Result<String> {
    match get_setting(conn, "current_month")? {
        Some(m) => parse_month(&m),
        None => Ok(month_key(today())),
    }
}

/// Month selected by `--month`, falling back to the navigated month.
pub fn month_arg(conn: &Connection, sub: &clap::ArgMatches) -> Result<String> {
    match sub.get_one::<String>("month") {
        Some(m) => parse_month(m),
        None => current_month(conn),
    }
}

pub fn parse_bool_cell(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "si" | "sí" | "x"
    )
}
