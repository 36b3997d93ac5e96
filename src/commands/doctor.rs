// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{get_setting, parse_date, pretty_table, today};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;

const STALE_DOLAR_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub kind: &'static str,
    pub detail: String,
}

impl Issue {
    fn new(kind: &'static str, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

pub fn handle(conn: &Connection) -> Result<()> {
    let issues = diagnose(conn, today())?;
    if issues.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        let rows = issues
            .into_iter()
            .map(|i| vec![i.kind.to_string(), i.detail])
            .collect();
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}

pub fn diagnose(conn: &Connection, today: NaiveDate) -> Result<Vec<Issue>> {
    let mut issues = Vec::new();

    // 1) Same fixed expense billed twice in one month and currency
    let mut stmt = conn.prepare(
        "SELECT mes_facturacion, descripcion, COUNT(*) FROM gastos
         WHERE es_fijo = 1
         GROUP BY mes_facturacion, descripcion, moneda
         HAVING COUNT(*) > 1
         ORDER BY mes_facturacion, descripcion",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let mes: String = r.get(0)?;
        let desc: String = r.get(1)?;
        let n: i64 = r.get(2)?;
        issues.push(Issue::new("duplicated_fixed", format!("{} x{} in {}", desc, n, mes)));
    }

    // 2) Installment counters out of range, or fixed expenses split in installments
    let mut stmt = conn.prepare(
        "SELECT id, descripcion, cuotas, cuota_actual, es_fijo FROM gastos
         WHERE cuota_actual < 1 OR cuota_actual > cuotas OR (es_fijo = 1 AND cuotas > 1)
         ORDER BY id",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let desc: String = r.get(1)?;
        let cuotas: i64 = r.get(2)?;
        let actual: i64 = r.get(3)?;
        let fijo: bool = r.get(4)?;
        let detail = if fijo && cuotas > 1 {
            format!("#{} {}: fixed with {} installments", id, desc, cuotas)
        } else {
            format!("#{} {}: installment {}/{}", id, desc, actual, cuotas)
        };
        issues.push(Issue::new("invalid_installments", detail));
    }

    // 3) Goals already reached but still open
    let mut stmt =
        conn.prepare("SELECT id, nombre, objetivo, progreso FROM metas WHERE completada = 0 ORDER BY id")?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let nombre: String = r.get(1)?;
        let objetivo: Decimal = r.get::<_, String>(2)?.parse()?;
        let progreso: Decimal = r.get::<_, String>(3)?.parse()?;
        if progreso >= objetivo {
            issues.push(Issue::new(
                "goal_not_completed",
                format!("#{} {}: {} of {}", id, nombre, progreso, objetivo),
            ));
        }
    }

    // 4) Cards without a closing day get no closing alerts
    let mut stmt = conn.prepare("SELECT nombre FROM tarjetas WHERE cierre IS NULL ORDER BY nombre")?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let nombre: String = r.get(0)?;
        issues.push(Issue::new("card_without_closing", nombre));
    }

    // 5) Dolar rate
    match get_setting(conn, "dolar_fecha")? {
        None => issues.push(Issue::new(
            "dolar_missing",
            "no rate fetched yet, using the fallback",
        )),
        Some(d) => {
            let fecha = parse_date(&d)?;
            let age = (today - fecha).num_days();
            if age > STALE_DOLAR_DAYS {
                issues.push(Issue::new("dolar_stale", format!("last update {} ({} days)", d, age)));
            }
        }
    }

    tracing::debug!(count = issues.len(), "doctor finished");
    Ok(issues)
}
