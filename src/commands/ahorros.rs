// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Movimiento, SavingsKind, validate_positive};
use crate::utils::{
    dolar_rate, fmt_money, get_setting_decimal, load_profile, maybe_print_json, parse_decimal,
    pretty_table, set_setting,
};
use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("deposit", sub)) => movement(conn, sub, true)?,
        Some(("withdraw", sub)) => movement(conn, sub, false)?,
        Some(("status", sub)) => status(conn, sub)?,
        Some(("history", sub)) => {
            let limit = *sub.get_one::<usize>("limit").unwrap();
            let data = load_movimientos(conn, None, limit)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                println!("{}", movimientos_table(&data));
            }
        }
        _ => {}
    }
    Ok(())
}

fn movement(conn: &mut Connection, sub: &clap::ArgMatches, deposit: bool) -> Result<()> {
    let kind: SavingsKind = sub.get_one::<String>("kind").unwrap().parse()?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let note = sub
        .get_one::<String>("note")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let signed = if deposit { amount } else { -amount };
    let balance = record_movement(conn, kind, signed, note.as_deref())?;
    println!(
        "{} {} ({}); balance {}",
        if deposit { "Deposited" } else { "Withdrew" },
        fmt_money(&amount, kind.moneda()),
        kind,
        fmt_money(&balance, kind.moneda())
    );
    Ok(())
}

/// Apply a signed movement to a savings balance and log it.
///
/// The balance never goes below zero; the movimiento keeps the signed amount
/// that was requested.
pub fn record_movement(
    conn: &mut Connection,
    kind: SavingsKind,
    signed: Decimal,
    note: Option<&str>,
) -> Result<Decimal> {
    validate_positive(signed.abs())?;
    let tx = conn.transaction()?;
    let current = get_setting_decimal(&tx, kind.balance_key())?;
    let new_balance = (current + signed).max(Decimal::ZERO);
    set_setting(&tx, kind.balance_key(), &new_balance.to_string())?;
    tx.execute(
        "INSERT INTO movimientos_ahorro(tipo, monto, descripcion) VALUES (?1, ?2, ?3)",
        params![kind.as_str(), signed.to_string(), note],
    )?;
    tx.commit()?;
    tracing::debug!(kind = kind.as_str(), %signed, %new_balance, "savings movement");
    Ok(new_balance)
}

#[derive(Serialize)]
struct SavingsStatus {
    ahorro_pesos: Decimal,
    ahorro_usd: Decimal,
    dolar: Decimal,
    patrimonio: Decimal,
    movimientos_pesos: Vec<Movimiento>,
    movimientos_usd: Vec<Movimiento>,
}

fn status(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let profile = load_profile(conn)?;
    let dolar = dolar_rate(conn, sub.get_one::<String>("dolar"))?;
    let data = SavingsStatus {
        ahorro_pesos: profile.ahorro_pesos,
        ahorro_usd: profile.ahorro_usd,
        dolar,
        patrimonio: profile.ahorro_pesos + profile.ahorro_usd * dolar,
        movimientos_pesos: load_movimientos(conn, Some(SavingsKind::Pesos), 5)?,
        movimientos_usd: load_movimientos(conn, Some(SavingsKind::Usd), 5)?,
    };
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        return Ok(());
    }
    println!(
        "Net worth: {} (dolar {:.2})",
        fmt_money(&data.patrimonio, SavingsKind::Pesos.moneda()),
        data.dolar
    );
    println!(
        "{}",
        pretty_table(
            &["Savings", "Balance"],
            vec![
                vec![
                    "pesos".into(),
                    fmt_money(&data.ahorro_pesos, SavingsKind::Pesos.moneda())
                ],
                vec![
                    "usd".into(),
                    fmt_money(&data.ahorro_usd, SavingsKind::Usd.moneda())
                ],
            ],
        )
    );
    let mut recent = data.movimientos_pesos;
    recent.extend(data.movimientos_usd);
    if !recent.is_empty() {
        println!("{}", movimientos_table(&recent));
    }
    Ok(())
}

fn movimientos_table(data: &[Movimiento]) -> comfy_table::Table {
    let rows = data
        .iter()
        .map(|m| {
            let sign = if m.monto > Decimal::ZERO { "+" } else { "-" };
            vec![
                m.fecha.clone(),
                m.tipo.to_string(),
                format!("{}{}", sign, fmt_money(&m.monto, m.tipo.moneda())),
                m.descripcion.clone().unwrap_or_default(),
            ]
        })
        .collect();
    pretty_table(&["Date", "Kind", "Amount", "Note"], rows)
}

/// Latest movimientos first, optionally for one kind.
pub fn load_movimientos(
    conn: &Connection,
    kind: Option<SavingsKind>,
    limit: usize,
) -> Result<Vec<Movimiento>> {
    let mut stmt = conn.prepare(
        "SELECT id, tipo, monto, descripcion, fecha FROM movimientos_ahorro
         WHERE ?1 IS NULL OR tipo=?1
         ORDER BY fecha DESC, id DESC LIMIT ?2",
    )?;
    let mut rows = stmt.query(params![kind.map(|k| k.as_str()), limit as i64])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        let id: i64 = r.get(0)?;
        let tipo: String = r.get(1)?;
        let monto: String = r.get(2)?;
        out.push(Movimiento {
            id,
            tipo: tipo.parse()?,
            monto: monto
                .parse()
                .with_context(|| format!("Invalid amount '{}' in movement {}", monto, id))?,
            descripcion: r.get(3)?,
            fecha: r.get(4)?,
        });
    }
    Ok(out)
}
