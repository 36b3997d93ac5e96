// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::gastos::{NewGasto, insert_gasto, load_gastos};
use crate::ledger::gastos_del_mes;
use crate::models::Moneda;
use crate::utils::{
    add_months, current_month, fmt_money, load_profile, maybe_print_json, month_name,
    month_start, parse_decimal, pretty_table, set_setting,
};
use anyhow::{Result, anyhow};
use rusqlite::Connection;
use rust_decimal::Decimal;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", sub)) => show(conn, sub)?,
        Some(("profile", sub)) => {
            if let Some(n) = sub.get_one::<String>("name") {
                set_setting(conn, "profile_nombre", n.trim())?;
            }
            if let Some(e) = sub.get_one::<String>("email") {
                set_setting(conn, "profile_email", e.trim())?;
            }
            let p = load_profile(conn)?;
            println!("Profile: {} <{}>", p.nombre, p.email);
        }
        Some(("budget", sub)) => budget(conn, sub)?,
        Some(("copy-fixed", _)) => {
            let from = current_month(conn)?;
            let to = add_months(&from, 1)?;
            let copied = copy_fixed(conn, &from)?;
            if copied > 0 {
                println!("Copied {} fixed expenses to {}", copied, month_name(&to)?);
            } else {
                println!("Every fixed expense already exists in {}", month_name(&to)?);
            }
        }
        _ => {}
    }
    Ok(())
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let p = load_profile(conn)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &p)? {
        return Ok(());
    }
    let budget = |d: &Decimal, moneda: Moneda| {
        if d.is_zero() {
            "off".to_string()
        } else {
            fmt_money(d, moneda)
        }
    };
    let rows = vec![
        vec!["Name".into(), p.nombre.clone()],
        vec!["Email".into(), p.email.clone()],
        vec!["Month".into(), month_name(&current_month(conn)?)?],
        vec!["Budget ARS".into(), budget(&p.budget_ars, Moneda::Ars)],
        vec!["Budget USD".into(), budget(&p.budget_usd, Moneda::Usd)],
        vec!["Savings pesos".into(), fmt_money(&p.ahorro_pesos, Moneda::Ars)],
        vec!["Savings USD".into(), fmt_money(&p.ahorro_usd, Moneda::Usd)],
    ];
    println!("{}", pretty_table(&["Setting", "Value"], rows));
    Ok(())
}

fn budget(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    if sub.get_flag("off") {
        set_setting(conn, "budget_ars", "0")?;
        set_setting(conn, "budget_usd", "0")?;
        println!("Budget disabled");
        return Ok(());
    }
    let ars = sub.get_one::<String>("ars");
    let usd = sub.get_one::<String>("usd");
    if ars.is_none() && usd.is_none() {
        return Err(anyhow!("Pass --ars and/or --usd, or --off"));
    }
    for (key, raw, moneda) in [("budget_ars", ars, Moneda::Ars), ("budget_usd", usd, Moneda::Usd)] {
        if let Some(raw) = raw {
            let v = parse_decimal(raw)?.max(Decimal::ZERO);
            set_setting(conn, key, &v.to_string())?;
            println!("Monthly budget {} set to {}", moneda, fmt_money(&v, moneda));
        }
    }
    Ok(())
}

/// Copy the fixed expenses in effect for `from` into the following month.
///
/// A fixed expense is skipped when one with the same description is already
/// billed in the target month. Returns how many were copied.
pub fn copy_fixed(conn: &mut Connection, from: &str) -> Result<usize> {
    let to = add_months(from, 1)?;
    let fecha = month_start(&to)?;
    let gastos = load_gastos(conn)?;
    let fijos = gastos_del_mes(&gastos, from)?
        .into_iter()
        .filter(|g| g.es_fijo)
        .collect::<Vec<_>>();

    let tx = conn.transaction()?;
    let mut copied = 0;
    for g in fijos {
        let exists = gastos
            .iter()
            .any(|x| x.es_fijo && x.descripcion == g.descripcion && x.mes_facturacion == to);
        if exists {
            tracing::debug!(descripcion = %g.descripcion, mes = %to, "fixed expense already present");
            continue;
        }
        insert_gasto(
            &tx,
            &NewGasto {
                tarjeta_id: g.tarjeta_id,
                categoria_id: g.categoria_id,
                descripcion: g.descripcion.clone(),
                monto: g.monto,
                moneda: g.moneda,
                cuotas: 1,
                fecha,
                mes_facturacion: to.clone(),
                es_fijo: true,
                tag_ids: g.tag_ids.clone(),
                pagado: false,
            },
        )?;
        copied += 1;
    }
    tx.commit()?;
    tracing::info!(copied, from, to = %to, "copied fixed expenses");
    Ok(copied)
}
