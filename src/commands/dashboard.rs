// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::{
    categorias::load_categorias, gastos::load_gastos, impuestos::load_impuestos,
    tarjetas::load_tarjetas,
};
use crate::ledger::{
    self, Alert, AlertLevel, BudgetLevel, BudgetProgress, CardTotals, MonthComparison,
    MonthTotals, monthly_amount,
};
use crate::models::Moneda;
use crate::utils::{
    dolar_rate, fmt_money, load_profile, maybe_print_json, month_arg, month_name, pretty_table,
    today,
};
use anyhow::Result;
use chrono::Datelike;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct TopGasto {
    pub id: i64,
    pub descripcion: String,
    pub monto: Decimal,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub mes: String,
    pub nombre: String,
    pub dolar: Decimal,
    pub cantidad: usize,
    pub totals: MonthTotals,
    pub budget_ars: Option<BudgetProgress>,
    pub budget_usd: Option<BudgetProgress>,
    pub alerts: Vec<Alert>,
    pub no_vienen_cantidad: usize,
    pub no_vienen_ars: Decimal,
    pub no_vienen_usd: Decimal,
    pub comparison: MonthComparison,
    pub categorias: Vec<(String, Decimal)>,
    pub top: Vec<TopGasto>,
    pub tarjetas: Vec<CardTotals>,
}

/// Everything the month summary shows, computed from the database.
pub fn build_summary(conn: &Connection, mes: &str, dolar: Decimal, today_day: u32) -> Result<Summary> {
    let gastos = load_gastos(conn)?;
    let impuestos = load_impuestos(conn)?;
    let tarjetas = load_tarjetas(conn)?;
    let categorias = load_categorias(conn)?;
    let profile = load_profile(conn)?;

    let del_mes = ledger::gastos_del_mes(&gastos, mes)?;
    let imp_mes = ledger::impuestos_del_mes(&impuestos, mes);
    let totals = ledger::month_totals(&del_mes, &imp_mes, dolar);
    let budget_ars = ledger::budget_status(totals.ars, profile.budget_ars);
    let budget_usd = ledger::budget_status(totals.usd, profile.budget_usd);
    let alerts = ledger::alerts(&tarjetas, today_day, budget_ars.as_ref());
    let no_vienen = ledger::not_next_month(&gastos, mes)?;

    Ok(Summary {
        mes: mes.to_string(),
        nombre: month_name(mes)?,
        dolar,
        cantidad: del_mes.len(),
        budget_ars,
        budget_usd,
        alerts,
        no_vienen_cantidad: no_vienen.cantidad,
        no_vienen_ars: no_vienen.total_ars,
        no_vienen_usd: no_vienen.total_usd,
        comparison: ledger::month_difference(&gastos, &impuestos, mes, dolar)?,
        categorias: ledger::category_breakdown(&del_mes, &categorias),
        top: ledger::top_gastos(&del_mes, 5)
            .into_iter()
            .map(|g| TopGasto {
                id: g.id,
                descripcion: g.descripcion.clone(),
                monto: monthly_amount(g),
            })
            .collect(),
        tarjetas: ledger::card_breakdown(&tarjetas, &del_mes, &imp_mes),
        totals,
    })
}

pub fn handle(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let mes = month_arg(conn, sub)?;
    let dolar = dolar_rate(conn, sub.get_one::<String>("dolar"))?;
    let s = build_summary(conn, &mes, dolar, today().day())?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
        return Ok(());
    }
    render(&s);
    Ok(())
}

fn money(d: &Decimal) -> String {
    fmt_money(d, Moneda::Ars)
}

fn render(s: &Summary) {
    println!("📊 {} · {} expenses · dolar {:.2}", s.nombre, s.cantidad, s.dolar);

    for a in &s.alerts {
        let icon = match a.level {
            AlertLevel::Danger => "🚨",
            AlertLevel::Warning => "⚠️",
        };
        println!("{} {}: {}", icon, a.title, a.detail);
    }

    let t = &s.totals;
    println!(
        "{}",
        pretty_table(
            &["Total ARS", "Taxes", "To pay", "Total USD", "USD in pesos", "Fixed"],
            vec![vec![
                money(&t.ars),
                money(&t.impuestos),
                money(&t.total_pagar),
                fmt_money(&t.usd, Moneda::Usd),
                money(&t.usd_en_pesos),
                money(&t.fijos_ars),
            ]],
        )
    );

    for (label, b, moneda) in [
        ("ARS", &s.budget_ars, Moneda::Ars),
        ("USD", &s.budget_usd, Moneda::Usd),
    ] {
        if let Some(b) = b {
            let state = match b.level {
                BudgetLevel::Ok => "ok",
                BudgetLevel::Warning => "warning",
                BudgetLevel::Danger => "over budget",
            };
            println!(
                "Budget {}: {} / {} ({:.0}%, {}) {}",
                label,
                fmt_money(&b.spent, moneda),
                fmt_money(&b.budget, moneda),
                b.pct,
                state,
                b.remaining_label(moneda)
            );
        }
    }

    if s.no_vienen_cantidad > 0 {
        println!(
            "Not coming next month: {} expenses, {} + {}",
            s.no_vienen_cantidad,
            money(&s.no_vienen_ars),
            fmt_money(&s.no_vienen_usd, Moneda::Usd)
        );
    }

    let c = &s.comparison;
    if c.actual.total > Decimal::ZERO {
        let sign = if c.diferencia > Decimal::ZERO { "-" } else { "+" };
        println!(
            "Next month ({}): {} vs {} now ({}{})",
            c.proximo.mes,
            money(&c.proximo.total),
            money(&c.actual.total),
            sign,
            money(&c.diferencia)
        );
    }

    if s.categorias.is_empty() {
        println!("No data this month");
    } else {
        let rows = s
            .categorias
            .iter()
            .map(|(name, amt)| vec![name.clone(), money(amt)])
            .collect();
        println!("{}", pretty_table(&["Category", "Spent (ARS)"], rows));
    }

    if !s.top.is_empty() {
        let rows = s
            .top
            .iter()
            .enumerate()
            .map(|(i, g)| vec![(i + 1).to_string(), g.descripcion.clone(), money(&g.monto)])
            .collect();
        println!("{}", pretty_table(&["#", "Top expenses", "Amount"], rows));
    }

    if !s.tarjetas.is_empty() {
        let rows = s
            .tarjetas
            .iter()
            .map(|c| {
                vec![
                    c.tarjeta.clone(),
                    money(&c.ars),
                    fmt_money(&c.usd, Moneda::Usd),
                    money(&c.impuestos),
                    money(&(c.ars + c.impuestos)),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Card", "ARS", "USD", "Taxes", "Total ARS"], rows)
        );
    }
}
