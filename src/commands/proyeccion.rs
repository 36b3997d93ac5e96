// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::gastos::load_gastos;
use crate::ledger::{
    InstallmentStatus, ProjectionMonth, gastos_del_mes, monthly_amount, pending_installments,
    projection, sum_by_moneda,
};
use crate::models::{Gasto, Moneda};
use crate::utils::{fmt_money, maybe_print_json, month_arg, month_name, pretty_table};
use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Serialize)]
struct ProjectionReport<'a> {
    mes: String,
    meses: Vec<ProjectionMonth>,
    fijos: Vec<&'a Gasto>,
    fijos_ars: Decimal,
    fijos_usd: Decimal,
    cuotas: Vec<InstallmentStatus>,
}

pub fn handle(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let mes = month_arg(conn, sub)?;
    let months = *sub.get_one::<u32>("months").unwrap();
    let gastos = load_gastos(conn)?;

    let fijos: Vec<&Gasto> = gastos_del_mes(&gastos, &mes)?
        .into_iter()
        .filter(|g| g.es_fijo)
        .collect();
    let (fijos_ars, fijos_usd) = sum_by_moneda(&fijos);
    let mut cuotas = pending_installments(&gastos, &mes)?;
    if !sub.get_flag("all") {
        cuotas.retain(|c| !c.is_finished());
    }
    let report = ProjectionReport {
        meses: projection(&gastos, &mes, months)?,
        mes,
        fijos,
        fijos_ars,
        fijos_usd,
        cuotas,
    };
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report)? {
        return Ok(());
    }

    let rows = report
        .meses
        .iter()
        .map(|p| {
            vec![
                p.nombre.clone(),
                fmt_money(&p.total_ars, Moneda::Ars),
                if p.total_usd > Decimal::ZERO {
                    fmt_money(&p.total_usd, Moneda::Usd)
                } else {
                    String::new()
                },
            ]
        })
        .collect();
    println!("{}", pretty_table(&["Month", "Committed ARS", "Committed USD"], rows));

    if report.fijos.is_empty() {
        println!("No fixed expenses in {}", month_name(&report.mes)?);
    } else {
        let rows = report
            .fijos
            .iter()
            .map(|g| {
                vec![
                    g.descripcion.clone(),
                    fmt_money(&monthly_amount(g), g.moneda),
                    g.mes_facturacion.clone(),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Fixed expense", "Amount", "Since"], rows));
        println!(
            "Fixed total: {} + {}",
            fmt_money(&report.fijos_ars, Moneda::Ars),
            fmt_money(&report.fijos_usd, Moneda::Usd)
        );
    }

    if report.cuotas.is_empty() {
        println!("No installment plans pending");
    } else {
        let rows = report
            .cuotas
            .iter()
            .map(|c| {
                vec![
                    c.descripcion.clone(),
                    format!("{}/{}", c.cuota_actual, c.cuotas),
                    fmt_money(&c.valor_cuota, c.moneda),
                    fmt_money(&c.restante, c.moneda),
                    c.ultimo_mes.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Installment plan", "Current", "Per month", "Remaining", "Last month"],
                rows
            )
        );
    }
    Ok(())
}
