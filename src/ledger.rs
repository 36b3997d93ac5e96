// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Month-scoped derived totals over gastos and impuestos.
//!
//! Everything here works on in-memory slices loaded by the command modules,
//! so it can be tested without a database.

use crate::models::{Categoria, Gasto, Impuesto, Meta, Moneda, Tarjeta};
use crate::utils::{add_months, fmt_money, month_name, months_between};
use anyhow::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

pub const CASH_LABEL: &str = "Efectivo";
pub const UNCATEGORIZED: &str = "Otros";

/// Amount billed each month: one installment for split purchases.
pub fn monthly_amount(g: &Gasto) -> Decimal {
    if g.cuotas > 1 {
        g.monto / Decimal::from(g.cuotas)
    } else {
        g.monto
    }
}

pub fn applies_to_month(g: &Gasto, mes: &str) -> Result<bool> {
    if g.es_fijo {
        return Ok(g.mes_facturacion.as_str() <= mes);
    }
    if g.cuotas > 1 {
        let diff = months_between(&g.mes_facturacion, mes)?;
        return Ok(diff >= 0 && (diff as u32) < g.cuotas);
    }
    Ok(g.mes_facturacion == mes)
}

/// Gastos billed in `mes`, in input order.
///
/// Fixed expenses repeat every month from their billing month on. A fixed
/// expense is dropped once a copy with the same description and currency has
/// a later billing month not after `mes`. Copies billed in the same month all
/// count.
pub fn gastos_del_mes<'a>(gastos: &'a [Gasto], mes: &str) -> Result<Vec<&'a Gasto>> {
    let mut applicable: Vec<&Gasto> = Vec::new();
    let mut latest: HashMap<(&str, Moneda), &str> = HashMap::new();
    for g in gastos {
        if !applies_to_month(g, mes)? {
            continue;
        }
        if g.es_fijo {
            let slot = latest
                .entry((g.descripcion.as_str(), g.moneda))
                .or_insert(g.mes_facturacion.as_str());
            if g.mes_facturacion.as_str() > *slot {
                *slot = g.mes_facturacion.as_str();
            }
        }
        applicable.push(g);
    }
    Ok(applicable
        .into_iter()
        .filter(|g| {
            !g.es_fijo
                || latest
                    .get(&(g.descripcion.as_str(), g.moneda))
                    .is_none_or(|m| *m == g.mes_facturacion.as_str())
        })
        .collect())
}

pub fn impuestos_del_mes<'a>(impuestos: &'a [Impuesto], mes: &str) -> Vec<&'a Impuesto> {
    impuestos.iter().filter(|i| i.mes == mes).collect()
}

/// 1-based installment billed in `mes`, clamped to `0..=cuotas`.
pub fn installment_number(g: &Gasto, mes: &str) -> Result<u32> {
    if g.cuotas <= 1 {
        return Ok(1);
    }
    let diff = months_between(&g.mes_facturacion, mes)?;
    let n = (i64::from(diff) + 1).clamp(0, i64::from(g.cuotas));
    Ok(u32::try_from(n)?)
}

pub fn sum_by_moneda(gastos: &[&Gasto]) -> (Decimal, Decimal) {
    let mut ars = Decimal::ZERO;
    let mut usd = Decimal::ZERO;
    for g in gastos {
        match g.moneda {
            Moneda::Ars => ars += monthly_amount(g),
            Moneda::Usd => usd += monthly_amount(g),
        }
    }
    (ars, usd)
}

pub fn sum_impuestos(impuestos: &[&Impuesto]) -> Decimal {
    impuestos.iter().map(|i| i.monto).sum()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthTotals {
    pub ars: Decimal,
    pub usd: Decimal,
    pub fijos_ars: Decimal,
    pub impuestos: Decimal,
    pub total_pagar: Decimal,
    pub usd_en_pesos: Decimal,
}

pub fn month_totals(del_mes: &[&Gasto], imp_mes: &[&Impuesto], dolar: Decimal) -> MonthTotals {
    let (ars, usd) = sum_by_moneda(del_mes);
    let fijos_ars = del_mes
        .iter()
        .filter(|g| g.es_fijo && g.moneda == Moneda::Ars)
        .map(|g| monthly_amount(g))
        .sum();
    let impuestos = sum_impuestos(imp_mes);
    MonthTotals {
        ars,
        usd,
        fijos_ars,
        impuestos,
        total_pagar: ars + impuestos,
        usd_en_pesos: usd * dolar,
    }
}

#[derive(Debug, Serialize)]
pub struct NotNextMonth<'a> {
    pub gastos: Vec<&'a Gasto>,
    pub cantidad: usize,
    pub total_ars: Decimal,
    pub total_usd: Decimal,
}

/// Non-fixed gastos billed in `mes` that stop before the following month.
pub fn not_next_month<'a>(gastos: &'a [Gasto], mes: &str) -> Result<NotNextMonth<'a>> {
    let actuales = gastos_del_mes(gastos, mes)?;
    let proximo = gastos_del_mes(gastos, &add_months(mes, 1)?)?;
    let no_vienen: Vec<&Gasto> = actuales
        .into_iter()
        .filter(|g| !g.es_fijo && !proximo.iter().any(|p| p.id == g.id))
        .collect();
    let (total_ars, total_usd) = sum_by_moneda(&no_vienen);
    Ok(NotNextMonth {
        cantidad: no_vienen.len(),
        gastos: no_vienen,
        total_ars,
        total_usd,
    })
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthSide {
    pub mes: String,
    pub ars: Decimal,
    pub usd: Decimal,
    pub imp: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthComparison {
    pub actual: MonthSide,
    pub proximo: MonthSide,
    pub diferencia: Decimal,
    pub diferencia_ars: Decimal,
    pub diferencia_usd: Decimal,
}

fn month_side(
    gastos: &[Gasto],
    impuestos: &[Impuesto],
    mes: &str,
    dolar: Decimal,
) -> Result<MonthSide> {
    let (ars, usd) = sum_by_moneda(&gastos_del_mes(gastos, mes)?);
    let imp = sum_impuestos(&impuestos_del_mes(impuestos, mes));
    Ok(MonthSide {
        mes: mes.to_string(),
        ars,
        usd,
        imp,
        total: ars + imp + usd * dolar,
    })
}

/// Current month against the next one, with USD expressed in pesos.
pub fn month_difference(
    gastos: &[Gasto],
    impuestos: &[Impuesto],
    mes: &str,
    dolar: Decimal,
) -> Result<MonthComparison> {
    let actual = month_side(gastos, impuestos, mes, dolar)?;
    let proximo = month_side(gastos, impuestos, &add_months(mes, 1)?, dolar)?;
    Ok(MonthComparison {
        diferencia: actual.total - proximo.total,
        diferencia_ars: actual.ars - proximo.ars,
        diferencia_usd: actual.usd - proximo.usd,
        actual,
        proximo,
    })
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BudgetLevel {
    Ok,
    Warning,
    Danger,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BudgetProgress {
    pub budget: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub pct: Decimal,
    pub level: BudgetLevel,
}

impl BudgetProgress {
    /// "remaining $ X" while under budget, "over by $ X" past it.
    pub fn remaining_label(&self, moneda: Moneda) -> String {
        if self.remaining < Decimal::ZERO {
            format!("over by {}", fmt_money(&self.remaining, moneda))
        } else {
            format!("remaining {}", fmt_money(&self.remaining, moneda))
        }
    }
}

/// `None` when no budget is configured.
pub fn budget_status(spent: Decimal, budget: Decimal) -> Option<BudgetProgress> {
    if budget <= Decimal::ZERO {
        return None;
    }
    let pct = spent / budget * Decimal::ONE_HUNDRED;
    let level = if pct >= Decimal::ONE_HUNDRED {
        BudgetLevel::Danger
    } else if pct >= Decimal::from(80) {
        BudgetLevel::Warning
    } else {
        BudgetLevel::Ok
    };
    Some(BudgetProgress {
        budget,
        spent,
        remaining: budget - spent,
        pct,
        level,
    })
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Warning,
    Danger,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Alert {
    pub level: AlertLevel,
    pub title: String,
    pub detail: String,
}

pub fn alerts(tarjetas: &[Tarjeta], today_day: u32, budget: Option<&BudgetProgress>) -> Vec<Alert> {
    let mut out = Vec::new();
    for t in tarjetas {
        let Some(cierre) = t.cierre else { continue };
        let diff = cierre as i64 - today_day as i64;
        if diff > 0 && diff <= 5 {
            out.push(Alert {
                level: AlertLevel::Warning,
                title: format!("{} closes soon", t.nombre),
                detail: format!("{} days left", diff),
            });
        } else if diff == 0 {
            out.push(Alert {
                level: AlertLevel::Danger,
                title: format!("{} closes TODAY", t.nombre),
                detail: "last day".to_string(),
            });
        }
    }
    if let Some(b) = budget.filter(|b| b.pct >= Decimal::from(90)) {
        let over = b.pct >= Decimal::ONE_HUNDRED;
        out.push(Alert {
            level: if over {
                AlertLevel::Danger
            } else {
                AlertLevel::Warning
            },
            title: if over {
                "Budget exceeded".to_string()
            } else {
                "Close to the budget limit".to_string()
            },
            detail: format!(
                "{} / {}",
                fmt_money(&b.spent, Moneda::Ars),
                fmt_money(&b.budget, Moneda::Ars)
            ),
        });
    }
    out
}

/// ARS spend per category name, largest first.
pub fn category_breakdown(del_mes: &[&Gasto], categorias: &[Categoria]) -> Vec<(String, Decimal)> {
    let names: HashMap<i64, &str> = categorias.iter().map(|c| (c.id, c.nombre.as_str())).collect();
    let mut agg: HashMap<String, Decimal> = HashMap::new();
    for g in del_mes.iter().filter(|g| g.moneda == Moneda::Ars) {
        let name = g
            .categoria_id
            .and_then(|id| names.get(&id).copied())
            .unwrap_or(UNCATEGORIZED);
        *agg.entry(name.to_string()).or_insert(Decimal::ZERO) += monthly_amount(g);
    }
    let mut items: Vec<_> = agg.into_iter().collect();
    items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    items
}

pub fn top_gastos<'a>(del_mes: &[&'a Gasto], n: usize) -> Vec<&'a Gasto> {
    let mut ars: Vec<&Gasto> = del_mes
        .iter()
        .copied()
        .filter(|g| g.moneda == Moneda::Ars)
        .collect();
    ars.sort_by(|a, b| monthly_amount(b).cmp(&monthly_amount(a)));
    ars.truncate(n);
    ars
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CardTotals {
    pub tarjeta: String,
    pub ars: Decimal,
    pub usd: Decimal,
    pub impuestos: Decimal,
}

pub fn card_breakdown(
    tarjetas: &[Tarjeta],
    del_mes: &[&Gasto],
    imp_mes: &[&Impuesto],
) -> Vec<CardTotals> {
    let totals_for = |id: Option<i64>| {
        let gs: Vec<&Gasto> = del_mes
            .iter()
            .copied()
            .filter(|g| g.tarjeta_id == id)
            .collect();
        let is: Vec<&Impuesto> = imp_mes
            .iter()
            .copied()
            .filter(|i| i.tarjeta_id == id)
            .collect();
        let (ars, usd) = sum_by_moneda(&gs);
        (ars, usd, sum_impuestos(&is))
    };
    let mut out: Vec<CardTotals> = tarjetas
        .iter()
        .map(|t| {
            let (ars, usd, impuestos) = totals_for(Some(t.id));
            CardTotals {
                tarjeta: t.nombre.clone(),
                ars,
                usd,
                impuestos,
            }
        })
        .collect();
    let (ars, usd, impuestos) = totals_for(None);
    if !(ars.is_zero() && usd.is_zero() && impuestos.is_zero()) {
        out.push(CardTotals {
            tarjeta: CASH_LABEL.to_string(),
            ars,
            usd,
            impuestos,
        });
    }
    out
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProjectionMonth {
    pub mes: String,
    pub nombre: String,
    pub total_ars: Decimal,
    pub total_usd: Decimal,
}

/// Committed spend (fixed expenses and installments) for `months` months from `start`.
pub fn projection(gastos: &[Gasto], start: &str, months: u32) -> Result<Vec<ProjectionMonth>> {
    let mut out = Vec::with_capacity(months as usize);
    for i in 0..months {
        let mes = add_months(start, i as i32)?;
        let comprometidos: Vec<&Gasto> = gastos_del_mes(gastos, &mes)?
            .into_iter()
            .filter(|g| g.es_fijo || g.cuotas > 1)
            .collect();
        let (total_ars, total_usd) = sum_by_moneda(&comprometidos);
        out.push(ProjectionMonth {
            nombre: month_name(&mes)?,
            mes,
            total_ars,
            total_usd,
        });
    }
    Ok(out)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InstallmentStatus {
    pub gasto_id: i64,
    pub descripcion: String,
    pub moneda: Moneda,
    pub cuotas: u32,
    pub cuota_actual: u32,
    pub valor_cuota: Decimal,
    pub restante: Decimal,
    pub ultimo_mes: String,
    pub terminado: bool,
}

impl InstallmentStatus {
    /// The last installment was billed before the month it was computed for.
    pub fn is_finished(&self) -> bool {
        self.terminado
    }
}

pub fn pending_installments(gastos: &[Gasto], mes: &str) -> Result<Vec<InstallmentStatus>> {
    let mut out = Vec::new();
    for g in gastos.iter().filter(|g| g.cuotas > 1 && !g.es_fijo) {
        let valor_cuota = monthly_amount(g);
        let cuota_actual = installment_number(g, mes)?;
        let ultimo_mes = add_months(&g.mes_facturacion, i32::try_from(g.cuotas - 1)?)?;
        out.push(InstallmentStatus {
            gasto_id: g.id,
            descripcion: g.descripcion.clone(),
            moneda: g.moneda,
            cuotas: g.cuotas,
            cuota_actual,
            valor_cuota,
            restante: valor_cuota * Decimal::from(g.cuotas - cuota_actual),
            terminado: months_between(&ultimo_mes, mes)? > 0,
            ultimo_mes,
        });
    }
    Ok(out)
}

pub fn meta_percent(meta: &Meta) -> Decimal {
    if meta.objetivo <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (meta.progreso / meta.objetivo * Decimal::ONE_HUNDRED).min(Decimal::ONE_HUNDRED)
}
