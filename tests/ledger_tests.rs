// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use gastos::ledger::{
    self, AlertLevel, BudgetLevel, applies_to_month, gastos_del_mes, installment_number,
    monthly_amount, pending_installments, projection,
};
use gastos::models::{CardKind, Gasto, Impuesto, Moneda, Tarjeta};
use rust_decimal::Decimal;
use std::str::FromStr;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn gasto(id: i64, desc: &str, monto: &str, mes: &str) -> Gasto {
    Gasto {
        id,
        tarjeta_id: None,
        categoria_id: None,
        descripcion: desc.to_string(),
        monto: dec(monto),
        moneda: Moneda::Ars,
        cuotas: 1,
        cuota_actual: 1,
        fecha: NaiveDate::parse_from_str(&format!("{}-10", mes), "%Y-%m-%d").unwrap(),
        mes_facturacion: mes.to_string(),
        es_fijo: false,
        tag_ids: vec![],
        pagado: false,
    }
}

fn fijo(id: i64, desc: &str, monto: &str, mes: &str) -> Gasto {
    Gasto {
        es_fijo: true,
        ..gasto(id, desc, monto, mes)
    }
}

fn en_cuotas(id: i64, desc: &str, monto: &str, mes: &str, cuotas: u32) -> Gasto {
    Gasto {
        cuotas,
        ..gasto(id, desc, monto, mes)
    }
}

fn tarjeta(id: i64, nombre: &str, cierre: Option<u32>) -> Tarjeta {
    Tarjeta {
        id,
        nombre: nombre.to_string(),
        tipo: CardKind::Visa,
        banco: None,
        digitos: None,
        cierre,
    }
}

#[test]
fn installment_amount_is_split_evenly() {
    let g = en_cuotas(1, "Heladera", "1200", "2025-03", 6);
    assert_eq!(monthly_amount(&g), dec("200"));
    assert_eq!(monthly_amount(&gasto(2, "Pan", "150", "2025-03")), dec("150"));
}

#[test]
fn membership_rules_per_kind() {
    let plan = en_cuotas(1, "TV", "600", "2025-11", 3);
    assert!(!applies_to_month(&plan, "2025-10").unwrap());
    assert!(applies_to_month(&plan, "2025-11").unwrap());
    assert!(applies_to_month(&plan, "2026-01").unwrap());
    assert!(!applies_to_month(&plan, "2026-02").unwrap());

    let f = fijo(2, "Alquiler", "300000", "2025-06");
    assert!(!applies_to_month(&f, "2025-05").unwrap());
    assert!(applies_to_month(&f, "2027-01").unwrap());

    let once = gasto(3, "Cena", "20000", "2025-06");
    assert!(applies_to_month(&once, "2025-06").unwrap());
    assert!(!applies_to_month(&once, "2025-07").unwrap());
}

#[test]
fn copied_fixed_expense_supersedes_the_original() {
    let gastos = vec![
        fijo(1, "Internet", "20000", "2025-01"),
        fijo(2, "Internet", "25000", "2025-03"),
        gasto(3, "Cine", "8000", "2025-03"),
    ];
    let feb = gastos_del_mes(&gastos, "2025-02").unwrap();
    assert_eq!(feb.iter().map(|g| g.id).collect::<Vec<_>>(), vec![1]);

    let abr = gastos_del_mes(&gastos, "2025-04").unwrap();
    assert_eq!(abr.len(), 1);
    assert_eq!(abr[0].monto, dec("25000"));
}

#[test]
fn fixed_expenses_sharing_a_name_in_one_month_all_count() {
    let usd = Gasto {
        moneda: Moneda::Usd,
        ..fijo(2, "Seguro", "50", "2025-01")
    };
    let gastos = vec![
        fijo(1, "Seguro", "10000", "2025-01"),
        usd,
        fijo(3, "Seguro", "4000", "2025-01"),
    ];
    let ene = gastos_del_mes(&gastos, "2025-01").unwrap();
    assert_eq!(ene.iter().map(|g| g.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    let (ars, usd) = ledger::sum_by_moneda(&ene);
    assert_eq!(ars, dec("14000"));
    assert_eq!(usd, dec("50"));

    // A later ARS copy replaces both ARS rows but leaves the USD one alone.
    let mut copied = gastos.clone();
    copied.push(fijo(4, "Seguro", "11000", "2025-02"));
    let feb = gastos_del_mes(&copied, "2025-02").unwrap();
    assert_eq!(feb.iter().map(|g| g.id).collect::<Vec<_>>(), vec![2, 4]);
}

#[test]
fn huge_installment_counts_do_not_overflow() {
    let plan = en_cuotas(1, "Raro", "1000", "2025-01", u32::MAX);
    assert_eq!(installment_number(&plan, "2025-03").unwrap(), 3);
    assert!(applies_to_month(&plan, "2030-01").unwrap());
    assert!(pending_installments(&[plan], "2025-03").is_err());
}

#[test]
fn installment_number_is_clamped() {
    let plan = en_cuotas(1, "Notebook", "900", "2025-01", 3);
    assert_eq!(installment_number(&plan, "2024-11").unwrap(), 0);
    assert_eq!(installment_number(&plan, "2025-02").unwrap(), 2);
    assert_eq!(installment_number(&plan, "2025-09").unwrap(), 3);
}

#[test]
fn month_totals_add_taxes_and_convert_dollars() {
    let mut usd = gasto(2, "Spotify", "10", "2025-05");
    usd.moneda = Moneda::Usd;
    let gastos = vec![fijo(1, "Alquiler", "100000", "2025-05"), usd];
    let impuestos = vec![Impuesto {
        id: 1,
        tarjeta_id: None,
        descripcion: "Sellos".into(),
        monto: dec("1500"),
        mes: "2025-05".into(),
    }];
    let del_mes = gastos_del_mes(&gastos, "2025-05").unwrap();
    let imp = ledger::impuestos_del_mes(&impuestos, "2025-05");
    let t = ledger::month_totals(&del_mes, &imp, dec("1000"));
    assert_eq!(t.ars, dec("100000"));
    assert_eq!(t.usd, dec("10"));
    assert_eq!(t.fijos_ars, dec("100000"));
    assert_eq!(t.total_pagar, dec("101500"));
    assert_eq!(t.usd_en_pesos, dec("10000"));
}

#[test]
fn last_installments_do_not_come_next_month() {
    let gastos = vec![
        en_cuotas(1, "Zapatillas", "300", "2025-01", 3),
        en_cuotas(2, "Silla", "400", "2025-03", 2),
        fijo(3, "Gym", "5000", "2025-01"),
    ];
    let nn = ledger::not_next_month(&gastos, "2025-03").unwrap();
    assert_eq!(nn.cantidad, 1);
    assert_eq!(nn.gastos[0].id, 1);
    assert_eq!(nn.total_ars, dec("100"));
}

#[test]
fn month_difference_compares_with_next_month() {
    let gastos = vec![
        gasto(1, "Super", "1000", "2025-08"),
        fijo(2, "Luz", "500", "2025-08"),
    ];
    let c = ledger::month_difference(&gastos, &[], "2025-08", dec("1000")).unwrap();
    assert_eq!(c.actual.total, dec("1500"));
    assert_eq!(c.proximo.mes, "2025-09");
    assert_eq!(c.proximo.total, dec("500"));
    assert_eq!(c.diferencia, dec("1000"));
}

#[test]
fn budget_levels_follow_thresholds() {
    assert!(ledger::budget_status(dec("10"), Decimal::ZERO).is_none());
    let b = ledger::budget_status(dec("79"), dec("100")).unwrap();
    assert_eq!(b.level, BudgetLevel::Ok);
    let b = ledger::budget_status(dec("80"), dec("100")).unwrap();
    assert_eq!(b.level, BudgetLevel::Warning);
    let b = ledger::budget_status(dec("120"), dec("100")).unwrap();
    assert_eq!(b.level, BudgetLevel::Danger);
    assert_eq!(b.remaining, dec("-20"));
    assert_eq!(b.remaining_label(Moneda::Ars), "over by $ 20.00");

    let b = ledger::budget_status(dec("30"), dec("100")).unwrap();
    assert_eq!(b.remaining_label(Moneda::Usd), "remaining U$S 70.00");
}

#[test]
fn alerts_for_closing_cards_and_budget() {
    let cards = vec![
        tarjeta(1, "Visa Galicia", Some(15)),
        tarjeta(2, "Master BBVA", Some(10)),
        tarjeta(3, "Amex", Some(20)),
        tarjeta(4, "Sin cierre", None),
    ];
    let budget = ledger::budget_status(dec("95"), dec("100")).unwrap();
    let alerts = ledger::alerts(&cards, 10, Some(&budget));
    assert_eq!(alerts.len(), 3);
    assert_eq!(alerts[0].level, AlertLevel::Warning);
    assert!(alerts[0].title.contains("Visa Galicia"));
    assert_eq!(alerts[1].level, AlertLevel::Danger);
    assert_eq!(alerts[2].title, "Close to the budget limit");

    let low = ledger::budget_status(dec("89"), dec("100")).unwrap();
    assert!(ledger::alerts(&[], 1, Some(&low)).is_empty());
}

#[test]
fn card_breakdown_adds_cash_row() {
    let cards = vec![tarjeta(1, "Visa", None)];
    let mut en_visa = gasto(1, "Nafta", "50", "2025-02");
    en_visa.tarjeta_id = Some(1);
    let gastos = vec![en_visa, gasto(2, "Feria", "20", "2025-02")];
    let del_mes = gastos_del_mes(&gastos, "2025-02").unwrap();
    let rows = ledger::card_breakdown(&cards, &del_mes, &[]);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].ars, dec("50"));
    assert_eq!(rows[1].tarjeta, ledger::CASH_LABEL);
    assert_eq!(rows[1].ars, dec("20"));
}

#[test]
fn projection_counts_fixed_and_installments_only() {
    let gastos = vec![
        fijo(1, "Alquiler", "1000", "2025-01"),
        en_cuotas(2, "Celular", "600", "2025-02", 3),
        gasto(3, "Cena", "999", "2025-01"),
    ];
    let p = projection(&gastos, "2025-01", 5).unwrap();
    let totals: Vec<Decimal> = p.iter().map(|m| m.total_ars).collect();
    assert_eq!(
        totals,
        vec![dec("1000"), dec("1200"), dec("1200"), dec("1200"), dec("1000")]
    );
    assert_eq!(p[0].nombre, "Enero 2025");
}

#[test]
fn pending_installments_report_remaining_amounts() {
    let gastos = vec![
        en_cuotas(1, "Sillón", "1200", "2025-01", 12),
        en_cuotas(2, "Auriculares", "300", "2024-01", 3),
    ];
    let st = pending_installments(&gastos, "2025-04").unwrap();
    assert_eq!(st[0].cuota_actual, 4);
    assert_eq!(st[0].restante, dec("800"));
    assert_eq!(st[0].ultimo_mes, "2025-12");
    assert!(!st[0].is_finished());
    assert!(st[1].is_finished());
}
