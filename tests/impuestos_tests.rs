// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use gastos::commands::impuestos::{self, load_impuestos};
use gastos::ledger::{impuestos_del_mes, sum_impuestos};
use gastos::utils::set_setting;
use gastos::{cli, db};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn.execute("INSERT INTO tarjetas(nombre, tipo) VALUES ('Visa', 'visa')", [])
        .unwrap();
    set_setting(&conn, "current_month", "2025-05").unwrap();
    conn
}

fn run(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut full = vec!["gastos", "tax"];
    full.extend_from_slice(args);
    let m = cli::build_cli().get_matches_from(full);
    impuestos::handle(conn, m.subcommand().unwrap().1)
}

#[test]
fn add_defaults_to_the_navigated_month() {
    let conn = setup();
    run(&conn, &["add", "--desc", " IVA ", "--amount", "1500.50", "--card", "Visa"]).unwrap();
    run(&conn, &["add", "--desc", "Sellos", "--amount", "300", "--month", "2025-06"]).unwrap();

    let all = load_impuestos(&conn).unwrap();
    let iva = all.iter().find(|i| i.descripcion == "IVA").unwrap();
    assert_eq!(iva.mes, "2025-05");
    assert_eq!(iva.tarjeta_id, Some(1));

    let mayo = impuestos_del_mes(&all, "2025-05");
    assert_eq!(mayo.len(), 1);
    assert_eq!(sum_impuestos(&mayo), "1500.50".parse::<Decimal>().unwrap());
    run(&conn, &["list"]).unwrap();
}

#[test]
fn add_validates_its_fields() {
    let conn = setup();
    assert!(run(&conn, &["add", "--desc", "  ", "--amount", "10"]).is_err());
    assert!(run(&conn, &["add", "--desc", "IVA", "--amount", "0"]).is_err());
    assert!(run(&conn, &["add", "--desc", "IVA", "--amount", "10", "--month", "2025-13"]).is_err());
    assert!(run(&conn, &["add", "--desc", "IVA", "--amount", "10", "--card", "Amex"]).is_err());
    assert!(load_impuestos(&conn).unwrap().is_empty());
}

#[test]
fn edit_updates_fields_and_rejects_blank_text() {
    let conn = setup();
    run(&conn, &["add", "--desc", "IVA", "--amount", "100", "--card", "Visa"]).unwrap();
    run(
        &conn,
        &["edit", "--id", "1", "--amount", "250", "--month", "2025-07", "--no-card"],
    )
    .unwrap();
    let imp = &load_impuestos(&conn).unwrap()[0];
    assert_eq!(imp.monto, Decimal::from(250));
    assert_eq!(imp.mes, "2025-07");
    assert_eq!(imp.tarjeta_id, None);

    assert!(run(&conn, &["edit", "--id", "1", "--desc", " "]).is_err());
    assert_eq!(load_impuestos(&conn).unwrap()[0].descripcion, "IVA");
    assert!(run(&conn, &["edit", "--id", "9", "--amount", "1"]).is_err());
}

#[test]
fn rm_deletes_and_reports_missing_ids() {
    let conn = setup();
    run(&conn, &["add", "--desc", "IVA", "--amount", "100"]).unwrap();
    run(&conn, &["rm", "--id", "1"]).unwrap();
    assert!(load_impuestos(&conn).unwrap().is_empty());
    assert!(run(&conn, &["rm", "--id", "1"]).is_err());
}
