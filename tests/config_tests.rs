// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use gastos::commands::config::{self, copy_fixed};
use gastos::commands::gastos::{NewGasto, insert_gasto, load_gastos};
use gastos::ledger::gastos_del_mes;
use gastos::models::Moneda;
use gastos::utils::load_profile;
use gastos::{cli, db};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn
}

fn add(conn: &Connection, desc: &str, monto: i64, mes: &str, fijo: bool, cuotas: u32) -> i64 {
    let fecha = NaiveDate::parse_from_str(&format!("{}-01", mes), "%Y-%m-%d").unwrap();
    insert_gasto(
        conn,
        &NewGasto {
            tarjeta_id: None,
            categoria_id: None,
            descripcion: desc.to_string(),
            monto: Decimal::from(monto),
            moneda: Moneda::Ars,
            cuotas,
            fecha,
            mes_facturacion: mes.to_string(),
            es_fijo: fijo,
            tag_ids: vec![],
            pagado: true,
        },
    )
    .unwrap()
}

#[test]
fn copy_fixed_moves_fixed_expenses_forward_once() {
    let mut conn = setup();
    conn.execute("INSERT INTO tags(nombre) VALUES ('casa')", []).unwrap();
    let alquiler = add(&conn, "Alquiler", 300000, "2025-01", true, 1);
    conn.execute(
        "INSERT INTO gasto_tags(gasto_id, tag_id) VALUES (?1, 1)",
        [alquiler],
    )
    .unwrap();
    add(&conn, "Internet", 20000, "2025-03", true, 1);
    add(&conn, "Cena", 15000, "2025-03", false, 1);

    assert_eq!(copy_fixed(&mut conn, "2025-03").unwrap(), 2);
    // second run finds both already present
    assert_eq!(copy_fixed(&mut conn, "2025-03").unwrap(), 0);

    let gastos = load_gastos(&conn).unwrap();
    let copies: Vec<_> = gastos
        .iter()
        .filter(|g| g.mes_facturacion == "2025-04")
        .collect();
    assert_eq!(copies.len(), 2);
    assert!(copies.iter().all(|g| g.es_fijo && !g.pagado && g.cuotas == 1));
    let copia = copies.iter().find(|g| g.descripcion == "Alquiler").unwrap();
    assert_eq!(copia.fecha.to_string(), "2025-04-01");
    assert_eq!(copia.tag_ids, vec![1]);

    // the copies replace the originals instead of doubling them
    let abril = gastos_del_mes(&gastos, "2025-04").unwrap();
    assert_eq!(abril.len(), 2);
}

#[test]
fn budget_is_stored_and_disabled() {
    let mut conn = setup();
    let m = cli::build_cli().get_matches_from(["gastos", "config", "budget", "--ars", "500000"]);
    config::handle(&mut conn, m.subcommand().unwrap().1).unwrap();
    let p = load_profile(&conn).unwrap();
    assert_eq!(p.budget_ars, Decimal::from(500000));
    assert_eq!(p.budget_usd, Decimal::ZERO);

    let m = cli::build_cli().get_matches_from(["gastos", "config", "budget", "--off"]);
    config::handle(&mut conn, m.subcommand().unwrap().1).unwrap();
    assert_eq!(load_profile(&conn).unwrap().budget_ars, Decimal::ZERO);

    let m = cli::build_cli().get_matches_from(["gastos", "config", "budget"]);
    assert!(config::handle(&mut conn, m.subcommand().unwrap().1).is_err());
}

#[test]
fn profile_fields_are_saved() {
    let mut conn = setup();
    let m = cli::build_cli().get_matches_from([
        "gastos",
        "config",
        "profile",
        "--name",
        " Ana ",
        "--email",
        "ana@example.com",
    ]);
    config::handle(&mut conn, m.subcommand().unwrap().1).unwrap();
    let p = load_profile(&conn).unwrap();
    assert_eq!(p.nombre, "Ana");
    assert_eq!(p.email, "ana@example.com");
}
