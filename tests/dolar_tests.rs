// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use gastos::commands::dolar::{self, store_rate};
use gastos::utils::{DOLAR_FALLBACK, dolar_rate, get_setting, today};
use gastos::{cli, db};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn
}

fn run(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut full = vec!["gastos", "dolar"];
    full.extend_from_slice(args);
    let m = cli::build_cli().get_matches_from(full);
    dolar::handle(conn, m.subcommand().unwrap().1)
}

#[test]
fn rate_falls_back_until_one_is_cached() {
    let conn = setup();
    assert_eq!(dolar_rate(&conn, None).unwrap(), DOLAR_FALLBACK);
    assert_eq!(DOLAR_FALLBACK, Decimal::from(1050));

    run(&conn, &["set", "--rate", "1185.5"]).unwrap();
    assert_eq!(dolar_rate(&conn, None).unwrap(), "1185.5".parse::<Decimal>().unwrap());
    assert_eq!(get_setting(&conn, "dolar_fuente").unwrap().as_deref(), Some("manual"));
    assert_eq!(
        get_setting(&conn, "dolar_fecha").unwrap(),
        Some(today().to_string())
    );
}

#[test]
fn explicit_rate_wins_over_the_cache() {
    let conn = setup();
    store_rate(&conn, Decimal::from(1200), "dolarapi").unwrap();
    let over = "1300".to_string();
    assert_eq!(dolar_rate(&conn, Some(&over)).unwrap(), Decimal::from(1300));
    assert!(dolar_rate(&conn, Some(&"0".to_string())).is_err());
    assert!(dolar_rate(&conn, Some(&"mucho".to_string())).is_err());
}

#[test]
fn non_positive_rates_are_not_stored() {
    let conn = setup();
    assert!(store_rate(&conn, Decimal::ZERO, "manual").is_err());
    assert!(store_rate(&conn, Decimal::from(-10), "manual").is_err());
    assert!(run(&conn, &["set", "--rate=-1"]).is_err());
    assert_eq!(get_setting(&conn, "dolar_venta").unwrap(), None);
    assert_eq!(dolar_rate(&conn, None).unwrap(), DOLAR_FALLBACK);
}
