// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use gastos::commands::categorias::{self, load_categorias};
use gastos::commands::gastos::{NewGasto, insert_gasto, load_gasto};
use gastos::commands::tags::{self, load_tags};
use gastos::models::Moneda;
use gastos::{cli, db};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn
}

fn run(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut full = vec!["gastos"];
    full.extend_from_slice(args);
    let m = cli::build_cli().get_matches_from(full);
    match m.subcommand() {
        Some(("category", sub)) => categorias::handle(conn, sub),
        Some(("tag", sub)) => tags::handle(conn, sub),
        other => panic!("unexpected subcommand {:?}", other.map(|(n, _)| n)),
    }
}

fn gasto(conn: &Connection, categoria_id: Option<i64>, tag_ids: Vec<i64>) -> i64 {
    insert_gasto(
        conn,
        &NewGasto {
            tarjeta_id: None,
            categoria_id,
            descripcion: "Veterinaria".into(),
            monto: Decimal::from(18000),
            moneda: Moneda::Ars,
            cuotas: 1,
            fecha: NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            mes_facturacion: "2025-03".into(),
            es_fijo: false,
            tag_ids,
            pagado: false,
        },
    )
    .unwrap()
}

#[test]
fn removing_a_category_leaves_expenses_uncategorized() {
    let conn = setup();
    run(&conn, &["category", "add", "--name", "Mascotas", "--icon", "🐶"]).unwrap();
    let id = load_categorias(&conn)
        .unwrap()
        .into_iter()
        .find(|c| c.nombre == "Mascotas")
        .unwrap()
        .id;
    let gid = gasto(&conn, Some(id), vec![]);

    run(&conn, &["category", "rm", "--name", "Mascotas"]).unwrap();
    assert!(load_categorias(&conn).unwrap().iter().all(|c| c.nombre != "Mascotas"));
    assert_eq!(load_gasto(&conn, gid).unwrap().categoria_id, None);
    assert!(run(&conn, &["category", "rm", "--name", "Mascotas"]).is_err());
}

#[test]
fn category_names_are_required() {
    let conn = setup();
    let before = load_categorias(&conn).unwrap().len();
    assert!(run(&conn, &["category", "add", "--name", "  "]).is_err());
    assert_eq!(load_categorias(&conn).unwrap().len(), before);
}

#[test]
fn tag_add_trims_and_rejects_empty_names() {
    let conn = setup();
    run(&conn, &["tag", "add", "--name", "  vacaciones "]).unwrap();
    assert!(run(&conn, &["tag", "add", "--name", " "]).is_err());
    let all = load_tags(&conn).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].nombre, "vacaciones");
}

#[test]
fn removing_a_tag_drops_its_links() {
    let conn = setup();
    run(&conn, &["tag", "add", "--name", "regalo"]).unwrap();
    run(&conn, &["tag", "add", "--name", "casa"]).unwrap();
    let ids: Vec<i64> = load_tags(&conn).unwrap().iter().map(|t| t.id).collect();
    let gid = gasto(&conn, None, ids);

    run(&conn, &["tag", "rm", "--name", "regalo"]).unwrap();
    let links: i64 = conn
        .query_row("SELECT COUNT(*) FROM gasto_tags WHERE gasto_id=?1", [gid], |r| r.get(0))
        .unwrap();
    assert_eq!(links, 1);
    let casa = load_tags(&conn).unwrap()[0].id;
    assert_eq!(load_gasto(&conn, gid).unwrap().tag_ids, vec![casa]);
}
