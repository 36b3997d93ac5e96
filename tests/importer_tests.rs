// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use gastos::commands::exporter::export_expenses;
use gastos::commands::gastos::{NewGasto, insert_gasto, load_gastos};
use gastos::commands::importer::{
    ImportReport, Snapshot, import_expenses_csv, import_snapshot, normalize_timestamp,
    parse_content_range,
};
use gastos::commands::metas::load_metas;
use gastos::commands::tarjetas::load_tarjetas;
use gastos::db;
use gastos::models::Moneda;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn.execute("INSERT INTO tarjetas(nombre, tipo) VALUES ('Visa', 'visa')", [])
        .unwrap();
    conn.execute("INSERT INTO tags(nombre) VALUES ('casa')", [])
        .unwrap();
    conn.execute("INSERT INTO tags(nombre) VALUES ('auto')", [])
        .unwrap();
    conn
}

fn csv_file(body: &str) -> NamedTempFile {
    let mut f = NamedTempFile::new().unwrap();
    f.write_all(body.as_bytes()).unwrap();
    f.flush().unwrap();
    f
}

#[test]
fn imports_expenses_from_csv() {
    let mut conn = setup();
    let f = csv_file(
        "fecha,descripcion,monto,moneda,cuotas,categoria,tarjeta,fijo,tags\n\
         2025-02-14,Lavarropas,450000,ARS,6,Compras,Visa,,casa;auto\n\
         2025-02-01,Alquiler,300000,,,Servicios,,si,\n\
         2025-02-20,Dominio,12.5,USD,1,,,no,\n",
    );
    let n = import_expenses_csv(&mut conn, f.path()).unwrap();
    assert_eq!(n, 3);

    let gastos = load_gastos(&conn).unwrap();
    let lava = gastos.iter().find(|g| g.descripcion == "Lavarropas").unwrap();
    assert_eq!(lava.cuotas, 6);
    assert_eq!(lava.tarjeta_id, Some(1));
    assert_eq!(lava.mes_facturacion, "2025-02");
    assert_eq!(lava.tag_ids, vec![1, 2]);

    let alquiler = gastos.iter().find(|g| g.descripcion == "Alquiler").unwrap();
    assert!(alquiler.es_fijo);
    assert_eq!(alquiler.moneda, Moneda::Ars);
    assert_eq!(alquiler.tarjeta_id, None);

    let dominio = gastos.iter().find(|g| g.descripcion == "Dominio").unwrap();
    assert_eq!(dominio.moneda, Moneda::Usd);
    assert!(!dominio.es_fijo);
}

#[test]
fn a_bad_row_rolls_back_the_whole_file() {
    let mut conn = setup();
    let f = csv_file(
        "fecha,descripcion,monto,moneda,cuotas,categoria,tarjeta,fijo,tags\n\
         2025-02-14,Pan,900,ARS,1,,,,\n\
         2025-02-15,Vino,3000,ARS,1,,Naranja,,\n",
    );
    assert!(import_expenses_csv(&mut conn, f.path()).is_err());
    assert!(load_gastos(&conn).unwrap().is_empty());
}

#[test]
fn snapshot_import_remaps_remote_ids() {
    let mut conn = setup();
    let snapshot: Snapshot = serde_json::from_value(json!({
        "tarjetas": [
            {"id": "t-1", "nombre": "Visa", "tipo": "visa", "banco": null, "digitos": null, "cierre": 12},
            {"id": "t-2", "nombre": "Naranja", "tipo": "naranja", "banco": "Naranja X", "digitos": "1111", "cierre": 40}
        ],
        "categorias": [
            {"id": "c-1", "nombre": "Comida", "icono": "🍔", "color": "#f59e0b"},
            {"id": "c-2", "nombre": "Mascotas", "icono": "🐶", "color": "#000000"}
        ],
        "tags": [{"id": "g-1", "nombre": "regalo"}],
        "gastos": [
            {"id": "x-1", "tarjeta_id": "t-2", "categoria_id": "c-2", "descripcion": "Alimento",
             "monto": 25000, "moneda": "ARS", "cuotas": 3, "cuota_actual": 1,
             "fecha": "2025-03-02T10:00:00+00:00", "mes_facturacion": "2025-04",
             "es_fijo": false, "tag_ids": ["g-1"], "pagado": true},
            {"id": "x-2", "tarjeta_id": null, "categoria_id": "c-1", "descripcion": "Roto",
             "monto": 10, "moneda": "EUR", "cuotas": 1, "fecha": "2025-03-02", "mes_facturacion": "2025-03"}
        ],
        "impuestos": [{"id": "i-1", "tarjeta_id": "t-1", "descripcion": "IVA", "monto": 1500.5, "mes": "2025-03"}],
        "metas": [{"id": "m-1", "nombre": "Auto", "icono": "🚗", "objetivo": 100, "progreso": 150, "moneda": "USD", "completada": false}],
        "movimientos_ahorro": [{"id": "s-1", "tipo": "usd", "monto": -20, "descripcion": null, "fecha": "2025-03-01T15:30:00.123+03:00"}]
    }))
    .unwrap();

    let report = import_snapshot(&mut conn, &snapshot).unwrap();
    assert_eq!(
        report,
        ImportReport {
            tarjetas: 1,
            categorias: 1,
            tags: 1,
            gastos: 1,
            impuestos: 1,
            metas: 1,
            movimientos: 1,
            skipped: 1,
        }
    );

    let tarjetas = load_tarjetas(&conn).unwrap();
    let naranja = tarjetas.iter().find(|t| t.nombre == "Naranja").unwrap();
    assert_eq!(naranja.cierre, None);

    let gastos = load_gastos(&conn).unwrap();
    assert_eq!(gastos.len(), 1);
    let g = &gastos[0];
    assert_eq!(g.tarjeta_id, Some(naranja.id));
    assert_eq!(g.fecha.to_string(), "2025-03-02");
    assert_eq!(g.mes_facturacion, "2025-04");
    assert_eq!(g.tag_ids.len(), 1);
    assert!(g.pagado);

    let impuesto_card: Option<i64> = conn
        .query_row("SELECT tarjeta_id FROM impuestos", [], |r| r.get(0))
        .unwrap();
    assert_eq!(impuesto_card, Some(1));

    let meta = &load_metas(&conn).unwrap()[0];
    assert!(meta.completada);
    assert_eq!(meta.progreso, Decimal::from(150));

    let mov_fecha: String = conn
        .query_row("SELECT fecha FROM movimientos_ahorro", [], |r| r.get(0))
        .unwrap();
    assert_eq!(mov_fecha, "2025-03-01 12:30:00");
}

#[test]
fn exported_csv_imports_back_including_cash() {
    let source = setup();
    let comida: i64 = source
        .query_row("SELECT id FROM categorias WHERE nombre='Comida'", [], |r| r.get(0))
        .unwrap();
    let base = NewGasto {
        tarjeta_id: None,
        categoria_id: Some(comida),
        descripcion: "Pan".into(),
        monto: Decimal::from(150),
        moneda: Moneda::Ars,
        cuotas: 1,
        fecha: NaiveDate::from_ymd_opt(2025, 1, 5).unwrap(),
        mes_facturacion: "2025-01".into(),
        es_fijo: false,
        tag_ids: vec![1],
        pagado: false,
    };
    insert_gasto(&source, &base).unwrap();
    insert_gasto(
        &source,
        &NewGasto {
            tarjeta_id: Some(1),
            categoria_id: None,
            descripcion: "Zapatillas".into(),
            monto: Decimal::from(90000),
            cuotas: 3,
            fecha: NaiveDate::from_ymd_opt(2025, 1, 28).unwrap(),
            mes_facturacion: "2025-02".into(),
            tag_ids: vec![],
            pagado: true,
            ..base
        },
    )
    .unwrap();

    let out = NamedTempFile::new().unwrap();
    let path = out.path().to_str().unwrap();
    assert_eq!(export_expenses(&source, "csv", path, None).unwrap(), 2);

    let mut target = setup();
    assert_eq!(import_expenses_csv(&mut target, out.path()).unwrap(), 2);

    let gastos = load_gastos(&target).unwrap();
    let pan = gastos.iter().find(|g| g.descripcion == "Pan").unwrap();
    assert_eq!(pan.tarjeta_id, None);
    assert_eq!(pan.categoria_id, Some(comida));
    assert_eq!(pan.tag_ids, vec![1]);

    let zapas = gastos.iter().find(|g| g.descripcion == "Zapatillas").unwrap();
    assert_eq!(zapas.tarjeta_id, Some(1));
    assert_eq!(zapas.cuotas, 3);
    assert_eq!(zapas.mes_facturacion, "2025-02");
    assert!(zapas.pagado);
}

#[test]
fn cash_column_is_case_insensitive() {
    let mut conn = setup();
    let f = csv_file(
        "fecha,descripcion,monto,moneda,cuotas,categoria,tarjeta,fijo,tags\n\
         2025-02-14,Kiosco,900,ARS,1,,EFECTIVO,,\n",
    );
    assert_eq!(import_expenses_csv(&mut conn, f.path()).unwrap(), 1);
    assert_eq!(load_gastos(&conn).unwrap()[0].tarjeta_id, None);
}

#[test]
fn remote_timestamps_use_the_local_shape() {
    assert_eq!(
        normalize_timestamp("2025-03-01T10:00:00+00:00").unwrap(),
        "2025-03-01 10:00:00"
    );
    assert_eq!(
        normalize_timestamp("2025-03-01T10:00:00.5").unwrap(),
        "2025-03-01 10:00:00"
    );
    assert_eq!(
        normalize_timestamp("2025-03-01 08:15:00").unwrap(),
        "2025-03-01 08:15:00"
    );
    assert_eq!(normalize_timestamp("2025-03-01").unwrap(), "2025-03-01 00:00:00");
    assert!(normalize_timestamp("ayer").is_err());
}

#[test]
fn snapshot_with_a_bad_timestamp_skips_the_movement() {
    let mut conn = setup();
    let snapshot: Snapshot = serde_json::from_value(json!({
        "movimientos_ahorro": [
            {"id": "s-1", "tipo": "pesos", "monto": 100, "descripcion": null, "fecha": "nunca"},
            {"id": "s-2", "tipo": "pesos", "monto": 50, "descripcion": "sueldo", "fecha": "2025-03-01"}
        ]
    }))
    .unwrap();
    let report = import_snapshot(&mut conn, &snapshot).unwrap();
    assert_eq!(report.movimientos, 1);
    assert_eq!(report.skipped, 1);
}

#[test]
fn content_range_yields_the_total() {
    assert_eq!(parse_content_range("0-0/42"), Some(42));
    assert_eq!(parse_content_range("*/0"), Some(0));
    assert_eq!(parse_content_range("0-0/*"), None);
    assert_eq!(parse_content_range("garbage"), None);
}
