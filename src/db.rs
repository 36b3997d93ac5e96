// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::{Connection, params};
use std::fs;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("com.alphavelocity", "Gastos", "gastos"));

pub const DB_ENV: &str = "GASTOS_DB";

/// Default categories seeded on first run: (name, icon, color).
pub const DEFAULT_CATEGORIES: &[(&str, &str, &str)] = &[
    ("Supermercado", "🛒", "#10b981"),
    ("Transporte", "🚗", "#3b82f6"),
    ("Comida", "🍔", "#f59e0b"),
    ("Servicios", "📞", "#6366f1"),
    ("Suscripción", "📱", "#8b5cf6"),
    ("Compras", "🛍️", "#ec4899"),
    ("Trabajo", "💼", "#ef4444"),
    ("Otros", "💰", "#64748b"),
];

pub fn db_path() -> Result<PathBuf> {
    if let Ok(p) = std::env::var(DB_ENV) {
        let p = p.trim();
        if !p.is_empty() {
            return Ok(PathBuf::from(p));
        }
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("gastos.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    tracing::debug!(path = %path.display(), "opening database");
    let mut conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&mut conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS tarjetas(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        nombre TEXT NOT NULL UNIQUE,
        tipo TEXT NOT NULL CHECK(tipo IN ('visa','mastercard','amex','other')),
        banco TEXT,
        digitos TEXT,
        cierre INTEGER CHECK(cierre IS NULL OR (cierre BETWEEN 1 AND 31)),
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS categorias(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        nombre TEXT NOT NULL UNIQUE,
        icono TEXT NOT NULL DEFAULT '💰',
        color TEXT NOT NULL DEFAULT '#64748b',
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS tags(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        nombre TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS gastos(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        tarjeta_id INTEGER,
        categoria_id INTEGER,
        descripcion TEXT NOT NULL,
        monto TEXT NOT NULL,
        moneda TEXT NOT NULL CHECK(moneda IN ('ARS','USD')),
        cuotas INTEGER NOT NULL DEFAULT 1 CHECK(cuotas >= 1),
        cuota_actual INTEGER NOT NULL DEFAULT 1,
        fecha TEXT NOT NULL,
        mes_facturacion TEXT NOT NULL, -- YYYY-MM
        es_fijo INTEGER NOT NULL DEFAULT 0,
        pagado INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(tarjeta_id) REFERENCES tarjetas(id) ON DELETE SET NULL,
        FOREIGN KEY(categoria_id) REFERENCES categorias(id) ON DELETE SET NULL
    );
    CREATE INDEX IF NOT EXISTS idx_gastos_mes ON gastos(mes_facturacion);

    CREATE TABLE IF NOT EXISTS gasto_tags(
        gasto_id INTEGER NOT NULL,
        tag_id INTEGER NOT NULL,
        PRIMARY KEY(gasto_id, tag_id),
        FOREIGN KEY(gasto_id) REFERENCES gastos(id) ON DELETE CASCADE,
        FOREIGN KEY(tag_id) REFERENCES tags(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS impuestos(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        tarjeta_id INTEGER,
        descripcion TEXT NOT NULL,
        monto TEXT NOT NULL, -- ARS
        mes TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(tarjeta_id) REFERENCES tarjetas(id) ON DELETE SET NULL
    );
    CREATE INDEX IF NOT EXISTS idx_impuestos_mes ON impuestos(mes);

    CREATE TABLE IF NOT EXISTS metas(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        nombre TEXT NOT NULL,
        icono TEXT NOT NULL DEFAULT '🎯',
        objetivo TEXT NOT NULL,
        progreso TEXT NOT NULL DEFAULT '0',
        moneda TEXT NOT NULL CHECK(moneda IN ('ARS','USD')),
        completada INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS movimientos_ahorro(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        tipo TEXT NOT NULL CHECK(tipo IN ('pesos','usd')),
        monto TEXT NOT NULL,
        descripcion TEXT,
        fecha TEXT NOT NULL DEFAULT (datetime('now'))
    );
    CREATE INDEX IF NOT EXISTS idx_movimientos_fecha ON movimientos_ahorro(fecha);
    "#,
    )?;
    seed_categories(conn)?;
    Ok(())
}

fn seed_categories(conn: &mut Connection) -> Result<()> {
    let seeded: bool = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM settings WHERE key='categories_seeded')",
            [],
            |r| r.get(0),
        )?;
    if seeded {
        return Ok(());
    }
    let tx = conn.transaction()?;
    for (nombre, icono, color) in DEFAULT_CATEGORIES {
        tx.execute(
            "INSERT OR IGNORE INTO categorias(nombre, icono, color) VALUES (?1, ?2, ?3)",
            params![nombre, icono, color],
        )?;
    }
    tx.execute(
        "INSERT INTO settings(key, value) VALUES('categories_seeded', '1')",
        [],
    )?;
    tx.commit()?;
    tracing::debug!(count = DEFAULT_CATEGORIES.len(), "seeded default categories");
    Ok(())
}
