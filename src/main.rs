// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use gastos::{cli, commands, db};

fn init_tracing() {
    let filter = EnvFilter::try_from_env("GASTOS_LOG").unwrap_or_else(|_| "gastos=warn".into());
    let json = std::env::var("GASTOS_LOG_FORMAT").is_ok_and(|f| f == "json");
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn main() -> Result<()> {
    init_tracing();

    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let mut conn = db::open_or_init()?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path()?.display());
        }
        Some(("card", sub)) => commands::tarjetas::handle(&conn, sub)?,
        Some(("category", sub)) => commands::categorias::handle(&conn, sub)?,
        Some(("tag", sub)) => commands::tags::handle(&conn, sub)?,
        Some(("expense", sub)) => commands::gastos::handle(&conn, sub)?,
        Some(("tax", sub)) => commands::impuestos::handle(&conn, sub)?,
        Some(("goal", sub)) => commands::metas::handle(&conn, sub)?,
        Some(("savings", sub)) => commands::ahorros::handle(&mut conn, sub)?,
        Some(("dashboard", sub)) => commands::dashboard::handle(&conn, sub)?,
        Some(("projection", sub)) => commands::proyeccion::handle(&conn, sub)?,
        Some(("config", sub)) => commands::config::handle(&mut conn, sub)?,
        Some(("month", sub)) => commands::month::handle(&conn, sub)?,
        Some(("dolar", sub)) => commands::dolar::handle(&conn, sub)?,
        Some(("import", sub)) => commands::importer::handle(&mut conn, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&conn, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(&conn)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
