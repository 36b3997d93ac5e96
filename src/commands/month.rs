// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{add_months, clear_setting, current_month, month_name, parse_month, set_setting};
use anyhow::Result;
use rusqlite::Connection;

const KEY: &str = "current_month";

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("next", _)) => {
            change_month(conn, 1)?;
        }
        Some(("prev", _)) => {
            change_month(conn, -1)?;
        }
        Some(("set", sub)) => {
            let mes = parse_month(sub.get_one::<String>("month").unwrap())?;
            set_setting(conn, KEY, &mes)?;
        }
        Some(("today", _)) => clear_setting(conn, KEY)?,
        _ => {}
    }
    let mes = current_month(conn)?;
    println!("{} ({})", month_name(&mes)?, mes);
    Ok(())
}

/// Move the navigated month by `delta` months and return the new key.
pub fn change_month(conn: &Connection, delta: i32) -> Result<String> {
    let mes = add_months(&current_month(conn)?, delta)?;
    set_setting(conn, KEY, &mes)?;
    Ok(mes)
}
