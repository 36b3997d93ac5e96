// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn month_opt() -> Arg {
    Arg::new("month")
        .long("month")
        .help("Billing month YYYY-MM (defaults to the navigated month)")
}

fn dolar_opt() -> Arg {
    Arg::new("dolar")
        .long("dolar")
        .help("Pesos per dollar (defaults to the cached rate)")
}

fn id_arg() -> Arg {
    Arg::new("id")
        .long("id")
        .required(true)
        .value_parser(value_parser!(i64))
}

fn card_cmd() -> Command {
    let card_fields = |cmd: Command| {
        cmd.arg(
            Arg::new("type")
                .long("type")
                .help("visa | mastercard | amex | other"),
        )
        .arg(Arg::new("bank").long("bank"))
        .arg(Arg::new("digits").long("digits").help("Last four digits"))
        .arg(
            Arg::new("closing")
                .long("closing")
                .value_parser(value_parser!(i64))
                .help("Statement closing day (1-31)"),
        )
    };
    Command::new("card")
        .visible_alias("tarjeta")
        .about("Manage payment cards")
        .subcommand(card_fields(
            Command::new("add").arg(Arg::new("name").long("name").required(true)),
        ))
        .subcommand(json_flags(Command::new("list")))
        .subcommand(card_fields(
            Command::new("edit")
                .arg(Arg::new("name").long("name").required(true))
                .arg(Arg::new("new_name").long("new-name"))
                .arg(
                    Arg::new("no_closing")
                        .long("no-closing")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("closing"),
                ),
        ))
        .subcommand(Command::new("rm").arg(Arg::new("name").long("name").required(true)))
}

fn category_cmd() -> Command {
    Command::new("category")
        .visible_alias("categoria")
        .about("Manage expense categories")
        .subcommand(
            Command::new("add")
                .arg(Arg::new("name").long("name").required(true))
                .arg(Arg::new("icon").long("icon").default_value("💰"))
                .arg(Arg::new("color").long("color").default_value("#64748b")),
        )
        .subcommand(json_flags(Command::new("list")))
        .subcommand(Command::new("rm").arg(Arg::new("name").long("name").required(true)))
}

fn tag_cmd() -> Command {
    Command::new("tag")
        .about("Manage tags")
        .subcommand(Command::new("add").arg(Arg::new("name").long("name").required(true)))
        .subcommand(json_flags(Command::new("list")))
        .subcommand(Command::new("rm").arg(Arg::new("name").long("name").required(true)))
}

fn expense_cmd() -> Command {
    let optional_fields = |cmd: Command| {
        cmd.arg(Arg::new("currency").long("currency").help("ARS | USD"))
            .arg(
                Arg::new("installments")
                    .long("installments")
                    .value_parser(value_parser!(i64)),
            )
            .arg(Arg::new("date").long("date").help("Purchase date YYYY-MM-DD"))
            .arg(
                Arg::new("billing_month")
                    .long("billing-month")
                    .help("Override the billing month derived from the date"),
            )
            .arg(Arg::new("category").long("category"))
            .arg(Arg::new("card").long("card"))
            .arg(Arg::new("tag").long("tag").action(ArgAction::Append))
    };
    Command::new("expense")
        .visible_alias("gasto")
        .about("Record and browse expenses")
        .subcommand(optional_fields(
            Command::new("add")
                .arg(Arg::new("desc").long("desc").required(true))
                .arg(Arg::new("amount").long("amount").required(true))
                .arg(Arg::new("fixed").long("fixed").action(ArgAction::SetTrue))
                .arg(Arg::new("paid").long("paid").action(ArgAction::SetTrue)),
        ))
        .subcommand(json_flags(
            Command::new("list")
                .arg(month_opt())
                .arg(Arg::new("search").long("search"))
                .arg(
                    Arg::new("card")
                        .long("card")
                        .help("Card name, or 'efectivo' for cash"),
                )
                .arg(Arg::new("currency").long("currency"))
                .arg(Arg::new("tag").long("tag"))
                .arg(
                    Arg::new("sort")
                        .long("sort")
                        .default_value("monto-desc")
                        .help("monto-desc | monto-asc | fecha-desc | fecha-asc"),
                ),
        ))
        .subcommand(optional_fields(
            Command::new("edit")
                .arg(id_arg())
                .arg(Arg::new("desc").long("desc"))
                .arg(Arg::new("amount").long("amount"))
                .arg(
                    Arg::new("no_card")
                        .long("no-card")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("card"),
                )
                .arg(
                    Arg::new("no_category")
                        .long("no-category")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("category"),
                ),
        ))
        .subcommand(Command::new("rm").arg(id_arg()))
        .subcommand(
            Command::new("pay")
                .about("Toggle the paid flag")
                .arg(id_arg()),
        )
        .subcommand(
            Command::new("fix")
                .about("Toggle the fixed (recurring) flag")
                .arg(id_arg()),
        )
}

fn tax_cmd() -> Command {
    Command::new("tax")
        .visible_alias("impuesto")
        .about("Taxes and fees billed per month")
        .subcommand(
            Command::new("add")
                .arg(Arg::new("desc").long("desc").required(true))
                .arg(Arg::new("amount").long("amount").required(true))
                .arg(month_opt())
                .arg(Arg::new("card").long("card")),
        )
        .subcommand(json_flags(Command::new("list").arg(month_opt())))
        .subcommand(
            Command::new("edit")
                .arg(id_arg())
                .arg(Arg::new("desc").long("desc"))
                .arg(Arg::new("amount").long("amount"))
                .arg(month_opt())
                .arg(Arg::new("card").long("card"))
                .arg(
                    Arg::new("no_card")
                        .long("no-card")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("card"),
                ),
        )
        .subcommand(Command::new("rm").arg(id_arg()))
}

fn goal_cmd() -> Command {
    Command::new("goal")
        .visible_alias("meta")
        .about("Savings goals")
        .subcommand(
            Command::new("add")
                .arg(Arg::new("name").long("name").required(true))
                .arg(Arg::new("target").long("target").required(true))
                .arg(Arg::new("icon").long("icon").default_value("🎯"))
                .arg(Arg::new("currency").long("currency").default_value("ARS"))
                .arg(Arg::new("progress").long("progress").default_value("0")),
        )
        .subcommand(json_flags(Command::new("list")))
        .subcommand(
            Command::new("edit")
                .arg(id_arg())
                .arg(Arg::new("name").long("name"))
                .arg(Arg::new("target").long("target"))
                .arg(Arg::new("icon").long("icon"))
                .arg(Arg::new("currency").long("currency"))
                .arg(Arg::new("progress").long("progress")),
        )
        .subcommand(Command::new("rm").arg(id_arg()))
        .subcommand(
            Command::new("contribute")
                .arg(id_arg())
                .arg(Arg::new("amount").long("amount").required(true)),
        )
}

fn savings_cmd() -> Command {
    let movement = |name: &'static str| {
        Command::new(name)
            .arg(
                Arg::new("kind")
                    .long("kind")
                    .required(true)
                    .help("pesos | usd"),
            )
            .arg(Arg::new("amount").long("amount").required(true))
            .arg(Arg::new("note").long("note"))
    };
    Command::new("savings")
        .visible_alias("ahorro")
        .about("Cash and dollar savings")
        .subcommand(movement("deposit"))
        .subcommand(movement("withdraw"))
        .subcommand(json_flags(Command::new("status").arg(dolar_opt())))
        .subcommand(json_flags(
            Command::new("history").arg(
                Arg::new("limit")
                    .long("limit")
                    .value_parser(value_parser!(usize))
                    .default_value("20"),
            ),
        ))
}

pub fn build_cli() -> Command {
    Command::new("gastos")
        .version(clap::crate_version!())
        .about("Card, cash, installment and savings tracking for the household budget")
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(card_cmd())
        .subcommand(category_cmd())
        .subcommand(tag_cmd())
        .subcommand(expense_cmd())
        .subcommand(tax_cmd())
        .subcommand(goal_cmd())
        .subcommand(savings_cmd())
        .subcommand(json_flags(
            Command::new("dashboard")
                .visible_alias("resumen")
                .about("Month summary")
                .arg(month_opt())
                .arg(dolar_opt()),
        ))
        .subcommand(json_flags(
            Command::new("projection")
                .visible_alias("proyeccion")
                .about("Fixed expenses and installments ahead")
                .arg(month_opt())
                .arg(
                    Arg::new("months")
                        .long("months")
                        .value_parser(value_parser!(u32))
                        .default_value("6"),
                )
                .arg(
                    Arg::new("all")
                        .long("all")
                        .action(ArgAction::SetTrue)
                        .help("Include finished installment plans"),
                ),
        ))
        .subcommand(
            Command::new("config")
                .about("Profile, budget and recurring expenses")
                .subcommand(json_flags(Command::new("show")))
                .subcommand(
                    Command::new("profile")
                        .arg(Arg::new("name").long("name"))
                        .arg(Arg::new("email").long("email")),
                )
                .subcommand(
                    Command::new("budget")
                        .arg(Arg::new("ars").long("ars"))
                        .arg(Arg::new("usd").long("usd"))
                        .arg(
                            Arg::new("off")
                                .long("off")
                                .action(ArgAction::SetTrue)
                                .conflicts_with_all(["ars", "usd"]),
                        ),
                )
                .subcommand(
                    Command::new("copy-fixed")
                        .about("Copy fixed expenses into the month after the navigated one"),
                ),
        )
        .subcommand(
            Command::new("month")
                .about("Navigate the month used by default")
                .subcommand(Command::new("show"))
                .subcommand(Command::new("next"))
                .subcommand(Command::new("prev"))
                .subcommand(Command::new("today"))
                .subcommand(
                    Command::new("set").arg(Arg::new("month").long("month").required(true)),
                ),
        )
        .subcommand(
            Command::new("dolar")
                .about("ARS/USD selling rate")
                .subcommand(Command::new("fetch"))
                .subcommand(Command::new("set").arg(Arg::new("rate").long("rate").required(true)))
                .subcommand(Command::new("show")),
        )
        .subcommand(
            Command::new("export").subcommand(
                Command::new("expenses")
                    .arg(
                        Arg::new("format")
                            .long("format")
                            .default_value("csv")
                            .help("csv | json"),
                    )
                    .arg(Arg::new("out").long("out").required(true))
                    .arg(Arg::new("month").long("month").help("Only this billing month")),
            ),
        )
        .subcommand(
            Command::new("import")
                .subcommand(
                    Command::new("expenses").arg(Arg::new("path").long("path").required(true)),
                )
                .subcommand(
                    Command::new("supabase")
                        .about("Pull every table from a Supabase REST endpoint")
                        .arg(Arg::new("url").long("url").required(true))
                        .arg(
                            Arg::new("key")
                                .long("key")
                                .required(true)
                                .env("SUPABASE_SERVICE_KEY")
                                .hide_env_values(true),
                        )
                        .arg(
                            Arg::new("check")
                                .long("check")
                                .action(ArgAction::SetTrue)
                                .help("Only test the connection and count remote gastos"),
                        ),
                ),
        )
        .subcommand(Command::new("doctor").about("Check the data for inconsistencies"))
}
