pub mod commands;

use clap::{ArgGroup, Parser, Subcommand};
use pricedesk_core::{Discount, RateInput};
use rust_decimal::Decimal;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "pricedesk",
    about = "Pricedesk operator CLI",
    long_about = "Inspect configuration, check readiness, load the demo dataset and compute rate quotes.",
    after_help = "Examples:\n  pricedesk doctor --json\n  pricedesk config\n  pricedesk rate --zone 5 --weight 10 --base-rate 15.50 --percent 15"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, demo data, agreement template and converter readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Load the demo dataset into a fresh workspace and summarize it")]
    Seed,
    #[command(about = "Compute a spot rate quote from the static rate formula")]
    #[command(group(ArgGroup::new("discount").args(["percent", "flat"])))]
    Rate {
        #[arg(long, help = "Shipping zone, 1 through 8")]
        zone: u8,
        #[arg(long, help = "Package weight in pounds")]
        weight: Decimal,
        #[arg(long = "base-rate", help = "Base rate in dollars")]
        base_rate: Decimal,
        #[arg(long, help = "Percentage discount, 0 through 100")]
        percent: Option<Decimal>,
        #[arg(long, help = "Flat discount in dollars")]
        flat: Option<Decimal>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::config::run(),
        Command::Doctor { json } => {
            let (exit_code, output) = commands::doctor::run(json);
            commands::CommandResult::text(exit_code, output)
        }
        Command::Seed => commands::seed::run(),
        Command::Rate { zone, weight, base_rate, percent, flat } => {
            let discount = match (percent, flat) {
                (_, Some(amount)) => Discount::Flat(amount),
                (Some(percent), None) => Discount::Percentage(percent),
                (None, None) => Discount::Percentage(Decimal::ZERO),
            };
            commands::rate::run(&RateInput { weight_lbs: weight, zone, base_rate, discount })
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
