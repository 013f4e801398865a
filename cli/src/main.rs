//! Pledge command line: inspect the program catalog, quote payouts and replay
//! staking scenarios against an in-memory token ledger.

mod config;
mod scenario;

use anyhow::Context;
use clap::Parser;
use config::CliConfig;
use pledge_staking::{compute_payout, PayoutKind, StakeProgram};
use pledge_types::{Amount, SECS_PER_DAY};
use pledge_utils::{format_duration, format_token_amount, LogFormat};
use scenario::{Scenario, SimulationReport};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pledge-cli", about = "Staking rewards ledger tools")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// CLI flags and env vars override them.
    #[arg(long, env = "PLEDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter: "trace", "debug", "info", "warn", "error" or a directive list.
    #[arg(long, env = "PLEDGE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log output format: "human" or "json".
    #[arg(long, env = "PLEDGE_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Print the program catalog.
    Programs,

    /// Compute what a stake would pay after a given number of days.
    Quote {
        /// Program id.
        #[arg(long)]
        program: u32,

        /// Staked amount in raw units.
        #[arg(long)]
        amount: Amount,

        /// Days elapsed since the deposit.
        #[arg(long)]
        elapsed_days: u64,

        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Replay a TOML scenario and print the event log and staker accounts.
    Simulate {
        /// Scenario file.
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    pledge_utils::init_logging(config.log_format, &config.log_level)
        .context("failed to initialise logging")?;

    match cli.command {
        Command::Programs => {
            let catalog = config.catalog().context("invalid program catalog")?;
            print_programs(&catalog);
        }
        Command::Quote {
            program,
            amount,
            elapsed_days,
            json,
        } => {
            let catalog = config.catalog().context("invalid program catalog")?;
            let program = catalog
                .get(program as usize)
                .with_context(|| format!("stake program {program} not found"))?;
            let payout = compute_payout(amount, program, elapsed_days.saturating_mul(SECS_PER_DAY))?;
            if json {
                let (tier, fine_percent) = match payout.kind {
                    PayoutKind::Matured => (None, None),
                    PayoutKind::EarlyExit { tier, fine_percent } => (tier, Some(fine_percent)),
                };
                let value = serde_json::json!({
                    "program": program.id,
                    "elapsed_days": elapsed_days,
                    "principal": payout.principal.raw().to_string(),
                    "payout": payout.amount.raw().to_string(),
                    "matured": payout.is_matured(),
                    "reward": payout.reward().raw().to_string(),
                    "fine": payout.fine().raw().to_string(),
                    "tier": tier,
                    "fine_percent": fine_percent,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!(
                    "program {} after {elapsed_days}d: payout {} ({} tokens)",
                    program.id,
                    payout.amount,
                    format_token_amount(payout.amount)
                );
                match payout.kind {
                    PayoutKind::Matured => println!("  matured, reward {}", payout.reward()),
                    PayoutKind::EarlyExit {
                        tier: Some(tier),
                        fine_percent,
                    } => println!(
                        "  early exit, tier {tier} fines {fine_percent}%: fine {}",
                        payout.fine()
                    ),
                    PayoutKind::EarlyExit { tier: None, .. } => {
                        println!("  early exit, no fine schedule")
                    }
                }
            }
        }
        Command::Simulate { file } => {
            let scenario = Scenario::load(&file)?;
            tracing::info!(
                file = %file.display(),
                steps = scenario.steps.len(),
                "replaying scenario"
            );
            let report = scenario::run(&config, &scenario).context("scenario setup failed")?;
            print_report(&report);
        }
    }

    Ok(())
}

fn print_programs(catalog: &[StakeProgram]) {
    println!("{:>3}  {:>6}  {:>8}  {:>5}  fines", "id", "active", "period", "apy");
    for program in catalog {
        let fines = program
            .fine_tiers
            .iter()
            .map(|t| format!("<{} {}%", format_duration(t.threshold_secs), t.fine_percent))
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "{:>3}  {:>6}  {:>8}  {:>5}  {}",
            program.id,
            program.active,
            format_duration(program.period_secs),
            program.apy,
            if fines.is_empty() { "-".to_string() } else { fines }
        );
    }
}

fn print_report(report: &SimulationReport) {
    println!("steps:");
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(detail) => println!("  {:>3} ok   {} ({detail})", outcome.step, outcome.description),
            Err(reason) => println!("  {:>3} FAIL {} ({reason})", outcome.step, outcome.description),
        }
    }

    println!("events:");
    for event in &report.events {
        println!("  {event:?}");
    }

    println!("stakers:");
    for (account, balance) in &report.accounts {
        println!(
            "  {}: positions {}, deposited {}, paid out {}, balance {}",
            account.address,
            account.position_count,
            account.total_deposited,
            account.total_after,
            balance
        );
    }
    println!("pool reserve: {}", report.reserve);
    if report.failures() > 0 {
        println!("{} step(s) failed", report.failures());
    }
}
