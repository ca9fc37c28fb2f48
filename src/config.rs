//! Command-line and environment configuration.

use crate::application::dispatcher::DispatcherConfig;
use crate::domain::fee::FeeTable;
use crate::error::{CalculationError, Result};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Fee calculation server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the calculation API over HTTP
    Serve(ServeArgs),
    /// Compute every proposal of a CSV file and print the results as CSV
    Batch(BatchArgs),
    /// Print an unsigned bearer credential granting a plan
    Token(TokenArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address the HTTP listener binds to
    #[arg(long, env = "FEECALC_BIND", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    #[command(flatten)]
    pub engine: EngineArgs,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Input proposals CSV file (clientId,grossAmount,plan)
    pub input: PathBuf,

    /// Only compute proposals whose gross amount is above this value
    #[arg(long)]
    pub min_gross: Option<Decimal>,

    #[command(flatten)]
    pub engine: EngineArgs,
}

#[derive(Args, Debug)]
pub struct TokenArgs {
    #[arg(long)]
    pub user: String,

    #[arg(long)]
    pub plan: String,
}

/// Options shared by every command that computes fees.
#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
    /// Number of compute workers
    #[arg(long, env = "FEECALC_WORKERS", default_value_t = 4)]
    pub workers: usize,

    /// Calculations that may wait for a worker before new ones are refused
    #[arg(long, env = "FEECALC_QUEUE_CAPACITY", default_value_t = 1024)]
    pub queue_capacity: usize,

    /// Maximum time a caller waits for one calculation
    #[arg(long, env = "FEECALC_COMPUTE_TIMEOUT_MS", default_value_t = 5000)]
    pub compute_timeout_ms: u64,

    /// Artificial latency before each calculation, modelling an external lookup
    #[arg(long, env = "FEECALC_SIMULATED_LATENCY_MS", default_value_t = 0)]
    pub simulated_latency_ms: u64,

    /// Add or override a plan's fee rate, e.g. `--fee-rate VIP=0.02`
    #[arg(long = "fee-rate", value_name = "PLAN=RATE")]
    pub fee_rates: Vec<PlanRate>,

    /// Fee rate for plans missing from the table
    #[arg(long, env = "FEECALC_DEFAULT_FEE_RATE", default_value = "0")]
    pub default_fee_rate: Decimal,

    /// Path to a persistent ledger (optional). If provided, uses RocksDB.
    #[arg(long, env = "FEECALC_DB_PATH")]
    pub db_path: Option<PathBuf>,
}

impl EngineArgs {
    /// The standard tiers with command-line overrides applied.
    pub fn fee_table(&self) -> Result<FeeTable> {
        let mut table = FeeTable::standard().with_default_rate(self.default_fee_rate)?;
        for PlanRate { plan, rate } in &self.fee_rates {
            table = table.with_rate(plan, *rate)?;
        }
        Ok(table)
    }

    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            workers: self.workers,
            queue_capacity: self.queue_capacity,
            timeout: Duration::from_millis(self.compute_timeout_ms),
            simulated_latency: Duration::from_millis(self.simulated_latency_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanRate {
    pub plan: String,
    pub rate: Decimal,
}

impl FromStr for PlanRate {
    type Err = CalculationError;

    fn from_str(s: &str) -> Result<Self> {
        let (plan, rate) = s.split_once('=').ok_or_else(|| {
            CalculationError::InvalidFeeRate(format!("expected PLAN=RATE, got {}", s))
        })?;
        let plan = plan.trim();
        if plan.is_empty() {
            return Err(CalculationError::InvalidFeeRate(format!("missing plan in {}", s)));
        }
        let rate = Decimal::from_str(rate.trim())
            .map_err(|e| CalculationError::InvalidFeeRate(format!("{}: {}", s, e)))?;
        Ok(Self {
            plan: plan.to_string(),
            rate,
        })
    }
}
