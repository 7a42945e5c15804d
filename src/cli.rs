use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::{Source, parse_source_arg};
use crate::domain::YearMonth;
use crate::ledger::MonthOrder;

#[derive(Debug, Parser)]
#[command(name = "monthbook")]
#[command(about = "Categorize bank CSV exports and summarize them per month", long_about = None)]
pub struct Cli {
    /// Config file (defaults to ./monthbook.json, then the platform config dir).
    #[arg(long, global = true, env = "MONTHBOOK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Classifier store; overrides the config's `store`.
    #[arg(long, global = true, env = "MONTHBOOK_STORE")]
    pub store: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug).
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import the configured exports, ask for unknown labels, print monthly totals.
    Run(RunArgs),
    /// Write a default config and an empty classifier store.
    Init(InitArgs),
    /// Inspect or edit the classifier store.
    Rules(RulesArgs),
}

#[derive(Debug, Args, Default)]
pub struct RunArgs {
    /// Import PATH with FORMAT (credit_card or account) instead of the configured sources.
    #[arg(long = "source", value_name = "PATH:FORMAT", value_parser = parse_source_arg)]
    pub sources: Vec<Source>,

    /// Echo transactions with this label while importing (replaces the configured list).
    #[arg(long = "watch", value_name = "LABEL")]
    pub watch: Vec<String>,

    #[arg(long, value_enum)]
    pub order: Option<OrderArg>,

    /// Only print this month (YYYY-MM).
    #[arg(long)]
    pub month: Option<YearMonth>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OrderArg {
    Chronological,
    Encounter,
}

impl From<OrderArg> for MonthOrder {
    fn from(value: OrderArg) -> Self {
        match value {
            OrderArg::Chronological => MonthOrder::Chronological,
            OrderArg::Encounter => MonthOrder::Encounter,
        }
    }
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Overwrite an existing config file. The store is never overwritten.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct RulesArgs {
    #[command(subcommand)]
    pub cmd: RulesCmd,
}

#[derive(Debug, Subcommand)]
pub enum RulesCmd {
    List {
        #[arg(long)]
        label: Option<String>,
    },
    Set {
        description: String,
        label: String,
    },
    Remove {
        description: String,
    },
}
