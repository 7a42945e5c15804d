mod classifier;
mod cli;
mod config;
mod domain;
mod ledger;
mod logging;
mod parser;
mod pipeline;
mod prompt;
mod report;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::classifier::Classifier;
use crate::cli::{Cli, Command, InitArgs, RulesCmd, RunArgs};
use crate::config::{
    AppConfig, CONFIG_FILE_NAME, ConfigOrigin, load_config, validate_watch, write_config,
};
use crate::pipeline::Import;
use crate::prompt::PromptResolver;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let Cli {
        config,
        store,
        verbose,
        command,
    } = Cli::parse();
    logging::init(verbose);

    match command.unwrap_or_else(|| Command::Run(RunArgs::default())) {
        Command::Init(args) => handle_init(args, config.as_deref(), store.as_deref()),
        Command::Run(args) => handle_run(args, resolve_config(config.as_deref(), store)?),
        Command::Rules(args) => {
            let cfg = resolve_config(config.as_deref(), store)?;
            handle_rules(args.cmd, &cfg.store)
        }
    }
}

fn resolve_config(explicit: Option<&Path>, store: Option<PathBuf>) -> Result<AppConfig> {
    let (mut cfg, origin) = load_config(explicit)?;
    match &origin {
        ConfigOrigin::File(path) => tracing::debug!(path = %path.display(), "using config"),
        ConfigOrigin::Defaults => tracing::debug!("using built-in config"),
    }
    if let Some(store) = store {
        cfg.store = store;
    }
    Ok(cfg)
}

fn handle_run(args: RunArgs, mut cfg: AppConfig) -> Result<()> {
    if !args.sources.is_empty() {
        cfg.sources = args.sources;
    }
    if !args.watch.is_empty() {
        cfg.watch = args.watch;
    }
    if let Some(order) = args.order {
        cfg.month_order = order.into();
    }
    validate_watch(&cfg.watch)?;
    if cfg.sources.is_empty() {
        return Err(anyhow!(
            "No sources configured. Add some to {CONFIG_FILE_NAME} or pass --source PATH:FORMAT"
        ));
    }

    let mut classifier = Classifier::from_path(&cfg.store).with_context(|| {
        format!(
            "Cannot start import (run `monthbook init` to create an empty store at {})",
            cfg.store.display()
        )
    })?;

    let stdin = io::stdin();
    let resolver = PromptResolver::new(stdin.lock(), io::stdout());
    let mut import = Import::new(&mut classifier, resolver, &cfg.watch);
    let rows = import.import_all(&cfg.sources, &mut io::stdout())?;
    let learned = import.learned();
    let ledger = import.finish();

    classifier.save(&cfg.store)?;
    tracing::info!(rows, learned, rules = classifier.len(), "import complete");

    let mut out = io::stdout().lock();
    report::print_months(&ledger, cfg.month_order, args.month, &mut out)?;
    out.flush()?;
    Ok(())
}

fn handle_init(args: InitArgs, config: Option<&Path>, store: Option<&Path>) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to resolve working directory")?;
    let cfg_path = config
        .map(Path::to_path_buf)
        .unwrap_or_else(|| cwd.join(CONFIG_FILE_NAME));

    if cfg_path.exists() && !args.force {
        println!("Config already exists: {}", cfg_path.display());
    } else {
        write_config(&cfg_path, &AppConfig::default())?;
        println!("Wrote config: {}", cfg_path.display());
    }

    let base = cfg_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or(cwd);
    let store = match store {
        Some(store) => store.to_path_buf(),
        None => AppConfig::default().anchor(&base).store,
    };

    if store.exists() {
        println!("Store already exists: {}", store.display());
    } else {
        Classifier::new().save(&store)?;
        println!("Wrote empty store: {}", store.display());
    }
    Ok(())
}

fn handle_rules(cmd: RulesCmd, store: &Path) -> Result<()> {
    let mut classifier = Classifier::from_path(store)?;
    match cmd {
        RulesCmd::List { label } => {
            if classifier.is_empty() {
                println!("(no rules)");
                return Ok(());
            }
            let mut any = false;
            for (description, rule) in classifier.iter() {
                if label.as_deref().is_some_and(|l| l != rule) {
                    continue;
                }
                println!("{description}\t{rule}");
                any = true;
            }
            if !any {
                println!("(no rules labelled {})", label.unwrap_or_default());
            }
        }
        RulesCmd::Set { description, label } => {
            let label = label.trim().to_string();
            if label.is_empty() {
                return Err(anyhow!("Label must not be blank"));
            }
            let previous = classifier.lookup(&description).map(str::to_string);
            classifier.set(description.clone(), label.clone());
            classifier.save(store)?;
            match previous {
                Some(old) if old != label => {
                    println!("Reclassified '{description}': {old} -> {label}")
                }
                Some(_) => println!("Unchanged '{description}': {label}"),
                None => println!("Classified '{description}' as {label}"),
            }
        }
        RulesCmd::Remove { description } => {
            let Some(old) = classifier.remove(&description) else {
                return Err(anyhow!("No rule for '{description}' in {}", store.display()));
            };
            classifier.save(store)?;
            println!("Removed '{description}' ({old})");
        }
    }
    Ok(())
}
