//! Inspection CLI for the Stash client core
//!
//! Validates and prints the modal flow tables, replays navigation sequences
//! and shows what attribution a landing URL yields.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use stash_app::attribution::{AttributionParams, AttributionStore};
use stash_app::flows::{
    BackTarget, CardDepositFlow, DepositFlow, FlowKind, FlowMachine, FlowSet, FlowSpec, FlowState,
    Navigation, SendFlow, WithdrawFlow,
};
use stash_app::{AppConfig, LaunchParams};
use stash_core::{PhysicalTimeEffects, StorageEffects};
use stash_effects::{FilesystemStorageHandler, MemoryStorageHandler, RealTimeHandler};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "stash-flows")]
#[command(about = "Inspect Stash modal flows and attribution parsing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, default_value = "stash.toml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and validate every flow table
    Validate,

    /// Print a flow's states, numbers, titles and back targets
    Table {
        /// deposit, send, withdraw or card-deposit
        flow: FlowKind,
    },

    /// Replay steps against a flow: state names, `open`, `back` or `close`
    Simulate {
        /// deposit, send, withdraw or card-deposit
        flow: FlowKind,

        /// Steps applied in order
        #[arg(required = true)]
        steps: Vec<String>,
    },

    /// Parse and sanitize the marketing parameters of a URL or deep link
    Attribution {
        /// Landing URL, custom-scheme deep link or bare path
        url: String,

        /// Also capture into the configured storage and print event properties
        #[arg(long)]
        capture: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = AppConfig::load_from_file(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    config.apply_env_overrides()?;
    config.validate()?;

    match cli.command {
        Commands::Validate => validate(),
        Commands::Table { flow } => match flow {
            FlowKind::Deposit => print_table::<DepositFlow>(),
            FlowKind::Send => print_table::<SendFlow>(),
            FlowKind::Withdraw => print_table::<WithdrawFlow>(),
            FlowKind::CardDeposit => print_table::<CardDepositFlow>(),
        },
        Commands::Simulate { flow, steps } => match flow {
            FlowKind::Deposit => simulate::<DepositFlow>(&steps),
            FlowKind::Send => simulate::<SendFlow>(&steps),
            FlowKind::Withdraw => simulate::<WithdrawFlow>(&steps),
            FlowKind::CardDeposit => simulate::<CardDepositFlow>(&steps),
        },
        Commands::Attribution { url, capture } => attribution(&config, &url, capture).await,
    }
}

fn validate() -> Result<()> {
    FlowSet::new()?;
    for flow in FlowKind::ALL {
        println!("{flow}: ok");
    }
    Ok(())
}

fn print_table<F: FlowSpec>() -> Result<()> {
    let machine = FlowMachine::<F>::new()?;
    let registry = machine.registry();
    println!("{:<28} {:>3}  {:<28} {:<26} TITLE", "STATE", "NUM", "BACK", "VIEW");
    for state in F::State::all().iter().copied() {
        let back = match registry.back_target(state) {
            BackTarget::To(target) => target.name().to_string(),
            BackTarget::Previous { fallback } => format!("previous|{}", fallback.name()),
        };
        let view = format!("{:?}", registry.content().resolve(state));
        println!(
            "{:<28} {:>3}  {:<28} {:<26} {}",
            state.name(),
            state.number(),
            back,
            view,
            registry.title(state)
        );
    }
    Ok(())
}

fn simulate<F: FlowSpec>(steps: &[String]) -> Result<()> {
    let machine = FlowMachine::<F>::new()?;
    let ctx = F::Context::default();

    for step in steps {
        let outcome = match step.as_str() {
            "open" => machine.handle_open_change(true, &ctx),
            "close" => machine.handle_open_change(false, &ctx),
            "back" => machine.handle_back_press(&ctx),
            name => match F::State::from_name(name) {
                Some(state) => Navigation::Moved(machine.navigate(state)),
                None => bail!("{}: unknown state {name:?}", F::NAME),
            },
        };

        let t = machine.store().transition();
        let kind = match outcome {
            Navigation::Moved(_) => "moved",
            Navigation::Closed => "closed",
            Navigation::Blocked { .. } => "blocked",
            Navigation::Redirected(_) => "redirected",
            Navigation::Unchanged => "unchanged",
        };
        println!(
            "{step:<28} {kind:<10} {} <- {} forward={} animate={} view={:?}",
            t.current.name(),
            t.previous.name(),
            t.is_forward(),
            t.should_animate(),
            machine.view(),
        );
    }
    Ok(())
}

async fn attribution(config: &AppConfig, url: &str, capture: bool) -> Result<()> {
    let launch = LaunchParams::parse(url)?;
    let params = AttributionParams::from_deep_link(url)?;
    println!("path: {}", launch.path);
    if let Some(code) = &launch.referral_code {
        println!("referral_code: {code}");
    }
    if let Some(resume) = &launch.resume_params {
        println!("resume_params: {resume}");
    }
    println!("country_confirmed: {}", launch.country_confirmed);
    println!("{}", serde_json::to_string_pretty(&params)?);

    if !capture {
        return Ok(());
    }

    let storage: Arc<dyn StorageEffects> = match &config.storage_dir {
        Some(dir) => Arc::new(FilesystemStorageHandler::new(dir.clone())),
        None => Arc::new(MemoryStorageHandler::new()),
    };
    let time: Arc<dyn PhysicalTimeEffects> = Arc::new(RealTimeHandler::new());
    let store = AttributionStore::new(storage, time, &config.storage_prefix)
        .with_window_days(config.attribution_window_days);

    let outcome = store.capture_from_deep_link(url).await?;
    println!("capture: {outcome:?}");
    println!(
        "{}",
        serde_json::to_string_pretty(&store.attribution_for_event().await?)?
    );
    Ok(())
}
