use clap::Parser;
use feecalc::application::auth::{Authorizer, issue_credential};
use feecalc::application::dispatcher::Dispatcher;
use feecalc::application::engine::ComputeEngine;
use feecalc::config::{BatchArgs, Cli, Command, EngineArgs, ServeArgs};
use feecalc::domain::ports::SharedLedger;
use feecalc::infrastructure::in_memory::InMemoryLedger;
#[cfg(feature = "storage-rocksdb")]
use feecalc::infrastructure::rocksdb::RocksDBLedger;
use feecalc::interfaces::csv::batch::BatchProcessor;
use feecalc::interfaces::http::handler::{AppState, create_router};
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => serve(args),
        Command::Batch(args) => batch(args),
        Command::Token(args) => {
            println!("{}", issue_credential(&args.user, &args.plan));
            Ok(())
        }
    }
}

/// Request handling and computation run on separate runtimes so slow
/// calculations never starve the listener.
fn build_runtimes(engine: &EngineArgs) -> Result<(Runtime, Runtime)> {
    let io_runtime = Builder::new_multi_thread()
        .enable_all()
        .thread_name("feecalc-http")
        .build()
        .into_diagnostic()?;
    let compute_runtime = Builder::new_multi_thread()
        .worker_threads(engine.workers.max(1))
        .enable_all()
        .thread_name("feecalc-compute")
        .build()
        .into_diagnostic()?;
    Ok((io_runtime, compute_runtime))
}

fn start_dispatcher(engine: &EngineArgs, compute_runtime: &Runtime) -> Result<Dispatcher> {
    let fees = engine.fee_table().into_diagnostic()?;
    Ok(Dispatcher::start_on(
        compute_runtime.handle(),
        ComputeEngine::new(Arc::new(fees)),
        engine.dispatcher_config(),
    ))
}

fn open_ledger(db_path: Option<&Path>) -> Result<SharedLedger> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let ledger = RocksDBLedger::open(path).into_diagnostic()?;
            info!(path = %path.display(), "using persistent ledger");
            Ok(Arc::new(ledger))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            warn!(
                "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory ledger."
            );
            Ok(Arc::new(InMemoryLedger::new()))
        }
        None => Ok(Arc::new(InMemoryLedger::new())),
    }
}

fn serve(args: ServeArgs) -> Result<()> {
    let (io_runtime, compute_runtime) = build_runtimes(&args.engine)?;
    let dispatcher = start_dispatcher(&args.engine, &compute_runtime)?;
    let ledger = open_ledger(args.engine.db_path.as_deref())?;
    let state = AppState::new(Authorizer::new(), Arc::new(dispatcher), ledger);

    io_runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(args.bind)
            .await
            .into_diagnostic()?;
        info!(addr = %args.bind, workers = args.engine.workers, "calculation server listening");

        axum::serve(listener, create_router(state))
            .with_graceful_shutdown(async {
                if tokio::signal::ctrl_c().await.is_err() {
                    warn!("could not install ctrl-c handler");
                    std::future::pending::<()>().await;
                }
                info!("shutdown requested");
            })
            .await
            .into_diagnostic()
    })?;

    compute_runtime.shutdown_timeout(Duration::from_secs(5));
    Ok(())
}

fn batch(args: BatchArgs) -> Result<()> {
    let (io_runtime, compute_runtime) = build_runtimes(&args.engine)?;
    let dispatcher = start_dispatcher(&args.engine, &compute_runtime)?;
    let ledger = open_ledger(args.engine.db_path.as_deref())?;
    let input = File::open(&args.input).into_diagnostic()?;

    io_runtime.block_on(async {
        let stdout = io::stdout();
        BatchProcessor::new(&dispatcher, ledger)
            .with_min_gross(args.min_gross)
            .run(input, stdout.lock())
            .await
            .into_diagnostic()?;
        dispatcher.shutdown().await;
        Ok::<_, miette::Report>(())
    })?;

    compute_runtime.shutdown_timeout(Duration::from_secs(5));
    Ok(())
}
