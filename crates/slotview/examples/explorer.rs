//! Example: run the explorer runtime against a live backend and print the view as it changes.
//!
//! Usage: cargo run -p slotview --example explorer -- --api-url http://localhost:3001 --ws-url ws://localhost:3001/ws
//!
//! Options:
//!   --config PATH     JSON config file; command-line URLs override it.
//!   --show-skipped    Include skipped slots in the printed list.
//!   --more N          Request N extra pages once the first page lands.

use clap::Parser;
use slotview::{Driver, ExplorerConfig, HttpSource, PushStream};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Follow a ledger explorer backend from the terminal")]
struct Args {
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    ws_url: Option<String>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    show_skipped: bool,
    #[arg(long, default_value_t = 0)]
    more: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();
    let show_skipped = args.show_skipped;
    let mut pending_more = args.more;

    let mut config = match &args.config {
        Some(path) => ExplorerConfig::from_json_file(path)?,
        None => ExplorerConfig::default(),
    };
    if let Some(url) = args.api_url {
        config.api_url = url;
    }
    if let Some(url) = args.ws_url {
        config.ws_url = url;
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let source = HttpSource::from_config(&config)?;
        let (stream_tx, stream_rx) = mpsc::channel(256);
        let stream = PushStream::from_config(&config);
        tokio::spawn(async move {
            if let Err(e) = stream.run(stream_tx).await {
                tracing::error!(reason = %e, "push stream stopped");
            }
        });

        let (driver, handle) = Driver::new(config, source);
        let driver = tokio::spawn(driver.run(stream_rx));
        if show_skipped && !handle.send(slotview::Command::SetShowSkipped(true)).await {
            tracing::warn!("driver stopped before the skip filter was applied");
        }

        let mut rx = handle.subscribe();
        loop {
            tokio::select! {
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let view = rx.borrow_and_update().clone();
                    if view.initial_load_complete && !view.loading_more && pending_more > 0 {
                        pending_more -= 1;
                        if !handle.request_more().await {
                            tracing::warn!("driver stopped, load-more not sent");
                            break;
                        }
                    }
                    let head: Vec<String> = view
                        .displayed()
                        .iter()
                        .take(5)
                        .map(|e| format!("{}:{:?}", e.slot, e.status))
                        .collect();
                    println!(
                        "v{} entries={} shown={} finalized={:?} producer={:?} events={} nodes={} ws={} head=[{}]",
                        view.version,
                        view.entries.len(),
                        view.displayed().len(),
                        view.highest_finalized_slot,
                        view.current_producer,
                        view.finalization_events.len(),
                        view.nodes.len(),
                        view.stream_connected,
                        head.join(" "),
                    );
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("interrupted, shutting down");
                    break;
                }
            }
        }

        drop(rx);
        drop(handle);
        let engine = driver.await?;
        println!(
            "final: {} entries, highest finalized {:?}",
            engine.store().len(),
            engine.tracker().highest_finalized_slot()
        );
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
