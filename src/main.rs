//! Binary entrypoint for the carousel demo.
//!
//! Delegates all logic to the library crate; the terminal stands in for the
//! host page: stdin lines are the navigation triggers, tracing is the display.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use carousel::config;
use carousel::engine::{EngineOptions, TransitionEngine};
use carousel::events::EngineEvent;
use carousel::policy::NavigationRequest;
use carousel::preload::ImagePreloader;
use carousel::render::TraceRenderer;
use carousel::slides::SlideSet;

/// Simple CLI
#[derive(Debug, Parser)]
#[command(name = "carousel", about = "Cross-fading image carousel")]
struct Cli {
    /// Path to YAML config file
    #[arg(short, long, value_name = "FILE", default_value = "config.yaml")]
    config: PathBuf,

    /// Override autoplay dwell (ms)
    #[arg(long, value_name = "MILLIS")]
    dwell_ms: Option<u64>,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    // map -v to log level
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter =
        EnvFilter::from_default_env().add_directive(format!("carousel={level}").parse()?);
    fmt().with_env_filter(filter).with_target(true).init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let cfg = config::from_yaml_file(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    cfg.validate().context("validating configuration")?;

    let mut slides = SlideSet::new(cfg.images.clone(), cfg.links.clone())?;
    let start = slides.resolve_start(cfg.initial.as_deref());
    info!(slides = slides.len(), start, "slide set ready");

    let dwell = cli.dwell_ms.map(Duration::from_millis).unwrap_or(cfg.dwell);
    let options = EngineOptions {
        dwell,
        fade: cfg.fade.duration(),
        random: cfg.random,
    };

    let (nav_tx, nav_rx) = mpsc::channel(16);
    let (event_tx, mut event_rx) = mpsc::channel(16);
    let cancel = CancellationToken::new();

    let engine = TransitionEngine::new(
        slides,
        start,
        options,
        Arc::new(ImagePreloader),
        TraceRenderer::default(),
        event_tx,
    );
    let engine_task = tokio::spawn(engine.run(nav_rx, cancel.clone()));
    let stdin_task = tokio::spawn(read_stdin_nav(nav_tx, cancel.clone()));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("ctrl-c; shutting down");
                cancel.cancel();
                break;
            }
            _ = cancel.cancelled() => break,
            maybe_event = event_rx.recv() => match maybe_event {
                Some(EngineEvent::SlideShown { index, url, link }) => {
                    info!(index, url = %url, link = ?link, "now showing");
                }
                Some(EngineEvent::LoadFailed { index, url, error }) => {
                    warn!(index, url = %url, error = %error, "slide skipped");
                }
                None => break,
            },
        }
    }

    cancel.cancel();
    let _ = engine_task.await;
    stdin_task.abort();
    Ok(())
}

/// Map stdin lines to navigation requests: `n` next, `p` previous, a number
/// jumps to that slide, `q` quits.
async fn read_stdin_nav(nav: mpsc::Sender<NavigationRequest>, cancel: CancellationToken) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => {
                let Ok(Some(line)) = line else { break };
                let request = match line.trim() {
                    "" => continue,
                    "n" => NavigationRequest::Next,
                    "p" => NavigationRequest::Previous,
                    "q" => {
                        cancel.cancel();
                        break;
                    }
                    other => match other.parse::<i64>() {
                        Ok(index) => NavigationRequest::JumpTo(index),
                        Err(_) => {
                            warn!(input = other, "unrecognized command (n/p/<index>/q)");
                            continue;
                        }
                    },
                };
                if nav.send(request).await.is_err() {
                    break;
                }
            }
        }
    }
}
