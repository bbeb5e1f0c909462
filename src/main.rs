//! relay-stream: mirror the orderbooks of the configured pairs
//!
//! 1. Loads `.env` and `config.yaml` (path overridable with `RELAY_CONFIG`)
//! 2. Starts one stream session per pair
//! 3. Logs snapshots, updates and announcements until Ctrl+C

use tokio::signal;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use relay_client::config::{self, logging::init_logging};
use relay_client::stream::{StreamEvent, StreamSession, WsConnector};
use relay_client::tokens::TokenRegistry;

/// Event channel capacity shared by all sessions
const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    info!("relay-stream starting");
    config::constants::log_configuration();

    let app_config = config::load_config(&config::config_path())?;
    let registry = app_config.token_registry()?;
    let pairs = app_config.resolve_pairs(&registry)?;
    info!(
        pairs = ?pairs.iter().map(|p| p.label.as_str()).collect::<Vec<_>>(),
        tokens = registry.len(),
        "[CONFIG] Loaded configuration"
    );

    let cancel = CancellationToken::new();
    let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

    let mut sessions = JoinSet::new();
    for pair in pairs {
        let connector = WsConnector::new(
            app_config.relay.ws_url.clone(),
            app_config.stream.handshake_timeout(),
        );
        let mut session = StreamSession::new(
            pair.label.clone(),
            pair.base,
            pair.quote,
            connector,
            app_config.stream.session_config(),
        )
        .with_events(event_tx.clone());
        let token = cancel.child_token();
        sessions.spawn(async move {
            let result = session.run(token).await;
            (pair.label, result)
        });
    }
    drop(event_tx);

    let printer = tokio::spawn(log_events(event_rx, registry));

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("[SHUTDOWN] Graceful shutdown initiated");
                shutdown.cancel();
            }
            Err(err) => {
                error!(error = %err, "Failed to listen for Ctrl+C signal");
            }
        }
    });

    let mut failed = 0usize;
    while let Some(joined) = sessions.join_next().await {
        match joined {
            Ok((pair, Ok(()))) => info!(pair = %pair, "Session stopped"),
            Ok((pair, Err(e))) => {
                failed += 1;
                error!(pair = %pair, error = %e, "Session failed");
            }
            Err(e) => {
                failed += 1;
                error!(error = %e, "Session task panicked");
            }
        }
    }
    cancel.cancel();
    if let Err(e) = printer.await {
        warn!(error = %e, "Event printer ended abnormally");
    }

    if failed > 0 {
        anyhow::bail!("{} stream session(s) failed", failed);
    }
    info!("[SHUTDOWN] Clean exit");
    Ok(())
}

async fn log_events(mut rx: mpsc::Receiver<StreamEvent>, registry: TokenRegistry) {
    while let Some(event) = rx.recv().await {
        match event {
            StreamEvent::StateChanged { pair, state } => {
                info!(pair = %pair, state = %state, "State changed");
            }
            StreamEvent::SnapshotReplaced { pair, bids, asks } => {
                info!(pair = %pair, bids, asks, "Snapshot");
            }
            StreamEvent::OrderUpdated { pair, side, order } => {
                info!(
                    pair = %pair,
                    hash = %order.hash_hex(),
                    signed_by_maker = order.is_signed_by_maker(),
                    "New {}",
                    registry.describe(&order, side)
                );
            }
            StreamEvent::Announcement { pair, motd, announcements } => {
                if let Some(motd) = motd {
                    info!(pair = %pair, "MOTD: {}", motd);
                }
                for a in announcements {
                    info!(pair = %pair, "* {}", a);
                }
            }
        }
    }
}
