//! relay-orderbook: fetch one orderbook over REST and verify every order
//!
//! Usage: `relay-orderbook <BASE> <QUOTE>` where each side is a symbol from
//! `config.yaml` or a hex address.

use anyhow::Context;
use tracing::{info, warn};

use relay_client::config::{self, logging::init_logging};
use relay_client::order::Side;
use relay_client::relay::{OrderbookQuery, RelayClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let mut args = std::env::args().skip(1);
    let (base_arg, quote_arg) = match (args.next(), args.next()) {
        (Some(b), Some(q)) => (b, q),
        _ => anyhow::bail!("usage: relay-orderbook <BASE> <QUOTE>"),
    };

    let app_config = config::load_config(&config::config_path())?;
    let registry = app_config.token_registry()?;

    let base = registry
        .resolve(&base_arg)
        .with_context(|| format!("unknown base token '{}'", base_arg))?;
    let quote = registry
        .resolve(&quote_arg)
        .with_context(|| format!("unknown quote token '{}'", quote_arg))?;

    let client = RelayClient::new(app_config.relay.url.clone())
        .with_debug(app_config.relay.debug)
        .with_retry(app_config.request_policy());

    let response = client.orderbook(&OrderbookQuery::new(base, quote)).await?;
    info!(
        pair = %registry.pair_label(&base, &quote),
        bids = response.data.bids.len(),
        asks = response.data.asks.len(),
        rate_remaining = ?response.rate_limit.remaining,
        rate_reset = ?response.rate_limit.reset,
        "Orderbook fetched"
    );

    let sides = [(Side::Bid, &response.data.bids), (Side::Ask, &response.data.asks)];
    let mut rejected = 0usize;
    for (side, orders) in sides {
        for order in orders {
            if order.is_signed_by_maker() {
                info!(hash = %order.hash_hex(), "{}", registry.describe(order, side));
            } else {
                rejected += 1;
                warn!(
                    hash = %order.hash_hex(),
                    maker = %order.terms().maker,
                    "Signature does not match maker, skipping"
                );
            }
        }
    }

    if rejected > 0 {
        warn!(rejected, "Orders with invalid signatures");
    }
    Ok(())
}
