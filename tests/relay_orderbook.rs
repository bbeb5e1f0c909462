//! REST orderbook fetch through signature verification and display labels

use ethers::signers::{LocalWallet, Signer};
use mockito::Matcher;

use relay_client::config::load_config_from_str;
use relay_client::order::{self, Address, Order, OrderTerms, Side, Signature, Uint256};
use relay_client::relay::{OrderbookQuery, RelayClient, RelayError};

/// Hardhat account #1, a public test key
const TEST_KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
const ZRX: &str = "0xe41d2489571d322189246dafa5ebde1f4699f498";
const WETH: &str = "0x2956356cd2a2bf3202f771f50d3d14a367b48070";

fn config_yaml(url: &str) -> String {
    format!(
        r#"
relay:
  url: {url}
  ws_url: ws://127.0.0.1:1/ws
  max_attempts: 2
tokens:
  - symbol: ZRX
    address: "{ZRX}"
  - symbol: WETH
    address: "{WETH}"
pairs:
  - base: ZRX
    quote: WETH
"#
    )
}

fn signed(
    maker_token: &str,
    taker_token: &str,
    maker_amount: u64,
    taker_amount: u64,
    salt: u64,
) -> Order {
    let wallet: LocalWallet = TEST_KEY.parse().unwrap();
    let terms = OrderTerms {
        maker: Address::from_bytes(wallet.address().0),
        maker_token: maker_token.parse().unwrap(),
        taker_token: taker_token.parse().unwrap(),
        maker_amount: Uint256::from_u64(maker_amount),
        taker_amount: Uint256::from_u64(taker_amount),
        expiration_timestamp: Uint256::from_u64(1_900_000_000),
        salt: Uint256::from_u64(salt),
        ..Default::default()
    };
    let signature = order::sign_order_hash(&wallet, &terms.hash()).unwrap();
    Order::new(terms, signature, Uint256::ZERO, Uint256::ZERO)
}

fn forged(order: &Order) -> Order {
    let sig = order.signature();
    let mut s = *sig.s();
    s[31] ^= 0x01;
    Order::new(
        *order.terms(),
        Signature::new(sig.v(), *sig.r(), s),
        order.taker_amount_filled(),
        order.taker_amount_cancelled(),
    )
}

#[tokio::test]
async fn test_fetch_verify_and_describe_orderbook() {
    let mut server = mockito::Server::new_async().await;
    let config = load_config_from_str(&config_yaml(&server.url())).unwrap();
    let registry = config.token_registry().unwrap();
    let pair = config.resolve_pairs(&registry).unwrap().remove(0);
    assert_eq!(pair.label, "ZRX/WETH");

    let bid = signed(WETH, ZRX, 2, 100, 1);
    let ask = signed(ZRX, WETH, 100, 3, 2);
    let bad_ask = forged(&signed(ZRX, WETH, 50, 1, 3));
    let body = serde_json::json!({ "bids": [bid], "asks": [ask, bad_ask] }).to_string();

    let mock = server
        .mock("GET", "/orderbook")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("baseTokenAddress".into(), ZRX.into()),
            Matcher::UrlEncoded("quoteTokenAddress".into(), WETH.into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_header("X-RateLimit-Remaining", "41")
        .with_body(body)
        .create_async()
        .await;

    let client = RelayClient::new(config.relay.url.clone()).with_retry(config.request_policy());
    let response = client
        .orderbook(&OrderbookQuery::new(pair.base, pair.quote))
        .await
        .unwrap();
    mock.assert_async().await;

    assert_eq!(response.rate_limit.remaining, Some(41));
    assert_eq!(response.data.bids, vec![bid.clone()]);
    assert_eq!(response.data.asks.len(), 2);

    let verified: Vec<&Order> = response
        .data
        .asks
        .iter()
        .filter(|o| o.is_signed_by_maker())
        .collect();
    assert_eq!(verified, vec![&ask]);
    assert!(response.data.bids[0].is_signed_by_maker());

    // hash survives the JSON hop
    assert_eq!(response.data.bids[0].hash(), bid.hash());
    assert_eq!(order::decode(&order::encode(&response.data.bids[0])).unwrap(), bid);

    assert_eq!(
        Side::classify(&response.data.asks[0], &pair.base),
        Side::Ask
    );
    assert_eq!(
        registry.describe(&response.data.bids[0], Side::Bid),
        "Bid: 2 WETH -> 100 ZRX"
    );
    assert_eq!(
        registry.describe(&response.data.asks[0], Side::Ask),
        "Ask: 100 ZRX -> 3 WETH"
    );
}

#[tokio::test]
async fn test_orderbook_with_corrupt_order_is_decode_error() {
    let mut server = mockito::Server::new_async().await;
    let mut bad = serde_json::to_value(signed(ZRX, WETH, 1, 1, 9)).unwrap();
    bad["makerTokenAmount"] = serde_json::json!("not a number");
    let body = serde_json::json!({ "bids": [], "asks": [bad] }).to_string();

    let _mock = server
        .mock("GET", "/orderbook")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let client = RelayClient::new(server.url());
    let result = client
        .orderbook(&OrderbookQuery::new(ZRX.parse().unwrap(), WETH.parse().unwrap()))
        .await;
    assert!(matches!(result, Err(RelayError::Decode { .. })));
}
