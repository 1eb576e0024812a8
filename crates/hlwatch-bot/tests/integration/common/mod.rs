pub mod mock_ws;

use std::future::Future;
use std::time::Duration;

pub const ADDR_A: &str = "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
pub const ADDR_B: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

/// Poll `condition` every 20ms until it holds or `limit` elapses.
pub async fn wait_until<F, Fut>(limit: Duration, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    tokio::time::timeout(limit, async {
        loop {
            if condition().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .is_ok()
}

/// A streaming userFills frame with one BTC fill for `user`.
pub fn btc_fill_frame(user: &str) -> String {
    serde_json::json!({
        "channel": "userFills",
        "data": {
            "user": user,
            "fills": [{
                "coin": "BTC",
                "px": "50000",
                "sz": "0.1",
                "side": "B",
                "time": 1700000000000u64,
                "startPosition": "0",
                "dir": "Open Long",
                "closedPnl": "0",
                "hash": "0x00",
                "oid": 1,
                "crossed": true,
                "fee": "0",
                "tid": 1
            }]
        }
    })
    .to_string()
}
