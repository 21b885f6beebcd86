//! Polling helpers for background work

use std::time::Duration;

/// Poll `check` every 10ms for up to 5s
pub async fn wait_until(mut check: impl FnMut() -> bool) {
    for _ in 0..500 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within 5s");
}
