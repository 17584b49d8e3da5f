//! Background poll loop.

use super::{PollOutcome, Relay};

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};

/// Runs a poll cycle on a fixed interval until stopped.
pub struct PollLoop {
    relay: Arc<Relay>,
    interval: Duration,
    stop: Arc<Mutex<Option<broadcast::Sender<()>>>>,
}

impl PollLoop {
    pub fn new(relay: Arc<Relay>, interval: Duration) -> Self {
        Self {
            relay,
            interval,
            stop: Arc::new(Mutex::new(None)),
        }
    }

    /// Start the loop in a background task. Starting twice is a no-op.
    pub async fn start(&self) {
        let mut stop_guard = self.stop.lock().await;
        if stop_guard.is_some() {
            return;
        }

        let (tx, mut rx) = broadcast::channel(1);
        *stop_guard = Some(tx);
        drop(stop_guard);

        let relay = self.relay.clone();
        let period = self.interval;
        tracing::info!("PollLoop: polling every {:?}", period);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = rx.recv() => break,
                    _ = interval.tick() => {
                        match relay.poll_once().await {
                            Ok(PollOutcome::Delivered) => tracing::info!("PollLoop: report delivered"),
                            Ok(_) => {}
                            Err(e) => tracing::error!("PollLoop: poll failed: {}", e),
                        }
                    }
                }
            }

            tracing::info!("PollLoop: stopped");
        });
    }

    /// Stop the loop.
    pub async fn stop(&self) {
        let mut stop = self.stop.lock().await;
        if let Some(tx) = stop.take() {
            let _ = tx.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::tests::{relay_for, RESULT_BODY};
    use crate::testing::FakeUpstream;
    use chrono::Utc;

    #[tokio::test]
    async fn test_loop_delivers_then_stops() {
        let fake = FakeUpstream::start().await;
        fake.respond("/testStatus.php", 200, r#"{"statusCode":200}"#);
        fake.respond("/jsonResult.php", 200, RESULT_BODY);
        fake.respond("/webhook", 200, "ok");

        let relay = Arc::new(relay_for(&fake));
        relay.store().set_pending_test_id(Some("T1"), Utc::now()).unwrap();

        let poller = PollLoop::new(relay.clone(), Duration::from_millis(20));
        poller.start().await;
        poller.start().await;

        let mut delivered = false;
        for _ in 0..100 {
            if !fake.requests_to("/webhook").is_empty() {
                delivered = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        poller.stop().await;

        assert!(delivered);
        assert!(!relay.store().get_pending().unwrap().is_pending());

        // Further ticks find nothing to do.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fake.requests_to("/webhook").len(), 1);
        assert_eq!(fake.requests_to("/testStatus.php").len(), 1);
    }
}
