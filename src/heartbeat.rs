use crate::bus::{Event, EventBus};
use std::{sync::Arc, time::Duration};
use tokio::time::{self, Instant};

/// Announces on the event bus that the server is alive.
pub struct Heartbeat {
    event_bus: Arc<EventBus>,
    initial_delay: Duration,
    /// `None` announces once.
    interval: Option<Duration>,
}

impl Heartbeat {
    pub fn new(
        event_bus: Arc<EventBus>,
        initial_delay: Duration,
        interval: Option<Duration>,
    ) -> Self {
        Self {
            event_bus,
            initial_delay,
            interval,
        }
    }

    /// Runs until the task is dropped, or returns after the first
    /// announcement when no interval is set.
    pub async fn run(&self) {
        let started = Instant::now();
        time::sleep(self.initial_delay).await;
        self.announce(started);

        let Some(period) = self.interval else {
            return;
        };

        let mut ticker = time::interval_at(Instant::now() + period, period);
        loop {
            ticker.tick().await;
            self.announce(started);
        }
    }

    fn announce(&self, started: Instant) {
        self.event_bus.publish(Event::Status {
            message: format!(
                "Server running for {}s. Waiting for forwarded packets...",
                started.elapsed().as_secs()
            ),
        });
    }
}
