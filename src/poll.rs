//! Poll-and-react loop shared by both processes

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::Result;

/// Loop pacing
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    /// Sleep after every successful tick
    pub interval: Duration,
    /// Sleep after a failed tick
    pub error_backoff: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            error_backoff: Duration::from_secs(1),
        }
    }
}

/// One side of the turn protocol, driven one step at a time
#[async_trait]
pub trait Reactor: Send {
    /// Name used in log output
    fn name(&self) -> &'static str;

    /// Read shared state and perform at most one protocol step
    async fn tick(&mut self) -> Result<()>;
}

/// Drive `reactor` until `shutdown` resolves
///
/// Tick errors are logged and followed by `error_backoff`; they never end the
/// loop. Shutdown interrupts both a running tick and the inter-tick sleep.
pub async fn run_reactor<R, F>(reactor: &mut R, config: PollConfig, shutdown: F)
where
    R: Reactor + ?Sized,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let name = reactor.name();
    tracing::info!(
        reactor = name,
        interval_ms = config.interval.as_millis(),
        "poll loop started"
    );

    loop {
        let delay = tokio::select! {
            () = &mut shutdown => break,
            result = reactor.tick() => match result {
                Ok(()) => config.interval,
                Err(e) => {
                    tracing::error!(reactor = name, error = %e, "tick failed, backing off");
                    config.error_backoff
                }
            },
        };

        tokio::select! {
            () = &mut shutdown => break,
            () = tokio::time::sleep(delay) => {}
        }
    }

    tracing::info!(reactor = name, "poll loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    struct Flaky {
        ticks: u32,
        fail_every: u32,
    }

    #[async_trait]
    impl Reactor for Flaky {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn tick(&mut self) -> Result<()> {
            self.ticks += 1;
            if self.ticks % self.fail_every == 0 {
                return Err(Error::Robot("transient".to_string()));
            }
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_survives_errors_and_paces_ticks() {
        let mut reactor = Flaky {
            ticks: 0,
            fail_every: 3,
        };
        let config = PollConfig::default();

        run_reactor(&mut reactor, config, tokio::time::sleep(Duration::from_millis(2_050))).await;

        // Two ok ticks (100ms each) then one failure (1s): 1.2s per cycle
        // t=0 ok, 0.1 ok, 0.2 fail, 1.2 ok, 1.3 ok, 1.4 fail, then shutdown at 2.05
        assert_eq!(reactor.ticks, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_immediately() {
        let mut reactor = Flaky {
            ticks: 0,
            fail_every: u32::MAX,
        };

        run_reactor(&mut reactor, PollConfig::default(), std::future::ready(())).await;

        assert!(reactor.ticks <= 1);
    }
}
