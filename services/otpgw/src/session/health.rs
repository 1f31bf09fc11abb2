//! Periodic session health monitor
//!
//! One background task. Each tick runs `ensure_healthy` inline, so checks
//! never overlap; ticks missed while a check is running are skipped. Every
//! check is bounded by a timeout so a hung bind cannot starve later ticks.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::manager::{SessionLifecycleManager, SessionState};

/// Background health checker for the SMPP session
pub struct HealthMonitor {
    manager: Arc<SessionLifecycleManager>,
    interval: Duration,
    check_timeout: Duration,
}

impl HealthMonitor {
    pub fn new(
        manager: Arc<SessionLifecycleManager>,
        interval: Duration,
        check_timeout: Duration,
    ) -> Self {
        Self {
            manager,
            interval,
            check_timeout,
        }
    }

    /// Run one bounded health check
    pub async fn check(&self) -> SessionState {
        match tokio::time::timeout(self.check_timeout, self.manager.ensure_healthy()).await {
            Ok(state) => state,
            Err(_) => {
                warn!(
                    "Session health check exceeded {:?}, abandoning this attempt",
                    self.check_timeout
                );
                self.manager.state()
            },
        }
    }

    /// Start the monitor; the first check runs one interval from now
    ///
    /// Cancel the returned token to stop it.
    pub fn spawn(self) -> (JoinHandle<()>, CancellationToken) {
        let token = CancellationToken::new();
        let task_token = token.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(
                "Session health monitor started (interval {:?}, timeout {:?})",
                self.interval, self.check_timeout
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        tokio::select! {
                            state = self.check() => debug!("Session health check: {}", state),
                            () = task_token.cancelled() => break,
                        }
                    }
                    () = task_token.cancelled() => {
                        info!("Health monitor received cancellation signal, shutting down");
                        break;
                    }
                }
            }

            info!("Session health monitor terminated");
        });

        (handle, token)
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use crate::config::BindCredentials;
    use smpp_link::mock::{OpenBehavior, ScriptedTransport};
    use smpp_link::LinkError;

    const INTERVAL: Duration = Duration::from_secs(30);
    const CHECK_TIMEOUT: Duration = Duration::from_secs(20);

    fn setup(transport: Arc<ScriptedTransport>) -> Arc<SessionLifecycleManager> {
        Arc::new(SessionLifecycleManager::new(
            BindCredentials::new("h", 1, "s", "p", "t", "a"),
            transport,
        ))
    }

    fn refused() -> OpenBehavior {
        OpenBehavior::Fail(LinkError::connection("connection refused"))
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_tick_leaves_session_absent_until_next_success() {
        let transport = Arc::new(ScriptedTransport::with_script(vec![refused(), refused()]));
        let manager = setup(transport.clone());
        let (handle, token) = HealthMonitor::new(manager.clone(), INTERVAL, CHECK_TIMEOUT).spawn();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(transport.open_count(), 0);

        tokio::time::sleep(INTERVAL).await; // t=31
        assert_eq!(transport.open_count(), 1);
        assert!(manager.current().is_none());

        tokio::time::sleep(INTERVAL).await; // t=61
        assert_eq!(transport.open_count(), 2);
        assert!(manager.current().is_none());

        tokio::time::sleep(INTERVAL).await; // t=91
        assert_eq!(transport.open_count(), 3);
        assert!(manager.current().unwrap().is_bound());

        // Healthy ticks make no transport calls
        tokio::time::sleep(INTERVAL * 3).await;
        assert_eq!(transport.open_count(), 3);

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_dropped_session() {
        let transport = Arc::new(ScriptedTransport::new());
        let manager = setup(transport.clone());
        manager.establish().await.unwrap();
        let (handle, token) = HealthMonitor::new(manager.clone(), INTERVAL, CHECK_TIMEOUT).spawn();

        transport.last_session().unwrap().drop_link();
        tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;

        assert_eq!(transport.open_count(), 2);
        assert!(manager.current().unwrap().is_bound());

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_bind_does_not_block_later_ticks() {
        let transport = Arc::new(ScriptedTransport::with_script(vec![OpenBehavior::HangOnBind]));
        let manager = setup(transport.clone());
        let (handle, token) = HealthMonitor::new(manager.clone(), INTERVAL, CHECK_TIMEOUT).spawn();

        // t=30 check hangs until its 20s timeout
        tokio::time::sleep(Duration::from_secs(55)).await;
        assert_eq!(transport.open_count(), 1);
        assert!(manager.current().is_none());

        // t=60 tick binds normally
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(transport.open_count(), 2);
        assert!(manager.current().unwrap().is_bound());

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_running_check() {
        let transport = Arc::new(ScriptedTransport::with_script(vec![OpenBehavior::HangOnBind]));
        let manager = setup(transport.clone());
        let (handle, token) =
            HealthMonitor::new(manager, INTERVAL, Duration::from_secs(3600)).spawn();

        tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;
        assert_eq!(transport.open_count(), 1);

        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
