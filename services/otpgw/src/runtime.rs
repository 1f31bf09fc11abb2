//! Gateway startup and shutdown orchestration

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use smpp_link::Transport;

use crate::config::AppConfig;
use crate::dispatch::SmsDispatcher;
use crate::error::Result;
use crate::session::{HealthMonitor, SessionLifecycleManager};

/// Wait for the monitor task to finish after cancellation
const MONITOR_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// A started gateway: bound session plus running health monitor
pub struct Gateway {
    manager: Arc<SessionLifecycleManager>,
    dispatcher: SmsDispatcher,
    monitor: JoinHandle<()>,
    monitor_token: CancellationToken,
}

/// Bind under the startup retry policy, then start the health monitor
///
/// Returns an error (and never reports ready) when every startup attempt
/// fails.
pub async fn start(config: &AppConfig, transport: Arc<dyn Transport>) -> Result<Gateway> {
    let manager = Arc::new(SessionLifecycleManager::new(config.smpp.clone(), transport));
    let policy = config.session.retry_policy();

    info!(
        endpoint = %config.smpp.endpoint(),
        system_id = %config.smpp.system_id,
        "Binding SMPP session (up to {} attempts, {:?} apart)",
        policy.max_attempts,
        policy.delay
    );

    policy
        .run(|| {
            let manager = Arc::clone(&manager);
            async move { manager.establish().await }
        })
        .await?;

    let monitor = HealthMonitor::new(
        Arc::clone(&manager),
        config.session.health_interval(),
        config.session.health_check_timeout(),
    );
    let (monitor, monitor_token) = monitor.spawn();

    info!("OTP gateway ready");
    Ok(Gateway {
        dispatcher: SmsDispatcher::new(Arc::clone(&manager)),
        manager,
        monitor,
        monitor_token,
    })
}

impl Gateway {
    pub fn manager(&self) -> &Arc<SessionLifecycleManager> {
        &self.manager
    }

    pub fn dispatcher(&self) -> SmsDispatcher {
        self.dispatcher.clone()
    }

    /// Stop the monitor, then unbind
    pub async fn shutdown(self) {
        info!("Stopping OTP gateway");
        self.monitor_token.cancel();
        match tokio::time::timeout(MONITOR_STOP_TIMEOUT, self.monitor).await {
            Ok(Ok(())) => {},
            Ok(Err(e)) => warn!("Health monitor task failed: {}", e),
            Err(_) => warn!("Health monitor did not stop within {:?}", MONITOR_STOP_TIMEOUT),
        }

        self.manager.shutdown().await;
        info!("OTP gateway stopped");
    }
}
