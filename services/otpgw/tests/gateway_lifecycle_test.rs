//! Gateway startup, recovery and shutdown against a scripted transport

#![allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable

use std::sync::Arc;
use std::time::Duration;

use otpgw::{runtime, AppConfig, BindCredentials, GatewayError, SessionConfig, SessionState};
use smpp_link::constants::ESME_RBINDFAIL;
use smpp_link::mock::{OpenBehavior, ScriptedTransport};
use smpp_link::LinkError;
use tokio::time::Instant;

fn config() -> AppConfig {
    AppConfig {
        smpp: BindCredentials::new("h", 1, "s", "p", "t", "a"),
        session: SessionConfig::default(),
        ..Default::default()
    }
}

fn refused() -> OpenBehavior {
    OpenBehavior::Fail(LinkError::connection("connection refused"))
}

#[tokio::test(start_paused = true)]
async fn test_startup_binds_with_configured_credentials() {
    let transport = Arc::new(ScriptedTransport::new());
    let gateway = runtime::start(&config(), transport.clone()).await.unwrap();

    assert_eq!(gateway.manager().state(), SessionState::Bound);
    assert!(gateway.manager().current().unwrap().is_bound());
    assert_eq!(transport.endpoints(), vec![("h".to_string(), 1)]);

    let binds = transport.last_session().unwrap().binds();
    let bind = &binds[0];
    assert_eq!(
        (
            bind.system_id.as_str(),
            bind.password.as_str(),
            bind.system_type.as_str(),
            bind.address_range.as_str()
        ),
        ("s", "p", "t", "a")
    );
    assert_eq!(bind.interface_version, 0x34);

    gateway.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_startup_fails_twice_then_binds() {
    let transport = Arc::new(ScriptedTransport::with_script(vec![refused(), refused()]));
    let started = Instant::now();

    let gateway = runtime::start(&config(), transport.clone()).await.unwrap();

    assert_eq!(transport.open_count(), 3);
    assert_eq!(started.elapsed(), Duration::from_secs(10));
    assert!(gateway.manager().current().unwrap().is_bound());

    gateway.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_startup_exhaustion_is_fatal() {
    let transport = Arc::new(ScriptedTransport::with_script(vec![
        refused(),
        OpenBehavior::Bind(ESME_RBINDFAIL),
        refused(),
    ]));

    let err = runtime::start(&config(), transport.clone())
        .await
        .err()
        .unwrap();

    match err {
        GatewayError::RetryExhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, GatewayError::Transport(_)));
        },
        other => panic!("expected RetryExhausted, got {other:?}"),
    }
    // No fourth attempt and nothing left running that could bind later
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(transport.open_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_runtime_recovery_is_single_shot() {
    let transport = Arc::new(ScriptedTransport::new());
    let gateway = runtime::start(&config(), transport.clone()).await.unwrap();

    // Link drops and the gateway refuses the next two binds
    transport.push(refused());
    transport.push(refused());
    transport.last_session().unwrap().drop_link();

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(transport.open_count(), 2);
    assert!(gateway.manager().current().is_none());

    let err = gateway.dispatcher().send("15550100", "123456").await.unwrap_err();
    assert!(matches!(err, GatewayError::DeliveryUnavailable(_)));

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(transport.open_count(), 3);
    assert!(gateway.manager().current().is_none());

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(transport.open_count(), 4);
    assert_eq!(gateway.manager().state(), SessionState::Bound);

    let id = gateway.dispatcher().send("15550100", "123456").await.unwrap();
    assert_eq!(id, "msg-1");

    gateway.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_monitor_and_unbinds() {
    let transport = Arc::new(ScriptedTransport::new());
    let gateway = runtime::start(&config(), transport.clone()).await.unwrap();
    let manager = Arc::clone(gateway.manager());
    let session = transport.last_session().unwrap();

    gateway.shutdown().await;
    assert_eq!(session.unbind_count(), 1);
    assert!(manager.current().is_none());

    // Monitor is gone: no recovery after shutdown
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(transport.open_count(), 1);
}
