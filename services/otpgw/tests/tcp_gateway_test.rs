//! End-to-end: gateway over real TCP against an in-process fake SMSC

#![allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use otpgw::{runtime, AppConfig, BindCredentials, SessionConfig, SessionState};
use smpp_link::constants::{ESME_RINVSYSID, ESME_ROK};
use smpp_link::{Pdu, PduBody, PduCodec, TcpTransport};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;

/// Accepts any number of connections; the first one is unbound by the
/// SMSC right after its first submit_sm
async fn spawn_smsc() -> (u16, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let connections = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&connections);
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::spawn(serve(Framed::new(stream, PduCodec::default()), n == 1));
        }
    });

    (port, connections)
}

async fn serve(mut framed: Framed<TcpStream, PduCodec>, unbind_after_submit: bool) {
    let mut submitted = 0;
    while let Some(Ok(pdu)) = framed.next().await {
        let seq = pdu.sequence_number;
        let reply = match pdu.body {
            PduBody::BindTransmitter(bind) => {
                let status = if bind.system_id == "otpgw" {
                    ESME_ROK
                } else {
                    ESME_RINVSYSID
                };
                Pdu::response(
                    seq,
                    status,
                    PduBody::BindTransmitterResp {
                        system_id: "FAKESMSC".into(),
                    },
                )
            },
            PduBody::SubmitSm(_) => {
                submitted += 1;
                Pdu::new(
                    seq,
                    PduBody::SubmitSmResp {
                        message_id: format!("id-{submitted}"),
                    },
                )
            },
            PduBody::EnquireLink => Pdu::new(seq, PduBody::EnquireLinkResp),
            PduBody::Unbind => {
                let _ = framed.send(Pdu::new(seq, PduBody::UnbindResp)).await;
                return;
            },
            _ => continue,
        };
        let was_submit = reply.command_id() == smpp_link::constants::SUBMIT_SM_RESP;
        if framed.send(reply).await.is_err() {
            return;
        }
        if was_submit && unbind_after_submit {
            let _ = framed.send(Pdu::new(77, PduBody::Unbind)).await;
        }
    }
}

fn config(port: u16) -> AppConfig {
    AppConfig {
        smpp: BindCredentials::new("127.0.0.1", port, "otpgw", "secret", "OTP", "MyBank"),
        session: SessionConfig {
            health_interval_secs: 1,
            health_check_timeout_secs: 2,
            connect_timeout_secs: 2,
            response_timeout_secs: 2,
            enquire_link_interval_secs: 1,
            ..Default::default()
        },
        ..Default::default()
    }
}

#[tokio::test]
async fn test_send_and_recover_after_gateway_unbind() {
    let (port, connections) = spawn_smsc().await;
    let cfg = config(port);
    let transport = Arc::new(TcpTransport::new(cfg.session.transport_options()));

    let gateway = runtime::start(&cfg, transport).await.unwrap();
    assert_eq!(gateway.manager().state(), SessionState::Bound);

    let id = gateway
        .dispatcher()
        .send("+15550100", "Your code is 123456")
        .await
        .unwrap();
    assert_eq!(id, "id-1");

    // Keep-alive notices the unbind, the monitor binds a fresh connection
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        if connections.load(Ordering::SeqCst) >= 2
            && gateway.manager().state() == SessionState::Bound
        {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "session was not recovered"
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let id = gateway.dispatcher().send("15550100", "654321").await.unwrap();
    assert_eq!(id, "id-1");

    gateway.shutdown().await;
}

#[tokio::test]
async fn test_bad_system_id_exhausts_startup() {
    let (port, connections) = spawn_smsc().await;
    let mut cfg = config(port);
    cfg.smpp.system_id = "intruder".to_string();
    cfg.session.retry_delay_secs = 0;
    let transport = Arc::new(TcpTransport::new(cfg.session.transport_options()));

    let err = runtime::start(&cfg, transport).await.err().unwrap();
    assert_eq!(err.bind_status(), Some(ESME_RINVSYSID));
    assert_eq!(connections.load(Ordering::SeqCst), 3);
}
