//! TcpTransport against an in-process fake SMSC

#![allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable

use futures::{SinkExt, StreamExt};
use smpp_link::constants::*;
use smpp_link::{
    BindTransmitter, LinkError, Pdu, PduBody, PduCodec, SmppSession, SubmitSm, TcpTransport,
    Transport, TransportOptions,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::codec::Framed;

#[derive(Clone, Copy)]
enum SmscMode {
    /// Answer everything normally
    Normal,
    /// Ping the client with enquire_link before answering submit_sm
    PingBeforeSubmitResp,
    /// Close the socket right after a successful bind
    DropAfterBind,
    /// Never answer anything
    Silent,
}

async fn spawn_smsc(mode: SmscMode) -> (SocketAddr, mpsc::UnboundedReceiver<Pdu>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        serve(Framed::new(stream, PduCodec::default()), mode, tx).await;
    });

    (addr, rx)
}

async fn serve(
    mut framed: Framed<TcpStream, PduCodec>,
    mode: SmscMode,
    seen: mpsc::UnboundedSender<Pdu>,
) {
    let mut submitted = 0u32;
    while let Some(Ok(pdu)) = framed.next().await {
        let _ = seen.send(pdu.clone());
        if matches!(mode, SmscMode::Silent) {
            continue;
        }
        let seq = pdu.sequence_number;
        match pdu.body {
            PduBody::BindTransmitter(bind) => {
                let status = if bind.password == "secret" {
                    ESME_ROK
                } else {
                    ESME_RINVPASWD
                };
                framed
                    .send(Pdu::response(
                        seq,
                        status,
                        PduBody::BindTransmitterResp {
                            system_id: "FAKESMSC".into(),
                        },
                    ))
                    .await
                    .unwrap();
                if status == ESME_ROK && matches!(mode, SmscMode::DropAfterBind) {
                    return;
                }
            },
            PduBody::SubmitSm(_) => {
                if matches!(mode, SmscMode::PingBeforeSubmitResp) {
                    framed.send(Pdu::new(9000, PduBody::EnquireLink)).await.unwrap();
                    let resp = framed.next().await.unwrap().unwrap();
                    let _ = seen.send(resp);
                }
                submitted += 1;
                framed
                    .send(Pdu::new(
                        seq,
                        PduBody::SubmitSmResp {
                            message_id: format!("id-{submitted}"),
                        },
                    ))
                    .await
                    .unwrap();
            },
            PduBody::EnquireLink => {
                framed.send(Pdu::new(seq, PduBody::EnquireLinkResp)).await.unwrap();
            },
            PduBody::Unbind => {
                framed.send(Pdu::new(seq, PduBody::UnbindResp)).await.unwrap();
                return;
            },
            _ => {},
        }
    }
}

fn transport() -> TcpTransport {
    TcpTransport::new(TransportOptions {
        connect_timeout: Duration::from_secs(2),
        response_timeout: Duration::from_secs(2),
        ..Default::default()
    })
}

fn credentials(password: &str) -> BindTransmitter {
    BindTransmitter::new("otpgw", password, "OTP", "MyBank")
}

#[tokio::test]
async fn test_bind_submit_unbind() {
    let (addr, mut seen) = spawn_smsc(SmscMode::Normal).await;
    let session = transport().open("127.0.0.1", addr.port()).await.unwrap();
    assert!(!session.is_bound());

    let resp = session.bind_transmitter(credentials("secret")).await.unwrap();
    assert!(resp.is_ok());
    assert_eq!(resp.system_id, "FAKESMSC");
    assert!(session.is_bound());

    let bind = seen.recv().await.unwrap();
    match bind.body {
        PduBody::BindTransmitter(b) => {
            assert_eq!(b.system_id, "otpgw");
            assert_eq!(b.system_type, "OTP");
            assert_eq!(b.interface_version, INTERFACE_VERSION_34);
            assert_eq!(b.address_range, "MyBank");
        },
        other => panic!("expected bind, got {other:?}"),
    }

    let sm = SubmitSm::text("MyBank", "+15550100", "Your code is 424242").unwrap();
    let resp = session.submit(sm).await.unwrap();
    assert_eq!(resp.status, ESME_ROK);
    assert_eq!(resp.message_id, "id-1");

    session.enquire_link().await.unwrap();

    session.unbind().await.unwrap();
    assert!(!session.is_bound());
    assert!(matches!(session.enquire_link().await, Err(LinkError::Closed)));
}

#[tokio::test]
async fn test_bind_rejected() {
    let (addr, _seen) = spawn_smsc(SmscMode::Normal).await;
    let session = transport().open("127.0.0.1", addr.port()).await.unwrap();

    let resp = session.bind_transmitter(credentials("wrong")).await.unwrap();
    assert_eq!(resp.status, ESME_RINVPASWD);
    assert!(!session.is_bound());

    let sm = SubmitSm::text("MyBank", "15550100", "x").unwrap();
    assert!(matches!(session.submit(sm).await, Err(LinkError::NotBound)));
}

#[tokio::test]
async fn test_gateway_enquire_link_answered_while_waiting() {
    let (addr, mut seen) = spawn_smsc(SmscMode::PingBeforeSubmitResp).await;
    let session = transport().open("127.0.0.1", addr.port()).await.unwrap();
    session.bind_transmitter(credentials("secret")).await.unwrap();

    let sm = SubmitSm::text("MyBank", "15550100", "123456").unwrap();
    let resp = session.submit(sm).await.unwrap();
    assert_eq!(resp.message_id, "id-1");

    let _bind = seen.recv().await.unwrap();
    let _submit = seen.recv().await.unwrap();
    let ping_resp = seen.recv().await.unwrap();
    assert_eq!(ping_resp.sequence_number, 9000);
    assert_eq!(ping_resp.body, PduBody::EnquireLinkResp);
}

#[tokio::test]
async fn test_peer_close_marks_unbound() {
    let (addr, _seen) = spawn_smsc(SmscMode::DropAfterBind).await;
    let session = transport().open("127.0.0.1", addr.port()).await.unwrap();
    session.bind_transmitter(credentials("secret")).await.unwrap();
    assert!(session.is_bound());

    let sm = SubmitSm::text("MyBank", "15550100", "123456").unwrap();
    let err = session.submit(sm).await.unwrap_err();
    assert!(err.needs_reconnect());
    assert!(!session.is_bound());
}

#[tokio::test]
async fn test_response_timeout_closes_session() {
    let (addr, _seen) = spawn_smsc(SmscMode::Silent).await;
    let transport = TcpTransport::new(TransportOptions {
        response_timeout: Duration::from_millis(100),
        ..Default::default()
    });
    let session = transport.open("127.0.0.1", addr.port()).await.unwrap();

    let err = session.bind_transmitter(credentials("secret")).await.unwrap_err();
    assert!(matches!(err, LinkError::Timeout(_)));
    assert!(matches!(session.enquire_link().await, Err(LinkError::Closed)));
}

#[tokio::test]
async fn test_connection_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let err = transport().open("127.0.0.1", port).await.err().unwrap();
    assert!(matches!(err, LinkError::Connection(_)));
    assert!(err.needs_reconnect());
}

#[tokio::test]
async fn test_keepalive_sends_enquire_link() {
    let (addr, mut seen) = spawn_smsc(SmscMode::Normal).await;
    let transport = TcpTransport::new(TransportOptions {
        enquire_link_interval: Some(Duration::from_millis(50)),
        ..Default::default()
    });
    let session = transport.open("127.0.0.1", addr.port()).await.unwrap();
    session.bind_transmitter(credentials("secret")).await.unwrap();

    let _bind = seen.recv().await.unwrap();
    for _ in 0..2 {
        let pdu = tokio::time::timeout(Duration::from_secs(2), seen.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(pdu.body, PduBody::EnquireLink);
    }
    assert!(session.is_bound());
}
