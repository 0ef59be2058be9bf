mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{config, eventually, StubTransport};
use mobilessh::session::{ConnectionManager, ConnectionState};
use mobilessh::transport::RawError;
use mobilessh::{ConnectError, FailureKind, SessionError};

#[tokio::test]
async fn test_hanging_transport_times_out() {
    for timeout_ms in [10u64, 50, 120] {
        let transport = Arc::new(StubTransport::hanging());
        let stats = Arc::clone(&transport.stats);
        let manager = ConnectionManager::new(transport, Duration::from_millis(timeout_ms));

        let start = Instant::now();
        let err = manager.connect(config()).await.unwrap_err();
        let elapsed = start.elapsed();

        assert_eq!(err, ConnectError::Failed(FailureKind::Timeout));
        assert!(elapsed >= Duration::from_millis(timeout_ms));
        assert!(
            elapsed < Duration::from_millis(timeout_ms + 250),
            "timeout {}ms took {:?}",
            timeout_ms,
            elapsed
        );
        assert_eq!(manager.state(), ConnectionState::Failed(FailureKind::Timeout));
        assert_eq!(stats.shells_opened(), 0);
    }
}

#[tokio::test]
async fn test_connect_after_timeout_is_disconnected() {
    let (transport, gate) = StubTransport::gated_connect();
    let transport = Arc::new(transport);
    let stats = Arc::clone(&transport.stats);
    let manager = ConnectionManager::new(transport, Duration::from_millis(20));

    let err = manager.connect(config()).await.unwrap_err();
    assert_eq!(err.failure_kind(), Some(FailureKind::Timeout));

    // Transport "succeeds" after the caller already got Timeout
    gate.succeed();

    assert!(eventually(|| stats.disconnects() == 1).await);
    assert_eq!(stats.shells_opened(), 0);
    assert_eq!(manager.state(), ConnectionState::Failed(FailureKind::Timeout));
}

#[tokio::test]
async fn test_shell_opened_after_timeout_is_closed() {
    let (transport, gate) = StubTransport::gated_shell();
    let transport = Arc::new(transport);
    let stats = Arc::clone(&transport.stats);
    let manager = ConnectionManager::new(transport, Duration::from_millis(20));

    let err = manager.connect(config()).await.unwrap_err();
    assert_eq!(err.failure_kind(), Some(FailureKind::Timeout));

    gate.succeed();

    assert!(eventually(|| stats.stream_closes() == 1).await);
    assert_eq!(stats.shells_opened(), 1);
    // Nothing is ever delivered to a session
    assert!(!stats.push_data(0, "orphan"));
}

#[tokio::test]
async fn test_success_cancels_timer() {
    let transport = Arc::new(StubTransport::ready());
    let manager = ConnectionManager::new(transport, Duration::from_millis(30));

    let session = manager.connect(config()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(80)).await;

    assert_eq!(manager.state(), ConnectionState::Ready);
    assert!(session.state().is_ready());
    session.close().await;
}

#[tokio::test]
async fn test_transport_failures_are_classified() {
    let cases = [
        (
            RawError::new("ECONNREFUSED: connect 127.0.0.1:22"),
            FailureKind::ConnectionRefused,
        ),
        (RawError::new("auth failed"), FailureKind::AuthenticationFailed),
        (
            RawError::new("connect").with_code("EHOSTUNREACH"),
            FailureKind::NetworkUnreachable,
        ),
        (RawError::protocol("unexpected packet"), FailureKind::ProtocolError),
        (RawError::new("something odd"), FailureKind::Unknown),
    ];

    for (error, expected) in cases {
        let manager = ConnectionManager::new(
            Arc::new(StubTransport::failing(error.clone())),
            Duration::from_secs(1),
        );
        let err = manager.connect(config()).await.unwrap_err();
        assert_eq!(err, ConnectError::Failed(expected), "error {:?}", error);
        assert_eq!(manager.state(), ConnectionState::Failed(expected));
    }
}

#[tokio::test]
async fn test_failure_after_timeout_is_ignored() {
    let (transport, gate) = StubTransport::gated_connect();
    let manager = ConnectionManager::new(Arc::new(transport), Duration::from_millis(20));

    let err = manager.connect(config()).await.unwrap_err();
    gate.fail(RawError::new("auth failed"));
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(err.failure_kind(), Some(FailureKind::Timeout));
    assert_eq!(manager.state(), ConnectionState::Failed(FailureKind::Timeout));
}

#[tokio::test]
async fn test_second_connect_is_rejected() {
    let transport = Arc::new(StubTransport::ready());
    let stats = Arc::clone(&transport.stats);
    let manager = ConnectionManager::new(transport, Duration::from_secs(1));

    let session = manager.connect(config()).await.unwrap();
    let err = manager.connect(config()).await.unwrap_err();

    assert_eq!(err, ConnectError::Usage(SessionError::AlreadyAttempted));
    assert_eq!(stats.connects(), 1);
    session.close().await;
}

#[tokio::test]
async fn test_second_connect_after_failure_is_rejected() {
    let manager = ConnectionManager::new(
        Arc::new(StubTransport::failing(RawError::new("ECONNREFUSED"))),
        Duration::from_secs(1),
    );

    assert!(manager.connect(config()).await.is_err());
    let err = manager.connect(config()).await.unwrap_err();
    assert_eq!(err, ConnectError::Usage(SessionError::AlreadyAttempted));
}

#[derive(Clone, Default)]
struct LogSink(Arc<parking_lot::Mutex<Vec<u8>>>);

impl std::io::Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_connection_details_stay_out_of_logs() {
    let sink = LogSink::default();
    let writer = sink.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let ok = ConnectionManager::new(Arc::new(StubTransport::ready()), Duration::from_secs(1));
    let session = ok.connect(config()).await.unwrap();
    session.send("ls").unwrap();
    session.close().await;

    let failing = ConnectionManager::new(
        Arc::new(StubTransport::failing(RawError::new("connection refused"))),
        Duration::from_secs(1),
    );
    assert!(failing.connect(config()).await.is_err());

    let logs = String::from_utf8_lossy(&sink.0.lock()).into_owned();
    assert!(logs.contains("Connecting"));
    assert!(logs.contains("Connection failed"));
    for secret in ["192.168.1.100", "root", "hunter2"] {
        assert!(!logs.contains(secret), "{:?} leaked into logs:\n{}", secret, logs);
    }
}
