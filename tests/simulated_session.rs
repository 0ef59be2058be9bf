mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{config, eventually};
use mobilessh::config::{ConnectionForm, SecureString};
use mobilessh::lifecycle::{LifecycleCoordinator, OwnerSignal};
use mobilessh::session::ConnectionManager;
use mobilessh::transport::SimulatedTransport;
use mobilessh::{ConnectError, EndReason, FailureKind};

#[tokio::test]
async fn test_simulated_shell_round_trip() {
    let manager = ConnectionManager::new(
        Arc::new(SimulatedTransport::instant()),
        Duration::from_secs(1),
    );
    let coordinator = LifecycleCoordinator::new(OwnerSignal::new());
    let session = coordinator.connect(&manager, config()).await.unwrap();

    assert!(eventually(|| session.output_lossy().ends_with("$ ")).await);
    assert!(session.output_lossy().contains("Connected to root@192.168.1.100:22"));

    session.send("whoami").unwrap();
    assert!(eventually(|| session.output_lossy().contains("whoami\nroot\n$ ")).await);

    session.send("frobnicate").unwrap();
    assert!(eventually(|| session
        .output_lossy()
        .contains("bash: frobnicate: command not found"))
    .await);

    session.send("exit").unwrap();
    assert_eq!(session.ended().await, EndReason::Normal);
    assert_eq!(session.history(), vec!["whoami", "frobnicate", "exit"]);
}

#[tokio::test]
async fn test_form_to_session_with_wrong_password() {
    let connection = ConnectionForm {
        host: " 10.0.0.7 ".to_string(),
        port: "22".to_string(),
        username: "admin".to_string(),
        password: SecureString::new("guess".to_string()),
    }
    .validate()
    .unwrap();

    let transport = SimulatedTransport::instant()
        .with_password(SecureString::new("correct horse".to_string()));
    let manager = ConnectionManager::new(Arc::new(transport), Duration::from_secs(1));

    let err = manager.connect(connection).await.unwrap_err();
    assert_eq!(err, ConnectError::Failed(FailureKind::AuthenticationFailed));
}

#[tokio::test]
async fn test_slow_simulated_connect_times_out() {
    let transport = SimulatedTransport::new(Duration::from_millis(500), Duration::ZERO);
    let manager = ConnectionManager::new(Arc::new(transport), Duration::from_millis(20));

    let err = manager.connect(config()).await.unwrap_err();
    assert_eq!(err.failure_kind(), Some(FailureKind::Timeout));
}
