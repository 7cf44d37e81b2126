//! iCloud pull flow with a mocked worker and a real vault

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::time::{Clock, FixedClock};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use core_auth::{CredentialVault, EncryptionKey, SessionArtifact, WorkerAuthBridge};
use core_library::db::create_test_pool;
use core_library::repositories::SqliteAccountRepository;
use core_sync::{
    IcloudSync, IcloudSyncOutcome, SyncError, WorkerClient, WorkerError, CHALLENGE_TTL_SECS,
};
use mockall::mock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

const NOW: i64 = 1_700_000_000;

mock! {
    Http {}

    #[async_trait]
    impl HttpClient for Http {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
    }
}

struct SteppingClock(AtomicI64);

impl SteppingClock {
    fn advance(&self, seconds: i64) {
        self.0.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.0.load(Ordering::SeqCst), 0).unwrap()
    }
}

fn response(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        headers: HashMap::new(),
        body: Bytes::from(body.to_string()),
    }
}

fn body_json(request: &HttpRequest) -> serde_json::Value {
    serde_json::from_slice(request.body.as_ref().unwrap()).unwrap()
}

struct Fixture {
    vault: CredentialVault,
    clock: Arc<SteppingClock>,
    flow: IcloudSync,
}

async fn fixture(http: MockHttp) -> Fixture {
    let pool = create_test_pool().await.unwrap();
    let accounts = Arc::new(SqliteAccountRepository::new(pool));
    let key = EncryptionKey::from_bytes(&[0x42; 32]).unwrap();
    let vault = CredentialVault::new(&key, accounts, Arc::new(FixedClock::at_unix(NOW)));

    let clock = Arc::new(SteppingClock(AtomicI64::new(NOW)));
    let auth = WorkerAuthBridge::new("https://worker.test/", "s3cret", clock.clone()).unwrap();
    let worker = WorkerClient::new(Arc::new(http), auth, Duration::from_secs(60));
    let flow = IcloudSync::new(vault.clone(), worker, clock.clone());

    Fixture { vault, clock, flow }
}

async fn with_credentials(f: &Fixture) {
    f.vault
        .save_credentials("user-1", "jane@icloud.com", "abcd-efgh-ijkl-mnop")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_no_credentials_never_calls_worker() {
    let mut http = MockHttp::new();
    http.expect_execute().never();
    let f = fixture(http).await;

    let err = f.flow.start("user-1", None).await.unwrap_err();
    assert!(matches!(err, SyncError::NoCredentials { user_id } if user_id == "user-1"));
}

#[tokio::test]
async fn test_completed_pull_persists_renewed_session() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .times(1)
        .withf(|request| {
            let body = body_json(request);
            request.url == "https://worker.test/sync"
                && body["apple_id"] == "jane@icloud.com"
                && body.get("session").is_none()
        })
        .returning(|_| {
            Ok(response(
                200,
                r#"{"status":"ok","imported":12,"skipped":3,"session":{"file_name":"/tmp/x/janeicloudcom","data":"cookies"}}"#,
            ))
        });
    let f = fixture(http).await;
    with_credentials(&f).await;

    let outcome = f.flow.start("user-1", None).await.unwrap();
    let IcloudSyncOutcome::Completed(summary) = outcome else {
        panic!("expected a completed pull");
    };
    assert_eq!(summary.imported, 12);
    assert_eq!(summary.skipped, 3);

    let credentials = f.vault.get_credentials("user-1").await.unwrap().unwrap();
    assert_eq!(
        credentials.session,
        Some(SessionArtifact::new("janeicloudcom", "cookies"))
    );
    assert_eq!(credentials.app_password, "abcd-efgh-ijkl-mnop");
}

#[tokio::test]
async fn test_two_factor_round_trip() {
    let mut http = MockHttp::new();
    let mut seq = mockall::Sequence::new();
    http.expect_execute()
        .times(1)
        .in_sequence(&mut seq)
        .withf(|request| request.url.ends_with("/sync"))
        .returning(|_| Ok(response(200, r#"{"status":"needs_2fa","session_id":"abc123"}"#)));
    http.expect_execute()
        .times(1)
        .in_sequence(&mut seq)
        .withf(|request| {
            let body = body_json(request);
            request.url == "https://worker.test/sync/2fa"
                && body["session_id"] == "abc123"
                && body["code"] == "123456"
        })
        .returning(|_| {
            Ok(response(
                200,
                r#"{"status":"ok","imported":5,"skipped":0,"session":{"file_name":"jane","data":"trusted"}}"#,
            ))
        });
    let f = fixture(http).await;
    with_credentials(&f).await;

    let IcloudSyncOutcome::NeedsTwoFactor(challenge) = f.flow.start("user-1", Some(50)).await.unwrap()
    else {
        panic!("expected a challenge");
    };
    assert_eq!(challenge.session_id, "abc123");
    assert_eq!(challenge.expires_at, NOW + CHALLENGE_TTL_SECS);
    assert_eq!(f.flow.challenges().pending_count().await, 1);

    f.clock.advance(90);
    let outcome = f
        .flow
        .submit_two_factor("user-1", " abc123 ", "123456\n")
        .await
        .unwrap();

    assert!(matches!(outcome, IcloudSyncOutcome::Completed(ref s) if s.imported == 5));
    assert_eq!(f.flow.challenges().pending_count().await, 0);
    let session = f.vault.get_credentials("user-1").await.unwrap().unwrap().session;
    assert_eq!(session.map(|s| s.data), Some("trusted".to_string()));
}

#[tokio::test]
async fn test_expired_challenge_rejected_locally() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .times(1)
        .returning(|_| Ok(response(200, r#"{"status":"needs_2fa","session_id":"abc123"}"#)));
    let f = fixture(http).await;
    with_credentials(&f).await;

    f.flow.start("user-1", None).await.unwrap();
    f.clock.advance(CHALLENGE_TTL_SECS + 1);

    let err = f
        .flow
        .submit_two_factor("user-1", "abc123", "123456")
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::ChallengeExpired { .. }));
}

#[tokio::test]
async fn test_unknown_session_relays_worker_error() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .times(1)
        .returning(|_| Ok(response(400, r#"{"detail":"Invalid or expired session"}"#)));
    let f = fixture(http).await;

    let err = f
        .flow
        .submit_two_factor("user-1", "from-another-process", "123456")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SyncError::Worker(WorkerError::Application { status: 400, .. })
    ));
    assert_eq!(err.to_string(), "Invalid or expired session");
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_blank_code_rejected() {
    let mut http = MockHttp::new();
    http.expect_execute().never();
    let f = fixture(http).await;

    let err = f
        .flow
        .submit_two_factor("user-1", "abc123", "   ")
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::InvalidInput(_)));
}
