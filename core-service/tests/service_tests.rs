//! Photo service wiring over mocked bridges

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::storage::{ObjectPage, ObjectStore};
use bridge_traits::time::FixedClock;
use bytes::Bytes;
use core_library::db::create_test_pool;
use core_library::Catalog;
use core_metadata::{MetadataExtractor, PhotoMetadata, Result as MetadataResult};
use core_service::{CoreDependencies, CoreError, PhotoService};
use core_runtime::AppConfig;
use core_sync::{IcloudSyncOutcome, SyncError};
use mockall::mock;
use mockall::predicate::{always, eq};
use std::collections::HashMap;
use std::sync::Arc;

const KEY_HEX: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

mock! {
    Store {}

    #[async_trait]
    impl ObjectStore for Store {
        async fn list_objects(
            &self,
            bucket: &str,
            prefix: &str,
            continuation_token: Option<String>,
        ) -> BridgeResult<ObjectPage>;
        async fn get_object(&self, bucket: &str, key: &str) -> BridgeResult<Bytes>;
    }
}

mock! {
    Http {}

    #[async_trait]
    impl HttpClient for Http {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
    }
}

struct DatedExtractor;

impl MetadataExtractor for DatedExtractor {
    fn extract(&self, bytes: &[u8]) -> MetadataResult<PhotoMetadata> {
        Ok(PhotoMetadata {
            date_taken: Some(String::from_utf8_lossy(bytes).to_string()),
            ..PhotoMetadata::default()
        })
    }
}

fn config(vars: &[(&str, &str)]) -> AppConfig {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    AppConfig::from_lookup(|name| vars.get(name).cloned()).unwrap()
}

async fn service(config: AppConfig, store: MockStore, http: MockHttp) -> PhotoService {
    let catalog = Catalog::new(create_test_pool().await.unwrap());
    let deps = CoreDependencies::new(
        Arc::new(store),
        Arc::new(http),
        Arc::new(DatedExtractor),
        Arc::new(FixedClock::at_unix(1_700_000_000)),
    );
    PhotoService::new(config, catalog, deps).unwrap()
}

fn bucket_with(keys: &'static [(&'static str, &'static str)]) -> MockStore {
    let mut store = MockStore::new();
    store
        .expect_list_objects()
        .with(eq("family"), eq("photos/"), always())
        .returning(move |_, _, _| {
            Ok(ObjectPage::new(
                keys.iter().map(|(k, _)| k.to_string()).collect(),
                None,
            ))
        });
    store.expect_get_object().returning(move |_, key| {
        let (_, date) = *keys.iter().find(|(k, _)| *k == key).unwrap();
        Ok(Bytes::from_static(date.as_bytes()))
    });
    store
}

#[tokio::test]
async fn test_sync_then_list_with_proxy_urls() {
    let svc = service(
        config(&[
            ("PHOTO_BUCKET", "family"),
            ("PHOTO_PREFIX", "photos"),
            ("THUMBNAIL_PREFIX", "thumbs"),
        ]),
        bucket_with(&[
            ("photos/old.jpg", "2019-07-04T12:00:00"),
            ("photos/new.heic", "2024-02-29T08:30:00"),
            ("photos/clip.mov", "ignored"),
        ]),
        MockHttp::new(),
    )
    .await;

    let result = svc.sync_bucket(None).await.unwrap();
    assert_eq!(result.imported, 2);
    assert!(result.errors.is_empty());

    let photos = svc.list_photos().await.unwrap();
    let keys: Vec<&str> = photos.iter().map(|p| p.object_key.as_str()).collect();
    assert_eq!(keys, vec!["photos/new.heic", "photos/old.jpg"]);
    assert_eq!(photos[0].original_url, "/api/photos/file?key=photos%2Fnew.heic");
    assert_eq!(photos[0].thumbnail_url, "/api/photos/file?key=thumbs%2Fnew.heic");
    assert!(!photos[0].has_gps);
}

#[tokio::test]
async fn test_public_base_url_links_directly() {
    let svc = service(
        config(&[
            ("PHOTO_BUCKET", "family"),
            ("PUBLIC_PHOTO_BASE_URL", "https://cdn.example.com/"),
        ]),
        bucket_with(&[("photos/a.png", "2020-01-01T00:00:00")]),
        MockHttp::new(),
    )
    .await;

    svc.sync_bucket(Some(5)).await.unwrap();
    let photos = svc.list_photos().await.unwrap();

    assert_eq!(photos[0].original_url, "https://cdn.example.com/photos/a.png");
    assert_eq!(photos[0].thumbnail_url, photos[0].original_url);
}

#[tokio::test]
async fn test_missing_bucket_only_blocks_sync() {
    let svc = service(config(&[]), MockStore::new(), MockHttp::new()).await;

    let err = svc.sync_bucket(None).await.unwrap_err();
    assert!(matches!(err, CoreError::Configuration(_)));
    assert!(err.to_string().contains("PHOTO_BUCKET"));

    assert!(svc.list_photos().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_vault_key_names_the_variable() {
    let svc = service(config(&[]), MockStore::new(), MockHttp::new()).await;

    let err = svc.has_account("user-1").await.unwrap_err();
    assert!(err.to_string().contains("ICLOUD_ENCRYPTION_KEY"));

    let err = svc.start_icloud_sync("user-1", None).await.unwrap_err();
    assert!(err.to_string().contains("ICLOUD_ENCRYPTION_KEY"));
}

#[tokio::test]
async fn test_missing_worker_settings_name_the_variable() {
    let svc = service(
        config(&[("ICLOUD_ENCRYPTION_KEY", KEY_HEX)]),
        MockStore::new(),
        MockHttp::new(),
    )
    .await;

    let err = svc.start_icloud_sync("user-1", None).await.unwrap_err();
    assert!(err.to_string().contains("ICLOUD_WORKER_URL"));

    let svc = service(
        config(&[
            ("ICLOUD_ENCRYPTION_KEY", KEY_HEX),
            ("ICLOUD_WORKER_URL", "https://worker.test"),
        ]),
        MockStore::new(),
        MockHttp::new(),
    )
    .await;

    let err = svc.submit_two_factor("user-1", "abc", "123456").await.unwrap_err();
    assert!(err.to_string().contains("WORKER_JWT_SECRET"));
}

#[tokio::test]
async fn test_malformed_vault_key_fails_construction() {
    let catalog = Catalog::new(create_test_pool().await.unwrap());
    let deps = CoreDependencies::new(
        Arc::new(MockStore::new()),
        Arc::new(MockHttp::new()),
        Arc::new(DatedExtractor),
        Arc::new(FixedClock::at_unix(0)),
    );

    let result = PhotoService::new(config(&[("ICLOUD_ENCRYPTION_KEY", "abcd")]), catalog, deps);
    assert!(result.is_err());
}

#[tokio::test]
async fn test_credentials_and_icloud_flow() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .times(1)
        .withf(|request| request.url == "https://worker.test/sync")
        .returning(|_| {
            Ok(HttpResponse {
                status: 200,
                headers: HashMap::new(),
                body: Bytes::from_static(br#"{"status":"needs_2fa","session_id":"s-1"}"#),
            })
        });

    let svc = service(
        config(&[
            ("ICLOUD_ENCRYPTION_KEY", KEY_HEX),
            ("ICLOUD_WORKER_URL", "https://worker.test/"),
            ("WORKER_JWT_SECRET", "s3cret"),
        ]),
        MockStore::new(),
        http,
    )
    .await;

    let err = svc.start_icloud_sync("user-1", None).await.unwrap_err();
    assert!(matches!(err, CoreError::Sync(SyncError::NoCredentials { .. })));

    assert!(!svc.has_account("user-1").await.unwrap());
    svc.save_credentials("user-1", "jane@icloud.com", "abcd-efgh-ijkl-mnop")
        .await
        .unwrap();
    assert!(svc.has_account("user-1").await.unwrap());

    let outcome = svc.start_icloud_sync("user-1", None).await.unwrap();
    assert!(matches!(outcome, IcloudSyncOutcome::NeedsTwoFactor(c) if c.session_id == "s-1"));
}
