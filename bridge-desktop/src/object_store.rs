//! S3-compatible object store adapter.

use async_trait::async_trait;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::Client;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{ObjectPage, ObjectStore},
};
use bytes::Bytes;
use tracing::{debug, instrument};

/// Connection settings for an S3-compatible endpoint.
#[derive(Clone, Default)]
pub struct S3StoreConfig {
    pub region: String,
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub force_path_style: bool,
}

impl S3StoreConfig {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            ..Self::default()
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_static_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    pub fn with_force_path_style(mut self, enabled: bool) -> Self {
        self.force_path_style = enabled;
        self
    }
}

impl std::fmt::Debug for S3StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3StoreConfig")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id.as_ref().map(|_| "[REDACTED]"))
            .field("secret_access_key", &self.secret_access_key.as_ref().map(|_| "[REDACTED]"))
            .field("force_path_style", &self.force_path_style)
            .finish()
    }
}

/// [`ObjectStore`] backed by `aws-sdk-s3`.
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    /// Build a client from the ambient AWS configuration, overridden by `config`.
    pub async fn connect(config: S3StoreConfig) -> Self {
        let shared = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

        let mut builder =
            aws_sdk_s3::config::Builder::from(&shared).region(Region::new(config.region.clone()));
        if let Some(endpoint) = config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        if let (Some(key), Some(secret)) = (config.access_key_id, config.secret_access_key) {
            builder = builder.credentials_provider(Credentials::new(key, secret, None, None, "static"));
        }
        if config.force_path_style {
            builder = builder.force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
        }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn map_sdk_error<E: std::fmt::Debug, R: std::fmt::Debug>(context: &str, error: SdkError<E, R>) -> BridgeError {
        match error {
            SdkError::TimeoutError(_) => BridgeError::Timeout(context.to_string()),
            SdkError::DispatchFailure(e) => {
                BridgeError::Unreachable(format!("{}: {:?}", context, e))
            }
            other => BridgeError::OperationFailed(format!("{}: {:?}", context, other)),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[instrument(skip(self, continuation_token))]
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> Result<ObjectPage> {
        let mut request = self.client.list_objects_v2().bucket(bucket).prefix(prefix);
        if let Some(token) = continuation_token {
            request = request.continuation_token(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Self::map_sdk_error("list_objects_v2 failed", e))?;

        let keys: Vec<String> = response
            .contents
            .unwrap_or_default()
            .into_iter()
            .filter_map(|object| object.key)
            .filter(|key| !key.ends_with('/'))
            .collect();

        let next = if response.is_truncated.unwrap_or(false) {
            response.next_continuation_token
        } else {
            None
        };

        debug!(count = keys.len(), has_more = next.is_some(), "Listed object page");
        Ok(ObjectPage::new(keys, next))
    }

    #[instrument(skip(self))]
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().map(|s| s.is_no_such_key()).unwrap_or(false) {
                    BridgeError::NotFound(key.to_string())
                } else {
                    Self::map_sdk_error("get_object failed", e)
                }
            })?;

        let collected = response
            .body
            .collect()
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("reading object body failed: {}", e)))?;

        Ok(collected.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = S3StoreConfig::new("auto")
            .with_endpoint("https://account.r2.cloudflarestorage.com")
            .with_static_credentials("AKIA", "shh")
            .with_force_path_style(true);

        assert_eq!(config.region, "auto");
        assert!(config.force_path_style);
        assert_eq!(config.access_key_id.as_deref(), Some("AKIA"));
    }

    #[test]
    fn test_config_debug_redacts_keys() {
        let config = S3StoreConfig::new("us-east-1").with_static_credentials("AKIA123", "topsecret");
        let rendered = format!("{:?}", config);

        assert!(!rendered.contains("topsecret"));
        assert!(!rendered.contains("AKIA123"));
        assert!(rendered.contains("us-east-1"));
    }
}
