//! Credential Vault
//!
//! Sole owner of plaintext iCloud secrets. Apple ID, app password and session
//! data are sealed with [`CredentialCipher`] before they reach the account
//! repository, and opened only here.
//!
//! ## Example
//!
//! ```ignore
//! let vault = CredentialVault::new(&key, catalog.accounts(), Arc::new(SystemClock));
//! vault.save_credentials("user-1", "jane@icloud.com", "abcd-efgh-ijkl-mnop").await?;
//!
//! let credentials = vault.get_credentials("user-1").await?.expect("saved above");
//! assert!(credentials.session.is_none());
//! ```

use crate::cipher::{CredentialCipher, EncryptionKey};
use crate::error::{AuthError, Result};
use crate::types::{Credentials, SessionArtifact};
use bridge_traits::time::Clock;
use core_library::repositories::AccountRepository;
use core_runtime::logging::redact_if_sensitive;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[derive(Clone)]
pub struct CredentialVault {
    cipher: CredentialCipher,
    accounts: Arc<dyn AccountRepository>,
    clock: Arc<dyn Clock>,
}

impl CredentialVault {
    pub fn new(
        key: &EncryptionKey,
        accounts: Arc<dyn AccountRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            cipher: CredentialCipher::new(key),
            accounts,
            clock,
        }
    }

    /// Whether credentials are stored for `user_id`. Nothing is decrypted.
    #[instrument(skip(self))]
    pub async fn has_account(&self, user_id: &str) -> Result<bool> {
        Ok(self.accounts.exists(user_id).await?)
    }

    /// Decrypted credentials, or `None` when the user has never saved any.
    ///
    /// # Errors
    ///
    /// [`AuthError::DecryptionFailed`] when any stored value is malformed or
    /// was sealed under a different key.
    #[instrument(skip(self))]
    pub async fn get_credentials(&self, user_id: &str) -> Result<Option<Credentials>> {
        let Some(account) = self.accounts.find(user_id).await? else {
            debug!("No stored credentials");
            return Ok(None);
        };

        let opened = self.open_account(&account);
        if let Err(e) = &opened {
            warn!(error = %e, "Stored credentials could not be decrypted");
        }
        opened.map(Some)
    }

    fn open_account(&self, account: &core_library::IcloudAccount) -> Result<Credentials> {
        let apple_id = self.cipher.decrypt(&account.apple_id_encrypted)?;
        let app_password = self.cipher.decrypt(&account.app_password_encrypted)?;

        let session = match (&account.session_file_name, &account.session_data_encrypted) {
            (Some(file_name), Some(data)) => Some(SessionArtifact {
                file_name: file_name.clone(),
                data: self.cipher.decrypt(data)?,
            }),
            _ => None,
        };

        Ok(Credentials {
            apple_id,
            app_password,
            session,
        })
    }

    /// Store a new credential pair, replacing any previous one.
    ///
    /// Any stored session is cleared: it belonged to the old credentials.
    #[instrument(skip(self, apple_id, app_password))]
    pub async fn save_credentials(
        &self,
        user_id: &str,
        apple_id: &str,
        app_password: &str,
    ) -> Result<()> {
        if apple_id.trim().is_empty() || app_password.is_empty() {
            return Err(AuthError::InvalidInput(
                "Apple ID and app password are required".to_string(),
            ));
        }

        let apple_id_encrypted = self.cipher.encrypt(apple_id.trim())?;
        let app_password_encrypted = self.cipher.encrypt(app_password)?;

        self.accounts
            .upsert_credentials(
                user_id,
                &apple_id_encrypted,
                &app_password_encrypted,
                self.clock.unix_timestamp(),
            )
            .await?;

        info!(
            apple_id = %redact_if_sensitive("apple_id", apple_id),
            "Saved iCloud credentials"
        );
        Ok(())
    }

    /// Store a renewed session, leaving the credential pair untouched.
    ///
    /// Only the base name of `session.file_name` is kept.
    #[instrument(skip(self, session), fields(file_name = %session.file_name))]
    pub async fn save_session(&self, user_id: &str, session: &SessionArtifact) -> Result<()> {
        let file_name = session_base_name(&session.file_name).ok_or_else(|| {
            AuthError::InvalidInput(format!(
                "Session file name has no base name: {:?}",
                session.file_name
            ))
        })?;

        let data_encrypted = self.cipher.encrypt(&session.data)?;

        self.accounts
            .update_session(user_id, file_name, &data_encrypted, self.clock.unix_timestamp())
            .await?;

        debug!(file_name, "Saved iCloud session");
        Ok(())
    }
}

/// Last path component, whichever separator the worker used.
fn session_base_name(file_name: &str) -> Option<&str> {
    file_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
}
