use std::env;
use std::fmt;

use quiz_core::model::UserId;
use tracing::warn;
use url::Url;

use crate::error::BackendError;

pub const SUPABASE_URL_VAR: &str = "ACT_REVIEW_SUPABASE_URL";
pub const SUPABASE_ANON_KEY_VAR: &str = "ACT_REVIEW_SUPABASE_ANON_KEY";
pub const ACCESS_TOKEN_VAR: &str = "ACT_REVIEW_ACCESS_TOKEN";
pub const USER_ID_VAR: &str = "ACT_REVIEW_USER_ID";

/// Connection settings for the hosted progress table.
///
/// `access_token` is the signed-in user's JWT. Without it requests carry the
/// anon key only, which row-level security usually rejects.
#[derive(Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub base_url: Url,
    pub anon_key: String,
    pub access_token: Option<String>,
    pub user_id: UserId,
}

impl BackendConfig {
    /// Validate raw settings.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Config` for an unparsable URL, a blank key or a
    /// malformed user id.
    pub fn new(
        base_url: &str,
        anon_key: &str,
        access_token: Option<&str>,
        user_id: &str,
    ) -> Result<Self, BackendError> {
        let mut base_url = Url::parse(base_url.trim())
            .map_err(|e| BackendError::Config(format!("{SUPABASE_URL_VAR}: {e}")))?;
        // `Url::join` drops the last path segment unless it ends with '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let anon_key = anon_key.trim();
        if anon_key.is_empty() {
            return Err(BackendError::Config(format!("{SUPABASE_ANON_KEY_VAR} is empty")));
        }

        let user_id = user_id
            .trim()
            .parse::<UserId>()
            .map_err(|e| BackendError::Config(format!("{USER_ID_VAR}: {e}")))?;

        Ok(Self {
            base_url,
            anon_key: anon_key.to_owned(),
            access_token: access_token
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(ToOwned::to_owned),
            user_id,
        })
    }

    /// Read settings from the process environment.
    ///
    /// Returns `None` (local-only progress) unless URL, key and user id are
    /// all set; invalid values are logged and also yield `None`.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`BackendConfig::from_env`] with a custom variable source.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let base_url = lookup(SUPABASE_URL_VAR)?;
        let anon_key = lookup(SUPABASE_ANON_KEY_VAR)?;
        let user_id = lookup(USER_ID_VAR)?;
        let access_token = lookup(ACCESS_TOKEN_VAR);

        match Self::new(&base_url, &anon_key, access_token.as_deref(), &user_id) {
            Ok(config) => Some(config),
            Err(err) => {
                warn!(error = %err, "ignoring hosted backend settings");
                None
            }
        }
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("base_url", &self.base_url.as_str())
            .field("anon_key", &"***")
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .field("user_id", &self.user_id)
            .finish()
    }
}
