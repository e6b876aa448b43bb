//! User models as returned by the backend.
//!
//! The gateway only needs a handful of fields (notably the intranet
//! credential); everything else is carried through untouched so backend
//! additions never require a gateway release.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Successful login response from the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginUpstream {
    /// User record, passed through to the browser as-is
    pub user: Value,
    /// Short-lived bearer token
    pub access: String,
    /// Long-lived refresh credential
    pub refresh: String,
}

/// User-info record from the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub profile: Option<UserProfile>,
    /// Remaining fields, passed through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Profile section of the user-info record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Secondary credential for the intranet API
    #[serde(default)]
    pub token_intranet: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl UserInfo {
    /// The intranet credential, if the caller's profile carries one.
    pub fn token_intranet(&self) -> Option<&str> {
        self.profile
            .as_ref()
            .and_then(|p| p.token_intranet.as_deref())
            .filter(|t| !t.is_empty())
    }
}
