// Session state injected into the review thread store
// Replaces ambient storage lookups with an explicit value

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// The active user's session: bearer token, user id and wishlist ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub wishlist: BTreeSet<i64>,
}

impl Session {
    /// Anonymous session with no token
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Logged-in session for the given user
    pub fn authenticated(token: impl Into<String>, user_id: i64) -> Self {
        Self {
            token: Some(token.into()),
            user_id: Some(user_id),
            wishlist: BTreeSet::new(),
        }
    }

    /// Bearer token if one is stored and non-blank
    pub fn bearer_token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.trim().is_empty())
    }

    pub fn is_authenticated(&self) -> bool {
        self.bearer_token().is_some()
    }

    pub fn in_wishlist(&self, post_id: i64) -> bool {
        self.wishlist.contains(&post_id)
    }

    /// Add or remove a listing from the wishlist
    ///
    /// Returns `true` if the listing is in the wishlist afterwards.
    pub fn toggle_wishlist(&mut self, post_id: i64) -> bool {
        if self.wishlist.remove(&post_id) {
            false
        } else {
            self.wishlist.insert(post_id);
            true
        }
    }
}

/// JSON file holding a persisted [`Session`]
///
/// Read and written opportunistically with no locking.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored session
    ///
    /// A missing file is an anonymous session. A corrupt file is logged and
    /// also treated as anonymous.
    pub fn load(&self) -> Session {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No session file at {}", self.path.display());
                return Session::anonymous();
            }
            Err(e) => {
                tracing::warn!("Failed to read session file {}: {}", self.path.display(), e);
                return Session::anonymous();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Ignoring corrupt session file {}: {}", self.path.display(), e);
                Session::anonymous()
            }
        }
    }

    /// Persist the session, replacing any previous content
    pub fn save(&self, session: &Session) -> std::io::Result<()> {
        let raw = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, raw)?;
        tracing::debug!("Saved session to {}", self.path.display());
        Ok(())
    }
}
