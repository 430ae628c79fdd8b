//! Viewer session: the signed-in profile marker and notification permission.
//!
//! The context is an explicit value handed to the dashboard and dispatcher;
//! `SessionStore` persists it between runs.

use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ViewError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "User".into()
}

impl UserProfile {
    /// Fill the blanks the way the sign-in response is normalised: an empty
    /// role becomes `User`.
    pub fn new(first_name: &str, last_name: &str, email: &str, role: Option<&str>) -> Self {
        Self {
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            email: email.trim().to_string(),
            role: role
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string)
                .unwrap_or_else(default_role),
        }
    }

    pub fn display_name(&self) -> String {
        let first = if self.first_name.is_empty() {
            "User"
        } else {
            self.first_name.as_str()
        };
        format!("{} {}", first, self.last_name).trim_end().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationPermission {
    #[default]
    Default,
    Granted,
    Denied,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    #[serde(default)]
    pub profile: Option<UserProfile>,
    #[serde(default)]
    pub notification_permission: NotificationPermission,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(profile: UserProfile) -> Self {
        Self {
            profile: Some(profile),
            notification_permission: NotificationPermission::Default,
            session_id: Some(Uuid::new_v4().to_string()),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.profile.is_some()
    }

    pub fn require_authenticated(&self) -> Result<&UserProfile, ViewError> {
        self.profile.as_ref().ok_or(ViewError::Unauthenticated)
    }

    pub fn notifications_granted(&self) -> bool {
        self.notification_permission == NotificationPermission::Granted
    }
}

/// Asks the user whether desktop notifications may be shown. `ask` may block.
pub trait PermissionPrompt: Send + Sync {
    fn ask(&self) -> NotificationPermission;
}

pub struct SessionStore {
    path: PathBuf,
    data: RwLock<SessionContext>,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read session from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Discarding unreadable session marker {}: {err}", path.display());
                SessionContext::default()
            })
        } else {
            SessionContext::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn context(&self) -> SessionContext {
        self.read().clone()
    }

    pub fn login(&self, profile: UserProfile) -> Result<SessionContext> {
        let mut guard = self.write();
        info!("Signed in as {}", profile.display_name());
        *guard = SessionContext::signed_in(profile);
        self.persist(&guard)?;
        Ok(guard.clone())
    }

    /// Drops the profile and everything tied to it, permission included.
    pub fn logout(&self) -> Result<()> {
        let mut guard = self.write();
        *guard = SessionContext::default();
        if self.path.exists() {
            fs::remove_file(&self.path).with_context(|| {
                format!("Failed to remove session marker {}", self.path.display())
            })?;
        }
        info!("Signed out");
        Ok(())
    }

    /// True while signed in and the notification permission is undecided;
    /// only then is the user asked.
    pub fn permission_pending(&self) -> bool {
        Self::pending(&self.read())
    }

    /// Store the user's answer to the permission prompt. An answer that
    /// arrives once the permission is no longer pending is dropped and the
    /// stored value returned instead.
    pub fn record_notification_permission(
        &self,
        answer: NotificationPermission,
    ) -> Result<NotificationPermission> {
        let mut guard = self.write();
        if !Self::pending(&guard) {
            return Ok(guard.notification_permission);
        }

        guard.notification_permission = answer;
        self.persist(&guard)?;
        info!("Notification permission set to {answer:?}");
        Ok(answer)
    }

    fn pending(context: &SessionContext) -> bool {
        context.is_authenticated()
            && context.notification_permission == NotificationPermission::Default
    }

    fn persist(&self, data: &SessionContext) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write session to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionContext> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionContext> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> UserProfile {
        UserProfile::new("Ada", "Lovelace", "ada@example.com", None)
    }

    #[test]
    fn login_persists_marker() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = SessionStore::new(path.clone()).unwrap();
        assert!(!store.context().is_authenticated());
        store.login(profile()).unwrap();

        let reopened = SessionStore::new(path).unwrap();
        let context = reopened.context();
        assert!(context.is_authenticated());
        assert_eq!(context.profile.unwrap().role, "User");
        assert!(context.session_id.is_some());
    }

    #[test]
    fn permission_is_only_pending_when_signed_in_and_undecided() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = SessionStore::new(path.clone()).unwrap();

        assert!(!store.permission_pending());
        let answer = store
            .record_notification_permission(NotificationPermission::Granted)
            .unwrap();
        assert_eq!(answer, NotificationPermission::Default);

        store.login(profile()).unwrap();
        assert!(store.permission_pending());
        let answer = store
            .record_notification_permission(NotificationPermission::Granted)
            .unwrap();
        assert_eq!(answer, NotificationPermission::Granted);
        assert!(!store.permission_pending());

        // Already decided: a late answer does not overwrite it.
        let answer = store
            .record_notification_permission(NotificationPermission::Denied)
            .unwrap();
        assert_eq!(answer, NotificationPermission::Granted);
        assert_eq!(
            SessionStore::new(path).unwrap().context().notification_permission,
            NotificationPermission::Granted
        );
    }

    #[test]
    fn logout_clears_profile_and_permission() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = SessionStore::new(path.clone()).unwrap();
        store.login(profile()).unwrap();
        store
            .record_notification_permission(NotificationPermission::Denied)
            .unwrap();

        store.logout().unwrap();
        let context = store.context();
        assert!(!context.is_authenticated());
        assert_eq!(context.notification_permission, NotificationPermission::Default);
        assert!(!path.exists());
    }

    #[test]
    fn corrupt_marker_reads_as_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();
        let store = SessionStore::new(path).unwrap();
        assert!(!store.context().is_authenticated());
    }

    #[test]
    fn unauthenticated_context_is_rejected() {
        let context = SessionContext::anonymous();
        assert!(matches!(
            context.require_authenticated(),
            Err(ViewError::Unauthenticated)
        ));
        assert_eq!(profile().display_name(), "Ada Lovelace");
    }
}
