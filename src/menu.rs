use serde::Serialize;

use crate::session::SessionContext;

pub const LOGOUT_CONFIRMATION: &str =
    "Are you sure you want to log out from the system? You will need to sign in again.";

/// Actions that need confirmation before they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MenuAction {
    Logout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MenuItem {
    Navigable {
        label: &'static str,
        path: &'static str,
    },
    Guarded {
        label: &'static str,
        action: MenuAction,
        confirmation: &'static str,
    },
}

impl MenuItem {
    pub fn label(&self) -> &'static str {
        match self {
            MenuItem::Navigable { label, .. } | MenuItem::Guarded { label, .. } => *label,
        }
    }
}

/// Sidebar entries for the current viewer.
pub fn sidebar_items(session: &SessionContext) -> Vec<MenuItem> {
    let account = if session.is_authenticated() {
        MenuItem::Guarded {
            label: "Logout",
            action: MenuAction::Logout,
            confirmation: LOGOUT_CONFIRMATION,
        }
    } else {
        MenuItem::Navigable {
            label: "Login",
            path: "/login",
        }
    };

    vec![
        MenuItem::Navigable {
            label: "Dashboard",
            path: "/dashboard",
        },
        account,
    ]
}
