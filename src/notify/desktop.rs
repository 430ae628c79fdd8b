use std::process::{Command, Stdio};

use anyhow::{Context, Result};

use crate::alerts::AlertEvent;
use crate::status::StatusTier;
use crate::utils::format_count;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopNotification {
    pub title: String,
    pub body: String,
    pub icon: String,
    /// Stays on screen until the user dismisses it.
    pub persistent: bool,
}

impl DesktopNotification {
    pub fn for_alert(alert: &AlertEvent) -> Self {
        Self {
            title: format!("⚠️ {}! ({})", alert.tier.label(), alert.offset),
            body: format!("Level: {} pc/cm³.", format_count(alert.value)),
            icon: alert.tier.icon().to_string(),
            persistent: true,
        }
    }

    /// Sent once notifications are granted.
    pub fn system_online() -> Self {
        Self {
            title: "System Online".to_string(),
            body: "Alerts will be delivered as notifications.".to_string(),
            icon: StatusTier::Comfortable.icon().to_string(),
            persistent: false,
        }
    }
}

pub trait DesktopNotifier: Send + Sync {
    fn notify(&self, notification: &DesktopNotification) -> Result<()>;
}

/// Shells out to `notify-send` (or `osascript` on macOS). Fire-and-forget:
/// the child is not awaited.
pub struct CommandNotifier {
    app_name: String,
}

impl CommandNotifier {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }

    fn command(&self, notification: &DesktopNotification) -> Command {
        if cfg!(target_os = "macos") {
            let script = format!(
                "display notification {} with title {}",
                applescript_quote(&notification.body),
                applescript_quote(&notification.title)
            );
            let mut cmd = Command::new("osascript");
            cmd.args(["-e", &script]);
            cmd
        } else {
            let urgency = if notification.persistent {
                "critical"
            } else {
                "normal"
            };
            let mut cmd = Command::new("notify-send");
            cmd.args([
                "--urgency",
                urgency,
                "--app-name",
                &self.app_name,
                "--icon",
                &notification.icon,
                &notification.title,
                &notification.body,
            ]);
            cmd
        }
    }
}

impl DesktopNotifier for CommandNotifier {
    fn notify(&self, notification: &DesktopNotification) -> Result<()> {
        let mut cmd = self.command(notification);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
            .with_context(|| format!("failed to launch {:?}", cmd.get_program()))
    }
}

fn applescript_quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::OffsetLabel;

    #[test]
    fn alert_notification_carries_tier_value_and_icon() {
        let alert = AlertEvent {
            offset: OffsetLabel::In60Min,
            value: 55_000.0,
            tier: StatusTier::VeryUncomfortable,
        };
        let n = DesktopNotification::for_alert(&alert);
        assert_eq!(n.title, "⚠️ Very Uncomfortable! (+60 min)");
        assert_eq!(n.body, "Level: 55,000 pc/cm³.");
        assert_eq!(n.icon, StatusTier::VeryUncomfortable.icon());
        assert!(n.persistent);
    }

    #[test]
    fn applescript_strings_are_escaped() {
        assert_eq!(applescript_quote(r#"say "hi""#), r#""say \"hi\"""#);
    }
}
