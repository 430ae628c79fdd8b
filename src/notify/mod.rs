//! Side effects driven by the head of the alert queue: a spoken warning, a
//! blinking window title and a desktop notification.
//!
//! Every backend is best effort. Failures are logged and never reach the
//! pipeline that triggered them.

pub mod desktop;
pub mod speech;
pub mod title;

use std::{sync::Arc, time::Duration};

use crate::{alerts::AlertEvent, session::SessionContext, settings::AlertSettings};
use crate::{log_debug, log_warn};

pub use desktop::{CommandNotifier, DesktopNotification, DesktopNotifier};
pub use speech::{warning_utterance, SpeechEngineHandle, SpeechProgram, Speaker};
pub use title::{danger_title, TerminalTitle, TitleBlinker, TitleSink, NORMAL_TITLE};

const ENABLE_LOGS: bool = true;

pub struct NotificationDispatcher {
    speaker: Arc<dyn Speaker>,
    notifier: Arc<dyn DesktopNotifier>,
    blinker: TitleBlinker,
    voice_enabled: bool,
    title_blink_enabled: bool,
}

impl NotificationDispatcher {
    pub fn new(
        speaker: Arc<dyn Speaker>,
        notifier: Arc<dyn DesktopNotifier>,
        title: Arc<dyn TitleSink>,
        settings: &AlertSettings,
    ) -> Self {
        Self {
            speaker,
            notifier,
            blinker: TitleBlinker::new(title, Duration::from_millis(settings.blink_interval_ms)),
            voice_enabled: settings.voice_enabled,
            title_blink_enabled: settings.title_blink_enabled,
        }
    }

    /// Platform backends: the detected TTS command, `notify-send`/`osascript`
    /// and the terminal title.
    pub fn platform(settings: &AlertSettings) -> Self {
        Self::new(
            Arc::new(SpeechEngineHandle::detect()),
            Arc::new(CommandNotifier::new("pmwatch")),
            Arc::new(TerminalTitle),
            settings,
        )
    }

    /// Bring the side effects in line with the current queue head. Must run
    /// inside a tokio runtime (the title blinker is a task).
    pub fn react(&mut self, head: Option<&AlertEvent>, session: &SessionContext) {
        match head {
            Some(alert) if session.is_authenticated() => self.raise(alert, session),
            _ => self.settle(),
        }
    }

    fn raise(&mut self, alert: &AlertEvent, session: &SessionContext) {
        let label = alert.offset.label();
        log_debug!("Raising alert for {label}: {}", alert.value);

        if self.voice_enabled {
            self.speaker.cancel();
            if let Err(err) = self.speaker.speak(&warning_utterance(label)) {
                log_warn!("Spoken warning failed: {err}");
            }
        }

        if self.title_blink_enabled {
            self.blinker.start(label);
        }

        if session.notifications_granted() {
            let notification = DesktopNotification::for_alert(alert);
            if let Err(err) = self.notifier.notify(&notification) {
                log_warn!("Desktop notification failed: {err:#}");
            }
        }
    }

    fn settle(&mut self) {
        self.speaker.cancel();
        self.blinker.stop();
    }

    /// Confirmation shown right after notifications were granted.
    pub fn announce_online(&self) {
        if let Err(err) = self.notifier.notify(&DesktopNotification::system_online()) {
            log_warn!("Desktop notification failed: {err:#}");
        }
    }

    #[cfg(test)]
    pub(crate) fn is_blinking(&self) -> bool {
        self.blinker.is_running()
    }

    pub fn shutdown(&mut self) {
        self.settle();
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use anyhow::Result;

    use super::*;

    #[derive(Default)]
    pub struct RecordingSpeaker {
        pub spoken: Mutex<Vec<String>>,
        pub cancels: Mutex<u32>,
    }

    impl Speaker for RecordingSpeaker {
        fn speak(&self, text: &str) -> Result<(), String> {
            self.spoken.lock().unwrap().push(text.to_string());
            Ok(())
        }

        fn cancel(&self) {
            *self.cancels.lock().unwrap() += 1;
        }
    }

    #[derive(Default)]
    pub struct RecordingNotifier {
        pub sent: Mutex<Vec<DesktopNotification>>,
    }

    impl DesktopNotifier for RecordingNotifier {
        fn notify(&self, notification: &DesktopNotification) -> Result<()> {
            self.sent.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct RecordingTitle {
        pub titles: Mutex<Vec<String>>,
    }

    impl TitleSink for RecordingTitle {
        fn set_title(&self, title: &str) {
            self.titles.lock().unwrap().push(title.to_string());
        }
    }

    pub struct Fakes {
        pub speaker: Arc<RecordingSpeaker>,
        pub notifier: Arc<RecordingNotifier>,
        pub title: Arc<RecordingTitle>,
    }

    impl Fakes {
        pub fn new() -> Self {
            Self {
                speaker: Arc::new(RecordingSpeaker::default()),
                notifier: Arc::new(RecordingNotifier::default()),
                title: Arc::new(RecordingTitle::default()),
            }
        }

        pub fn dispatcher(&self) -> NotificationDispatcher {
            NotificationDispatcher::new(
                self.speaker.clone(),
                self.notifier.clone(),
                self.title.clone(),
                &AlertSettings::default(),
            )
        }
    }
}
