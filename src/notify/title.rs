use std::{
    io::{self, IsTerminal, Write},
    sync::Arc,
    time::Duration,
};

use tokio::{
    task::JoinHandle,
    time::{self, Instant},
};

pub const NORMAL_TITLE: &str = "PM Dashboard";

pub fn danger_title(label: &str) -> String {
    format!("⚠️⚠️ DANGER! ({label}) ⚠️⚠️")
}

/// Where the window title goes.
pub trait TitleSink: Send + Sync {
    fn set_title(&self, title: &str);
}

/// Sets the terminal window title through the OSC 0 escape sequence.
/// Does nothing when stdout is not a terminal.
pub struct TerminalTitle;

impl TitleSink for TerminalTitle {
    fn set_title(&self, title: &str) {
        let mut stdout = io::stdout();
        if !stdout.is_terminal() {
            return;
        }
        let _ = write!(stdout, "\x1b]0;{title}\x07");
        let _ = stdout.flush();
    }
}

/// Alternates the title between the danger text and [`NORMAL_TITLE`] on a
/// fixed period until stopped. The first switch happens one period after
/// `start`, and shows the danger text.
pub struct TitleBlinker {
    sink: Arc<dyn TitleSink>,
    period: Duration,
    ticker: Option<JoinHandle<()>>,
}

impl TitleBlinker {
    pub fn new(sink: Arc<dyn TitleSink>, period: Duration) -> Self {
        Self {
            sink,
            period: period.max(Duration::from_millis(1)),
            ticker: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, label: &str) {
        self.cancel_ticker();

        let sink = Arc::clone(&self.sink);
        let period = self.period;
        let danger = danger_title(label);
        let first_switch = Instant::now() + period;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(first_switch, period);
            let mut show_danger = true;
            loop {
                interval.tick().await;
                if show_danger {
                    sink.set_title(&danger);
                } else {
                    sink.set_title(NORMAL_TITLE);
                }
                show_danger = !show_danger;
            }
        });

        self.ticker = Some(handle);
    }

    /// Stop toggling and restore the normal title. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.cancel_ticker();
        self.sink.set_title(NORMAL_TITLE);
    }

    fn cancel_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}

impl Drop for TitleBlinker {
    fn drop(&mut self) {
        self.cancel_ticker();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingTitle(Mutex<Vec<String>>);

    impl TitleSink for RecordingTitle {
        fn set_title(&self, title: &str) {
            self.0.lock().unwrap().push(title.to_string());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn toggles_every_period_starting_with_danger() {
        let sink = Arc::new(RecordingTitle::default());
        let mut blinker = TitleBlinker::new(sink.clone(), Duration::from_secs(1));

        blinker.start("+15 min");
        tokio::task::yield_now().await;
        assert!(sink.0.lock().unwrap().is_empty());

        for _ in 0..3 {
            time::advance(Duration::from_secs(1)).await;
            tokio::task::yield_now().await;
        }

        let titles = sink.0.lock().unwrap().clone();
        assert_eq!(
            titles,
            vec![
                danger_title("+15 min"),
                NORMAL_TITLE.to_string(),
                danger_title("+15 min"),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stop_restores_normal_title() {
        let sink = Arc::new(RecordingTitle::default());
        let mut blinker = TitleBlinker::new(sink.clone(), Duration::from_secs(1));

        blinker.start("Current");
        time::advance(Duration::from_secs(1)).await;
        tokio::task::yield_now().await;
        blinker.stop();
        assert!(!blinker.is_running());

        time::advance(Duration::from_secs(5)).await;
        tokio::task::yield_now().await;

        let titles = sink.0.lock().unwrap().clone();
        assert_eq!(titles.last().map(String::as_str), Some(NORMAL_TITLE));
        assert_eq!(titles.len(), 2);
    }
}
