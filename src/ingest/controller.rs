use anyhow::{bail, Context, Result};
use log::info;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{dashboard::DashboardController, db::Database};

use super::loop_worker::ingest_loop;

/// Owns the running ingest task, if any.
#[derive(Default)]
pub struct IngestController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl IngestController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(
        &mut self,
        db: Database,
        dashboard: DashboardController,
        day_groups: usize,
    ) -> Result<()> {
        if self.handle.is_some() {
            bail!("ingest already running");
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(ingest_loop(db, dashboard, day_groups, cancel_token.clone()));
        info!("Subscribed to the last {day_groups} day groups");

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("ingest task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}
