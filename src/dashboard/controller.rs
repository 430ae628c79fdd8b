use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;
use tokio::sync::{watch, Mutex};

use crate::{
    alerts::{derive_alerts, AlertEvent, AlertQueue},
    db::Database,
    forecast::{project, ForecastConfig, ForecastPoint, OffsetLabel},
    ingest::{pc01_history, IngestController},
    models::Reading,
    notify::NotificationDispatcher,
    session::{NotificationPermission, PermissionPrompt, SessionContext, SessionStore},
    settings::Settings,
    status::StatusTier,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastView {
    pub offset: OffsetLabel,
    pub value: u64,
    pub tier: StatusTier,
}

/// Serializable view of the live dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    /// True until the first snapshot arrives from the store
    pub loading: bool,
    pub authenticated: bool,
    pub latest: Option<Reading>,
    pub current_pc01: f64,
    pub status: StatusTier,
    pub forecast: Vec<ForecastView>,
    pub alerts: Vec<AlertEvent>,
    pub alert_revision: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

struct DashboardState {
    loading: bool,
    latest: Option<Reading>,
    forecast: [ForecastPoint; 4],
    alerts: AlertQueue,
    session: SessionContext,
    updated_at: Option<DateTime<Utc>>,
    dispatcher: NotificationDispatcher,
}

impl DashboardState {
    fn current_pc01(&self) -> f64 {
        self.latest.as_ref().and_then(|r| r.pc0_1).unwrap_or(0.0)
    }

    fn react(&mut self) {
        let head = self.alerts.head().copied();
        self.dispatcher.react(head.as_ref(), &self.session);
    }

    fn snapshot(&self) -> DashboardSnapshot {
        let current = self.current_pc01();
        DashboardSnapshot {
            loading: self.loading,
            authenticated: self.session.is_authenticated(),
            latest: self.latest.clone(),
            current_pc01: current,
            status: StatusTier::classify(current),
            forecast: self
                .forecast
                .iter()
                .map(|point| ForecastView {
                    offset: point.offset,
                    value: point.value,
                    tier: StatusTier::classify(point.value as f64),
                })
                .collect(),
            alerts: self.alerts.to_vec(),
            alert_revision: self.alerts.revision(),
            updated_at: self.updated_at,
        }
    }
}

/// Live pipeline state for one viewer.
///
/// Every mutation runs under one lock: a snapshot cycle (forecast, queue
/// replacement, dispatcher reaction) can never interleave with an
/// acknowledgment.
#[derive(Clone)]
pub struct DashboardController {
    state: Arc<Mutex<DashboardState>>,
    db: Database,
    threshold: f64,
    forecast_config: ForecastConfig,
    day_groups: usize,
    ingest: Arc<Mutex<IngestController>>,
    updates: Arc<watch::Sender<DashboardSnapshot>>,
}

impl DashboardController {
    pub fn new(
        db: Database,
        settings: &Settings,
        session: SessionContext,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        let forecast_config = settings.feed.forecast_config();
        let state = DashboardState {
            loading: true,
            latest: None,
            forecast: project(&[], &forecast_config),
            alerts: AlertQueue::new(),
            session,
            updated_at: None,
            dispatcher,
        };
        let (updates, _) = watch::channel(state.snapshot());

        Self {
            state: Arc::new(Mutex::new(state)),
            db,
            threshold: settings.alerts.threshold,
            forecast_config,
            day_groups: settings.feed.day_groups.max(1),
            ingest: Arc::new(Mutex::new(IngestController::new())),
            updates: Arc::new(updates),
        }
    }

    /// Start following the store.
    pub async fn start(&self) -> Result<()> {
        self.ingest
            .lock()
            .await
            .start(self.db.clone(), self.clone(), self.day_groups)
    }

    /// Receiver that sees every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.updates.subscribe()
    }

    pub async fn snapshot(&self) -> DashboardSnapshot {
        self.state.lock().await.snapshot()
    }

    /// One pipeline cycle over a flattened store snapshot. An empty snapshot
    /// only clears the loading flag; the previous reading stays on screen.
    pub async fn apply_snapshot(&self, readings: &[Reading]) {
        let mut state = self.state.lock().await;
        state.loading = false;

        if let Some(latest) = readings.last() {
            let history = pc01_history(readings, self.forecast_config.history_capacity);
            state.forecast = project(&history.to_vec(), &self.forecast_config);
            state.latest = Some(latest.clone());
            state.updated_at = Some(Utc::now());

            let current = state.current_pc01();
            let alerts = derive_alerts(current, &state.forecast, self.threshold);
            state.alerts.replace(alerts);
            state.react();
        }

        self.publish(&state);
    }

    /// Dismiss the alert at the head of the queue.
    pub async fn acknowledge(&self) -> Option<AlertEvent> {
        let mut state = self.state.lock().await;
        let popped = state.alerts.acknowledge()?;
        state.react();
        self.publish(&state);
        Some(popped)
    }

    pub async fn set_session(&self, session: SessionContext) {
        let mut state = self.state.lock().await;
        state.session = session;
        state.react();
        self.publish(&state);
    }

    /// Explicit permission request; a fresh grant is confirmed with a
    /// "System Online" notification. The prompt runs on the blocking pool
    /// and no lock is held while it waits for an answer.
    pub async fn request_notification_permission(
        &self,
        store: &SessionStore,
        prompt: Arc<dyn PermissionPrompt>,
    ) -> Result<NotificationPermission> {
        let before = store.context().notification_permission;
        let answer = if store.permission_pending() {
            let asked = tokio::task::spawn_blocking(move || prompt.ask())
                .await
                .context("notification permission prompt failed")?;
            store.record_notification_permission(asked)?
        } else {
            before
        };
        let session = store.context();

        let mut state = self.state.lock().await;
        if answer == NotificationPermission::Granted && before != NotificationPermission::Granted {
            state.dispatcher.announce_online();
        }
        state.session = session;
        self.publish(&state);
        Ok(answer)
    }

    /// Stop ingest, then silence every side effect.
    pub async fn shutdown(&self) -> Result<()> {
        let stopped = self.ingest.lock().await.stop().await;
        self.state.lock().await.dispatcher.shutdown();
        info!("Dashboard shut down");
        stopped
    }

    fn publish(&self, state: &DashboardState) {
        self.updates.send_replace(state.snapshot());
    }
}
