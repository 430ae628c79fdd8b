use anyhow::{Context, Result};
use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};
use tokio_util::sync::CancellationToken;

use crate::{
    dashboard::DashboardController,
    db::{Database, StoreChange},
};

use super::flatten;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

/// Loads the newest `day_groups` groups on start and after every store
/// change, feeding each snapshot to the dashboard.
pub async fn ingest_loop(
    db: Database,
    dashboard: DashboardController,
    day_groups: usize,
    cancel_token: CancellationToken,
) {
    // Subscribe before the first load so no write slips between the two.
    let changes = db.subscribe();
    follow_changes(db, dashboard, day_groups, changes, cancel_token).await;
}

async fn follow_changes(
    db: Database,
    dashboard: DashboardController,
    day_groups: usize,
    mut changes: broadcast::Receiver<StoreChange>,
    cancel_token: CancellationToken,
) {
    reload(&db, &dashboard, day_groups).await;

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                log_info!("ingest loop shutting down");
                break;
            }
            change = changes.recv() => {
                match change {
                    Ok(change) => log_debug!("store changed: {change:?}"),
                    Err(RecvError::Lagged(missed)) => {
                        log_warn!("ingest fell behind by {missed} changes, reloading once");
                    }
                    Err(RecvError::Closed) => {
                        log_info!("store closed, ingest loop exiting");
                        break;
                    }
                }

                let coalesced = drain_pending(&mut changes);
                if coalesced > 0 {
                    log_debug!("coalesced {coalesced} queued changes into one reload");
                }
                reload(&db, &dashboard, day_groups).await;
            }
        }
    }
}

/// Discard events already queued; the next reload covers them all.
fn drain_pending(changes: &mut broadcast::Receiver<StoreChange>) -> usize {
    let mut drained = 0;
    loop {
        match changes.try_recv() {
            Ok(_) => drained += 1,
            Err(TryRecvError::Lagged(missed)) => drained += missed as usize,
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return drained,
        }
    }
}

async fn reload(db: &Database, dashboard: &DashboardController, day_groups: usize) {
    match load_snapshot(db, day_groups).await {
        Ok(readings) => {
            log_debug!("snapshot loaded: {} readings", readings.len());
            dashboard.apply_snapshot(&readings).await;
        }
        Err(err) => log_error!("failed to load readings, keeping previous state: {err:?}"),
    }
}

async fn load_snapshot(db: &Database, day_groups: usize) -> Result<Vec<crate::models::Reading>> {
    let groups = db
        .last_day_groups(day_groups)
        .await
        .context("failed to query latest day groups")?;
    Ok(flatten(&groups))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::models::Reading;
    use crate::notify::testing::Fakes;
    use crate::session::{NotificationPermission, SessionContext, UserProfile};
    use crate::settings::Settings;

    fn reading(pc: f64) -> Reading {
        Reading {
            pc0_1: Some(pc),
            ..Reading::default()
        }
    }

    fn dashboard(db: &Database, fakes: &Fakes) -> DashboardController {
        let mut session =
            SessionContext::signed_in(UserProfile::new("Ada", "Lovelace", "ada@example.com", None));
        session.notification_permission = NotificationPermission::Granted;
        DashboardController::new(db.clone(), &Settings::default(), session, fakes.dispatcher())
    }

    fn reloads(fakes: &Fakes) -> usize {
        // Every over-threshold cycle speaks once for the new queue head.
        fakes.speaker.spoken.lock().unwrap().len()
    }

    #[tokio::test]
    async fn overflowed_receiver_reloads_once_and_lands_on_newest() {
        let fakes = Fakes::new();
        let db = Database::in_memory().unwrap();
        let dashboard = dashboard(&db, &fakes);

        let changes = db.subscribe();
        for n in 0..100 {
            db.put_reading("2024-01-01", &format!("k{n:03}"), &reading(11_000.0 + n as f64))
                .await
                .unwrap();
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(follow_changes(
            db.clone(),
            dashboard.clone(),
            10,
            changes,
            cancel.clone(),
        ));

        // Initial load, then a single reload for the whole lagged backlog.
        let settled = tokio::time::timeout(Duration::from_secs(5), async {
            while reloads(&fakes) < 2 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(settled.is_ok());
        tokio::time::sleep(Duration::from_millis(50)).await;

        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(reloads(&fakes), 2);
        let snapshot = dashboard.snapshot().await;
        assert!(!snapshot.loading);
        assert_eq!(snapshot.current_pc01, 11_099.0);
    }

    #[tokio::test]
    async fn writes_while_running_end_on_newest_snapshot() {
        let fakes = Fakes::new();
        let db = Database::in_memory().unwrap();
        let dashboard = dashboard(&db, &fakes);
        let mut updates = dashboard.subscribe();

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(ingest_loop(db.clone(), dashboard.clone(), 10, cancel.clone()));

        for n in 0..200 {
            db.put_reading("2024-01-01", &n.to_string(), &reading(n as f64))
                .await
                .unwrap();
        }

        let seen = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if updates.borrow_and_update().current_pc01 == 199.0 {
                    break;
                }
                updates.changed().await.unwrap();
            }
        })
        .await;
        assert!(seen.is_ok());

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn closed_channel_ends_the_loop() {
        let fakes = Fakes::new();
        let db = Database::in_memory().unwrap();
        db.put_reading("2024-01-01", "k", &reading(500.0)).await.unwrap();
        let dashboard = dashboard(&db, &fakes);

        let (sender, receiver) = broadcast::channel::<StoreChange>(4);
        drop(sender);

        let finished = tokio::time::timeout(
            Duration::from_secs(5),
            follow_changes(db, dashboard.clone(), 10, receiver, CancellationToken::new()),
        )
        .await;
        assert!(finished.is_ok());
        assert_eq!(dashboard.snapshot().await.current_pc01, 500.0);
    }

    #[test]
    fn drain_counts_queued_and_lagged_events() {
        let (sender, mut receiver) = broadcast::channel::<StoreChange>(2);
        for n in 0..5 {
            sender
                .send(StoreChange::Written {
                    day: "2024-01-01".into(),
                    key: format!("k{n}"),
                })
                .unwrap();
        }
        assert_eq!(drain_pending(&mut receiver), 5);
        assert_eq!(drain_pending(&mut receiver), 0);
    }
}
