//! Periodic maintenance: expired-session sweep and pending-video reconciliation.
//!
//! An interval of zero disables the loop.

use crate::auth::SessionManager;
use crate::constants::RECONCILE_SWEEP_BATCH;
use crate::services::ReconcilerService;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

pub fn spawn_session_sweep(sessions: SessionManager, every_secs: u64) -> Option<JoinHandle<()>> {
    if every_secs == 0 {
        tracing::info!("Session sweep disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(every_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            match sessions.sweep_expired().await {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "Expired sessions removed"),
                Err(e) => tracing::error!(error = %e, "Session sweep failed"),
            }
        }
    }))
}

pub fn spawn_reconcile_sweep(
    reconciler: ReconcilerService,
    every_secs: u64,
) -> Option<JoinHandle<()>> {
    if every_secs == 0 {
        tracing::info!("Background video reconciliation disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(every_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if let Err(e) = reconciler.reconcile_pending(RECONCILE_SWEEP_BATCH).await {
                tracing::error!(error = %e, "Pending video sweep failed");
            }
        }
    }))
}
