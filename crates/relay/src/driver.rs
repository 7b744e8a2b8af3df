//! Fixed-interval poll loop around [`Reconciler`].

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

use crate::error::CycleError;
use crate::reconcile::{CyclePhase, CycleReport, Reconciler};
use crate::shutdown::Shutdown;

/// What the liveness endpoint reports.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DriverStatus {
    pub phase: CyclePhase,
    pub cycles_completed: u64,
    pub cycles_aborted: u64,
    pub last_started: Option<DateTime<Utc>>,
    pub last_finished: Option<DateTime<Utc>>,
    pub last_report: Option<CycleReport>,
    pub last_error: Option<String>,
}

pub type SharedStatus = Arc<RwLock<DriverStatus>>;

// A panic while holding the lock leaves plain counters behind, still readable.
pub(crate) fn read_status(status: &SharedStatus) -> RwLockReadGuard<'_, DriverStatus> {
    status.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_status(status: &SharedStatus) -> RwLockWriteGuard<'_, DriverStatus> {
    status.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct PollDriver {
    reconciler: Reconciler,
    interval: Duration,
    status: SharedStatus,
}

impl PollDriver {
    pub fn new(reconciler: Reconciler, interval: Duration) -> Self {
        Self {
            reconciler,
            interval,
            status: SharedStatus::default(),
        }
    }

    /// Handle for readers such as the liveness endpoint.
    pub fn status(&self) -> SharedStatus {
        self.status.clone()
    }

    pub fn snapshot(&self) -> DriverStatus {
        read_status(&self.status).clone()
    }

    /// Run exactly one cycle and record its outcome.
    pub async fn tick(&self) -> Result<CycleReport, CycleError> {
        write_status(&self.status).last_started = Some(Utc::now());
        info!("Reconciliation cycle started");

        let status = self.status.clone();
        let mut observe = move |phase: CyclePhase| write_status(&status).phase = phase;
        let outcome = self.reconciler.run_cycle_observed(&mut observe).await;

        let mut status = write_status(&self.status);
        status.phase = CyclePhase::Idle;
        status.last_finished = Some(Utc::now());
        match &outcome {
            Ok(report) => {
                info!(
                    submitted = report.submitted,
                    rejected = report.rejected,
                    failed = report.failed,
                    already_present = report.already_present,
                    superseded = report.superseded,
                    unresolved = report.unresolved,
                    "Reconciliation cycle finished"
                );
                status.cycles_completed += 1;
                status.last_report = Some(report.clone());
                status.last_error = None;
            }
            Err(e) => {
                error!(stage = %e.stage(), error = %e, "Reconciliation cycle aborted");
                status.cycles_aborted += 1;
                status.last_error = Some(e.to_string());
            }
        }
        outcome
    }

    /// Poll until `shutdown` fires. An in-flight cycle always runs to completion.
    pub async fn run(&self, shutdown: &Shutdown) {
        info!(interval_secs = self.interval.as_secs(), "Poll driver started");
        loop {
            if shutdown.is_triggered() {
                break;
            }

            // Outcome is already logged and recorded in the status.
            let _ = self.tick().await;

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.wait() => {}
            }
        }
        info!("Poll driver stopped");
    }
}
