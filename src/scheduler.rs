//! Recurring scan schedule with an explicit overlap guard

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::models::RunResult;
use crate::pipeline::TriagePipeline;

/// Anything the scheduler can drive; a seam so the guard logic is testable
/// without a live pipeline
#[async_trait]
pub trait TriageRunner: Send {
    async fn run(&mut self, interactive: bool) -> Result<RunResult>;
}

#[async_trait]
impl TriageRunner for TriagePipeline {
    async fn run(&mut self, interactive: bool) -> Result<RunResult> {
        TriagePipeline::run(self, interactive).await
    }
}

/// Fires the pipeline on a fixed period and on manual triggers, with at most
/// one run in flight at a time. A tick that lands while a run is still going
/// is skipped, not queued.
pub struct Scheduler<R: TriageRunner> {
    runner: Arc<Mutex<R>>,
    period: Duration,
}

impl<R: TriageRunner> Scheduler<R> {
    pub fn new(runner: R, period: Duration) -> Self {
        Self {
            runner: Arc::new(Mutex::new(runner)),
            period,
        }
    }

    /// Run on the configured period until cancelled. The first run fires
    /// immediately.
    pub async fn watch(&self) {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(period_secs = self.period.as_secs(), "Watching inbox");

        loop {
            ticker.tick().await;
            match self.trigger(false).await {
                Some(Ok(result)) if result.aborted => {
                    // Credential is gone; scheduled runs cannot reauthorize
                    error!("Run aborted on authorization failure, stopping watch");
                    return;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) if e.is_auth() => {
                    error!(error = %e, "Cannot authenticate, stopping watch");
                    return;
                }
                Some(Err(e)) => error!(error = %e, "Triage run failed"),
                None => {}
            }
        }
    }

    /// Start a run now unless one is already in flight. Returns None when
    /// the trigger was skipped.
    pub async fn trigger(&self, interactive: bool) -> Option<Result<RunResult>> {
        match self.runner.try_lock() {
            Ok(mut runner) => Some(runner.run(interactive).await),
            Err(_) => {
                warn!("A triage run is already in flight, skipping trigger");
                None
            }
        }
    }
}
