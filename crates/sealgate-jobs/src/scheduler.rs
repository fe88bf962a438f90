//! The trigger loop.
//!
//! Each started job gets one tokio task that sleeps until its next trigger
//! and then runs the job on the blocking pool, awaiting completion before
//! computing the following trigger.  Triggers that fall due while a run is
//! in flight are therefore skipped, never queued.
//!
//! Stopping is cooperative: `JobHandle::stop` prevents future triggers and
//! waits for the loop to exit, which includes letting an in-flight run
//! finish.  A run is never aborted half way.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Instant;

use tokio::{sync::Notify, task::JoinHandle};
use tracing::{debug, error, info, warn};

use sealgate_contracts::error::{SealgateError, SealgateResult};
use sealgate_core::{
    traits::{Clock, Job},
    SystemClock,
};

use crate::trigger::{delay_until, Trigger};

/// Starts jobs on the current tokio runtime.
pub struct Scheduler {
    clock: Arc<dyn Clock>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Begin triggering `job` according to `trigger`.
    ///
    /// Fails with `SealgateError::Configuration` when the trigger is invalid
    /// or no tokio runtime is running.
    pub fn start(&self, job: Arc<dyn Job>, trigger: Trigger) -> SealgateResult<JobHandle> {
        trigger.next_after(self.clock.now())?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            SealgateError::Configuration {
                reason: format!("scheduler needs a tokio runtime: {}", e),
            }
        })?;

        let name = job.name().to_string();
        let stopped = Arc::new(AtomicBool::new(false));
        let wake = Arc::new(Notify::new());
        let task = runtime.spawn(trigger_loop(
            job,
            trigger,
            Arc::clone(&self.clock),
            Arc::clone(&stopped),
            Arc::clone(&wake),
        ));

        info!(job = %name, trigger = ?trigger, "scheduled job started");
        Ok(JobHandle {
            name,
            stopped,
            wake,
            task,
        })
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Control handle for one started job.
///
/// Dropping the handle without calling `stop` leaves the job running for
/// the life of the runtime.
pub struct JobHandle {
    name: String,
    stopped: Arc<AtomicBool>,
    wake: Arc<Notify>,
    task: JoinHandle<()>,
}

impl JobHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Prevent future triggers and wait for the loop to exit.
    pub async fn stop(self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.wake.notify_one();
        if let Err(e) = self.task.await {
            warn!(job = %self.name, error = %e, "scheduler loop ended abnormally");
        }
        info!(job = %self.name, "scheduled job stopped");
    }
}

async fn trigger_loop(
    job: Arc<dyn Job>,
    trigger: Trigger,
    clock: Arc<dyn Clock>,
    stopped: Arc<AtomicBool>,
    wake: Arc<Notify>,
) {
    let mut target = match trigger.next_after(clock.now()) {
        Ok(target) => target,
        Err(e) => {
            error!(job = %job.name(), error = %e, "cannot compute next trigger");
            return;
        }
    };

    loop {
        let delay = delay_until(target, clock.now());

        tokio::select! {
            biased;
            _ = wake.notified() => {}
            _ = tokio::time::sleep(delay) => {}
        }
        if stopped.load(Ordering::SeqCst) {
            break;
        }

        run_once(&job).await;

        // Step from the slot that fired, not only the wall clock, which may
        // still read just before it.
        target = match trigger.next_after_fire(target, clock.now()) {
            Ok(next) => next,
            Err(e) => {
                error!(job = %job.name(), error = %e, "cannot compute next trigger");
                break;
            }
        };
    }
    debug!(job = %job.name(), "scheduler loop exited");
}

async fn run_once(job: &Arc<dyn Job>) {
    let name = job.name().to_string();
    let started = Instant::now();
    let task_job = Arc::clone(job);

    match tokio::task::spawn_blocking(move || task_job.run()).await {
        Ok(Ok(())) => {
            info!(
                job = %name,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "scheduled job completed"
            );
        }
        Ok(Err(e)) => {
            error!(job = %name, error = %e, "scheduled job failed; retrying at next trigger");
        }
        Err(e) => {
            error!(job = %name, error = %e, "scheduled job panicked");
        }
    }
}
