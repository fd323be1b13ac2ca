// ── Background scheduler ──
//
// Repeats a check forever on a jittered interval until stopped. Each cycle
// is: sleep, check, hand the result to the callback, repeat. Cycles never
// overlap, and a failed check never ends the loop.

use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use checkpoint_api::CheckResponse;

use crate::checker::Checker;
use crate::error::CoreError;
use crate::params::CheckParams;

/// Result delivered to the callback once per cycle.
pub type CheckOutcome = Result<CheckResponse, CoreError>;

/// Lower bound of the stagger factor applied to the base interval.
pub const STAGGER_MIN: f64 = 0.75;
/// Upper bound of the stagger factor applied to the base interval.
pub const STAGGER_MAX: f64 = 1.25;

/// Pick a wait uniformly from `[0.75 * interval, 1.25 * interval]`.
///
/// Spreads a fleet of identical clients started at the same moment across
/// half an interval, so they do not all hit the endpoint together.
pub fn random_stagger(interval: Duration) -> Duration {
    let factor = rand::rng().random_range(STAGGER_MIN..=STAGGER_MAX);
    Duration::try_from_secs_f64(interval.as_secs_f64() * factor).unwrap_or(Duration::MAX)
}

/// Starts repeating checks in the background.
pub struct Scheduler;

impl Scheduler {
    /// Spawn a task that checks `params` roughly every `base_interval`.
    ///
    /// The first check happens after one staggered wait, not immediately.
    /// `callback` runs on Tokio's blocking pool once per cycle; the next
    /// wait starts only after it returns. If checks are disabled when this
    /// is called, nothing is spawned and the callback is never invoked.
    ///
    /// Called outside a Tokio runtime, nothing is spawned and an error is
    /// logged; the returned handle reports stopped. Dropping the returned
    /// handle stops the loop.
    pub fn start<F>(
        checker: Checker,
        params: CheckParams,
        base_interval: Duration,
        callback: F,
    ) -> ScheduleHandle
    where
        F: FnMut(CheckOutcome) + Send + 'static,
    {
        let cancel = CancellationToken::new();

        if checker.overrides().resolve().disabled {
            info!(product = %params.product, "checks disabled, scheduler not started");
            return ScheduleHandle { cancel, task: None };
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            error!(product = %params.product, "no Tokio runtime, scheduler not started");
            cancel.cancel();
            return ScheduleHandle { cancel, task: None };
        };

        let task = runtime.spawn(run(
            checker,
            params,
            base_interval,
            callback,
            cancel.clone(),
        ));

        ScheduleHandle {
            cancel,
            task: Some(task),
        }
    }
}

async fn run<F>(
    checker: Checker,
    params: CheckParams,
    base_interval: Duration,
    mut callback: F,
    cancel: CancellationToken,
) where
    F: FnMut(CheckOutcome) + Send + 'static,
{
    loop {
        let wait = random_stagger(base_interval);
        debug!(product = %params.product, wait_ms = wait.as_millis(), "next check scheduled");

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(wait) => {}
        }

        let outcome = checker.check(&params).await;
        if let Err(ref e) = outcome {
            warn!(product = %params.product, error = %e, "scheduled check failed");
        }

        match tokio::task::spawn_blocking(move || {
            callback(outcome);
            callback
        })
        .await
        {
            Ok(cb) => callback = cb,
            Err(e) => {
                warn!(product = %params.product, error = %e, "check callback panicked, stopping");
                break;
            }
        }
    }

    debug!(product = %params.product, "check scheduler stopped");
}

// ── ScheduleHandle ───────────────────────────────────────────────

/// Controls a running [`Scheduler`] loop.
#[derive(Debug)]
pub struct ScheduleHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ScheduleHandle {
    /// Stop scheduling further cycles. A check already in flight finishes
    /// and its result is still delivered. Safe to call any number of times.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// `true` while the background task is alive.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the loop and wait for the background task to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "check scheduler task failed");
            }
        }
    }
}

impl Drop for ScheduleHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn stagger_stays_within_bounds() {
        let interval = Duration::from_secs(24 * 60 * 60);
        let min = Duration::from_secs(18 * 60 * 60);
        let max = Duration::from_secs(30 * 60 * 60);

        for _ in 0..1000 {
            let out = random_stagger(interval);
            assert!(out >= min && out <= max, "unexpected value: {out:?}");
        }
    }

    #[test]
    fn stagger_actually_varies() {
        let interval = Duration::from_secs(60);
        let first = random_stagger(interval);
        assert!((0..100).any(|_| random_stagger(interval) != first));
    }

    #[test]
    fn zero_interval_stays_zero() {
        assert_eq!(random_stagger(Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn start_without_runtime_returns_stopped_handle() {
        let checker = Checker::with_base_url(
            url::Url::parse("http://127.0.0.1:9").unwrap(),
            &checkpoint_api::TransportConfig::default(),
        )
        .unwrap()
        .with_overrides(crate::OverrideSource::Fixed(crate::Overrides::default()));

        let handle = Scheduler::start(
            checker,
            CheckParams::new("test", "1.0"),
            Duration::from_millis(10),
            |_outcome| {
                panic!("callback must not run");
            },
        );

        assert!(handle.is_stopped());
        assert!(!handle.is_running());
    }
}
