//! Background tasks owned by a running controller.
//!
//! Three tasks run for the controller's lifetime:
//!
//! - lock-state reconciliation: applies every debounced lock switch change,
//!   including manual thumb-turn operation, to the auto-lock window
//! - door-state reconciliation: logs door transitions
//! - auto-lock: evaluates the auto-lock policy every check interval
//!
//! All three live in one [`JoinSet`] and stop together on
//! [`ControllerTasks::shutdown`].

use smartlock_core::Result;
use smartlock_hardware::SensorSubscription;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::controller::LockController;

/// Handle to the controller's background tasks.
#[derive(Debug)]
pub struct ControllerTasks {
    tasks: JoinSet<Result<()>>,
}

impl ControllerTasks {
    pub(crate) fn spawn(
        controller: LockController,
        lock_changes: SensorSubscription,
        door_changes: SensorSubscription,
    ) -> Self {
        let mut tasks = JoinSet::new();

        tasks.spawn(lock_reconciliation(controller.clone(), lock_changes));
        tasks.spawn(door_reconciliation(controller.clone(), door_changes));
        tasks.spawn(auto_lock_loop(controller));

        debug!("Spawned {} controller tasks", tasks.len());
        Self { tasks }
    }

    /// Number of tasks still running.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Stop all tasks and wait for them to finish.
    ///
    /// Task errors and panics are logged, not returned.
    ///
    /// # Errors
    ///
    /// Currently infallible; the `Result` leaves room for teardown steps
    /// that can fail.
    pub async fn shutdown(mut self) -> Result<()> {
        self.tasks.abort_all();

        let mut error_count = 0;
        let mut panic_count = 0;
        while let Some(result) = self.tasks.join_next().await {
            match classify_task_result(result) {
                TaskTermination::Success | TaskTermination::Cancelled => {}
                TaskTermination::Error => error_count += 1,
                TaskTermination::Panic => panic_count += 1,
            }
        }

        if error_count + panic_count > 0 {
            warn!(
                "Controller tasks stopped with {} errors, {} panics",
                error_count, panic_count
            );
        } else {
            info!("Controller tasks stopped");
        }
        Ok(())
    }
}

fn classify_task_result(
    result: std::result::Result<Result<()>, tokio::task::JoinError>,
) -> TaskTermination {
    match result {
        Ok(Ok(())) => TaskTermination::Success,
        Ok(Err(_)) => TaskTermination::Error,
        Err(e) if e.is_cancelled() => TaskTermination::Cancelled,
        Err(_) => TaskTermination::Panic,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskTermination {
    Success,
    Error,
    Cancelled,
    Panic,
}

async fn lock_reconciliation(
    controller: LockController,
    mut changes: SensorSubscription,
) -> Result<()> {
    while let Some(reading) = changes.recv().await {
        controller.observe_lock(reading);
    }
    debug!("Lock-state change stream closed");
    Ok(())
}

async fn door_reconciliation(
    controller: LockController,
    mut changes: SensorSubscription,
) -> Result<()> {
    while let Some(reading) = changes.recv().await {
        controller.observe_door(reading);
    }
    debug!("Door-state change stream closed");
    Ok(())
}

async fn auto_lock_loop(controller: LockController) -> Result<()> {
    let mut interval = tokio::time::interval(controller.config().auto_lock_check_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        controller.auto_lock_tick().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_classify_task_results() {
        let mut set: JoinSet<Result<()>> = JoinSet::new();
        set.spawn(async { Ok(()) });
        let result = set.join_next().await.unwrap();
        assert_eq!(classify_task_result(result), TaskTermination::Success);

        set.spawn(async { Err(smartlock_core::Error::Busy) });
        let result = set.join_next().await.unwrap();
        assert_eq!(classify_task_result(result), TaskTermination::Error);

        set.spawn(async {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            Ok(())
        });
        set.abort_all();
        let result = set.join_next().await.unwrap();
        assert_eq!(classify_task_result(result), TaskTermination::Cancelled);
    }
}
