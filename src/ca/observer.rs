use tracing::info;

use crate::status::Status;

/// Receives progress of a training run.
///
/// Called from the thread running a restart; restarts may run concurrently.
pub trait Observer: Sync {
    /// Called after every full pass over the coordinates.
    fn pass_finished(&self, _status: &Status) {}
    /// Called once a restart terminates.
    fn restart_finished(&self, _status: &Status) {}
    /// Checked before every pass; returning `true` ends the restart.
    fn should_stop(&self, _status: &Status) -> bool {
        false
    }
}

/// Reports nothing.
pub struct Silent;

impl Observer for Silent {}

/// Reports progress through `tracing`.
pub struct LogObserver;

impl Observer for LogObserver {
    fn pass_finished(&self, status: &Status) {
        info!(
            restart = status.restart,
            iteration = status.iteration,
            accepted = status.accepted,
            value = status.value,
            time = status.time,
            "pass finished"
        );
    }

    fn restart_finished(&self, status: &Status) {
        info!(
            restart = status.restart,
            iterations = status.iteration,
            value = status.value,
            code = ?status.code,
            "restart finished"
        );
    }
}

/// Stops a restart once the wrapped function returns `true`.
pub struct Callback<F>(pub F);

impl<F> Observer for Callback<F>
where
    F: Fn(&Status) -> bool + Sync,
{
    fn should_stop(&self, status: &Status) -> bool {
        (self.0)(status)
    }
}
