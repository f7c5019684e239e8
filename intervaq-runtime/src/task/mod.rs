mod handle;
mod state;
mod timed;

pub use handle::TaskHandle;
pub use state::{TaskId, TaskKind, TaskState};
pub(crate) use timed::{noop, Callback, TimedTask};

use crate::error::BoxError;

/// What a task callback reports back to `poll`.
pub type TaskResult = std::result::Result<(), BoxError>;

/// Return types accepted from task callbacks.
///
/// Plain `()` callbacks never fail. Callbacks returning `Result<(), E>` have
/// their error surfaced from `Scheduler::poll` as `Error::Callback`.
pub trait IntoTaskResult {
    fn into_task_result(self) -> TaskResult;
}

impl IntoTaskResult for () {
    fn into_task_result(self) -> TaskResult {
        Ok(())
    }
}

impl<E> IntoTaskResult for std::result::Result<(), E>
where
    E: Into<BoxError>,
{
    fn into_task_result(self) -> TaskResult {
        self.map_err(Into::into)
    }
}

/// Box a user callback into the form stored by a task.
pub(crate) fn boxed<F, R>(mut callback: F) -> Callback
where
    F: FnMut() -> R + Send + 'static,
    R: IntoTaskResult,
{
    Box::new(move || callback().into_task_result())
}
