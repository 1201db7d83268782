//! Shutdown coordination, webhook admission, and operational controls.

mod admission;
mod hooks;
mod operations;
mod shutdown;

pub use admission::{AdmissionDecision, WebhookAdmission};
pub use hooks::QueueShutdownHooks;
pub use operations::Operations;
pub use shutdown::{
    DEFAULT_SHUTDOWN_CEILING, FatalReporter, ShutdownCoordinator, ShutdownHandle, Supervised,
    listen_for_signals, report_panics,
};
