pub mod backend;
pub mod command;
mod coordinator;
pub mod error;
mod events;
pub mod handlers;
mod job;
pub mod readiness;
mod table;
pub mod tracker;
pub mod types;

pub use backend::{Backend, ForkBackend, Launched, EXEC_FAILURE_CODE};
pub use command::Command;
pub use coordinator::JobCoordinator;
pub use events::{JobStatus, Received};
pub use handlers::dispatch;
pub use job::Job;
pub use table::JobTable;
