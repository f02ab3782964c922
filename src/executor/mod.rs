//! Remote execution module
//!
//! Drives a remote suite execution and turns its progress into a task result.

mod poller;
mod session;
mod shutdown;

pub use poller::{Poller, RunOutcome};
pub use shutdown::listen_for_signals;
