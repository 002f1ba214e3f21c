pub mod process_supervisor;
pub mod run_loop;

pub use process_supervisor::{wait_for_upgrade_or_exit, ProcessSupervisor, DRAIN_GRACE};
pub use run_loop::run_until_exit;
