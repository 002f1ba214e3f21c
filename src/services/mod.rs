pub mod backup_service;
pub mod result_aggregator;
pub mod signal_forwarder;
pub mod stream_watcher;

pub use backup_service::{backup_destination, BackupService};
pub use result_aggregator::ResultAggregator;
pub use signal_forwarder::{os_signals, SignalForwarder, FORWARDED_SIGNALS};
pub use stream_watcher::StreamWatcher;
