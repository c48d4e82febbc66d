pub mod broadcast;
pub mod jsonl;
pub mod logging;
pub mod progress;

pub use broadcast::BroadcastPublisher;
pub use jsonl::JsonlPublisher;
pub use logging::TracingPublisher;
pub use progress::ProgressPublisher;
