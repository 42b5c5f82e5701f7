pub mod frame;
pub mod metrics;

pub use frame::*;
pub use metrics::{Metrics, MetricsSnapshot};
