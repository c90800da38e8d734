pub mod period;
pub mod progress;
pub mod stats;
