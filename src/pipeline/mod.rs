//! Metrics pipeline: one-shot and live aggregation.

pub mod aggregator;
pub mod live;

pub use aggregator::Aggregator;
pub use live::LiveAggregator;
