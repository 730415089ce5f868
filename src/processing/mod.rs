//! Reading processing

pub mod aggregator;

pub use aggregator::ReadingAggregator;
