// Derived pipeline views: columns, totals and staleness
// Nothing here owns data; every view is rebuilt from the records passed in

pub mod bucket;
pub mod metrics;

pub use bucket::*;
pub use metrics::*;
