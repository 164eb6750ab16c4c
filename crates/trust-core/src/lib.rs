pub mod dataset;
pub mod error;
pub mod estimator;
pub mod metrics;
pub mod neighbors;
pub mod pipeline;
pub mod stats;

pub use dataset::*;
pub use error::*;
pub use estimator::*;
