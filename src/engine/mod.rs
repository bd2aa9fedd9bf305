pub mod range;
pub mod sampling;
pub mod scoring;

pub use range::{Key, Pool, RangeSpec};
pub use sampling::{RefPool, SamplingPolicy};
