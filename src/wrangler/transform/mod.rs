//! Table-to-table stages applied after loading.

pub mod merge;
pub mod normalize;
pub mod reshape;

pub use merge::{inner_join, merge_sources};
pub use normalize::normalize;
pub use reshape::reshape;
