//! Public types for the Huginn API.

mod build;
mod file_stat;
mod path;

pub use build::{BuildDetails, FailureRecord, FinishedInfo, StartedInfo};
pub use file_stat::FileStat;
pub use path::{BucketAllowList, BuildPath, DEFAULT_BUCKET};
