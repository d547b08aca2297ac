// Central error aggregation module. This file defines the gear-wide
// `GearError` and re-exports the archiver's error under `crate::errors::*`.
pub mod archive;
pub mod gear;

pub use archive::ArchiveError;

pub use gear::GearError;
pub type Result<T> = std::result::Result<T, GearError>;
