pub mod config;
pub mod error;
pub mod linker;
pub mod report;
pub mod size_tool;

pub use config::{Config, RegionSpec};
pub use error::{Error, Result};
pub use report::{RegionUsage, Report};
