pub mod config;
pub mod error;
pub mod html;
pub mod index;
pub mod packager;
pub mod paths;
pub mod pipeline;
pub mod registry;
pub mod verify;
pub mod version;

pub use config::EnvSnapshot;
pub use error::{PackageError, Result};
pub use packager::{Artifact, Packager, Release};
pub use pipeline::{RunOptions, RunSummary, run};
pub use registry::Target;
