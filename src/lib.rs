//! scrapyd-runner - egg resolution and activation for Scrapy project runs
//!
//! Resolves a project's packaged egg from an egg store, materializes it on
//! the local filesystem when the store only hands back a byte stream,
//! activates it for the downstream crawl process, and guarantees cleanup of
//! anything spooled along the way, on every exit path.

pub mod config;
pub mod egg;
pub mod env;
pub mod mock;
pub mod runner;
pub mod storage;
pub mod utils;

pub use config::{Config, ConfigError};
pub use egg::{Distribution, EntryPoint};
pub use runner::{
    activate_egg, run, with_project_environment, BadEggError, ProjectEnvironment, RunnerError,
};
pub use storage::{Egg, EggStorage, StorageError};
