//! Configuration loading and management for the rota allocation engine.
//!
//! This module loads solver settings and bid weights from YAML files.
//!
//! # Example
//!
//! ```no_run
//! use rota_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/standard").unwrap();
//! println!("Backend: {:?}", config.solver().backend);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    BidWeights, DEFAULT_TIME_LIMIT_MS, EngineConfig, MAX_BID_WEIGHT, SolverBackend, SolverConfig,
    SolverFile, WeightsFile,
};
