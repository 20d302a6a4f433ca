// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # postgrab Store
//!
//! Configuration and persistence for postgrab.
//!
//! This crate provides:
//!
//! - **Config**: The JSON config file, converted into fetch settings and a target
//! - **Persistence**: File I/O helpers for JSON data
//!
//! ## Usage
//!
//! ```ignore
//! use postgrab_store::Config;
//!
//! let config = Config::load().await?;
//! let settings = config.to_fetch_settings();
//! let target = config.to_target();
//! ```

pub mod config;
pub mod error;
pub mod persistence;

pub use config::{Config, DEFAULT_CREDENTIAL_ENV, GeneralConfig, RetrievalConfig, TargetSection};
pub use error::StoreError;
pub use persistence::{
    default_config_dir, default_config_path, load_json, load_json_or_default, save_json,
};
