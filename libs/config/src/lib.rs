//! # Niche Configuration
//!
//! Configuration loading and default values for the niche option cache,
//! the invalidation bus and the operator tooling.
//!
//! ## Sources, lowest precedence first
//!
//! 1. Built-in defaults ([`defaults`])
//! 2. Base TOML file (optional)
//! 3. Environment overlay `<dir>/environments/<env>.toml` (optional)
//! 4. `NICHE_`-prefixed environment variables, `__` between sections
//!
//! ```rust,no_run
//! use niche_config::load_settings;
//!
//! let settings = load_settings(None)?;
//! let timeout = settings.cache.fetch_timeout();
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod defaults;
pub mod settings;

pub use settings::{
    load_settings, BusSettings, CacheSettings, LoggingSettings, NicheSettings, StoreSettings,
};
