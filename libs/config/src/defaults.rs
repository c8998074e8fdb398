//! Default configuration values

/// Canonical cache defaults
pub mod cache {
    /// Record Store fetch deadline (milliseconds)
    pub const FETCH_TIMEOUT_MS: u64 = 10_000;
}

/// Invalidation bus defaults
pub mod bus {
    /// Change-feed topic carrying niche configuration changes
    pub const TOPIC: &str = "niche_config";

    /// Buffer of the in-memory broadcast feed
    pub const BROADCAST_CAPACITY: usize = 256;
}

/// Logging defaults
pub mod logging {
    pub const LEVEL: &str = "info";
}

/// Fixture-backed store defaults
pub mod store {
    pub const FIXTURE_PATH: &str = "./data/niche_fixture.json";
}

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "NICHE";

/// Default base configuration file
pub const CONFIG_PATH: &str = "config/niche.toml";
