//! Client configuration loaded from the environment.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use runtime::LocalAuthorityOptions;

/// Configuration required to bootstrap the runtime and the local authority.
#[derive(Clone, Debug, Default)]
pub struct ClientConfig {
    pub session_id: Option<String>,
    /// JSON level file. The built-in level is used when unset.
    pub level_path: Option<PathBuf>,
    /// Overrides the level's respawn seed.
    pub seed: Option<u64>,
    pub authority: LocalAuthorityOptions,
}

impl ClientConfig {
    /// Construct configuration from process environment variables.
    ///
    /// - `ARENA_SESSION_ID`
    /// - `LEVEL_PATH` / `ARENA_SEED`
    /// - `AUTHORITY_LATENCY_MS` / `AUTHORITY_JITTER_MS`
    /// - `AUTHORITY_REJECT_EVERY`
    pub fn from_env() -> Self {
        let mut config = Self {
            session_id: env::var("ARENA_SESSION_ID").ok(),
            level_path: env::var_os("LEVEL_PATH").map(PathBuf::from),
            seed: read_env::<u64>("ARENA_SEED"),
            ..Self::default()
        };

        if let Some(millis) = read_env::<u64>("AUTHORITY_LATENCY_MS") {
            config.authority.latency = Duration::from_millis(millis);
        }
        if let Some(millis) = read_env::<u64>("AUTHORITY_JITTER_MS") {
            config.authority.jitter = Duration::from_millis(millis);
        }
        config.authority.reject_every = read_env::<u64>("AUTHORITY_REJECT_EVERY").filter(|&n| n > 0);

        config
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
