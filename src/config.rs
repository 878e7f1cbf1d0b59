use std::env;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use anyhow::{anyhow, Context};

pub const SCOPE_VAR: &str = "ZERO_SCOPE";
pub const MAX_CALL_DEPTH_VAR: &str = "ZERO_MAX_CALL_DEPTH";

/// How function parameters and `let` bindings are scoped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScopeMode {
    /// One global variable map shared by every call. Parameters overwrite
    /// globals of the same name, so recursion clobbers the caller.
    #[default]
    Flat,
    /// Each call gets its own frame for parameters and new bindings; globals
    /// stay visible and writable.
    Frames,
}

impl FromStr for ScopeMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flat" => Ok(ScopeMode::Flat),
            "frames" => Ok(ScopeMode::Frames),
            other => Err(anyhow!("unknown scope mode '{other}', expected 'flat' or 'frames'")),
        }
    }
}

impl Display for ScopeMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ScopeMode::Flat => write!(f, "flat"),
            ScopeMode::Frames => write!(f, "frames"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub scope: ScopeMode,
    pub max_call_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            scope: ScopeMode::Flat,
            max_call_depth: 10_000,
        }
    }
}

impl Config {
    /// Defaults overridden by `ZERO_SCOPE` and `ZERO_MAX_CALL_DEPTH`.
    pub fn from_env() -> anyhow::Result<Config> {
        Config::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Config> {
        let mut config = Config::default();
        if let Some(scope) = lookup(SCOPE_VAR) {
            config.scope = scope.parse().with_context(|| format!("invalid {SCOPE_VAR}"))?;
        }
        if let Some(depth) = lookup(MAX_CALL_DEPTH_VAR) {
            config.max_call_depth = depth
                .parse()
                .with_context(|| format!("invalid {MAX_CALL_DEPTH_VAR} '{depth}'"))?;
        }
        Ok(config)
    }
}
