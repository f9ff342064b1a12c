//! Runtime configuration, read from the environment at start-up.

use chess::Piece;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::game::opponent::DEFAULT_OPPONENT_DELAY;
use crate::game::utils::parse_promotion;

pub const BIND_ADDR_VAR: &str = "CHESS_BIND_ADDR";
pub const DATA_DIR_VAR: &str = "CHESS_DATA_DIR";
pub const STATIC_DIR_VAR: &str = "CHESS_STATIC_DIR";
pub const OPPONENT_DELAY_VAR: &str = "CHESS_OPPONENT_DELAY_MS";
pub const PROMOTION_VAR: &str = "CHESS_DEFAULT_PROMOTION";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be a number of milliseconds, got {1:?}")]
    InvalidDelay(&'static str, String),

    #[error("{0} must be one of q, r, b, n, got {1:?}")]
    InvalidPromotion(&'static str, String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind_addr: String,
    pub data_dir: PathBuf,
    pub static_dir: PathBuf,
    pub opponent_delay: Duration,
    pub default_promotion: Piece,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            data_dir: PathBuf::from("./data"),
            static_dir: PathBuf::from("./static"),
            opponent_delay: DEFAULT_OPPONENT_DELAY,
            default_promotion: Piece::Queen,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any variable source; unset variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        if let Some(addr) = lookup(BIND_ADDR_VAR) {
            config.bind_addr = addr;
        }
        if let Some(dir) = lookup(DATA_DIR_VAR) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(STATIC_DIR_VAR) {
            config.static_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup(OPPONENT_DELAY_VAR) {
            let millis = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidDelay(OPPONENT_DELAY_VAR, raw.clone()))?;
            config.opponent_delay = Duration::from_millis(millis);
        }
        if let Some(raw) = lookup(PROMOTION_VAR) {
            config.default_promotion =
                parse_promotion(&raw).ok_or_else(|| ConfigError::InvalidPromotion(PROMOTION_VAR, raw.clone()))?;
        }
        Ok(config)
    }
}
