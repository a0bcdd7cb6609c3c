use std::env;
use std::fmt::Display;
use std::str::FromStr;

use chrono::Duration;
use tracing::{info, warn};

/// Argon2id cost parameters for password and security-answer hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub lanes: u32,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            lanes: argon2::Params::DEFAULT_P_COST,
        }
    }
}

impl HashParams {
    /// Minimum cost argon2 accepts. Only for tests.
    pub fn cheapest() -> Self {
        Self {
            memory_kib: argon2::Params::MIN_M_COST,
            iterations: argon2::Params::MIN_T_COST,
            lanes: argon2::Params::MIN_P_COST,
        }
    }
}

/// Policy knobs of the core services.
#[derive(Debug, Clone)]
pub struct Config {
    pub min_password_length: usize,
    pub reset_token_ttl: Duration,
    pub max_image_bytes: usize,
    pub notification_limit: u32,
    pub message_history_limit: u32,
    pub blog_page_size: u32,
    pub hash: HashParams,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_password_length: 8,
            reset_token_ttl: Duration::minutes(30),
            max_image_bytes: 5 * 1024 * 1024,
            notification_limit: 20,
            message_history_limit: 50,
            blog_page_size: 100,
            hash: HashParams::default(),
        }
    }
}

impl Config {
    /// Read overrides from `QUILL_*` environment variables, keeping the
    /// default for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            min_password_length: load("QUILL_MIN_PASSWORD_LENGTH", defaults.min_password_length),
            reset_token_ttl: Duration::minutes(load(
                "QUILL_RESET_TOKEN_TTL_MINUTES",
                defaults.reset_token_ttl.num_minutes(),
            )),
            max_image_bytes: load("QUILL_MAX_IMAGE_BYTES", defaults.max_image_bytes),
            notification_limit: load("QUILL_NOTIFICATION_LIMIT", defaults.notification_limit),
            message_history_limit: load(
                "QUILL_MESSAGE_HISTORY_LIMIT",
                defaults.message_history_limit,
            ),
            blog_page_size: load("QUILL_BLOG_PAGE_SIZE", defaults.blog_page_size),
            hash: HashParams {
                memory_kib: load("QUILL_ARGON2_MEMORY_KIB", defaults.hash.memory_kib),
                iterations: load("QUILL_ARGON2_ITERATIONS", defaults.hash.iterations),
                lanes: load("QUILL_ARGON2_LANES", defaults.hash.lanes),
            },
        }
    }
}

fn load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value '{raw}': {e}, using default {default}");
            default
        }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}
