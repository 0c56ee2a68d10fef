//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.

use std::env;
use std::str::FromStr;
use std::sync::{OnceLock, RwLock, RwLockReadGuard};

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub database_path: String,
    pub storage_root: String,
    pub host: String,
    pub port: u16,
    /// Program used to launch rubric scripts (`<interpreter> <script> <args...>`).
    pub script_interpreter: String,
    pub script_timeout_secs: u64,
    pub max_output_bytes: usize,
    pub max_uncompressed_size: u64,
    /// Per-script ceilings; zero disables the ceiling.
    pub max_memory: u64,
    pub max_processes: u64,
    pub max_cpu_secs: u64,
    pub batch_workers: usize,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring unparseable value {raw:?} for {key}");
            default
        }),
        Err(_) => default,
    }
}

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// Missing or malformed values fall back to defaults. The database path and
    /// storage root default to paths relative to the working directory.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            env: var_or("APP_ENV", "development"),
            project_name: var_or("PROJECT_NAME", "gradebook"),
            log_level: var_or("LOG_LEVEL", "api=info"),
            log_file: var_or("LOG_FILE", "api.log"),
            log_to_stdout: var_or("LOG_TO_STDOUT", "false") == "true",
            database_path: var_or("DATABASE_PATH", "data/gradebook.db"),
            storage_root: var_or("STORAGE_ROOT", "data/storage"),
            host: var_or("HOST", "127.0.0.1"),
            port: parse_or("PORT", 3000),
            script_interpreter: var_or("SCRIPT_INTERPRETER", "python3"),
            script_timeout_secs: parse_or("SCRIPT_TIMEOUT_SECS", 30),
            max_output_bytes: parse_or("MAX_OUTPUT_BYTES", 1024 * 1024),
            max_uncompressed_size: parse_or("MAX_UNCOMPRESSED_SIZE", 512 * 1024 * 1024),
            max_memory: parse_or("MAX_MEMORY", 8_589_934_592),
            max_processes: parse_or("MAX_PROCESSES", 1024),
            max_cpu_secs: parse_or("MAX_CPU_SECS", 30),
            batch_workers: parse_or("BATCH_WORKERS", num_cpus::get()).max(1),
        }
    }

    fn lock() -> &'static RwLock<AppConfig> {
        CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()))
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// A poisoned lock is recovered: the config only holds plain values.
    pub fn global() -> RwLockReadGuard<'static, AppConfig> {
        Self::lock()
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        Self::set_field(|cfg| *cfg = AppConfig::from_env());
    }

    /// Generic internal setter for any field in the config.
    ///
    /// Used by public per-field setter methods.
    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut guard = Self::lock()
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    pub fn set_log_level(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.log_level = value.into());
    }

    pub fn set_database_path(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.database_path = value.into());
    }

    pub fn set_storage_root(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.storage_root = value.into());
    }

    pub fn set_script_interpreter(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.script_interpreter = value.into());
    }

    pub fn set_script_timeout_secs(value: u64) {
        AppConfig::set_field(|cfg| cfg.script_timeout_secs = value);
    }

    pub fn set_batch_workers(value: usize) {
        AppConfig::set_field(|cfg| cfg.batch_workers = value.max(1));
    }
}

// Accessors that copy the value out so callers never hold the read guard.

pub fn env() -> String {
    AppConfig::global().env.clone()
}

pub fn project_name() -> String {
    AppConfig::global().project_name.clone()
}

pub fn log_level() -> String {
    AppConfig::global().log_level.clone()
}

pub fn log_file() -> String {
    AppConfig::global().log_file.clone()
}

pub fn log_to_stdout() -> bool {
    AppConfig::global().log_to_stdout
}

pub fn database_path() -> String {
    AppConfig::global().database_path.clone()
}

pub fn storage_root() -> String {
    AppConfig::global().storage_root.clone()
}

pub fn host() -> String {
    AppConfig::global().host.clone()
}

pub fn port() -> u16 {
    AppConfig::global().port
}

pub fn batch_workers() -> usize {
    AppConfig::global().batch_workers
}
