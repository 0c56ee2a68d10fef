use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

/// Bounds applied to every rubric script invocation and archive extraction.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ExecutionLimits {
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Bytes captured per stream; anything past this is drained and dropped.
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,

    #[serde(default = "default_max_uncompressed_size")]
    pub max_uncompressed_size: u64,

    /// Address-space ceiling in bytes for each script. Zero means unlimited,
    /// as for the two limits below.
    #[serde(default = "default_max_memory")]
    pub max_memory: u64,

    #[serde(default = "default_max_processes")]
    pub max_processes: u64,

    #[serde(default = "default_max_cpu_secs")]
    pub max_cpu_secs: u64,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            timeout_secs: default_timeout_secs(),
            max_output_bytes: default_max_output_bytes(),
            max_uncompressed_size: default_max_uncompressed_size(),
            max_memory: default_max_memory(),
            max_processes: default_max_processes(),
            max_cpu_secs: default_max_cpu_secs(),
        }
    }
}

impl ExecutionLimits {
    /// Snapshot of the limits currently held by the global [`AppConfig`].
    pub fn from_config() -> Self {
        let cfg = AppConfig::global();
        Self {
            interpreter: cfg.script_interpreter.clone(),
            timeout_secs: cfg.script_timeout_secs,
            max_output_bytes: cfg.max_output_bytes,
            max_uncompressed_size: cfg.max_uncompressed_size,
            max_memory: cfg.max_memory,
            max_processes: cfg.max_processes,
            max_cpu_secs: cfg.max_cpu_secs,
        }
    }

    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_max_output_bytes(mut self, max_output_bytes: usize) -> Self {
        self.max_output_bytes = max_output_bytes;
        self
    }

    pub fn with_max_memory(mut self, max_memory: u64) -> Self {
        self.max_memory = max_memory;
        self
    }

    pub fn with_max_processes(mut self, max_processes: u64) -> Self {
        self.max_processes = max_processes;
        self
    }

    pub fn with_max_cpu_secs(mut self, max_cpu_secs: u64) -> Self {
        self.max_cpu_secs = max_cpu_secs;
        self
    }
}

fn default_interpreter() -> String {
    "python3".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_output_bytes() -> usize {
    1024 * 1024
}

fn default_max_uncompressed_size() -> u64 {
    512 * 1024 * 1024
}

fn default_max_memory() -> u64 {
    8_589_934_592
}

fn default_max_processes() -> u64 {
    1024
}

fn default_max_cpu_secs() -> u64 {
    30
}
