pub mod config;
pub mod execution_limits;
pub mod paths;
