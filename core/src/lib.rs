pub mod cli;
pub mod config;
pub mod interpreter;
pub mod runner;
pub mod scope;

// Re-export main types
pub use config::{Config, ConfigError};
pub use runner::{evaluate, ExecutionResult, RunnerError, ScriptRunner};
pub use scope::{load_scope, ScopeBindings};
