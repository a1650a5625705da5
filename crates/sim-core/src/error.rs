//! Error types shared by every simulator crate.
//!
//! Each variant maps to a stable process exit code so the binary can report
//! the failure class without inspecting messages.

use thiserror::Error;

/// Result alias used across the simulator crates.
pub type Result<T, E = SimError> = std::result::Result<T, E>;

/// Errors that can occur while loading, preparing or running a simulation.
#[derive(Error, Debug)]
pub enum SimError {
    /// Reading or parsing the configuration file failed.
    #[error("{0}")]
    ConfigLoad(String),

    /// The configuration parsed but violates the schema.
    #[error("{message}")]
    ConfigValidation {
        message: String,
        errors: Vec<String>,
    },

    /// A payload builder or value generator could not be built or could not
    /// produce a value.
    #[error("{0}")]
    PayloadBuild(String),

    /// Connecting to a broker failed or timed out.
    #[error("{0}")]
    BrokerConnection(String),

    /// A single publish attempt failed.
    #[error("{0}")]
    BrokerPublish(String),

    /// The runtime could not continue for a reason outside the other kinds.
    #[error("{0}")]
    RuntimeExecution(String),
}

impl SimError {
    /// Build a validation error from the collected violation messages.
    ///
    /// The display message carries the first violation so single-line output
    /// stays useful.
    pub fn validation(errors: Vec<String>) -> Self {
        let message = match errors.first() {
            Some(first) => format!("Config validation failed. {first}"),
            None => "Config validation failed.".to_string(),
        };
        SimError::ConfigValidation { message, errors }
    }

    /// Shorthand for a payload build error.
    pub fn payload(message: impl Into<String>) -> Self {
        SimError::PayloadBuild(message.into())
    }

    /// Stable exit code for this error kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            SimError::ConfigValidation { .. } => 2,
            SimError::ConfigLoad(_) => 3,
            SimError::PayloadBuild(_) => 4,
            SimError::BrokerConnection(_) | SimError::BrokerPublish(_) => 5,
            SimError::RuntimeExecution(_) => 6,
        }
    }

    /// Short kind label used in structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            SimError::ConfigLoad(_) => "config_load",
            SimError::ConfigValidation { .. } => "config_validation",
            SimError::PayloadBuild(_) => "payload_build",
            SimError::BrokerConnection(_) => "broker_connection",
            SimError::BrokerPublish(_) => "broker_publish",
            SimError::RuntimeExecution(_) => "runtime_execution",
        }
    }
}
