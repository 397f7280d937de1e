// Error types and error handling module
// This file defines the engine and service error taxonomies
// for the speedguard project
//
// Numan Thabit 2025 Nov

use thiserror::Error;

/// Errors raised by the pure scoring engine. Always terminal for the single
/// computation that produced them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid vehicle class: {0:?}")]
    InvalidVehicleClass(String),
}

/// Errors raised by the registry and the API layer on top of the engine.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("{0} not found")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("violation cannot move from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

impl ServiceError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(what: impl Into<String>) -> Self {
        Self::Conflict(what.into())
    }
}
