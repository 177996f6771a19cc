//! # Error Types
//!
//! Two families of failure exist in the engine:
//!
//! - [`AgentError`]: a transducer was driven outside its contract
//!   (unknown position, unaccepted input, undeclared transition).
//! - [`OperadError`]: an algebra was asked for an operation it does not
//!   have, or with the wrong number of operands.
//!
//! Both are raised synchronously and never partially applied. Payloads carry
//! the data a caller needs to react (names, positions, counts) rather than
//! prose alone. Law verification is the one non-fatal outcome and is
//! reported as [`crate::law::LawVerification`], never as an error.

use thiserror::Error;

/// Errors raised while invoking a transducer.
///
/// Positions and inputs are rendered with their `Debug` form so the error
/// stays independent of the agent's type parameters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// `invoke` was called with a state outside the position set.
    #[error("Invalid state for '{agent}': {state} is not one of {positions:?}")]
    InvalidState {
        agent: String,
        state: String,
        positions: Vec<String>,
    },

    /// The input is not accepted by the direction at the current position.
    #[error("Invalid input for '{agent}' at {state}: {input} not in {accepted:?}")]
    InvalidInput {
        agent: String,
        state: String,
        input: String,
        accepted: Vec<String>,
    },

    /// The transition produced a position that was never declared.
    #[error("Undeclared transition in '{agent}': {from} -> {to}")]
    UndeclaredTransition {
        agent: String,
        from: String,
        to: String,
    },

    /// A transducer must occupy at least one position.
    #[error("Agent '{agent}' declares no positions")]
    NoPositions { agent: String },

    /// A combinator received a value of the wrong dynamic kind.
    #[error("Type mismatch in '{agent}': expected {expected}, got {got}")]
    TypeMismatch {
        agent: String,
        expected: String,
        got: String,
    },
}

impl AgentError {
    /// The name of the agent that raised this error.
    pub fn agent(&self) -> &str {
        match self {
            AgentError::InvalidState { agent, .. }
            | AgentError::InvalidInput { agent, .. }
            | AgentError::UndeclaredTransition { agent, .. }
            | AgentError::NoPositions { agent }
            | AgentError::TypeMismatch { agent, .. } => agent,
        }
    }
}

/// Errors raised by operads and their operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OperadError {
    /// An operation received the wrong number of agents.
    #[error("Arity mismatch for '{operation}': expected {expected} agents, got {got}")]
    ArityMismatch {
        operation: String,
        expected: usize,
        got: usize,
    },

    /// The operad has no operation with the requested name.
    #[error("Unknown operation '{operation}' in operad '{operad}' (available: {available:?})")]
    UnknownOperation {
        operad: String,
        operation: String,
        available: Vec<String>,
    },

    /// An operation's compose callback refused its operands.
    #[error("Operation '{operation}' rejected its operands: {reason}")]
    Rejected { operation: String, reason: String },

    /// Building the composite failed inside the transducer core.
    #[error(transparent)]
    Agent(#[from] AgentError),
}
