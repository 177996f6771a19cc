//! # Polyagent Core - Polynomial Agents and Operads
//!
//! This crate provides a small algebra for building state-machine agents
//! out of smaller ones:
//!
//! - **Agents**: state-dependent transducers with mode-dependent input sets
//! - **Composition**: sequential, parallel, fan-out and branching combinators
//! - **Operads**: named, arity-checked tables of composition operations
//! - **Laws**: property-based checks that compositions behave as declared
//! - **Registry**: a lookup table of operads shared between modules
//!
//! ## Design Philosophy
//!
//! Agents are values. Composing two agents never touches either operand;
//! it builds a third agent whose positions are the product of theirs.
//! Running an agent threads the state through return values, so the same
//! agent can drive any number of independent runs.
//!
//! ```rust
//! use polyagent_core::{from_function, universal_operad, Value};
//!
//! let operad = universal_operad();
//! let double = from_function("Double", |x: i64| x * 2).into_dyn();
//! let square = from_function("Square", |x: i64| x * x).into_dyn();
//!
//! let both = operad.compose("par", &[double, square]).unwrap();
//! let (_, out) = both.invoke(both.initial(), Value::Int(5)).unwrap();
//! assert_eq!(out, Value::pair(Value::Int(10), Value::Int(25)));
//! ```

pub mod agent;
pub mod compose;
pub mod error;
pub mod law;
pub mod operad;
pub mod registry;
pub mod universal;
pub mod value;

// Re-export key types at crate root for convenience
pub use agent::{constant, from_function, identity, stateful, Direction, DynAgent, PolyAgent};
pub use compose::{branch, fan, parallel, sequential, WiringDiagram};
pub use error::{AgentError, OperadError};
pub use law::{InputDomain, Law, LawConfig, LawStatus, LawVerification, Precondition};
pub use operad::{Arity, Operad, Operation};
pub use registry::OperadRegistry;
pub use universal::{universal_operad, UNIVERSAL};
pub use value::{Datum, Value};
