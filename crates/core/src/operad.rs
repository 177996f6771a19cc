//! # Operads: Arity-Checked Agent Algebras
//!
//! An operad is a named table of composition operations plus the laws
//! those operations are expected to satisfy. Each [`Operation`] declares
//! how many agents it takes; the count is validated *before* the compose
//! callback runs, so a wrong call never produces a half-built composite.
//!
//! ```text
//! universal
//!   ├── seq(2)    : Agent[A, B] × Agent[B, C] → Agent[A, C]
//!   ├── par(2)    : Agent[A, B] × Agent[A, C] → Agent[A, (B, C)]
//!   ├── branch(3) : Agent[A, Bool] × Agent[A, B] × Agent[A, B] → Agent[A, B]
//!   └── fan(*)    : Agent[A, B]* → Agent[A, (B, …)]
//! ```
//!
//! Domain operads start from a base with [`Operad::extend`] and add their
//! own operations and laws; composition and law checking are inherited,
//! never re-implemented.
//!
//! ## Example
//!
//! ```rust
//! use polyagent_core::agent::from_function;
//! use polyagent_core::error::OperadError;
//! use polyagent_core::universal::universal_operad;
//! use polyagent_core::value::Value;
//!
//! let operad = universal_operad();
//! let double = from_function("Double", |x: i64| x * 2).into_dyn();
//! let add_one = from_function("AddOne", |x: i64| x + 1).into_dyn();
//!
//! let pipeline = operad.compose("seq", &[double.clone(), add_one]).unwrap();
//! let (_, out) = pipeline.invoke(pipeline.initial(), Value::Int(5)).unwrap();
//! assert_eq!(out, Value::Int(11));
//!
//! let err = operad.compose("seq", &[double]).unwrap_err();
//! assert!(matches!(err, OperadError::ArityMismatch { expected: 2, got: 1, .. }));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::agent::DynAgent;
use crate::error::OperadError;
use crate::law::{Law, LawConfig, LawVerification};

// ============================================================================
// Arity
// ============================================================================

/// How many agents an operation takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arity {
    Fixed(usize),
    Variadic,
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Arity::Fixed(n) => *n == count,
            Arity::Variadic => true,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Fixed(n) => write!(f, "{}", n),
            Arity::Variadic => write!(f, "*"),
        }
    }
}

// ============================================================================
// Operation
// ============================================================================

/// Callback that builds a composite from its operands.
pub type ComposeFn = Arc<dyn Fn(&[DynAgent]) -> Result<DynAgent, OperadError> + Send + Sync>;

/// A named composition with a declared arity.
///
/// # Example
///
/// ```rust
/// use polyagent_core::compose::fan;
/// use polyagent_core::operad::{Arity, Operation};
///
/// let broadcast = Operation::new("fan", Arity::Variadic, |agents| Ok(fan(agents)))
///     .with_signature("Agent[A, B]* → Agent[A, (B, …)]");
///
/// assert!(broadcast.call(&[]).is_ok());
/// assert_eq!(format!("{}", broadcast), "fan(*) : Agent[A, B]* → Agent[A, (B, …)]");
/// ```
#[derive(Clone)]
pub struct Operation {
    /// Lookup key within an operad.
    pub name: String,
    /// Number of agents expected.
    pub arity: Arity,
    /// Human-readable type signature.
    pub signature: String,
    compose: ComposeFn,
}

impl Operation {
    pub fn new<F>(name: impl Into<String>, arity: Arity, compose: F) -> Self
    where
        F: Fn(&[DynAgent]) -> Result<DynAgent, OperadError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            arity,
            signature: String::new(),
            compose: Arc::new(compose),
        }
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = signature.into();
        self
    }

    /// Compose `agents`, checking the count first.
    ///
    /// Fails with `ArityMismatch` before the callback runs when a fixed
    /// arity is not met. Variadic operations accept any count.
    pub fn call(&self, agents: &[DynAgent]) -> Result<DynAgent, OperadError> {
        if let Arity::Fixed(expected) = self.arity {
            if agents.len() != expected {
                return Err(OperadError::ArityMismatch {
                    operation: self.name.clone(),
                    expected,
                    got: agents.len(),
                });
            }
        }
        (self.compose)(agents)
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.arity)?;
        if !self.signature.is_empty() {
            write!(f, " : {}", self.signature)?;
        }
        Ok(())
    }
}

// ============================================================================
// Operad
// ============================================================================

/// A named algebra of operations and laws.
#[derive(Debug, Clone)]
pub struct Operad {
    name: String,
    operations: BTreeMap<String, Operation>,
    laws: Vec<Law>,
    config: LawConfig,
}

impl Operad {
    /// Create an operad. Later entries win when names repeat.
    pub fn new(
        name: impl Into<String>,
        operations: impl IntoIterator<Item = Operation>,
        laws: impl IntoIterator<Item = Law>,
    ) -> Self {
        let mut operad = Self {
            name: name.into(),
            operations: BTreeMap::new(),
            laws: Vec::new(),
            config: LawConfig::default(),
        };
        for op in operations {
            operad = operad.with_operation(op);
        }
        for law in laws {
            operad = operad.with_law(law);
        }
        operad
    }

    /// Start a new operad from a copy of `parent`'s operations, laws and
    /// law configuration.
    pub fn extend(parent: &Operad, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operations: parent.operations.clone(),
            laws: parent.laws.clone(),
            config: parent.config.clone(),
        }
    }

    /// Add an operation, replacing any with the same name.
    pub fn with_operation(mut self, op: Operation) -> Self {
        self.operations.insert(op.name.clone(), op);
        self
    }

    /// Add a law, replacing any with the same name in place.
    pub fn with_law(mut self, law: Law) -> Self {
        match self.laws.iter_mut().find(|l| l.name == law.name) {
            Some(existing) => *existing = law,
            None => self.laws.push(law),
        }
        self
    }

    pub fn with_law_config(mut self, config: LawConfig) -> Self {
        self.config = config;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operations(&self) -> &BTreeMap<String, Operation> {
        &self.operations
    }

    pub fn operation(&self, name: &str) -> Option<&Operation> {
        self.operations.get(name)
    }

    /// Operation names in sorted order.
    pub fn operation_names(&self) -> Vec<&str> {
        self.operations.keys().map(String::as_str).collect()
    }

    /// Laws in declaration order.
    pub fn laws(&self) -> &[Law] {
        &self.laws
    }

    pub fn law(&self, name: &str) -> Option<&Law> {
        self.laws.iter().find(|l| l.name == name)
    }

    pub fn law_config(&self) -> &LawConfig {
        &self.config
    }

    /// Apply the operation called `op_name` (exact match) to `agents`.
    pub fn compose(&self, op_name: &str, agents: &[DynAgent]) -> Result<DynAgent, OperadError> {
        let op = self
            .operations
            .get(op_name)
            .ok_or_else(|| OperadError::UnknownOperation {
                operad: self.name.clone(),
                operation: op_name.to_string(),
                available: self.operations.keys().cloned().collect(),
            })?;
        let agent = op.call(agents)?;
        trace!(operad = %self.name, operation = op_name, result = agent.name(), "composed");
        Ok(agent)
    }

    /// Check one law. A missing law is reported as skipped, not as an error.
    pub fn verify_law(&self, law_name: &str, agents: &[DynAgent]) -> LawVerification {
        match self.law(law_name) {
            Some(law) => law.verify(self, agents),
            None => {
                debug!(operad = %self.name, law = law_name, "law not declared");
                LawVerification::missing(law_name)
            }
        }
    }

    /// Check every declared law against the same agents.
    ///
    /// Laws that expect a different number of agents come back skipped.
    pub fn verify_all_laws(&self, agents: &[DynAgent]) -> Vec<LawVerification> {
        self.laws.iter().map(|law| law.verify(self, agents)).collect()
    }

    /// Breadth-first enumeration of compositions up to `depth` rounds.
    ///
    /// Each round applies every fixed-arity operation to every ordered
    /// selection (with repetition) from the agents known so far. Variadic
    /// operations are skipped since they have no finite selection size.
    /// The result always starts with `primitives`; `depth == 0` returns
    /// them unchanged.
    ///
    /// Growth is `O(|pool|^arity)` per round. Without a filter, keep
    /// `depth` very small; see [`Operad::enumerate_filtered`].
    pub fn enumerate(&self, primitives: &[DynAgent], depth: usize) -> Vec<DynAgent> {
        self.enumerate_inner(primitives, depth, None)
    }

    /// Like [`Operad::enumerate`], pruning each round's new agents with
    /// `keep` before they seed the next round.
    pub fn enumerate_filtered<F>(
        &self,
        primitives: &[DynAgent],
        depth: usize,
        keep: F,
    ) -> Vec<DynAgent>
    where
        F: Fn(&DynAgent) -> bool,
    {
        self.enumerate_inner(primitives, depth, Some(&keep))
    }

    fn enumerate_inner(
        &self,
        primitives: &[DynAgent],
        depth: usize,
        keep: Option<&dyn Fn(&DynAgent) -> bool>,
    ) -> Vec<DynAgent> {
        let mut pool: Vec<DynAgent> = primitives.to_vec();

        for round in 0..depth {
            let mut frontier = Vec::new();
            for op in self.operations.values() {
                let Arity::Fixed(arity) = op.arity else {
                    continue;
                };
                for selection in Selections::new(pool.len(), arity) {
                    let operands: Vec<DynAgent> =
                        selection.iter().map(|&i| pool[i].clone()).collect();
                    match op.call(&operands) {
                        Ok(agent) => frontier.push(agent),
                        Err(err) => {
                            trace!(operation = %op.name, error = %err, "skipping composition")
                        }
                    }
                }
            }

            let generated = frontier.len();
            if let Some(keep) = keep {
                frontier.retain(|agent| keep(agent));
            }
            debug!(
                operad = %self.name,
                round,
                generated,
                kept = frontier.len(),
                pool = pool.len(),
                "enumeration round"
            );
            pool.extend(frontier);
        }

        pool
    }
}

impl fmt::Display for Operad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Operad {} {{", self.name)?;
        for op in self.operations.values() {
            writeln!(f, "  {}", op)?;
        }
        for law in &self.laws {
            writeln!(f, "  law {}", law)?;
        }
        write!(f, "}}")
    }
}

// ============================================================================
// Selections
// ============================================================================

/// All index vectors of length `k` over `0..n`, in odometer order.
struct Selections {
    n: usize,
    current: Option<Vec<usize>>,
}

impl Selections {
    fn new(n: usize, k: usize) -> Self {
        let current = if k > 0 && n == 0 {
            None
        } else {
            Some(vec![0; k])
        };
        Self { n, current }
    }
}

impl Iterator for Selections {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let out = self.current.clone()?;

        let mut next = out.clone();
        let mut carried = true;
        for digit in next.iter_mut().rev() {
            *digit += 1;
            if *digit < self.n {
                carried = false;
                break;
            }
            *digit = 0;
        }
        self.current = if carried { None } else { Some(next) };

        Some(out)
    }
}

// ============================================================================
// Tests
// ============================================================================
