//! # Laws
//!
//! A law is a declared equivalence between two composition expressions,
//! checked by *running* both sides, never by symbolic proof. Verification
//! is property-based: input sequences are drawn from the operad's
//! [`LawConfig`] with `proptest`, and a disagreement is shrunk to a minimal
//! counterexample before being reported.
//!
//! ```text
//!   seq(seq(f, g), h)  ──┐
//!                        ├── same outputs on every sampled input sequence?
//!   seq(f, seq(g, h))  ──┘
//! ```
//!
//! Verification never fails with an error. Every outcome, including a law
//! that is not declared, comes back as a [`LawVerification`].

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use proptest::prelude::*;
use proptest::test_runner::{
    Config as ProptestConfig, RngAlgorithm, TestCaseError, TestError, TestRng, TestRunner,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::agent::DynAgent;
use crate::error::OperadError;
use crate::operad::Operad;
use crate::value::Value;

// ============================================================================
// Configuration
// ============================================================================

/// The values law checks draw inputs from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputDomain {
    /// `Value::Int` in `min..=max`.
    Integers { min: i64, max: i64 },
    /// `Value::Bool`.
    Booleans,
    /// Lowercase ASCII `Value::Text` up to `max_len` characters.
    Text { max_len: usize },
    /// One of a fixed list. An empty list samples `Value::Unit`.
    Choice(Vec<Value>),
}

impl InputDomain {
    /// A strategy producing single inputs from this domain.
    pub fn strategy(&self) -> BoxedStrategy<Value> {
        match self {
            InputDomain::Integers { min, max } => {
                let (lo, hi) = if min <= max { (*min, *max) } else { (*max, *min) };
                (lo..=hi).prop_map(Value::Int).boxed()
            }
            InputDomain::Booleans => any::<bool>().prop_map(Value::Bool).boxed(),
            InputDomain::Text { max_len } => {
                proptest::collection::vec(proptest::char::range('a', 'z'), 0..=*max_len)
                    .prop_map(|chars| Value::Text(chars.into_iter().collect()))
                    .boxed()
            }
            InputDomain::Choice(values) if values.is_empty() => Just(Value::Unit).boxed(),
            InputDomain::Choice(values) => proptest::sample::select(values.clone()).boxed(),
        }
    }
}

/// How equational laws are sampled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LawConfig {
    /// Number of input sequences to try.
    pub cases: u32,
    /// Longest input sequence fed to each side.
    pub max_inputs: usize,
    /// Seed for the sampler; equal seeds give equal verdicts.
    pub seed: u64,
    /// Where individual inputs come from.
    pub inputs: InputDomain,
}

impl Default for LawConfig {
    fn default() -> Self {
        Self {
            cases: 64,
            max_inputs: 8,
            seed: 0x5eed,
            inputs: InputDomain::Integers {
                min: -100,
                max: 100,
            },
        }
    }
}

impl LawConfig {
    pub fn with_cases(mut self, cases: u32) -> Self {
        self.cases = cases;
        self
    }

    pub fn with_max_inputs(mut self, max: usize) -> Self {
        self.max_inputs = max;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_inputs(mut self, inputs: InputDomain) -> Self {
        self.inputs = inputs;
        self
    }

    /// A strategy producing whole input sequences.
    pub fn sequences(&self) -> BoxedStrategy<Vec<Value>> {
        proptest::collection::vec(self.inputs.strategy(), 0..=self.max_inputs).boxed()
    }

    /// Every knob that `PROPTEST_*` variables can reach is pinned here, so
    /// verdicts depend only on this config.
    fn runner(&self) -> TestRunner {
        let config = ProptestConfig {
            cases: self.cases,
            max_local_rejects: 65_536,
            max_global_rejects: 1024,
            max_flat_map_regens: 1_000_000,
            max_shrink_time: 0,
            max_shrink_iters: u32::MAX,
            max_default_size_range: 100,
            failure_persistence: None,
            fork: false,
            timeout: 0,
            verbose: 0,
            rng_algorithm: RngAlgorithm::ChaCha,
            ..ProptestConfig::default()
        };
        let mut seed = [0u8; 32];
        for chunk in seed.chunks_mut(8) {
            chunk.copy_from_slice(&self.seed.to_le_bytes());
        }
        TestRunner::new_with_rng(config, TestRng::from_seed(RngAlgorithm::ChaCha, &seed))
    }
}

// ============================================================================
// Verification Results
// ============================================================================

/// Outcome of checking one law.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LawStatus {
    Passed,
    Failed,
    Skipped,
}

/// Structured report of a law check.
///
/// On failure `inputs` holds the minimal counterexample; on success, the
/// longest sampled sequence both sides accepted. `left` / `right` are the
/// output sequences each side produced for it (`None` when that side
/// rejected the inputs or panicked).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LawVerification {
    pub law: String,
    pub status: LawStatus,
    pub cases: u32,
    pub inputs: Option<Vec<Value>>,
    pub left: Option<Vec<Value>>,
    pub right: Option<Vec<Value>>,
    pub message: Option<String>,
}

impl LawVerification {
    fn new(law: impl Into<String>, status: LawStatus) -> Self {
        Self {
            law: law.into(),
            status,
            cases: 0,
            inputs: None,
            left: None,
            right: None,
            message: None,
        }
    }

    /// The law held on `cases` samples.
    pub fn pass(law: impl Into<String>, cases: u32) -> Self {
        Self {
            cases,
            ..Self::new(law, LawStatus::Passed)
        }
    }

    /// The law was violated.
    pub fn fail(law: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::new(law, LawStatus::Failed)
        }
    }

    /// The law could not be checked.
    pub fn skip(law: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::new(law, LawStatus::Skipped)
        }
    }

    /// The requested law is not declared by the operad.
    pub fn missing(law: impl Into<String>) -> Self {
        let law = law.into();
        let message = format!("law '{}' is not declared", law);
        Self::skip(law, message)
    }

    /// Attach an input sequence with the outputs each side produced for it.
    pub fn with_sample(
        mut self,
        inputs: Vec<Value>,
        left: Option<Vec<Value>>,
        right: Option<Vec<Value>>,
    ) -> Self {
        self.inputs = Some(inputs);
        self.left = left;
        self.right = right;
        self
    }

    /// True only for [`LawStatus::Passed`]; skipped laws did not pass.
    pub fn passed(&self) -> bool {
        self.status == LawStatus::Passed
    }
}

impl fmt::Display for LawVerification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.status {
            LawStatus::Passed => "PASS",
            LawStatus::Failed => "FAIL",
            LawStatus::Skipped => "SKIP",
        };
        write!(f, "[{}] {}", tag, self.law)?;
        if self.status == LawStatus::Passed {
            write!(f, " ({} cases)", self.cases)?;
        }
        if let Some(message) = &self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

// ============================================================================
// Law
// ============================================================================

/// One side of an equation, built from the operad and the sample agents.
pub type ExprFn = Arc<dyn Fn(&Operad, &[DynAgent]) -> Result<DynAgent, OperadError> + Send + Sync>;

/// A hand-written verification procedure.
pub type VerifyFn = Arc<dyn Fn(&Operad, &[DynAgent]) -> LawVerification + Send + Sync>;

type NormalizeFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

#[derive(Clone)]
struct Equation {
    agents: usize,
    lhs: ExprFn,
    rhs: ExprFn,
    normalize: Option<NormalizeFn>,
}

#[derive(Clone)]
enum Check {
    Equation(Equation),
    Custom(VerifyFn),
}

/// A named equivalence declared by an operad.
#[derive(Clone)]
pub struct Law {
    pub name: String,
    pub statement: String,
    check: Check,
}

impl Law {
    /// An equation between two expressions over exactly `agents` operands.
    pub fn equation<L, R>(
        name: impl Into<String>,
        statement: impl Into<String>,
        agents: usize,
        lhs: L,
        rhs: R,
    ) -> Self
    where
        L: Fn(&Operad, &[DynAgent]) -> Result<DynAgent, OperadError> + Send + Sync + 'static,
        R: Fn(&Operad, &[DynAgent]) -> Result<DynAgent, OperadError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            statement: statement.into(),
            check: Check::Equation(Equation {
                agents,
                lhs: Arc::new(lhs),
                rhs: Arc::new(rhs),
                normalize: None,
            }),
        }
    }

    /// A law checked by an arbitrary procedure.
    pub fn custom<F>(name: impl Into<String>, statement: impl Into<String>, verify: F) -> Self
    where
        F: Fn(&Operad, &[DynAgent]) -> LawVerification + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            statement: statement.into(),
            check: Check::Custom(Arc::new(verify)),
        }
    }

    /// Compare outputs only after passing them through `normalize`.
    ///
    /// Has no effect on custom laws.
    pub fn up_to<N>(mut self, normalize: N) -> Self
    where
        N: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        if let Check::Equation(eq) = &mut self.check {
            eq.normalize = Some(Arc::new(normalize));
        }
        self
    }

    /// Number of agents the law expects, if it declares one.
    pub fn agents(&self) -> Option<usize> {
        match &self.check {
            Check::Equation(eq) => Some(eq.agents),
            Check::Custom(_) => None,
        }
    }

    /// Check this law against `agents` in the context of `operad`.
    pub fn verify(&self, operad: &Operad, agents: &[DynAgent]) -> LawVerification {
        let verification = match &self.check {
            Check::Equation(eq) => self.verify_equation(eq, operad, agents),
            Check::Custom(verify) => verify(operad, agents),
        };
        debug!(
            operad = operad.name(),
            law = %self.name,
            status = ?verification.status,
            "law verified"
        );
        verification
    }

    fn verify_equation(
        &self,
        eq: &Equation,
        operad: &Operad,
        agents: &[DynAgent],
    ) -> LawVerification {
        if agents.len() != eq.agents {
            return LawVerification::skip(
                &self.name,
                format!("needs {} agents, got {}", eq.agents, agents.len()),
            );
        }

        let lhs = match (eq.lhs)(operad, agents) {
            Ok(agent) => agent,
            Err(err) => return LawVerification::fail(&self.name, format!("left side: {}", err)),
        };
        let rhs = match (eq.rhs)(operad, agents) {
            Ok(agent) => agent,
            Err(err) => return LawVerification::fail(&self.name, format!("right side: {}", err)),
        };

        let config = operad.law_config();
        if config.cases == 0 {
            return LawVerification::skip(&self.name, "no cases configured");
        }

        let sample: RefCell<Option<Sample>> = RefCell::new(None);
        let mut runner = config.runner();
        let outcome = runner.run(&config.sequences(), |inputs| {
            match eq.compare(&lhs, &rhs, &inputs) {
                Comparison::Agree(left, right) => {
                    let mut best = sample.borrow_mut();
                    if best.as_ref().map_or(true, |s| inputs.len() > s.inputs.len()) {
                        *best = Some(Sample { inputs, left, right });
                    }
                    Ok(())
                }
                Comparison::BothRejected => {
                    Err(TestCaseError::reject("both sides rejected the inputs"))
                }
                Comparison::Disagree(reason) => Err(TestCaseError::fail(reason)),
            }
        });

        match outcome {
            Ok(()) => {
                let verification = LawVerification::pass(&self.name, config.cases);
                match sample.into_inner() {
                    Some(s) => verification.with_sample(s.inputs, Some(s.left), Some(s.right)),
                    None => verification,
                }
            }
            Err(TestError::Fail(reason, inputs)) => {
                let left = eq.outputs(&lhs, &inputs).ok();
                let right = eq.outputs(&rhs, &inputs).ok();
                LawVerification::fail(&self.name, reason.to_string())
                    .with_sample(inputs, left, right)
            }
            Err(TestError::Abort(reason)) => LawVerification::skip(&self.name, reason.to_string()),
        }
    }
}

struct Sample {
    inputs: Vec<Value>,
    left: Vec<Value>,
    right: Vec<Value>,
}

enum RunError {
    Rejected,
    Panicked(String),
}

enum Comparison {
    Agree(Vec<Value>, Vec<Value>),
    BothRejected,
    Disagree(String),
}

impl Equation {
    /// Run `agent` over `inputs`, normalizing outputs.
    ///
    /// A panic inside the agent is caught and reported as `Panicked`.
    fn outputs(&self, agent: &DynAgent, inputs: &[Value]) -> Result<Vec<Value>, RunError> {
        let run = panic::catch_unwind(AssertUnwindSafe(|| {
            agent.run(agent.initial(), inputs.iter().cloned())
        }));
        let outputs = match run {
            Ok(Ok((_, outputs))) => outputs,
            Ok(Err(_)) => return Err(RunError::Rejected),
            Err(payload) => return Err(RunError::Panicked(panic_message(payload.as_ref()))),
        };
        Ok(match &self.normalize {
            Some(normalize) => outputs.iter().map(|v| normalize(v)).collect(),
            None => outputs,
        })
    }

    fn compare(&self, lhs: &DynAgent, rhs: &DynAgent, inputs: &[Value]) -> Comparison {
        match (self.outputs(lhs, inputs), self.outputs(rhs, inputs)) {
            (Err(RunError::Panicked(msg)), _) => {
                Comparison::Disagree(format!("{} panicked: {}", lhs.name(), msg))
            }
            (_, Err(RunError::Panicked(msg))) => {
                Comparison::Disagree(format!("{} panicked: {}", rhs.name(), msg))
            }
            (Ok(left), Ok(right)) if left == right => Comparison::Agree(left, right),
            (Err(RunError::Rejected), Err(RunError::Rejected)) => Comparison::BothRejected,
            (Ok(left), Ok(right)) => Comparison::Disagree(format!(
                "{} produced {:?} but {} produced {:?}",
                lhs.name(),
                left,
                rhs.name(),
                right
            )),
            (Ok(_), Err(RunError::Rejected)) => {
                Comparison::Disagree(format!("only {} rejected the inputs", rhs.name()))
            }
            (Err(RunError::Rejected), Ok(_)) => {
                Comparison::Disagree(format!("only {} rejected the inputs", lhs.name()))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl fmt::Debug for Law {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Law")
            .field("name", &self.name)
            .field("statement", &self.statement)
            .field("agents", &self.agents())
            .finish()
    }
}

impl fmt::Display for Law {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.statement)
    }
}

// ============================================================================
// Preconditions
// ============================================================================

/// A domain precondition over a slice of domain entities.
///
/// Domain operads pair their own laws with checks like "every unit is
/// adjacent to its target" or "all entities are at rest". The algebra does
/// not look inside `E`; it only records the verdict.
pub struct Precondition<E> {
    pub name: String,
    pub statement: String,
    check: Arc<dyn Fn(&[E]) -> Result<(), String> + Send + Sync>,
}

impl<E> Clone for Precondition<E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            statement: self.statement.clone(),
            check: Arc::clone(&self.check),
        }
    }
}

impl<E> Precondition<E> {
    pub fn new<F>(name: impl Into<String>, statement: impl Into<String>, check: F) -> Self
    where
        F: Fn(&[E]) -> Result<(), String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            statement: statement.into(),
            check: Arc::new(check),
        }
    }

    /// Run the checker. The number of entities inspected is reported as
    /// the case count.
    pub fn verify(&self, entities: &[E]) -> LawVerification {
        match (self.check)(entities) {
            Ok(()) => {
                let cases = u32::try_from(entities.len()).unwrap_or(u32::MAX);
                LawVerification::pass(&self.name, cases)
            }
            Err(reason) => LawVerification::fail(&self.name, reason),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
