//! # Composition
//!
//! Combinators that build new agents out of existing ones. None of them
//! mutate their operands; every composite owns cheap clones.
//!
//! | Combinator | Positions | Output |
//! |------------|-----------|--------|
//! | [`sequential`] | `S1 × S2` | second stage's output |
//! | [`parallel`] | `S1 × S2` | `(B, C)` from the same input |
//! | [`fan`] | `S1 × … × Sn` | tuple of all outputs |
//! | [`branch`] | `P × T × F` | output of the chosen branch |
//!
//! Sequential composition is associative and has [`crate::agent::identity`]
//! as a two-sided unit *behaviorally*: output sequences agree across
//! re-parenthesization while the nesting of state tuples differs. Do not
//! pattern-match on state shape across differently bracketed composites.
//!
//! ```rust
//! use polyagent_core::agent::from_function;
//! use polyagent_core::compose::{parallel, sequential};
//!
//! let double = from_function("Double", |x: i64| x * 2);
//! let add_one = from_function("AddOne", |x: i64| x + 1);
//!
//! let pipeline = sequential(&double, &add_one);
//! assert_eq!(pipeline.run(pipeline.initial(), [5]).unwrap().1, vec![11]);
//!
//! let both = parallel(&double, &add_one);
//! assert_eq!(both.invoke(both.initial(), 5).unwrap().1, (10, 6));
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::agent::{Direction, DynAgent, PolyAgent, Position, Signal};
use crate::error::AgentError;
use crate::value::{cartesian, Value};

fn product<X: Position, Y: Position>(xs: &BTreeSet<X>, ys: &BTreeSet<Y>) -> BTreeSet<(X, Y)> {
    xs.iter()
        .flat_map(|x| ys.iter().map(move |y| (x.clone(), y.clone())))
        .collect()
}

// ============================================================================
// Binary Composition
// ============================================================================

/// Run `first`, then feed its output into `second`.
///
/// Only `first` gates acceptance. Whether `first`'s outputs are acceptable
/// to `second` is the caller's concern; a rejection surfaces from
/// `second`'s transition when it happens.
pub fn sequential<S1, S2, A, B, C>(
    first: &PolyAgent<S1, A, B>,
    second: &PolyAgent<S2, B, C>,
) -> PolyAgent<(S1, S2), A, C>
where
    S1: Position,
    S2: Position,
    A: Signal,
    B: Signal,
    C: Signal,
{
    let name = format!("seq({}, {})", first.name(), second.name());
    let positions = product(first.positions(), second.positions());
    let initial = (first.initial().clone(), second.initial().clone());
    let gate = first.clone();
    let (f, g) = (first.clone(), second.clone());

    PolyAgent::from_parts(
        name,
        positions,
        initial,
        move |(s1, _): &(S1, S2)| gate.direction(s1),
        move |(s1, s2): &(S1, S2), x: A| {
            let (n1, y) = f.transition(s1, x)?;
            let (n2, z) = g.transition(s2, y)?;
            Ok(((n1, n2), z))
        },
    )
}

/// Broadcast one input to both agents and pair their outputs.
///
/// An input is accepted only where both operands accept it.
pub fn parallel<S1, S2, A, B, C>(
    left: &PolyAgent<S1, A, B>,
    right: &PolyAgent<S2, A, C>,
) -> PolyAgent<(S1, S2), A, (B, C)>
where
    S1: Position,
    S2: Position,
    A: Signal,
    B: Signal,
    C: Signal,
{
    let name = format!("par({}, {})", left.name(), right.name());
    let positions = product(left.positions(), right.positions());
    let initial = (left.initial().clone(), right.initial().clone());
    let (gl, gr) = (left.clone(), right.clone());
    let (f, g) = (left.clone(), right.clone());

    PolyAgent::from_parts(
        name,
        positions,
        initial,
        move |(s1, s2): &(S1, S2)| gl.direction(s1).intersect(&gr.direction(s2)),
        move |(s1, s2): &(S1, S2), x: A| {
            let (n1, y) = f.transition(s1, x.clone())?;
            let (n2, z) = g.transition(s2, x)?;
            Ok(((n1, n2), (y, z)))
        },
    )
}

// ============================================================================
// Dynamic N-ary Composition
// ============================================================================

fn split<'a>(agent: &str, state: &'a Value, arity: usize) -> Result<&'a [Value], AgentError> {
    match state.as_tuple() {
        Some(parts) if parts.len() == arity => Ok(parts),
        _ => Err(AgentError::TypeMismatch {
            agent: agent.to_string(),
            expected: format!("tuple of {}", arity),
            got: state.to_string(),
        }),
    }
}

/// Broadcast one input to every agent and collect a tuple of outputs.
///
/// With no operands the result has a single position and always emits the
/// empty tuple.
pub fn fan(agents: &[DynAgent]) -> DynAgent {
    let names: Vec<&str> = agents.iter().map(DynAgent::name).collect();
    let name = format!("fan({})", names.join(", "));
    let sets: Vec<&BTreeSet<Value>> = agents.iter().map(DynAgent::positions).collect();
    let positions = cartesian(&sets);
    let initial = Value::Tuple(agents.iter().map(|a| a.initial().clone()).collect());

    let gates: Arc<[DynAgent]> = agents.into();
    let members = Arc::clone(&gates);
    let arity = agents.len();
    let label = name.clone();

    DynAgent::from_parts(
        name,
        positions,
        initial,
        move |state: &Value| match state.as_tuple() {
            Some(parts) if parts.len() == arity => gates
                .iter()
                .zip(parts)
                .fold(Direction::Any, |acc, (agent, s)| {
                    acc.intersect(&agent.direction(s))
                }),
            _ => Direction::none(),
        },
        move |state: &Value, x: Value| {
            let parts = split(&label, state, arity)?;
            let mut next = Vec::with_capacity(arity);
            let mut outputs = Vec::with_capacity(arity);
            for (agent, s) in members.iter().zip(parts) {
                let (n, y) = agent.transition(s, x.clone())?;
                next.push(n);
                outputs.push(y);
            }
            Ok((Value::Tuple(next), Value::Tuple(outputs)))
        },
    )
}

/// Route each input to `on_true` or `on_false` depending on `predicate`.
///
/// The predicate must emit `Value::Bool`; anything else is a
/// `TypeMismatch`. The predicate gates acceptance and always advances;
/// only the chosen branch advances with it.
pub fn branch(predicate: &DynAgent, on_true: &DynAgent, on_false: &DynAgent) -> DynAgent {
    let name = format!(
        "branch({}, {}, {})",
        predicate.name(),
        on_true.name(),
        on_false.name()
    );
    let positions = cartesian(&[
        predicate.positions(),
        on_true.positions(),
        on_false.positions(),
    ]);
    let initial = Value::Tuple(vec![
        predicate.initial().clone(),
        on_true.initial().clone(),
        on_false.initial().clone(),
    ]);

    let gate = predicate.clone();
    let (p, t, f) = (predicate.clone(), on_true.clone(), on_false.clone());
    let label = name.clone();

    DynAgent::from_parts(
        name,
        positions,
        initial,
        move |state: &Value| match state.as_tuple() {
            Some([ps, _, _]) => gate.direction(ps),
            _ => Direction::none(),
        },
        move |state: &Value, x: Value| {
            let parts = split(&label, state, 3)?;
            let (ps, ts, fs) = (&parts[0], &parts[1], &parts[2]);
            let (np, verdict) = p.transition(ps, x.clone())?;
            match verdict {
                Value::Bool(true) => {
                    let (nt, y) = t.transition(ts, x)?;
                    Ok((Value::Tuple(vec![np, nt, fs.clone()]), y))
                }
                Value::Bool(false) => {
                    let (nf, y) = f.transition(fs, x)?;
                    Ok((Value::Tuple(vec![np, ts.clone(), nf]), y))
                }
                other => Err(AgentError::TypeMismatch {
                    agent: label.clone(),
                    expected: "bool".to_string(),
                    got: other.kind().to_string(),
                }),
            }
        },
    )
}

// ============================================================================
// Wiring Diagram
// ============================================================================

/// A named binary wiring: `left` feeds `right`.
///
/// Thin wrapper over [`sequential`]; the composite is tagged
/// `"{left}>>{right}"`.
pub struct WiringDiagram<S1, S2, A, B, C> {
    pub name: String,
    left: PolyAgent<S1, A, B>,
    right: PolyAgent<S2, B, C>,
}

impl<S1, S2, A, B, C> WiringDiagram<S1, S2, A, B, C>
where
    S1: Position,
    S2: Position,
    A: Signal,
    B: Signal,
    C: Signal,
{
    pub fn new(
        name: impl Into<String>,
        left: PolyAgent<S1, A, B>,
        right: PolyAgent<S2, B, C>,
    ) -> Self {
        Self {
            name: name.into(),
            left,
            right,
        }
    }

    pub fn left(&self) -> &PolyAgent<S1, A, B> {
        &self.left
    }

    pub fn right(&self) -> &PolyAgent<S2, B, C> {
        &self.right
    }

    /// Build the composite agent.
    pub fn compose(&self) -> PolyAgent<(S1, S2), A, C> {
        sequential(&self.left, &self.right)
            .with_name(format!("{}>>{}", self.left.name(), self.right.name()))
    }
}

impl<S1, S2, A, B, C> fmt::Display for WiringDiagram<S1, S2, A, B, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}>>{}", self.name, self.left, self.right)
    }
}

// ============================================================================
// Tests
// ============================================================================
