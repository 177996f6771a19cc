//! # Polynomial Agents
//!
//! A polynomial agent is a finite-state transducer whose input alphabet
//! depends on where it is:
//!
//! ```text
//!   positions   : finite set S
//!   direction   : S → Direction<A>        (what is accepted here)
//!   transition  : (S, A) → (S, B)         (where to go, what to emit)
//! ```
//!
//! Agents are immutable values. Composition builds new agents; invocation
//! threads the state explicitly through return values:
//!
//! ```rust
//! use polyagent_core::agent::{from_function, stateful};
//!
//! let double = from_function("Double", |x: i64| x * 2);
//! let (_, out) = double.invoke(&(), 21).unwrap();
//! assert_eq!(out, 42);
//!
//! // A toggle that reports the position it left.
//! let toggle = stateful("Toggle", [false, true], false, |on: &bool, _: ()| (!on, *on)).unwrap();
//! let (last, outputs) = toggle.run(toggle.initial(), [(), (), ()]).unwrap();
//! assert_eq!(outputs, vec![false, true, false]);
//! assert!(last);
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::compose::{parallel, sequential};
use crate::error::AgentError;
use crate::value::{Datum, Value};

// ============================================================================
// Bounds
// ============================================================================

/// Requirements on a position type: finite sets of them must be ordered
/// and printable for error payloads.
pub trait Position: Clone + Ord + fmt::Debug + Send + Sync + 'static {}

impl<T> Position for T where T: Clone + Ord + fmt::Debug + Send + Sync + 'static {}

/// Requirements on input and output types.
pub trait Signal: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {}

impl<T> Signal for T where T: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {}

// ============================================================================
// Direction
// ============================================================================

/// The inputs accepted at a position.
///
/// `Any` is checked by variant, never by membership, so it always takes
/// priority over whatever an exact set would say.
#[derive(Debug, Clone, PartialEq)]
pub enum Direction<A> {
    /// Every value of the input type is accepted.
    Any,
    /// Only the listed values are accepted. An empty list accepts nothing.
    Exact(Vec<A>),
}

impl<A: PartialEq + Clone> Direction<A> {
    /// Accept exactly the given inputs.
    pub fn exact(inputs: impl IntoIterator<Item = A>) -> Self {
        Direction::Exact(inputs.into_iter().collect())
    }

    /// Accept nothing (a terminal position).
    pub fn none() -> Self {
        Direction::Exact(Vec::new())
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Direction::Any)
    }

    /// Check whether `input` is accepted.
    pub fn accepts(&self, input: &A) -> bool {
        match self {
            Direction::Any => true,
            Direction::Exact(inputs) => inputs.contains(input),
        }
    }

    /// Inputs accepted by both directions.
    pub fn intersect(&self, other: &Self) -> Self {
        match (self, other) {
            (Direction::Any, d) | (d, Direction::Any) => d.clone(),
            (Direction::Exact(xs), Direction::Exact(ys)) => {
                Direction::Exact(xs.iter().filter(|x| ys.contains(x)).cloned().collect())
            }
        }
    }

    /// Map every exact input through `f`; `Any` stays `Any`.
    pub fn map<T>(&self, f: impl Fn(&A) -> T) -> Direction<T> {
        match self {
            Direction::Any => Direction::Any,
            Direction::Exact(inputs) => Direction::Exact(inputs.iter().map(f).collect()),
        }
    }
}

// ============================================================================
// PolyAgent
// ============================================================================

type DirectionFn<S, A> = Arc<dyn Fn(&S) -> Direction<A> + Send + Sync>;
type TransitionFn<S, A, B> = Arc<dyn Fn(&S, A) -> Result<(S, B), AgentError> + Send + Sync>;

/// A state-dependent transducer from `A` to `B` over positions `S`.
///
/// Cloning is cheap: positions and functions are shared behind `Arc`.
pub struct PolyAgent<S, A, B> {
    name: String,
    positions: Arc<BTreeSet<S>>,
    initial: S,
    direction: DirectionFn<S, A>,
    transition: TransitionFn<S, A, B>,
}

/// An agent whose positions, inputs and outputs are all [`Value`]s.
///
/// This is the form operads work with.
pub type DynAgent = PolyAgent<Value, Value, Value>;

impl<S: Clone, A, B> Clone for PolyAgent<S, A, B> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            positions: Arc::clone(&self.positions),
            initial: self.initial.clone(),
            direction: Arc::clone(&self.direction),
            transition: Arc::clone(&self.transition),
        }
    }
}

impl<S: fmt::Debug, A, B> fmt::Debug for PolyAgent<S, A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolyAgent")
            .field("name", &self.name)
            .field("positions", &self.positions)
            .field("initial", &self.initial)
            .finish_non_exhaustive()
    }
}

impl<S, A, B> fmt::Display for PolyAgent<S, A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl<S: Position, A: Signal, B: Signal> PolyAgent<S, A, B> {
    /// Build an agent from a fallible transition.
    ///
    /// Use this when the transition itself can refuse (e.g. a combinator
    /// that inspects the dynamic kind of an intermediate value). The
    /// direction defaults to [`Direction::Any`].
    ///
    /// Fails with `NoPositions` for an empty position set and with
    /// `InvalidState` when `initial` is not among `positions`.
    pub fn from_transition<F>(
        name: impl Into<String>,
        positions: impl IntoIterator<Item = S>,
        initial: S,
        transition: F,
    ) -> Result<Self, AgentError>
    where
        F: Fn(&S, A) -> Result<(S, B), AgentError> + Send + Sync + 'static,
    {
        let name = name.into();
        let positions: BTreeSet<S> = positions.into_iter().collect();
        if positions.is_empty() {
            return Err(AgentError::NoPositions { agent: name });
        }
        let agent = Self::from_parts(name, positions, initial, |_| Direction::Any, transition);
        if !agent.positions.contains(&agent.initial) {
            return Err(agent.invalid_state(&agent.initial));
        }
        Ok(agent)
    }

    /// Assemble an agent without validation. Combinators use this when the
    /// invariants already hold by construction.
    pub(crate) fn from_parts<D, F>(
        name: impl Into<String>,
        positions: BTreeSet<S>,
        initial: S,
        direction: D,
        transition: F,
    ) -> Self
    where
        D: Fn(&S) -> Direction<A> + Send + Sync + 'static,
        F: Fn(&S, A) -> Result<(S, B), AgentError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            positions: Arc::new(positions),
            initial,
            direction: Arc::new(direction),
            transition: Arc::new(transition),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn positions(&self) -> &BTreeSet<S> {
        &self.positions
    }

    /// The position a fresh run starts from.
    pub fn initial(&self) -> &S {
        &self.initial
    }

    /// Inputs accepted at `state`.
    pub fn direction(&self, state: &S) -> Direction<A> {
        (self.direction)(state)
    }

    /// Raw transition, without position or direction checks.
    ///
    /// Composite agents call their operands through this; callers from
    /// outside should prefer [`PolyAgent::invoke`].
    pub fn transition(&self, state: &S, input: A) -> Result<(S, B), AgentError> {
        (self.transition)(state, input)
    }

    /// Take one checked step.
    ///
    /// 1. `state` must be a declared position (`InvalidState`).
    /// 2. `input` must be accepted by `direction(state)` (`InvalidInput`).
    /// 3. The resulting position must be declared (`UndeclaredTransition`).
    pub fn invoke(&self, state: &S, input: A) -> Result<(S, B), AgentError> {
        if !self.positions.contains(state) {
            return Err(self.invalid_state(state));
        }

        let direction = self.direction(state);
        if !direction.accepts(&input) {
            let accepted = match direction {
                Direction::Any => Vec::new(),
                Direction::Exact(inputs) => inputs.iter().map(|i| format!("{:?}", i)).collect(),
            };
            return Err(AgentError::InvalidInput {
                agent: self.name.clone(),
                state: format!("{:?}", state),
                input: format!("{:?}", input),
                accepted,
            });
        }

        let (next, output) = self.transition(state, input)?;
        if !self.positions.contains(&next) {
            return Err(AgentError::UndeclaredTransition {
                agent: self.name.clone(),
                from: format!("{:?}", state),
                to: format!("{:?}", next),
            });
        }
        Ok((next, output))
    }

    /// Fold [`PolyAgent::invoke`] over `inputs`, left to right.
    ///
    /// All or nothing: the first failing step aborts the run and no
    /// outputs are returned.
    pub fn run(
        &self,
        initial: &S,
        inputs: impl IntoIterator<Item = A>,
    ) -> Result<(S, Vec<B>), AgentError> {
        let mut state = initial.clone();
        let mut outputs = Vec::new();
        for input in inputs {
            let (next, output) = self.invoke(&state, input)?;
            state = next;
            outputs.push(output);
        }
        Ok((state, outputs))
    }

    /// Return a copy under a different name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Return a copy that accepts only what `direction` allows.
    pub fn with_direction<D>(mut self, direction: D) -> Self
    where
        D: Fn(&S) -> Direction<A> + Send + Sync + 'static,
    {
        self.direction = Arc::new(direction);
        self
    }

    /// Sequential composition: `self` then `next`.
    pub fn then<S2: Position, C: Signal>(
        &self,
        next: &PolyAgent<S2, B, C>,
    ) -> PolyAgent<(S, S2), A, C> {
        sequential(self, next)
    }

    /// Parallel composition: both agents see the same input.
    pub fn tensor<S2: Position, C: Signal>(
        &self,
        other: &PolyAgent<S2, A, C>,
    ) -> PolyAgent<(S, S2), A, (B, C)> {
        parallel(self, other)
    }

    pub(crate) fn invalid_state(&self, state: &S) -> AgentError {
        AgentError::InvalidState {
            agent: self.name.clone(),
            state: format!("{:?}", state),
            positions: self.positions.iter().map(|p| format!("{:?}", p)).collect(),
        }
    }
}

impl<S, A, B> PolyAgent<S, A, B>
where
    S: Position + Datum,
    A: Signal + Datum,
    B: Signal + Datum,
{
    /// Erase the static types, producing a [`DynAgent`].
    ///
    /// Values that do not decode into `S` or `A` are reported as
    /// `InvalidState` and `InvalidInput` respectively.
    pub fn into_dyn(self) -> DynAgent {
        let name = self.name.clone();
        let positions: BTreeSet<Value> = self.positions.iter().map(Datum::to_value).collect();
        let initial = self.initial.to_value();
        let typed = Arc::new(self);
        let gate = Arc::clone(&typed);

        DynAgent::from_parts(
            name,
            positions,
            initial,
            move |state: &Value| match S::from_value(state) {
                Some(s) => gate.direction(&s).map(Datum::to_value),
                None => Direction::none(),
            },
            move |state: &Value, input: Value| {
                let s = S::from_value(state).ok_or_else(|| AgentError::InvalidState {
                    agent: typed.name.clone(),
                    state: state.to_string(),
                    positions: typed.positions.iter().map(|p| format!("{:?}", p)).collect(),
                })?;
                let a = A::from_value(&input).ok_or_else(|| AgentError::InvalidInput {
                    agent: typed.name.clone(),
                    state: state.to_string(),
                    input: input.to_string(),
                    accepted: vec![std::any::type_name::<A>().to_string()],
                })?;
                let (next, output) = typed.transition(&s, a)?;
                Ok((next.to_value(), output.to_value()))
            },
        )
    }
}

// ============================================================================
// Constructors
// ============================================================================

/// The identity agent: one position, accepts anything, echoes its input.
pub fn identity<A: Signal>() -> PolyAgent<(), A, A> {
    PolyAgent::from_parts(
        "Id",
        BTreeSet::from([()]),
        (),
        |_| Direction::Any,
        |_, x| Ok(((), x)),
    )
}

/// An agent that ignores its input and always emits `value`.
pub fn constant<A: Signal, B: Signal>(value: B) -> PolyAgent<(), A, B> {
    let name = format!("Const({:?})", value);
    PolyAgent::from_parts(
        name,
        BTreeSet::from([()]),
        (),
        |_| Direction::Any,
        move |_, _| Ok(((), value.clone())),
    )
}

/// Lift a pure function into a single-position agent.
pub fn from_function<A, B, F>(name: impl Into<String>, f: F) -> PolyAgent<(), A, B>
where
    A: Signal,
    B: Signal,
    F: Fn(A) -> B + Send + Sync + 'static,
{
    PolyAgent::from_parts(
        name,
        BTreeSet::from([()]),
        (),
        |_| Direction::Any,
        move |_, x| Ok(((), f(x))),
    )
}

/// General multi-position agent.
///
/// Accepts any input until narrowed with [`PolyAgent::with_direction`].
pub fn stateful<S, A, B, F>(
    name: impl Into<String>,
    positions: impl IntoIterator<Item = S>,
    initial: S,
    transition: F,
) -> Result<PolyAgent<S, A, B>, AgentError>
where
    S: Position,
    A: Signal,
    B: Signal,
    F: Fn(&S, A) -> (S, B) + Send + Sync + 'static,
{
    PolyAgent::from_transition(name, positions, initial, move |s, x| Ok(transition(s, x)))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    enum Door {
        Open,
        Closed,
        Locked,
    }

    fn door() -> PolyAgent<Door, &'static str, &'static str> {
        stateful(
            "Door",
            [Door::Open, Door::Closed, Door::Locked],
            Door::Closed,
            |state: &Door, cmd: &'static str| match (state, cmd) {
                (Door::Closed, "open") => (Door::Open, "opened"),
                (Door::Open, "close") => (Door::Closed, "closed"),
                (Door::Closed, "lock") => (Door::Locked, "locked"),
                (Door::Locked, "unlock") => (Door::Closed, "unlocked"),
                (s, _) => (*s, "ignored"),
            },
        )
        .unwrap()
        .with_direction(|state: &Door| match state {
            Door::Open => Direction::exact(["close"]),
            Door::Closed => Direction::exact(["open", "lock"]),
            Door::Locked => Direction::exact(["unlock"]),
        })
    }

    #[test]
    fn test_identity_echoes() {
        let id = identity::<i64>();
        assert_eq!(id.invoke(&(), 7).unwrap(), ((), 7));
        assert_eq!(id.positions().len(), 1);
    }

    #[test]
    fn test_constant_ignores_input() {
        let c = constant::<i64, &str>("fixed");
        let (_, outputs) = c.run(&(), [1, 2, 3]).unwrap();
        assert_eq!(outputs, vec!["fixed"; 3]);
    }

    #[test]
    fn test_mode_dependent_direction() {
        let d = door();
        let (state, out) = d.invoke(&Door::Closed, "lock").unwrap();
        assert_eq!((state, out), (Door::Locked, "locked"));

        let err = d.invoke(&Door::Locked, "open").unwrap_err();
        match err {
            AgentError::InvalidInput {
                agent,
                input,
                accepted,
                ..
            } => {
                assert_eq!(agent, "Door");
                assert_eq!(input, "\"open\"");
                assert_eq!(accepted, vec!["\"unlock\"".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_state_reports_positions() {
        let toggle = stateful("Toggle", [0i64, 1], 0, |s: &i64, _: ()| (1 - s, *s)).unwrap();
        let err = toggle.invoke(&5, ()).unwrap_err();
        assert_eq!(
            err,
            AgentError::InvalidState {
                agent: "Toggle".to_string(),
                state: "5".to_string(),
                positions: vec!["0".to_string(), "1".to_string()],
            }
        );
    }

    #[test]
    fn test_run_is_all_or_nothing() {
        let d = door();
        let result = d.run(&Door::Closed, ["open", "close", "unlock"]);
        assert!(matches!(result, Err(AgentError::InvalidInput { .. })));
    }

    #[test]
    fn test_run_threads_state() {
        let d = door();
        let (state, outputs) = d.run(d.initial(), ["lock", "unlock", "open"]).unwrap();
        assert_eq!(state, Door::Open);
        assert_eq!(outputs, vec!["locked", "unlocked", "opened"]);
    }

    #[test]
    fn test_undeclared_transition_rejected() {
        let leaky = stateful("Leaky", [0i64, 1], 0, |s: &i64, _: ()| (s + 1, ())).unwrap();
        assert!(leaky.invoke(&0, ()).is_ok());
        let err = leaky.invoke(&1, ()).unwrap_err();
        assert!(matches!(err, AgentError::UndeclaredTransition { ref to, .. } if to == "2"));
    }

    #[test]
    fn test_stateful_validates_positions() {
        let empty: Result<PolyAgent<i64, (), ()>, _> =
            stateful("Empty", Vec::<i64>::new(), 0, |s: &i64, _: ()| (*s, ()));
        assert!(matches!(empty, Err(AgentError::NoPositions { .. })));

        let stray = stateful("Stray", [1i64, 2], 3, |s: &i64, _: ()| (*s, ()));
        assert!(matches!(stray, Err(AgentError::InvalidState { .. })));
    }

    #[test]
    fn test_direction_any_short_circuits() {
        let any: Direction<i64> = Direction::Any;
        assert!(any.accepts(&-1));
        assert!(!Direction::<i64>::none().accepts(&0));
        assert_eq!(
            Direction::exact([1, 2, 3]).intersect(&Direction::exact([2, 3, 4])),
            Direction::exact([2, 3])
        );
        assert_eq!(any.intersect(&Direction::exact([9])), Direction::exact([9]));
    }

    #[test]
    fn test_into_dyn_preserves_behavior() {
        let toggle = stateful("Toggle", [false, true], false, |on: &bool, n: i64| {
            (!on, if *on { n } else { -n })
        })
        .unwrap()
        .into_dyn();

        assert_eq!(toggle.positions().len(), 2);
        let (state, outputs) = toggle
            .run(toggle.initial(), [Value::Int(1), Value::Int(2)])
            .unwrap();
        assert_eq!(state, Value::Bool(false));
        assert_eq!(outputs, vec![Value::Int(-1), Value::Int(2)]);

        let err = toggle.invoke(&Value::Bool(false), Value::from("x")).unwrap_err();
        assert!(matches!(err, AgentError::InvalidInput { .. }));
    }
}
