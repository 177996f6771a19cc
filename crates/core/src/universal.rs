//! The universal base operad.
//!
//! Every domain operad starts here via [`Operad::extend`]. The operations
//! are thin wrappers over [`crate::compose`]; the laws are the ones any
//! algebra of transducers is expected to keep.

use crate::agent::{identity, DynAgent};
use crate::compose::{branch, fan, parallel, sequential};
use crate::error::OperadError;
use crate::law::Law;
use crate::operad::{Arity, Operad, Operation};
use crate::value::Value;

/// Registry key of the universal operad.
pub const UNIVERSAL: &str = "universal";

fn operands<'a, const N: usize>(
    op: &str,
    agents: &'a [DynAgent],
) -> Result<&'a [DynAgent; N], OperadError> {
    agents
        .try_into()
        .map_err(|_| OperadError::ArityMismatch {
            operation: op.to_string(),
            expected: N,
            got: agents.len(),
        })
}

fn id() -> Operation {
    Operation::new("id", Arity::Fixed(0), |_| Ok(identity::<Value>().into_dyn()))
        .with_signature("() → Agent[A, A]")
}

fn twice() -> Operation {
    Operation::new("twice", Arity::Fixed(1), |agents| {
        let [f] = operands::<1>("twice", agents)?;
        Ok(sequential(f, f).into_dyn().with_name(format!("twice({})", f.name())))
    })
    .with_signature("Agent[A, A] → Agent[A, A]")
}

fn seq() -> Operation {
    Operation::new("seq", Arity::Fixed(2), |agents| {
        let [f, g] = operands::<2>("seq", agents)?;
        Ok(sequential(f, g).into_dyn())
    })
    .with_signature("Agent[A, B] × Agent[B, C] → Agent[A, C]")
}

fn par() -> Operation {
    Operation::new("par", Arity::Fixed(2), |agents| {
        let [f, g] = operands::<2>("par", agents)?;
        Ok(parallel(f, g).into_dyn())
    })
    .with_signature("Agent[A, B] × Agent[A, C] → Agent[A, (B, C)]")
}

fn branch_op() -> Operation {
    Operation::new("branch", Arity::Fixed(3), |agents| {
        let [p, t, f] = operands::<3>("branch", agents)?;
        Ok(branch(p, t, f))
    })
    .with_signature("Agent[A, Bool] × Agent[A, B] × Agent[A, B] → Agent[A, B]")
}

fn fan_op() -> Operation {
    Operation::new("fan", Arity::Variadic, |agents| Ok(fan(agents)))
        .with_signature("Agent[A, B]* → Agent[A, (B, …)]")
}

fn seq_associativity() -> Law {
    Law::equation(
        "seq_associativity",
        "seq(seq(f, g), h) = seq(f, seq(g, h))",
        3,
        |op, a| {
            let fg = op.compose("seq", &a[..2])?;
            op.compose("seq", &[fg, a[2].clone()])
        },
        |op, a| {
            let gh = op.compose("seq", &a[1..])?;
            op.compose("seq", &[a[0].clone(), gh])
        },
    )
}

fn seq_left_identity() -> Law {
    Law::equation(
        "seq_left_identity",
        "seq(id, f) = f",
        1,
        |op, a| {
            let id = op.compose("id", &[])?;
            op.compose("seq", &[id, a[0].clone()])
        },
        |_, a| Ok(a[0].clone()),
    )
}

fn seq_right_identity() -> Law {
    Law::equation(
        "seq_right_identity",
        "seq(f, id) = f",
        1,
        |op, a| {
            let id = op.compose("id", &[])?;
            op.compose("seq", &[a[0].clone(), id])
        },
        |_, a| Ok(a[0].clone()),
    )
}

fn par_associativity() -> Law {
    Law::equation(
        "par_associativity",
        "par(par(f, g), h) ≅ par(f, par(g, h))",
        3,
        |op, a| {
            let fg = op.compose("par", &a[..2])?;
            op.compose("par", &[fg, a[2].clone()])
        },
        |op, a| {
            let gh = op.compose("par", &a[1..])?;
            op.compose("par", &[a[0].clone(), gh])
        },
    )
    .up_to(Value::flatten)
}

/// Build the universal operad.
///
/// Operations: `id`, `twice`, `seq`, `par`, `branch`, `fan`.
/// Laws: `seq_associativity`, `seq_left_identity`, `seq_right_identity`,
/// `par_associativity` (outputs compared after flattening tuples).
pub fn universal_operad() -> Operad {
    Operad::new(
        UNIVERSAL,
        [id(), twice(), seq(), par(), branch_op(), fan_op()],
        [
            seq_associativity(),
            seq_left_identity(),
            seq_right_identity(),
            par_associativity(),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{from_function, stateful};
    use crate::law::LawStatus;

    fn double() -> DynAgent {
        from_function("Double", |x: i64| x * 2).into_dyn()
    }

    fn add_one() -> DynAgent {
        from_function("AddOne", |x: i64| x + 1).into_dyn()
    }

    fn counter() -> DynAgent {
        stateful("Counter", 0i64..4, 0, |n: &i64, x: i64| ((n + 1) % 4, x + n))
            .unwrap()
            .into_dyn()
    }

    #[test]
    fn test_operations_and_arities() {
        let u = universal_operad();
        assert_eq!(u.name(), UNIVERSAL);
        assert_eq!(
            u.operation_names(),
            vec!["branch", "fan", "id", "par", "seq", "twice"]
        );
        assert_eq!(u.operation("fan").unwrap().arity, Arity::Variadic);
        assert_eq!(u.operation("branch").unwrap().arity, Arity::Fixed(3));
    }

    #[test]
    fn test_twice_applies_twice() {
        let u = universal_operad();
        let quad = u.compose("twice", &[double()]).unwrap();
        assert_eq!(quad.name(), "twice(Double)");
        let (_, out) = quad.invoke(quad.initial(), Value::Int(3)).unwrap();
        assert_eq!(out, Value::Int(12));
    }

    #[test]
    fn test_branch_routes_by_predicate() {
        let u = universal_operad();
        let positive = from_function("Positive", |x: i64| x > 0).into_dyn();
        let negate = from_function("Negate", |x: i64| -x).into_dyn();
        let abs = u.compose("branch", &[positive, double(), negate]).unwrap();

        let (_, outputs) = abs
            .run(abs.initial(), [Value::Int(4), Value::Int(-4)])
            .unwrap();
        assert_eq!(outputs, vec![Value::Int(8), Value::Int(4)]);
    }

    #[test]
    fn test_branch_rejects_non_bool_predicate() {
        let u = universal_operad();
        let agent = u
            .compose("branch", &[double(), double(), double()])
            .unwrap();
        let err = agent.invoke(agent.initial(), Value::Int(1)).unwrap_err();
        assert!(matches!(
            err,
            crate::error::AgentError::TypeMismatch { ref expected, .. } if expected == "bool"
        ));
    }

    #[test]
    fn test_fan_collects_outputs() {
        let u = universal_operad();
        let agent = u.compose("fan", &[double(), add_one(), double()]).unwrap();
        let (_, out) = agent.invoke(agent.initial(), Value::Int(5)).unwrap();
        assert_eq!(
            out,
            Value::Tuple(vec![Value::Int(10), Value::Int(6), Value::Int(10)])
        );
    }

    #[test]
    fn test_all_laws_hold_for_pure_agents() {
        let u = universal_operad();
        let agents = [double(), add_one(), double()];
        for name in ["seq_associativity", "par_associativity"] {
            let v = u.verify_law(name, &agents);
            assert!(v.passed(), "{}", v);
        }
        for name in ["seq_left_identity", "seq_right_identity"] {
            let v = u.verify_law(name, &agents[..1]);
            assert!(v.passed(), "{}", v);
        }

        let v = u.verify_law("seq_right_identity", &agents[..1]);
        let inputs = v.inputs.expect("passing checks carry a sample");
        assert!(!inputs.is_empty());
        let expected: Vec<Value> = inputs
            .iter()
            .map(|x| Value::Int(x.as_int().unwrap() * 2))
            .collect();
        assert_eq!(v.left, Some(expected.clone()));
        assert_eq!(v.right, Some(expected));
    }

    #[test]
    fn test_laws_hold_for_stateful_agents() {
        let u = universal_operad();
        let agents = [counter(), double(), counter()];
        assert!(u.verify_law("seq_associativity", &agents).passed());
        assert!(u.verify_law("par_associativity", &agents).passed());
        assert!(u.verify_law("seq_right_identity", &agents[..1]).passed());
    }

    #[test]
    fn test_verify_all_skips_mismatched_counts() {
        let u = universal_operad();
        let results = u.verify_all_laws(&[double()]);
        assert_eq!(results.len(), 4);
        let skipped: Vec<&str> = results
            .iter()
            .filter(|v| v.status == LawStatus::Skipped)
            .map(|v| v.law.as_str())
            .collect();
        assert_eq!(skipped, vec!["seq_associativity", "par_associativity"]);
    }
}
