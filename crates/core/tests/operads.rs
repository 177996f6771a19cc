//! Domain operads built on the universal base.
//!
//! A toy turn-based game operad: units are agents over a small position
//! grid, `swarm` is a domain operation with its own law, and a domain
//! precondition inspects plain game entities.

use polyagent_core::{
    fan, from_function, stateful, universal_operad, Arity, Direction, DynAgent, InputDomain, Law,
    LawConfig, LawStatus, LawVerification, Operad, OperadError, OperadRegistry, Operation,
    Precondition, Value, UNIVERSAL,
};

#[derive(Debug, Clone)]
struct Unit {
    name: &'static str,
    x: i64,
    target: i64,
}

fn game_operad(base: &Operad) -> Operad {
    let swarm = Operation::new("swarm", Arity::Variadic, |agents| {
        if agents.is_empty() {
            return Err(OperadError::Rejected {
                operation: "swarm".to_string(),
                reason: "a swarm needs at least one unit".to_string(),
            });
        }
        Ok(fan(agents).with_name(format!("swarm[{}]", agents.len())))
    })
    .with_signature("Unit* → Unit");

    let swarm_of_one = Law::equation(
        "swarm_of_one",
        "swarm(u) = fan(u)",
        1,
        |op, a| op.compose("swarm", a),
        |op, a| op.compose("fan", a),
    );

    Operad::extend(base, "game")
        .with_operation(swarm)
        .with_law(swarm_of_one)
}

fn walker() -> DynAgent {
    stateful("Walker", 0i64..3, 0, |x: &i64, step: bool| {
        let next = if step { (x + 1).min(2) } else { *x };
        (next, next)
    })
    .unwrap()
    .with_direction(|x: &i64| {
        if *x == 2 {
            Direction::exact([false])
        } else {
            Direction::Any
        }
    })
    .into_dyn()
}

#[test]
fn extended_operad_inherits_and_adds() {
    let base = universal_operad();
    let game = game_operad(&base);

    assert_eq!(game.name(), "game");
    assert!(game.operation("seq").is_some());
    assert!(game.operation("swarm").is_some());
    assert!(base.operation("swarm").is_none());
    assert_eq!(game.laws().len(), base.laws().len() + 1);
}

#[test]
fn domain_operation_rejection_is_structured() {
    let game = game_operad(&universal_operad());
    let err = game.compose("swarm", &[]).unwrap_err();
    assert!(matches!(err, OperadError::Rejected { ref operation, .. } if operation == "swarm"));
}

#[test]
fn domain_law_is_checked_with_inherited_machinery() {
    let game = game_operad(&universal_operad())
        .with_law_config(LawConfig::default().with_inputs(InputDomain::Booleans));
    let v = game.verify_law("swarm_of_one", &[walker()]);
    assert!(v.passed(), "{}", v);
}

#[test]
fn walker_stops_at_the_wall() {
    let w = walker();
    let (state, _) = w
        .run(w.initial(), [Value::Bool(true), Value::Bool(true)])
        .unwrap();
    assert_eq!(state, Value::Int(2));
    assert!(w.invoke(&state, Value::Bool(true)).is_err());
    assert!(w.invoke(&state, Value::Bool(false)).is_ok());
}

#[test]
fn verify_all_reports_every_law() {
    let game = game_operad(&universal_operad())
        .with_law_config(LawConfig::default().with_inputs(InputDomain::Booleans));
    let not = from_function("Not", |b: bool| !b).into_dyn();
    let results = game.verify_all_laws(&[not]);

    let names: Vec<&str> = results.iter().map(|v| v.law.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "seq_associativity",
            "seq_left_identity",
            "seq_right_identity",
            "par_associativity",
            "swarm_of_one",
        ]
    );
    let statuses: Vec<LawStatus> = results.iter().map(|v| v.status).collect();
    assert_eq!(
        statuses,
        vec![
            LawStatus::Skipped,
            LawStatus::Passed,
            LawStatus::Passed,
            LawStatus::Skipped,
            LawStatus::Passed,
        ]
    );
}

#[test]
fn left_identity_only_gates_on_the_first_stage() {
    // seq(id, walker) is gated by id, so it keeps stepping where walker
    // alone would refuse.
    let game = game_operad(&universal_operad())
        .with_law_config(LawConfig::default().with_inputs(InputDomain::Booleans));
    let v = game.verify_law("seq_left_identity", &[walker()]);
    assert_eq!(v.status, LawStatus::Failed);
    assert!(v.left.is_some());
    assert!(v.right.is_none());

    assert!(game.verify_law("seq_right_identity", &[walker()]).passed());
}

#[test]
fn broken_law_reports_counterexample() {
    let liar = Law::equation(
        "double_is_identity",
        "double = id",
        1,
        |_, a| Ok(a[0].clone()),
        |op, _| op.compose("id", &[]),
    );
    let operad = universal_operad().with_law(liar);
    let double = from_function("Double", |x: i64| x * 2).into_dyn();

    let v = operad.verify_law("double_is_identity", &[double]);
    assert_eq!(v.status, LawStatus::Failed);
    let inputs = v.inputs.expect("counterexample");
    assert_eq!(inputs.len(), 1);
    assert_eq!(v.left, Some(vec![Value::Int(inputs[0].as_int().unwrap() * 2)]));
    assert_eq!(v.right, Some(inputs));
}

#[test]
fn precondition_over_domain_entities() {
    let adjacent: Precondition<Unit> = Precondition::new(
        "adjacent",
        "every unit is next to its target",
        |units: &[Unit]| match units.iter().find(|u| (u.x - u.target).abs() > 1) {
            Some(u) => Err(format!("{} is {} cells away", u.name, (u.x - u.target).abs())),
            None => Ok(()),
        },
    );

    let close = [
        Unit { name: "archer", x: 3, target: 4 },
        Unit { name: "knight", x: 0, target: 0 },
    ];
    assert!(adjacent.verify(&close).passed());

    let far = [Unit { name: "scout", x: 0, target: 5 }];
    let v = adjacent.verify(&far);
    assert_eq!(v.status, LawStatus::Failed);
    assert_eq!(v.message.as_deref(), Some("scout is 5 cells away"));
}

#[test]
fn law_config_loads_from_json() {
    let config: LawConfig = serde_json::from_str(
        r#"{ "cases": 16, "inputs": { "integers": { "min": 0, "max": 9 } } }"#,
    )
    .unwrap();
    assert_eq!(config.cases, 16);
    assert_eq!(config.inputs, InputDomain::Integers { min: 0, max: 9 });
    assert_eq!(config.max_inputs, LawConfig::default().max_inputs);
    assert_eq!(config.seed, LawConfig::default().seed);

    let choice: LawConfig =
        serde_json::from_str(r#"{ "inputs": { "choice": [ { "Int": 1 }, "Unit" ] } }"#).unwrap();
    assert_eq!(
        choice.inputs,
        InputDomain::Choice(vec![Value::Int(1), Value::Unit])
    );
}

#[test]
fn verification_reports_serialize() {
    let v = LawVerification::pass("seq_associativity", 64);
    let json = serde_json::to_value(&v).unwrap();
    assert_eq!(json["law"], "seq_associativity");
    assert_eq!(json["status"], "Passed");
    assert_eq!(json["cases"], 64);
}

#[test]
fn registry_shares_domain_operads() {
    let mut registry = OperadRegistry::with_universal();
    let base = registry.get(UNIVERSAL).cloned().unwrap();
    registry.register(game_operad(&base));

    let game = registry.get("game").unwrap();
    let pair = game.compose("par", &[walker(), walker()]).unwrap();
    assert_eq!(pair.positions().len(), 9);
}
