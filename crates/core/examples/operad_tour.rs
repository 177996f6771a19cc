//! A tour of polynomial agents and the universal operad.
//!
//! Run with: cargo run -p polyagent-core --example operad_tour
//!
//! Builds a few agents, composes them by hand and through an operad,
//! checks the operad's laws, and enumerates small compositions.

use polyagent_core::{
    from_function, parallel, sequential, stateful, Direction, DynAgent, OperadRegistry, Value,
    WiringDiagram, UNIVERSAL,
};

fn main() {
    println!("=== Polynomial Agents and Operads ===\n");

    // -------------------------------------------------------------------------
    // 1. Agents
    // -------------------------------------------------------------------------
    println!("1. Agents");
    println!("---------\n");

    let double = from_function("Double", |x: i64| x * 2);
    let add_one = from_function("AddOne", |x: i64| x + 1);
    let square = from_function("Square", |x: i64| x * x);

    let (_, out) = double.invoke(double.initial(), 21).unwrap();
    println!("  Double(21) = {}", out);

    // A light switch that only accepts the command that makes sense.
    let switch = stateful("Switch", [false, true], false, |on: &bool, _cmd: bool| {
        (!on, !on)
    })
    .unwrap()
    .with_direction(|on: &bool| Direction::exact([!on]));

    let (state, outputs) = switch.run(switch.initial(), [true, false, true]).unwrap();
    println!("  Switch after [on, off, on]: {} (outputs {:?})", state, outputs);
    match switch.invoke(&true, true) {
        Ok(_) => println!("  Switch accepted 'on' while on?"),
        Err(e) => println!("  Rejected: {}", e),
    }
    println!();

    // -------------------------------------------------------------------------
    // 2. Composition
    // -------------------------------------------------------------------------
    println!("2. Composition");
    println!("--------------\n");

    let pipeline = sequential(&double, &add_one);
    let (_, outputs) = pipeline.run(pipeline.initial(), [5, 10]).unwrap();
    println!("  {} on [5, 10] = {:?}", pipeline, outputs);

    let both = parallel(&double, &square);
    let (_, out) = both.invoke(both.initial(), 5).unwrap();
    println!("  {} on 5 = {:?}", both, out);

    let diagram = WiringDiagram::new("scale", double.clone(), add_one.clone());
    let wired = diagram.compose();
    println!("  {} → agent '{}'", diagram, wired.name());
    println!();

    // -------------------------------------------------------------------------
    // 3. The Universal Operad
    // -------------------------------------------------------------------------
    println!("3. The Universal Operad");
    println!("-----------------------\n");

    let registry = OperadRegistry::with_universal();
    let Some(universal) = registry.get(UNIVERSAL) else {
        println!("  universal operad missing");
        return;
    };
    println!("{}\n", universal);

    let agents: Vec<DynAgent> = vec![
        double.clone().into_dyn(),
        add_one.clone().into_dyn(),
        square.clone().into_dyn(),
    ];

    match universal.compose("seq", &agents[..1]) {
        Ok(_) => println!("  seq with one agent succeeded?"),
        Err(e) => println!("  {}", e),
    }

    let abs = universal
        .compose(
            "branch",
            &[
                from_function("Positive", |x: i64| x >= 0).into_dyn(),
                from_function("Keep", |x: i64| x).into_dyn(),
                from_function("Negate", |x: i64| -x).into_dyn(),
            ],
        )
        .unwrap();
    let (_, outputs) = abs
        .run(abs.initial(), [Value::Int(-3), Value::Int(4)])
        .unwrap();
    println!("  abs on [-3, 4] = {:?}", outputs);
    println!();

    // -------------------------------------------------------------------------
    // 4. Laws
    // -------------------------------------------------------------------------
    println!("4. Laws");
    println!("-------\n");

    for name in ["seq_associativity", "par_associativity"] {
        println!("  {}", universal.verify_law(name, &agents));
    }
    for v in universal.verify_all_laws(&agents[..1]) {
        println!("  {}", v);
    }
    println!("  {}", universal.verify_law("commutativity", &agents));
    println!();

    // -------------------------------------------------------------------------
    // 5. Enumeration
    // -------------------------------------------------------------------------
    println!("5. Enumeration");
    println!("--------------\n");

    let primitives = &agents[..2];
    for depth in 0..=2 {
        let all = universal.enumerate_filtered(primitives, depth, |a| {
            a.name().starts_with("seq")
        });
        println!("  depth {}: {} agents", depth, all.len());
    }

    let found = universal
        .enumerate_filtered(primitives, 2, |a| a.name().starts_with("seq"))
        .into_iter()
        .filter(|a| {
            a.invoke(a.initial(), Value::Int(1))
                .map(|(_, out)| out == Value::Int(5))
                .unwrap_or(false)
        })
        .map(|a| a.name().to_string())
        .collect::<Vec<_>>();
    println!("  compositions mapping 1 ↦ 5: {:?}", found);

    println!("\n=== Done ===");
}
