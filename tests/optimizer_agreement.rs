//! Differential tests: every combination of optimizer passes must compute the
//! same value as the unoptimized program.

use std::sync::Arc;

use formula_vm::prelude::*;
use proptest::prelude::*;
use proptest::sample::select;

fn same(a: f64, b: f64) -> bool {
    a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan())
}

fn leaf() -> impl Strategy<Value = String> {
    prop_oneof![
        (0usize..3).prop_map(|i| format!("X{}", i)),
        select(vec!["0", "1", "2", "0.5", "3.25", "10", "pi", "E"]).prop_map(String::from),
    ]
}

fn scalar_formula() -> impl Strategy<Value = String> {
    leaf().prop_recursive(4, 48, 3, |inner| {
        let binary_ops = vec![
            "+", "-", "*", "/", "^", "=", "<>", "<", "<=", ">", ">=", "AND", "OR",
        ];
        prop_oneof![
            (inner.clone(), select(binary_ops), inner.clone())
                .prop_map(|(a, op, b)| format!("({} {} {})", a, op, b)),
            inner.clone().prop_map(|a| format!("-({})", a)),
            inner.clone().prop_map(|a| format!("NOT ({})", a)),
            (inner.clone(), inner.clone(), inner.clone())
                .prop_map(|(c, t, e)| format!("IF({}, {}, {})", c, t, e)),
            (select(vec!["SQRT", "ABS", "SIN", "EXP", "FLOOR"]), inner.clone())
                .prop_map(|(f, a)| format!("{}({})", f, a)),
            (select(vec!["MIN", "MAX", "HYPOT", "MOD"]), inner.clone(), inner.clone())
                .prop_map(|(f, a, b)| format!("{}({}, {})", f, a, b)),
            (
                select(vec!["VSUM", "VMAX", "VMIN", "VNORM"]),
                prop::collection::vec(inner.clone(), 1..4)
            )
                .prop_map(|(f, elems)| format!("{}({{{}, X0{{}}}})", f, elems.join(", "))),
            // repeated pieces give the subterm and vector passes something to share
            inner
                .clone()
                .prop_map(|a| format!("({0}) * ({0}) + ({0})", a)),
            prop::collection::vec(inner, 1..3).prop_map(|elems| {
                let literal = format!("{{{}}}", elems.join(", "));
                format!("VSUM({0}) - VMAX({0})", literal)
            }),
        ]
    })
}

fn constant_formula() -> impl Strategy<Value = (String, f64)> {
    let number = select(vec![0.5, 1.0, 2.0, 3.0, 7.0, 10.0])
        .prop_map(|v: f64| (format!("{}", v), v));
    number.prop_recursive(3, 16, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone())
                .prop_map(|((a, x), (b, y))| (format!("({} + {})", a, b), x + y)),
            (inner.clone(), inner.clone())
                .prop_map(|((a, x), (b, y))| (format!("({} - {})", a, b), x - y)),
            (inner.clone(), inner.clone())
                .prop_map(|((a, x), (b, y))| (format!("({} * {})", a, b), x * y)),
            (inner.clone(), inner.clone())
                .prop_map(|((a, x), (b, y))| (format!("({} / {})", a, b), x / y)),
            inner.prop_map(|(a, x)| (format!("SQRT({})", a), x.sqrt())),
        ]
    })
}

fn evaluate(
    source: &str,
    registry: &Arc<Registry>,
    flags: OptimizationFlags,
    scalars: &[f64],
    vectors: &[&[f64]],
) -> f64 {
    let program = Program::compile(source, registry, flags).unwrap();
    let mut ctx = program.context();
    program.evaluate(&mut ctx, scalars, vectors).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn all_flag_combinations_agree(
        source in scalar_formula(),
        scalars in prop::array::uniform3(-10.0f64..10.0),
        vector in prop::collection::vec(-5.0f64..5.0, 0..4),
    ) {
        let registry = Arc::new(Registry::standard());
        let vectors: [&[f64]; 1] = [&vector];
        let baseline = evaluate(&source, &registry, OptimizationFlags::none(), &scalars, &vectors);

        for flags in OptimizationFlags::all_combinations() {
            let result = evaluate(&source, &registry, flags, &scalars, &vectors);
            prop_assert!(
                same(result, baseline),
                "{} with {:?}: {} != {}", source, flags, result, baseline
            );
        }
    }

    #[test]
    fn repeated_evaluation_is_stable(
        source in scalar_formula(),
        scalars in prop::array::uniform3(-10.0f64..10.0),
    ) {
        let registry = Arc::new(Registry::standard());
        let vector = [1.0, 2.0];
        let vectors: [&[f64]; 1] = [&vector];
        let program = Program::compile(&source, &registry, OptimizationFlags::default()).unwrap();
        let mut ctx = program.context();
        let first = program.evaluate(&mut ctx, &scalars, &vectors).unwrap();
        let second = program.evaluate(&mut ctx, &scalars, &vectors).unwrap();
        prop_assert!(same(first, second));
    }

    #[test]
    fn constant_formulas_match_arithmetic((source, expected) in constant_formula()) {
        let registry = Arc::new(Registry::standard());
        for flags in [OptimizationFlags::none(), OptimizationFlags::default()] {
            let result = evaluate(&source, &registry, flags, &[], &[]);
            prop_assert!(same(result, expected), "{}: {} != {}", source, result, expected);
        }
    }

    #[test]
    fn folded_constant_formulas_compile_to_one_instruction(
        (source, _) in constant_formula()
    ) {
        let registry = Arc::new(Registry::standard());
        let program = Program::compile(&source, &registry, OptimizationFlags::default()).unwrap();
        prop_assert_eq!(program.code().len(), 1);
    }
}

#[test]
fn scenarios_hold_for_every_flag_combination() {
    let registry = Arc::new(Registry::standard());
    let cases: [(&str, &[f64], f64); 6] = [
        ("1+2*3", &[], 7.0),
        ("(1+2)*3", &[], 9.0),
        ("X0^2+X0", &[3.0], 12.0),
        ("IF(X0>0,1,-1)", &[-5.0], -1.0),
        ("0/0=0/0", &[], 1.0),
        ("vsum({1,2,3})", &[], 6.0),
    ];
    for flags in OptimizationFlags::all_combinations() {
        for (source, scalars, expected) in cases {
            assert_eq!(
                evaluate(source, &registry, flags, scalars, &[]),
                expected,
                "{} with {:?}",
                source,
                flags
            );
        }
    }
}

#[test]
fn arity_errors_surface_at_compile_time() {
    let registry = Arc::new(Registry::standard());
    for source in ["MAX(1)", "SQRT(X0, X1)", "VSUM(1)", "VDOT(X0{})"] {
        let result = Program::compile(source, &registry, OptimizationFlags::default());
        assert!(result.is_err(), "{} should not compile", source);
    }
}
