//! Integration tests for the Z3 bindings.
//!
//! These tests link the real Z3 library and verify end-to-end behavior,
//! including handle lifetimes across threads.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use z3rc::{Config, Context, SatResult, SolverBackend, SolverResult, Z3Error};

// ---- Helper ----

fn make_context() -> Context {
    Context::with_default_config().expect("Z3 context should be creatable")
}

// ============================================================
// Arithmetic, bit-vectors, arrays
// ============================================================

#[test]
fn int_sum_exceeds_bound() {
    let ctx = make_context();
    let int = ctx.int_sort().unwrap();
    let x = ctx.constant("x", &int).unwrap();
    let sum = ctx.add(&[&x, &ctx.int(10, &int).unwrap()]).unwrap();
    let solver = ctx.solver().unwrap();
    solver
        .assert(&ctx.gt(&sum, &ctx.int(20, &int).unwrap()).unwrap())
        .unwrap();

    assert_eq!(solver.check().unwrap(), SatResult::Sat);
    let model = solver.model().unwrap();
    let x_val: i64 = model
        .eval_string(&x)
        .parse()
        .expect("x should be a plain integer");
    assert!(x_val > 10, "x = {x_val}, expected x > 10");
}

#[test]
fn bitvector_wraps_around() {
    let ctx = make_context();
    let bv8 = ctx.bv_sort(8).unwrap();
    let x = ctx.constant("x", &bv8).unwrap();
    let solver = ctx.solver().unwrap();
    solver
        .assert(&ctx.eq(&x, &ctx.bv_val(255, 8).unwrap()).unwrap())
        .unwrap();
    let next = ctx.bvadd(&x, &ctx.bv_val(1, 8).unwrap()).unwrap();
    solver
        .assert(&ctx.eq(&next, &ctx.bv_val(0, 8).unwrap()).unwrap())
        .unwrap();

    assert!(solver.check().unwrap().is_sat());
    assert_eq!(solver.model().unwrap().eval_string(&x), "#xff");
}

#[test]
fn unsigned_greater_than_is_strict() {
    let ctx = make_context();
    let bv8 = ctx.bv_sort(8).unwrap();
    let x = ctx.constant("x", &bv8).unwrap();
    let solver = ctx.solver().unwrap();
    solver.assert(&ctx.bvugt(&x, &x).unwrap()).unwrap();
    assert_eq!(solver.check().unwrap(), SatResult::Unsat);
}

#[test]
fn array_store_then_select() {
    let ctx = make_context();
    let int = ctx.int_sort().unwrap();
    let arr_sort = ctx.array_sort(&int, &int).unwrap();
    let a = ctx.constant("a", &arr_sort).unwrap();
    let one = ctx.int(1, &int).unwrap();
    let two = ctx.int(2, &int).unwrap();
    let b = ctx.store(&a, &one, &ctx.int(100, &int).unwrap()).unwrap();

    let solver = ctx.solver().unwrap();
    solver
        .assert(
            &ctx.eq(&ctx.select(&b, &one).unwrap(), &ctx.int(100, &int).unwrap())
                .unwrap(),
        )
        .unwrap();
    solver
        .assert(
            &ctx.eq(&ctx.select(&b, &two).unwrap(), &ctx.select(&a, &two).unwrap())
                .unwrap(),
        )
        .unwrap();

    assert!(solver.check().unwrap().is_sat());
}

#[test]
fn record_field_as_function() {
    let ctx = make_context();
    let user = ctx.uninterpreted_sort("User").unwrap();
    let int = ctx.int_sort().unwrap();
    let age = ctx.func_decl("Age", &[&user], &int).unwrap();
    let users = ctx
        .constant("users", &ctx.array_sort(&int, &user).unwrap())
        .unwrap();
    let first = ctx.select(&users, &ctx.int(0, &int).unwrap()).unwrap();
    let first_age = ctx.apply(&age, &[&first]).unwrap();

    let solver = ctx.solver().unwrap();
    solver
        .assert(&ctx.eq(&first_age, &ctx.int(25, &int).unwrap()).unwrap())
        .unwrap();

    assert!(solver.check().unwrap().is_sat());
    assert_eq!(solver.model().unwrap().eval_string(&first_age), "25");
}

// ============================================================
// Logic and quantifiers
// ============================================================

#[test]
fn forall_contradicts_witness() {
    let ctx = make_context();
    let int = ctx.int_sort().unwrap();
    let u = ctx.constant("u", &int).unwrap();
    let k = ctx.constant("k", &int).unwrap();
    let all_big = ctx
        .forall(&[&u], &ctx.gt(&u, &ctx.int(10, &int).unwrap()).unwrap())
        .unwrap();

    let solver = ctx.solver().unwrap();
    solver.assert(&all_big).unwrap();
    solver
        .assert(&ctx.eq(&k, &ctx.int(5, &int).unwrap()).unwrap())
        .unwrap();

    assert_eq!(solver.check().unwrap(), SatResult::Unsat);
}

#[test]
fn de_morgan_holds() {
    let ctx = make_context();
    let boolean = ctx.bool_sort().unwrap();
    let p = ctx.constant("p", &boolean).unwrap();
    let q = ctx.constant("q", &boolean).unwrap();
    let lhs = ctx.not(&ctx.and(&[&p, &q]).unwrap()).unwrap();
    let rhs = ctx
        .or(&[&ctx.not(&p).unwrap(), &ctx.not(&q).unwrap()])
        .unwrap();

    let solver = ctx.solver().unwrap();
    solver
        .assert(&ctx.not(&ctx.eq(&lhs, &rhs).unwrap()).unwrap())
        .unwrap();

    assert!(solver.check().unwrap().is_unsat());
}

// ============================================================
// Floating point
// ============================================================

#[test]
fn float_addition_is_not_associative() {
    let ctx = make_context();
    let f32s = ctx.float32_sort().unwrap();
    let rm = ctx.rne().unwrap();
    let a = ctx.constant("a", &f32s).unwrap();
    let b = ctx.constant("b", &f32s).unwrap();
    let c = ctx.constant("c", &f32s).unwrap();
    let left = ctx
        .fpa_add(&rm, &ctx.fpa_add(&rm, &a, &b).unwrap(), &c)
        .unwrap();
    let right = ctx
        .fpa_add(&rm, &a, &ctx.fpa_add(&rm, &b, &c).unwrap())
        .unwrap();

    let solver = ctx.solver().unwrap();
    solver
        .assert(&ctx.not(&ctx.fpa_eq(&left, &right).unwrap()).unwrap())
        .unwrap();

    assert!(solver.check().unwrap().is_sat());
}

#[test]
fn float_one_bit_pattern() {
    let ctx = make_context();
    let one = ctx.float_val(1.0, &ctx.float32_sort().unwrap()).unwrap();
    let bits = ctx.fpa_to_ieee_bv(&one).unwrap();
    let expected = ctx.bv_val(0x3f80_0000, 32).unwrap();

    let solver = ctx.solver().unwrap();
    solver.assert(&ctx.eq(&bits, &expected).unwrap()).unwrap();

    assert!(solver.check().unwrap().is_sat());
}

// ============================================================
// Optimization and the backend trait
// ============================================================

#[test]
fn optimize_finds_extremes() {
    let ctx = make_context();
    let int = ctx.int_sort().unwrap();
    let x = ctx.constant("x", &int).unwrap();
    let y = ctx.constant("y", &int).unwrap();
    let opt = ctx.optimize().unwrap();
    opt.assert(&ctx.le(&x, &ctx.int(50, &int).unwrap()).unwrap())
        .unwrap();
    opt.assert(&ctx.ge(&y, &ctx.int(-5, &int).unwrap()).unwrap())
        .unwrap();
    opt.maximize(&x).unwrap();
    opt.minimize(&y).unwrap();

    let result = opt.solve().unwrap();
    let model = result.model().expect("Expected model in SAT result");
    assert_eq!(model.get("x").as_deref(), Some("50"));
    assert_eq!(model.eval_string(&y), "(- 5)");
}

#[test]
fn backends_are_interchangeable() {
    let ctx = make_context();
    let int = ctx.int_sort().unwrap();
    let x = ctx.constant("x", &int).unwrap();
    let bounded = ctx
        .and(&[
            &ctx.gt(&x, &ctx.int(5, &int).unwrap()).unwrap(),
            &ctx.lt(&x, &ctx.int(3, &int).unwrap()).unwrap(),
        ])
        .unwrap();
    let backends: Vec<Box<dyn SolverBackend>> = vec![
        Box::new(ctx.solver().unwrap()),
        Box::new(ctx.optimize().unwrap()),
    ];
    for backend in &backends {
        backend.assert(&bounded).unwrap();
        assert!(matches!(backend.solve().unwrap(), SolverResult::Unsat));
    }
}

// ============================================================
// Handle lifetimes
// ============================================================

#[test]
fn many_expressions_release_cleanly() {
    let ctx = make_context();
    let int = ctx.int_sort().unwrap();
    let baseline = ctx.live_handles();
    for i in 0..100_000 {
        let _ = ctx.int(i, &int).unwrap();
    }
    assert_eq!(ctx.live_handles(), baseline);
}

#[test]
fn children_outlive_context_value() {
    let (solver, x) = {
        let ctx = make_context();
        let int = ctx.int_sort().unwrap();
        let x = ctx.constant("x", &int).unwrap();
        (ctx.solver().unwrap(), x)
    };
    let ctx = solver.context();
    let int = x.sort().unwrap();
    solver
        .assert(&ctx.eq(&x, &ctx.int(7, &int).unwrap()).unwrap())
        .unwrap();
    assert!(solver.check().unwrap().is_sat());
    assert_eq!(solver.model().unwrap().eval_string(&x), "7");
}

#[test]
fn foreign_handles_are_rejected() {
    let a = make_context();
    let b = make_context();
    let x = a.constant("x", &a.int_sort().unwrap()).unwrap();
    let y = b.constant("y", &b.int_sort().unwrap()).unwrap();
    assert_eq!(a.add(&[&x, &y]).unwrap_err(), Z3Error::ContextMismatch);
    assert_eq!(
        a.constant("z", &b.bool_sort().unwrap()).unwrap_err(),
        Z3Error::ContextMismatch
    );
}

#[test]
fn config_parameters_apply() {
    let config = Config::new().with_model(true).with_timeout(10_000);
    let ctx = Context::new(&config).unwrap();
    drop(config);
    let solver = ctx.solver().unwrap();
    solver.assert(&ctx.bool_val(true).unwrap()).unwrap();
    assert!(solver.check().unwrap().is_sat());
}

// ============================================================
// Concurrency
// ============================================================

#[test]
fn independent_contexts_on_threads() {
    let handles: Vec<_> = (0..10)
        .map(|i| {
            thread::spawn(move || {
                let ctx = make_context();
                let int = ctx.int_sort().unwrap();
                let x = ctx.constant("x", &int).unwrap();
                let solver = ctx.solver().unwrap();
                solver
                    .assert(&ctx.gt(&x, &ctx.int(10 + i, &int).unwrap()).unwrap())
                    .unwrap();
                solver.check().unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), SatResult::Sat);
    }
}

#[test]
fn shared_context_across_threads() {
    let ctx = make_context();
    let int = ctx.int_sort().unwrap();
    let baseline = ctx.live_handles();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let ctx = ctx.clone();
            let int = int.clone();
            thread::spawn(move || {
                for j in 0..200 {
                    let x = ctx.constant(&format!("x_{i}_{j}"), &int).unwrap();
                    let bound = ctx.int(j, &int).unwrap();
                    let _ = ctx.gt(&x, &bound).unwrap();
                }
                let solver = ctx.solver().unwrap();
                let y = ctx.constant(&format!("y_{i}"), &int).unwrap();
                solver
                    .assert(&ctx.eq(&y, &ctx.int(i, &int).unwrap()).unwrap())
                    .unwrap();
                solver.check().unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap().is_sat());
    }
    assert_eq!(ctx.live_handles(), baseline);
}

#[test]
fn interrupt_on_idle_context_is_harmless() {
    let ctx = make_context();
    let solver = ctx.solver().unwrap();
    let p = ctx.constant("p", &ctx.bool_sort().unwrap()).unwrap();
    solver.assert(&p).unwrap();
    let remote = solver.clone();
    thread::spawn(move || remote.interrupt()).join().unwrap();
    assert_eq!(solver.check().unwrap(), SatResult::Sat);
}

#[test]
fn interrupt_stops_a_running_check() {
    let ctx = make_context();
    let int = ctx.int_sort().unwrap();
    let one = ctx.int(1, &int).unwrap();
    let solver = ctx.solver().unwrap();
    let mut cubes = Vec::new();
    for name in ["x", "y", "z"] {
        let v = ctx.constant(name, &int).unwrap();
        solver.assert(&ctx.ge(&v, &one).unwrap()).unwrap();
        cubes.push(ctx.mul(&[&v, &v, &v]).unwrap());
    }
    let sum = ctx.add(&[&cubes[0], &cubes[1]]).unwrap();
    solver.assert(&ctx.eq(&sum, &cubes[2]).unwrap()).unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let remote = solver.clone();
    let flag = Arc::clone(&done);
    let interrupter = thread::spawn(move || {
        let start = Instant::now();
        // Keep interrupting until the check returns, in case the first
        // interrupt lands before the check has started.
        while !flag.load(Ordering::Acquire) && start.elapsed() < Duration::from_secs(60) {
            thread::sleep(Duration::from_millis(250));
            remote.interrupt();
        }
    });

    // This thread holds the context for the whole check.
    let result = solver.check().unwrap();
    done.store(true, Ordering::Release);
    interrupter.join().unwrap();

    assert_eq!(result, SatResult::Unknown);
    let reason = solver.reason_unknown();
    assert!(
        reason.contains("interrupted") || reason.contains("canceled"),
        "unexpected reason: {reason}"
    );
}
