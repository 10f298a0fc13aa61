//! End-to-end tests for Fieldcast execution.
//!
//! These tests run whole programs for one or more devices against the shared
//! in-memory environment: evaluate → publish → neighbor reads across rounds.

use fieldcast_foundation::{AlignmentPath, DeviceUid, Slot, Value};
use fieldcast_tests::{SharedEnvironment, TestHarness};
use fieldcast_vm::context::DeviceContext;
use fieldcast_vm::entropy::ScriptedSource;
use fieldcast_vm::network::NetworkManager;
use fieldcast_vm::ops::Op;
use fieldcast_vm::state::Export;
use fieldcast_vm::{Error, Expression, run_round};

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A stateful counter with no prior entry must initialize to its declared
/// default exactly once and increment thereafter.
#[test]
fn test_counter_increments_across_rounds() {
    // rep(count <- 0) { count + 1 }
    let program = Expression::rep(
        "count",
        Expression::num(0.0),
        Expression::apply(Op::Add, vec![Expression::var("count"), Expression::num(1.0)]),
    );

    let mut harness = TestHarness::new(program);
    harness.add_device(1);

    for expected in 1..=10 {
        harness.run_round().unwrap();
        assert_eq!(harness.num_value(1), Some(expected as f64));
    }
}

fn guarded_program(x: f64) -> Expression {
    // let x = <x> in if (x > 0) 1 else random()
    Expression::let_(
        "x",
        Expression::num(x),
        Expression::if_(
            Expression::apply(Op::Gt, vec![Expression::var("x"), Expression::num(0.0)]),
            Expression::num(1.0),
            Expression::Random,
        ),
    )
}

/// A stable guard takes the same branch with the identical alignment path
/// every round; flipping the guard switches to the other branch without
/// colliding with the prior branch's entry in `lastExec`.
#[test]
fn test_branch_switch_does_not_collide() {
    let then_path = AlignmentPath::empty()
        .extend(Slot::Child(1))
        .extend(Slot::Branch(true));
    let else_path = AlignmentPath::empty()
        .extend(Slot::Child(1))
        .extend(Slot::Branch(false));
    assert_ne!(then_path, else_path);

    let mut device = DeviceContext::new(DeviceUid(1), Box::new(ScriptedSource::new([0.625])));
    let neighbors = Default::default();

    // Two rounds with x = 5: the literal branch, identical paths and values
    let positive = guarded_program(5.0);
    let first = run_round(&positive, &mut device, &Export::new(), &neighbors).unwrap();
    assert_eq!(first.value, Value::Num(1.0));
    let second = run_round(&positive, &mut device, &first.export, &neighbors).unwrap();
    assert_eq!(second.value, Value::Num(1.0));
    assert_eq!(first.export, second.export);
    assert!(second.export.contains(&then_path));
    assert!(!second.export.contains(&else_path));

    // Third round with x = -1: the nondeterministic branch, disjoint path
    let negative = guarded_program(-1.0);
    let third = run_round(&negative, &mut device, &second.export, &neighbors).unwrap();
    assert_eq!(third.value, Value::Num(0.625));
    assert_eq!(third.export.get(&else_path), Some(&Value::Num(0.625)));
    assert!(!third.export.contains(&then_path));
}

/// A neighbor with no entry at the aggregation's path is excluded from the
/// aggregate, not substituted with zero.
#[test]
fn test_unaligned_neighbor_is_excluded() {
    // sum_hood(nbr(1))
    let program = Expression::apply(
        Op::SumHood,
        vec![Expression::neighbor(Expression::num(1.0))],
    );

    let mut harness = TestHarness::new(program);
    harness.add_device(1);
    harness.add_device(2);
    harness.add_device(3);
    harness.connect(1, 2);
    harness.connect(1, 3);

    // Device 2 publishes; device 3 never runs, so it has nothing at the path
    harness.run_device(2).unwrap();

    let value = harness.run_device(1).unwrap();
    assert_eq!(value, Value::Num(2.0)); // own 1 + device 2's 1, device 3 excluded
}

/// `shareState` followed by `getNeighborState` from the same device acting as
/// its own neighbor reproduces the export exactly.
#[test]
fn test_share_state_round_trip() {
    let env = SharedEnvironment::new();
    let uid = DeviceUid(9);
    env.register(uid);
    env.connect(uid, uid);

    let mut export = Export::new();
    export
        .record(AlignmentPath::empty(), Value::Num(3.0))
        .unwrap();
    export
        .record(AlignmentPath::empty().extend(Slot::Child(0)), Value::Bool(true))
        .unwrap();

    let mut network = env.network_for(uid);
    network.share_state(&export).unwrap();

    let table = network.neighbor_state();
    assert_eq!(table.get(&uid), Some(&export));
}

#[test]
fn test_publication_preconditions() {
    let env = SharedEnvironment::new();
    let registered = DeviceUid(1);
    env.register(registered);

    // Unknown device is rejected
    let mut export = Export::new();
    export
        .record(AlignmentPath::empty(), Value::Num(1.0))
        .unwrap();
    let mut stray = env.network_for(DeviceUid(404));
    assert!(matches!(
        stray.share_state(&export),
        Err(Error::InvalidPublication(DeviceUid(404)))
    ));

    // Publishing an empty export is a no-op, not an error
    let mut network = env.network_for(registered);
    network.share_state(&export).unwrap();
    network.share_state(&Export::new()).unwrap();
    assert_eq!(env.published(registered), export);
}

/// A failed round withholds publication: neighbors keep seeing the last
/// successful export.
#[test]
fn test_failed_round_keeps_last_publication() {
    let mut harness = TestHarness::new(Expression::Random);
    harness.add_device_with_entropy(1, Box::new(ScriptedSource::new([0.5])));

    harness.run_device(1).unwrap();
    let published = harness.published(1);
    assert_eq!(published.get(&AlignmentPath::empty()), Some(&Value::Num(0.5)));

    // Source exhausted: the round fails, the publication stays
    assert!(matches!(
        harness.run_device(1),
        Err(Error::Nondeterminism(_))
    ));
    assert_eq!(harness.published(1), published);
    assert_eq!(harness.num_value(1), Some(0.5));
}

const UNREACHED: f64 = 1.0e9;

fn gradient_program() -> Expression {
    // rep(d <- mux(source, 0, UNREACHED)) {
    //     mux(source, 0, min(min_hood(nbr(d)) + 1, UNREACHED))
    // }
    //
    // mux, not if: every device must evaluate the neighbor construct so the
    // shared values stay aligned across the network.
    Expression::rep(
        "d",
        Expression::apply(
            Op::Mux,
            vec![
                Expression::var("source"),
                Expression::num(0.0),
                Expression::num(UNREACHED),
            ],
        ),
        Expression::apply(
            Op::Mux,
            vec![
                Expression::var("source"),
                Expression::num(0.0),
                Expression::apply(
                    Op::Min,
                    vec![
                        Expression::apply(
                            Op::Add,
                            vec![
                                Expression::apply(
                                    Op::MinHood,
                                    vec![Expression::neighbor(Expression::var("d"))],
                                ),
                                Expression::num(1.0),
                            ],
                        ),
                        Expression::num(UNREACHED),
                    ],
                ),
            ],
        ),
    )
}

/// Hop-count gradient over a three-device line: the canonical aggregate
/// program, exercising rep + nbr + fold across devices and rounds.
#[test]
fn test_gradient_converges_on_a_line() {
    init_tracing();

    let mut harness = TestHarness::new(gradient_program());
    for uid in 1..=3 {
        harness.add_device(uid);
        harness.set_property(uid, "source", Value::Bool(uid == 1));
    }
    harness.connect(1, 2);
    harness.connect(2, 3);

    harness.run_rounds(3).unwrap();

    assert_eq!(harness.num_value(1), Some(0.0));
    assert_eq!(harness.num_value(2), Some(1.0));
    assert_eq!(harness.num_value(3), Some(2.0));

    // Stable thereafter
    harness.run_rounds(2).unwrap();
    assert_eq!(harness.num_value(2), Some(1.0));
    assert_eq!(harness.num_value(3), Some(2.0));
}
