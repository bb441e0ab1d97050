use std::cell::Cell;
use std::rc::Rc;

use tick_tree::{
    boxify, hash_map, load, parse_source, write_source, BehaviorCallback, BehaviorNode, Context,
    NodeStatus, PortSpec, Registry, RunOutcome, SequenceNode, TickEngine,
};

struct Always(NodeStatus);

impl BehaviorNode for Always {
    fn tick(&mut self, _arg: BehaviorCallback, _ctx: &mut Context) -> NodeStatus {
        self.0
    }
}

struct Counted {
    status: NodeStatus,
    ticks: Rc<Cell<usize>>,
}

impl BehaviorNode for Counted {
    fn tick(&mut self, _arg: BehaviorCallback, _ctx: &mut Context) -> NodeStatus {
        self.ticks.set(self.ticks.get() + 1);
        self.status
    }
}

/// Registers a leaf that always returns `status` and returns its shared
/// tick counter.
fn counted(registry: &mut Registry, name: &str, status: NodeStatus) -> Rc<Cell<usize>> {
    let ticks = Rc::new(Cell::new(0));
    let cons = ticks.clone();
    registry
        .register(
            name,
            boxify(move || Counted {
                status,
                ticks: cons.clone(),
            }),
        )
        .unwrap();
    ticks
}

#[test]
fn blackboard_values_reach_leaves() {
    struct CheckMe;

    impl BehaviorNode for CheckMe {
        fn tick(&mut self, _arg: BehaviorCallback, ctx: &mut Context) -> NodeStatus {
            assert_eq!(
                ctx.get::<String>("check").map(String::as_str),
                Some("check me")
            );
            NodeStatus::Success
        }
    }

    let mut ctx = Context::default();
    ctx.set("check", "check me".to_string());
    assert_eq!(CheckMe.tick(&mut |_| None, &mut ctx), NodeStatus::Success);
}

#[test]
fn a_sequence_aggregates_its_children() {
    let mut seq = SequenceNode::default();
    seq.add_child(Box::new(Always(NodeStatus::Success)), hash_map!())
        .unwrap();
    seq.add_child(Box::new(Always(NodeStatus::Success)), hash_map!())
        .unwrap();
    assert_eq!(
        seq.tick(&mut |_| None, &mut Context::default()),
        NodeStatus::Success
    );
    seq.add_child(Box::new(Always(NodeStatus::Failure)), hash_map!())
        .unwrap();
    assert_eq!(
        seq.tick(&mut |_| None, &mut Context::default()),
        NodeStatus::Failure
    );
}

#[test]
fn a_sequence_short_circuits_on_failure() {
    let source = parse_source("tree main = Sequence { First Bad Tail }").unwrap();
    let mut registry = Registry::default();
    let first = counted(&mut registry, "First", NodeStatus::Success);
    let bad = counted(&mut registry, "Bad", NodeStatus::Failure);
    let tail = counted(&mut registry, "Tail", NodeStatus::Success);
    let mut tree = load(&source, &registry, false).unwrap();

    assert_eq!(
        tree.tick(&mut |_| None, &mut Context::default()),
        NodeStatus::Failure
    );
    assert_eq!((first.get(), bad.get(), tail.get()), (1, 1, 0));
}

#[test]
fn a_fallback_short_circuits_on_success() {
    let source = parse_source("tree main = Fallback { Bad Good Tail }").unwrap();
    let mut registry = Registry::default();
    let bad = counted(&mut registry, "Bad", NodeStatus::Failure);
    let good = counted(&mut registry, "Good", NodeStatus::Success);
    let tail = counted(&mut registry, "Tail", NodeStatus::Success);
    let mut tree = load(&source, &registry, false).unwrap();

    assert_eq!(
        tree.tick(&mut |_| None, &mut Context::default()),
        NodeStatus::Success
    );
    assert_eq!((bad.get(), good.get(), tail.get()), (1, 1, 0));
}

struct SuspendOnce {
    suspended: bool,
    ticks: Rc<Cell<usize>>,
}

impl BehaviorNode for SuspendOnce {
    fn tick(&mut self, _arg: BehaviorCallback, _ctx: &mut Context) -> NodeStatus {
        self.ticks.set(self.ticks.get() + 1);
        if self.suspended {
            NodeStatus::Success
        } else {
            self.suspended = true;
            NodeStatus::Running
        }
    }
}

#[test]
fn a_running_sequence_resumes_from_its_cursor() {
    let source = parse_source("tree main = Sequence { First Pause Last }").unwrap();
    let mut registry = Registry::default();
    let first = counted(&mut registry, "First", NodeStatus::Success);
    let pause = Rc::new(Cell::new(0));
    let cons = pause.clone();
    registry
        .register(
            "Pause",
            boxify(move || SuspendOnce {
                suspended: false,
                ticks: cons.clone(),
            }),
        )
        .unwrap();
    let last = counted(&mut registry, "Last", NodeStatus::Success);
    let mut tree = load(&source, &registry, false).unwrap();

    let outcome = TickEngine::new().run(tree.as_mut(), &mut |_| None, &mut Context::default());
    assert_eq!(outcome, RunOutcome::Success { ticks: 2 });
    // The first child ran once; only the suspended child was re-ticked.
    assert_eq!((first.get(), pause.get(), last.get()), (1, 2, 1));
}

#[test]
fn negation_sugar_inverts_the_result() {
    let source = parse_source("tree main = Sequence { !Bad }").unwrap();
    let mut registry = Registry::default();
    let bad = counted(&mut registry, "Bad", NodeStatus::Failure);
    let mut tree = load(&source, &registry, false).unwrap();

    assert_eq!(
        tree.tick(&mut |_| None, &mut Context::default()),
        NodeStatus::Success
    );
    assert_eq!(bad.get(), 1);
}

#[test]
fn an_unresolved_input_fails_the_leaf_without_panicking() {
    struct NeedsTarget;

    impl BehaviorNode for NeedsTarget {
        fn provided_ports(&self) -> Vec<PortSpec> {
            vec![PortSpec::new_in("target")]
        }

        fn tick(&mut self, _arg: BehaviorCallback, ctx: &mut Context) -> NodeStatus {
            match ctx.require::<String>("target") {
                Ok(_) => NodeStatus::Success,
                Err(_) => NodeStatus::Failure,
            }
        }
    }

    let source = parse_source("tree main = Sequence { NeedsTarget }").unwrap();
    let mut registry = Registry::default();
    registry.register("NeedsTarget", boxify(|| NeedsTarget)).unwrap();
    let mut tree = load(&source, &registry, false).unwrap();

    assert_eq!(
        tree.tick(&mut |_| None, &mut Context::default()),
        NodeStatus::Failure
    );
}

#[test]
fn parallel_succeeds_at_its_threshold() {
    let source = parse_source(
        r#"tree main = Parallel (success_count <- "1") {
            Spin
            Good
        }"#,
    )
    .unwrap();
    let mut registry = Registry::default();
    let spin = counted(&mut registry, "Spin", NodeStatus::Running);
    let good = counted(&mut registry, "Good", NodeStatus::Success);
    let mut tree = load(&source, &registry, true).unwrap();

    assert_eq!(
        tree.tick(&mut |_| None, &mut Context::default()),
        NodeStatus::Success
    );
    assert_eq!((spin.get(), good.get()), (1, 1));
}

#[test]
fn the_engine_reports_budget_exhaustion() {
    let source = parse_source("tree main = Sequence { Spin }").unwrap();
    let mut registry = Registry::default();
    let spin = counted(&mut registry, "Spin", NodeStatus::Running);
    let mut tree = load(&source, &registry, false).unwrap();

    let outcome =
        TickEngine::with_budget(3).run(tree.as_mut(), &mut |_| None, &mut Context::default());
    assert_eq!(outcome, RunOutcome::TimedOut { ticks: 3 });
    assert_eq!(spin.get(), 3);
}

#[test]
fn subtrees_see_only_their_parameters() {
    struct Seed;

    impl BehaviorNode for Seed {
        fn tick(&mut self, _arg: BehaviorCallback, ctx: &mut Context) -> NodeStatus {
            ctx.set("secret", 1i32);
            ctx.set("hidden", 2i32);
            NodeStatus::Success
        }
    }

    struct Probe;

    impl BehaviorNode for Probe {
        fn tick(&mut self, _arg: BehaviorCallback, ctx: &mut Context) -> NodeStatus {
            let passed_in = ctx.get::<i32>("wanted") == Some(&1);
            let isolated =
                ctx.get::<i32>("hidden").is_none() && ctx.get::<i32>("secret").is_none();
            if passed_in && isolated {
                NodeStatus::Success
            } else {
                NodeStatus::Failure
            }
        }
    }

    let source = parse_source(
        "
tree main = Sequence {
    Seed
    sub (wanted <- secret)
}

tree sub(in wanted) = Sequence {
    Probe
}
",
    )
    .unwrap();
    let mut registry = Registry::default();
    registry.register("Seed", boxify(|| Seed)).unwrap();
    registry.register("Probe", boxify(|| Probe)).unwrap();
    let mut tree = load(&source, &registry, false).unwrap();

    assert_eq!(
        tree.tick(&mut |_| None, &mut Context::default()),
        NodeStatus::Success
    );
}

#[test]
fn the_demo_description_round_trips() {
    let text =
        std::fs::read_to_string(concat!(env!("CARGO_MANIFEST_DIR"), "/demos/robot.bt")).unwrap();
    let first = parse_source(&text).unwrap();
    let written = write_source(&first);
    let again = parse_source(&written).unwrap();
    assert_eq!(first, again);
}

#[test]
fn loading_an_unknown_node_names_it() {
    let source = parse_source("tree main = Sequence { Mystery }").unwrap();
    let err = load(&source, &Registry::default(), false).err().unwrap();
    assert!(err.to_string().contains("Mystery"));
}
