//! A robot task loaded from `robot.bt`: enter a room, fetch an apple from
//! the fridge, leave. Run with `RUST_LOG=debug` to watch the engine.

use std::path::Path;

use tick_tree::{
    boxify, load, parse_source, BehaviorCallback, BehaviorNode, Context, NodeStatus, PortSpec,
    Registry, TickEngine,
};

struct MoveTowards;

impl BehaviorNode for MoveTowards {
    fn provided_ports(&self) -> Vec<PortSpec> {
        vec![PortSpec::new_in("target")]
    }

    fn tick(&mut self, _arg: BehaviorCallback, ctx: &mut Context) -> NodeStatus {
        let Ok(target) = ctx.require::<String>("target") else {
            return NodeStatus::Failure;
        };
        println!("Moving towards {target}");
        NodeStatus::Success
    }
}

struct IsDoorOpen;

impl BehaviorNode for IsDoorOpen {
    fn provided_ports(&self) -> Vec<PortSpec> {
        vec![PortSpec::new_in("door")]
    }

    fn tick(&mut self, _arg: BehaviorCallback, ctx: &mut Context) -> NodeStatus {
        let Ok(door) = ctx.require::<String>("door") else {
            return NodeStatus::Failure;
        };
        println!("Checking if {door} is open");
        // Every door starts closed in this little world.
        NodeStatus::Failure
    }
}

struct OpenDoor;

impl BehaviorNode for OpenDoor {
    fn provided_ports(&self) -> Vec<PortSpec> {
        vec![PortSpec::new_in("door")]
    }

    fn tick(&mut self, _arg: BehaviorCallback, ctx: &mut Context) -> NodeStatus {
        let Ok(door) = ctx.require::<String>("door") else {
            return NodeStatus::Failure;
        };
        println!("Opening {door}");
        NodeStatus::Success
    }
}

struct CloseDoor;

impl BehaviorNode for CloseDoor {
    fn provided_ports(&self) -> Vec<PortSpec> {
        vec![PortSpec::new_in("door")]
    }

    fn tick(&mut self, _arg: BehaviorCallback, ctx: &mut Context) -> NodeStatus {
        let Ok(door) = ctx.require::<String>("door") else {
            return NodeStatus::Failure;
        };
        println!("Closing {door}");
        NodeStatus::Success
    }
}

struct Announce(&'static str);

impl BehaviorNode for Announce {
    fn tick(&mut self, _arg: BehaviorCallback, _ctx: &mut Context) -> NodeStatus {
        println!("{}", self.0);
        NodeStatus::Success
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let text = std::fs::read_to_string(
        Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/robot.bt"),
    )?;
    let source = parse_source(&text)?;

    let mut registry = Registry::default();
    registry.register("MoveTowards", boxify(|| MoveTowards))?;
    registry.register("IsDoorOpen", boxify(|| IsDoorOpen))?;
    registry.register("OpenDoor", boxify(|| OpenDoor))?;
    registry.register("CloseDoor", boxify(|| CloseDoor))?;
    registry.register("EnterRoom", boxify(|| Announce("Entering the room")))?;
    registry.register("ExitRoom", boxify(|| Announce("Exiting the room")))?;
    registry.register("FindApple", boxify(|| Announce("Finding an apple in the fridge")))?;
    registry.register("PickApple", boxify(|| Announce("Picking the apple")))?;

    let mut tree = load(&source, &registry, true)?;

    println!("--- starting robot task ---");
    let outcome =
        TickEngine::with_budget(100).run(tree.as_mut(), &mut |_| None, &mut Context::default());
    println!("--- {outcome:?} ---");
    Ok(())
}
