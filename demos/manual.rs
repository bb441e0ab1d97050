//! Builds a tree programmatically instead of from a description file, using
//! `add_child` and the `hash_map!` macro for port bindings.

use tick_tree::{
    hash_map,
    nodes::{FallbackNode, RetryNode, SequenceNode},
    BehaviorCallback, BehaviorNode, Context, NodeStatus, PortSpec, TickEngine,
};

struct FlakySensor {
    attempts: usize,
}

impl BehaviorNode for FlakySensor {
    fn tick(&mut self, _arg: BehaviorCallback, _ctx: &mut Context) -> NodeStatus {
        self.attempts += 1;
        if self.attempts < 3 {
            println!("sensor glitched (attempt {})", self.attempts);
            NodeStatus::Failure
        } else {
            println!("sensor locked on (attempt {})", self.attempts);
            NodeStatus::Success
        }
    }
}

struct Grab;

impl BehaviorNode for Grab {
    fn provided_ports(&self) -> Vec<PortSpec> {
        vec![PortSpec::new_in("item")]
    }

    fn tick(&mut self, _arg: BehaviorCallback, ctx: &mut Context) -> NodeStatus {
        let Ok(item) = ctx.require::<String>("item") else {
            return NodeStatus::Failure;
        };
        println!("grabbing the {item}");
        NodeStatus::Success
    }
}

struct Shrug;

impl BehaviorNode for Shrug {
    fn tick(&mut self, _arg: BehaviorCallback, _ctx: &mut Context) -> NodeStatus {
        println!("giving up");
        NodeStatus::Success
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut locate = RetryNode::default();
    locate.add_child(Box::new(FlakySensor { attempts: 0 }), hash_map!("n" => "5"))?;

    let mut fetch = SequenceNode::default();
    fetch.add_child(Box::new(locate), hash_map!())?;
    fetch.add_child(Box::new(Grab), hash_map!("item" => "wrench"))?;

    let mut root = FallbackNode::default();
    root.add_child(Box::new(fetch), hash_map!())?;
    root.add_child(Box::new(Shrug), hash_map!())?;

    let outcome =
        TickEngine::with_budget(20).run(&mut root, &mut |_| None, &mut Context::default());
    println!("--- {outcome:?} ---");
    Ok(())
}
