use crate::{BBMap, BehaviorCallback, BehaviorNode, Context, NodeStatus};

/// A node paired with the port bindings its parent declared for it.
///
/// Ticking swaps the bindings into the context for the duration of the
/// child's tick, so the child resolves its local port names against its own
/// map and the parent's map is restored afterwards.
pub struct BoundNode {
    pub(crate) node: Box<dyn BehaviorNode>,
    pub(crate) ports: BBMap,
}

impl BoundNode {
    pub fn new(node: Box<dyn BehaviorNode>, ports: BBMap) -> Self {
        Self { node, ports }
    }

    pub fn tick(&mut self, arg: BehaviorCallback, ctx: &mut Context) -> NodeStatus {
        std::mem::swap(&mut ctx.port_map, &mut self.ports);
        let status = self.node.tick(arg, ctx);
        std::mem::swap(&mut ctx.port_map, &mut self.ports);
        status
    }

    pub fn halt(&mut self) {
        self.node.halt();
    }
}
