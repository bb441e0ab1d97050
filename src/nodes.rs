//! The built-in node library: composites, decorators and a few leaf helpers.
//!
//! Children are always evaluated in declared order within a single tick.
//! There is no sibling concurrency; even `Parallel` interleaves its children
//! by ticking them one after another and only differs in how it aggregates
//! their results across ticks.

use crate::{
    bound::BoundNode, error::AddChildError, BBMap, BehaviorCallback, BehaviorNode, Blackboard,
    Context, Lazy, NodeStatus, PortSpec, Symbol,
};

fn set_single_child(
    slot: &mut Option<BoundNode>,
    node: Box<dyn BehaviorNode>,
    ports: BBMap,
) -> Result<(), AddChildError> {
    if slot.is_some() {
        return Err(AddChildError::TooManyChildren);
    }
    *slot = Some(BoundNode::new(node, ports));
    Ok(())
}

/// Ticks children in order until one fails or keeps running.
///
/// A `Running` child is remembered, and the next tick resumes at that child
/// rather than restarting from the first. The cursor resets on any terminal
/// result.
#[derive(Default)]
pub struct SequenceNode {
    children: Vec<BoundNode>,
    current: Option<usize>,
}

impl BehaviorNode for SequenceNode {
    fn tick(&mut self, arg: BehaviorCallback, ctx: &mut Context) -> NodeStatus {
        let from = self.current.unwrap_or(0);
        for (i, child) in self.children[from..].iter_mut().enumerate() {
            match child.tick(arg, ctx) {
                NodeStatus::Failure => {
                    self.current = None;
                    return NodeStatus::Failure;
                }
                NodeStatus::Running => {
                    self.current = Some(from + i);
                    return NodeStatus::Running;
                }
                _ => (),
            }
        }
        self.current = None;
        NodeStatus::Success
    }

    fn halt(&mut self) {
        for child in &mut self.children {
            child.halt();
        }
        self.current = None;
    }

    fn add_child(
        &mut self,
        node: Box<dyn BehaviorNode>,
        ports: BBMap,
    ) -> Result<(), AddChildError> {
        self.children.push(BoundNode::new(node, ports));
        Ok(())
    }
}

/// Like [`SequenceNode`], but re-evaluates every child from the first on
/// each tick. Children after the one that returned early are halted, since a
/// previously running child may have been abandoned by the restart.
#[derive(Default)]
pub struct ReactiveSequenceNode {
    children: Vec<BoundNode>,
}

impl ReactiveSequenceNode {
    fn halt_from(&mut self, from: usize) {
        for child in &mut self.children[from..] {
            child.halt();
        }
    }
}

impl BehaviorNode for ReactiveSequenceNode {
    fn tick(&mut self, arg: BehaviorCallback, ctx: &mut Context) -> NodeStatus {
        for i in 0..self.children.len() {
            match self.children[i].tick(arg, ctx) {
                NodeStatus::Failure => {
                    self.halt_from(i + 1);
                    return NodeStatus::Failure;
                }
                NodeStatus::Running => {
                    self.halt_from(i + 1);
                    return NodeStatus::Running;
                }
                _ => (),
            }
        }
        NodeStatus::Success
    }

    fn halt(&mut self) {
        self.halt_from(0);
    }

    fn add_child(
        &mut self,
        node: Box<dyn BehaviorNode>,
        ports: BBMap,
    ) -> Result<(), AddChildError> {
        self.children.push(BoundNode::new(node, ports));
        Ok(())
    }
}

/// Ticks children in order until one succeeds or keeps running. The mirror
/// image of [`SequenceNode`].
#[derive(Default)]
pub struct FallbackNode {
    children: Vec<BoundNode>,
    current: Option<usize>,
}

impl BehaviorNode for FallbackNode {
    fn tick(&mut self, arg: BehaviorCallback, ctx: &mut Context) -> NodeStatus {
        let from = self.current.unwrap_or(0);
        for (i, child) in self.children[from..].iter_mut().enumerate() {
            match child.tick(arg, ctx) {
                NodeStatus::Success => {
                    self.current = None;
                    return NodeStatus::Success;
                }
                NodeStatus::Running => {
                    self.current = Some(from + i);
                    return NodeStatus::Running;
                }
                _ => (),
            }
        }
        self.current = None;
        NodeStatus::Failure
    }

    fn halt(&mut self) {
        for child in &mut self.children {
            child.halt();
        }
        self.current = None;
    }

    fn add_child(
        &mut self,
        node: Box<dyn BehaviorNode>,
        ports: BBMap,
    ) -> Result<(), AddChildError> {
        self.children.push(BoundNode::new(node, ports));
        Ok(())
    }
}

/// Like [`FallbackNode`], but restarts from the first child on every tick.
#[derive(Default)]
pub struct ReactiveFallbackNode {
    children: Vec<BoundNode>,
}

impl ReactiveFallbackNode {
    fn halt_from(&mut self, from: usize) {
        for child in &mut self.children[from..] {
            child.halt();
        }
    }
}

impl BehaviorNode for ReactiveFallbackNode {
    fn tick(&mut self, arg: BehaviorCallback, ctx: &mut Context) -> NodeStatus {
        for i in 0..self.children.len() {
            match self.children[i].tick(arg, ctx) {
                NodeStatus::Success => {
                    self.halt_from(i + 1);
                    return NodeStatus::Success;
                }
                NodeStatus::Running => {
                    self.halt_from(i + 1);
                    return NodeStatus::Running;
                }
                _ => (),
            }
        }
        NodeStatus::Failure
    }

    fn halt(&mut self) {
        self.halt_from(0);
    }

    fn add_child(
        &mut self,
        node: Box<dyn BehaviorNode>,
        ports: BBMap,
    ) -> Result<(), AddChildError> {
        self.children.push(BoundNode::new(node, ports));
        Ok(())
    }
}

static SUCCESS_COUNT: Lazy<Symbol> = Lazy::new(|| "success_count".into());
static FAILURE_COUNT: Lazy<Symbol> = Lazy::new(|| "failure_count".into());

/// Ticks every non-terminal child each invocation and aggregates their
/// results against configurable thresholds.
///
/// A child that already reached Success or Failure is not ticked again until
/// the node resets. `success_count` successes produce Success (default: all
/// children); `failure_count` failures, or enough failures that the success
/// threshold can no longer be met, produce Failure (default: 1). Reaching
/// either threshold halts the still-running children and resets the
/// bookkeeping.
#[derive(Default)]
pub struct ParallelNode {
    children: Vec<BoundNode>,
    completed: Vec<NodeStatus>,
}

impl ParallelNode {
    fn reset(&mut self) {
        for child in &mut self.children {
            child.halt();
        }
        self.completed.fill(NodeStatus::Idle);
    }
}

impl BehaviorNode for ParallelNode {
    fn provided_ports(&self) -> Vec<PortSpec> {
        vec![
            PortSpec::new_in(*SUCCESS_COUNT).optional(),
            PortSpec::new_in(*FAILURE_COUNT).optional(),
        ]
    }

    fn tick(&mut self, arg: BehaviorCallback, ctx: &mut Context) -> NodeStatus {
        let total = self.children.len();
        if total == 0 {
            return NodeStatus::Success;
        }
        let success_goal = ctx.get_parse::<usize>(*SUCCESS_COUNT).unwrap_or(total);
        let failure_goal = ctx.get_parse::<usize>(*FAILURE_COUNT).unwrap_or(1);

        for (child, slot) in self.children.iter_mut().zip(self.completed.iter_mut()) {
            if slot.is_terminal() {
                continue;
            }
            *slot = child.tick(arg, ctx);
        }

        let successes = self
            .completed
            .iter()
            .filter(|s| **s == NodeStatus::Success)
            .count();
        let failures = self
            .completed
            .iter()
            .filter(|s| **s == NodeStatus::Failure)
            .count();

        if successes >= success_goal {
            self.reset();
            return NodeStatus::Success;
        }
        if failures >= failure_goal || failures > total.saturating_sub(success_goal) {
            self.reset();
            return NodeStatus::Failure;
        }
        NodeStatus::Running
    }

    fn halt(&mut self) {
        self.reset();
    }

    fn add_child(
        &mut self,
        node: Box<dyn BehaviorNode>,
        ports: BBMap,
    ) -> Result<(), AddChildError> {
        self.children.push(BoundNode::new(node, ports));
        self.completed.push(NodeStatus::Idle);
        Ok(())
    }
}

/// Swaps the child's Success and Failure, passing Running through.
#[derive(Default)]
pub struct InverterNode(Option<BoundNode>);

impl BehaviorNode for InverterNode {
    fn tick(&mut self, arg: BehaviorCallback, ctx: &mut Context) -> NodeStatus {
        match self.0 {
            Some(ref mut child) => child.tick(arg, ctx).invert(),
            None => NodeStatus::Failure,
        }
    }

    fn halt(&mut self) {
        if let Some(child) = &mut self.0 {
            child.halt();
        }
    }

    fn add_child(
        &mut self,
        node: Box<dyn BehaviorNode>,
        ports: BBMap,
    ) -> Result<(), AddChildError> {
        set_single_child(&mut self.0, node, ports)
    }
}

/// Reports Success whenever the child reaches a terminal status.
#[derive(Default)]
pub struct ForceSuccessNode(Option<BoundNode>);

impl BehaviorNode for ForceSuccessNode {
    fn tick(&mut self, arg: BehaviorCallback, ctx: &mut Context) -> NodeStatus {
        match self.0 {
            Some(ref mut child) => match child.tick(arg, ctx) {
                NodeStatus::Running => NodeStatus::Running,
                _ => NodeStatus::Success,
            },
            None => NodeStatus::Failure,
        }
    }

    fn halt(&mut self) {
        if let Some(child) = &mut self.0 {
            child.halt();
        }
    }

    fn add_child(
        &mut self,
        node: Box<dyn BehaviorNode>,
        ports: BBMap,
    ) -> Result<(), AddChildError> {
        set_single_child(&mut self.0, node, ports)
    }
}

/// Reports Failure whenever the child reaches a terminal status.
#[derive(Default)]
pub struct ForceFailureNode(Option<BoundNode>);

impl BehaviorNode for ForceFailureNode {
    fn tick(&mut self, arg: BehaviorCallback, ctx: &mut Context) -> NodeStatus {
        match self.0 {
            Some(ref mut child) => match child.tick(arg, ctx) {
                NodeStatus::Running => NodeStatus::Running,
                _ => NodeStatus::Failure,
            },
            None => NodeStatus::Failure,
        }
    }

    fn halt(&mut self) {
        if let Some(child) = &mut self.0 {
            child.halt();
        }
    }

    fn add_child(
        &mut self,
        node: Box<dyn BehaviorNode>,
        ports: BBMap,
    ) -> Result<(), AddChildError> {
        set_single_child(&mut self.0, node, ports)
    }
}

static N_PORT: Lazy<Symbol> = Lazy::new(|| "n".into());

/// Re-ticks the child until it has succeeded `n` times, then reports
/// Success. A child Failure propagates immediately.
#[derive(Default)]
pub struct RepeatNode {
    left: Option<usize>,
    child: Option<BoundNode>,
}

impl BehaviorNode for RepeatNode {
    fn provided_ports(&self) -> Vec<PortSpec> {
        vec![PortSpec::new_in(*N_PORT)]
    }

    fn tick(&mut self, arg: BehaviorCallback, ctx: &mut Context) -> NodeStatus {
        let Some(child) = self.child.as_mut() else {
            return NodeStatus::Failure;
        };
        let Some(left) = self.left.or_else(|| ctx.get_parse::<usize>(*N_PORT)) else {
            return NodeStatus::Failure;
        };
        if left == 0 {
            self.left = None;
            return NodeStatus::Success;
        }
        match child.tick(arg, ctx) {
            NodeStatus::Success => {
                self.left = Some(left - 1);
                NodeStatus::Running
            }
            NodeStatus::Failure => {
                self.left = None;
                NodeStatus::Failure
            }
            other => other,
        }
    }

    fn halt(&mut self) {
        if let Some(child) = &mut self.child {
            child.halt();
        }
        self.left = None;
    }

    fn add_child(
        &mut self,
        node: Box<dyn BehaviorNode>,
        ports: BBMap,
    ) -> Result<(), AddChildError> {
        set_single_child(&mut self.child, node, ports)
    }
}

/// Re-ticks the child until it succeeds, giving up with Failure after `n`
/// failed attempts.
#[derive(Default)]
pub struct RetryNode {
    left: Option<usize>,
    child: Option<BoundNode>,
}

impl BehaviorNode for RetryNode {
    fn provided_ports(&self) -> Vec<PortSpec> {
        vec![PortSpec::new_in(*N_PORT)]
    }

    fn tick(&mut self, arg: BehaviorCallback, ctx: &mut Context) -> NodeStatus {
        let Some(child) = self.child.as_mut() else {
            return NodeStatus::Failure;
        };
        let Some(left) = self.left.or_else(|| ctx.get_parse::<usize>(*N_PORT)) else {
            return NodeStatus::Failure;
        };
        if left == 0 {
            self.left = None;
            return NodeStatus::Failure;
        }
        match child.tick(arg, ctx) {
            NodeStatus::Failure => {
                if left == 1 {
                    self.left = None;
                    NodeStatus::Failure
                } else {
                    self.left = Some(left - 1);
                    NodeStatus::Running
                }
            }
            NodeStatus::Success => {
                self.left = None;
                NodeStatus::Success
            }
            other => other,
        }
    }

    fn halt(&mut self) {
        if let Some(child) = &mut self.child {
            child.halt();
        }
        self.left = None;
    }

    fn add_child(
        &mut self,
        node: Box<dyn BehaviorNode>,
        ports: BBMap,
    ) -> Result<(), AddChildError> {
        set_single_child(&mut self.child, node, ports)
    }
}

/// Conditional branch with up to three children: condition, then, else.
///
/// A terminal condition result is remembered while the chosen branch is
/// Running, so a resumed branch is not re-gated on a condition that may
/// have changed.
#[derive(Default)]
pub struct IfNode {
    children: Vec<BoundNode>,
    condition: Option<NodeStatus>,
}

impl BehaviorNode for IfNode {
    fn tick(&mut self, arg: BehaviorCallback, ctx: &mut Context) -> NodeStatus {
        let condition = match self.condition {
            Some(c) => c,
            None => {
                let c = match self.children.first_mut() {
                    Some(cond) => cond.tick(arg, ctx),
                    None => return NodeStatus::Failure,
                };
                if c == NodeStatus::Running {
                    return NodeStatus::Running;
                }
                self.condition = Some(c);
                c
            }
        };

        let branch = match condition {
            NodeStatus::Success => self
                .children
                .get_mut(1)
                .map(|c| c.tick(arg, ctx))
                .unwrap_or(NodeStatus::Failure),
            // A missing else clause is not an error.
            _ => self
                .children
                .get_mut(2)
                .map(|c| c.tick(arg, ctx))
                .unwrap_or(NodeStatus::Success),
        };

        if branch != NodeStatus::Running {
            self.condition = None;
        }
        branch
    }

    fn halt(&mut self) {
        for child in &mut self.children {
            child.halt();
        }
        self.condition = None;
    }

    fn add_child(
        &mut self,
        node: Box<dyn BehaviorNode>,
        ports: BBMap,
    ) -> Result<(), AddChildError> {
        if self.children.len() < 3 {
            self.children.push(BoundNode::new(node, ports));
            Ok(())
        } else {
            Err(AddChildError::TooManyChildren)
        }
    }
}

pub(crate) static VALUE: Lazy<Symbol> = Lazy::new(|| "value".into());
pub(crate) static OUTPUT: Lazy<Symbol> = Lazy::new(|| "output".into());
pub(crate) static INPUT: Lazy<Symbol> = Lazy::new(|| "input".into());

/// Writes a boolean to its output port. Backs `var x = true` declarations.
pub(crate) struct SetBoolNode;

impl BehaviorNode for SetBoolNode {
    fn provided_ports(&self) -> Vec<PortSpec> {
        vec![PortSpec::new_in(*VALUE), PortSpec::new_out(*OUTPUT)]
    }

    fn tick(&mut self, _arg: BehaviorCallback, ctx: &mut Context) -> NodeStatus {
        match ctx.get_parse::<bool>(*VALUE) {
            Some(value) => {
                ctx.set(*OUTPUT, value);
                NodeStatus::Success
            }
            None => NodeStatus::Failure,
        }
    }
}

/// Succeeds when its input port holds `true`. Backs bare variable
/// references in tree descriptions.
pub struct IsTrueNode;

impl BehaviorNode for IsTrueNode {
    fn provided_ports(&self) -> Vec<PortSpec> {
        vec![PortSpec::new_in(*INPUT)]
    }

    fn tick(&mut self, _arg: BehaviorCallback, ctx: &mut Context) -> NodeStatus {
        match ctx.get_parse::<bool>(*INPUT) {
            Some(true) => NodeStatus::Success,
            Some(false) => NodeStatus::Failure,
            None => {
                // require() records the unresolved port
                let _ = ctx.require::<bool>(*INPUT);
                NodeStatus::Failure
            }
        }
    }
}

/// A tree reference with its own blackboard namespace.
///
/// Declared parameters are copied across the boundary around each tick:
/// readable parameters in before, writable parameters out after, regardless
/// of the child's result. Everything else in the parent blackboard stays
/// invisible to the subtree.
pub struct SubtreeNode {
    child: BoundNode,
    blackboard: Blackboard,
    params: Vec<PortSpec>,
}

impl SubtreeNode {
    pub fn new(
        child: Box<dyn BehaviorNode>,
        ports: BBMap,
        blackboard: Blackboard,
        params: Vec<PortSpec>,
    ) -> Self {
        Self {
            child: BoundNode::new(child, ports),
            blackboard,
            params,
        }
    }
}

impl BehaviorNode for SubtreeNode {
    fn provided_ports(&self) -> Vec<PortSpec> {
        self.params.clone()
    }

    fn tick(&mut self, arg: BehaviorCallback, ctx: &mut Context) -> NodeStatus {
        for param in self.params.iter().filter(|p| p.ty.is_readable()) {
            if let Some(value) = ctx.get_any(param.key) {
                self.blackboard.insert(param.key, value);
            }
        }

        std::mem::swap(&mut ctx.blackboard, &mut self.blackboard);
        let res = self.child.tick(arg, ctx);
        std::mem::swap(&mut ctx.blackboard, &mut self.blackboard);

        for param in self.params.iter().filter(|p| p.ty.is_writable()) {
            if let Some(value) = self.blackboard.get(&param.key) {
                ctx.set_any(param.key, value.clone());
            }
        }

        res
    }

    fn halt(&mut self) {
        self.child.halt();
    }
}
