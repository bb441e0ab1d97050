//! Drives a tree to a terminal status under an optional tick budget.

use crate::{BehaviorCallback, BehaviorNode, Context, NodeStatus};

/// What a [`TickEngine::run`] call ended with, carrying the number of ticks
/// consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Success { ticks: usize },
    Failure { ticks: usize },
    /// The tick budget ran out before the tree reached a terminal status.
    /// The tree has been halted. This is an outcome, not an error.
    TimedOut { ticks: usize },
}

impl RunOutcome {
    pub fn ticks(&self) -> usize {
        match *self {
            RunOutcome::Success { ticks }
            | RunOutcome::Failure { ticks }
            | RunOutcome::TimedOut { ticks } => ticks,
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self, RunOutcome::Success { .. })
    }
}

/// Repeatedly ticks a root node until it returns Success or Failure.
///
/// Each iteration is exactly one top-level tick; composites resume from
/// their remembered cursors rather than restarting. With a budget, the
/// engine halts the tree when the budget is exhausted so that `Running`
/// nodes release whatever they hold, then reports
/// [`RunOutcome::TimedOut`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TickEngine {
    budget: Option<usize>,
}

impl TickEngine {
    /// An engine that runs until the tree completes, however long that
    /// takes. A tree that never leaves `Running` will loop forever; prefer
    /// [`with_budget`](TickEngine::with_budget) unless completion is known.
    pub fn new() -> Self {
        Self { budget: None }
    }

    pub fn with_budget(budget: usize) -> Self {
        Self {
            budget: Some(budget),
        }
    }

    pub fn run(
        &self,
        root: &mut dyn BehaviorNode,
        arg: BehaviorCallback,
        ctx: &mut Context,
    ) -> RunOutcome {
        let mut ticks = 0;
        loop {
            if self.budget.is_some_and(|budget| ticks >= budget) {
                root.halt();
                tracing::debug!(ticks, "tick budget exhausted, tree halted");
                return RunOutcome::TimedOut { ticks };
            }
            ticks += 1;
            match root.tick(arg, ctx) {
                NodeStatus::Success => {
                    tracing::debug!(ticks, "tree completed with success");
                    return RunOutcome::Success { ticks };
                }
                NodeStatus::Failure => {
                    tracing::debug!(ticks, "tree completed with failure");
                    return RunOutcome::Failure { ticks };
                }
                NodeStatus::Running | NodeStatus::Idle => (),
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{BBMap, SequenceNode};

    struct SucceedAfter {
        left: usize,
    }

    impl BehaviorNode for SucceedAfter {
        fn tick(&mut self, _arg: BehaviorCallback, _ctx: &mut Context) -> NodeStatus {
            if self.left == 0 {
                NodeStatus::Success
            } else {
                self.left -= 1;
                NodeStatus::Running
            }
        }
    }

    struct NeverDone {
        halted: bool,
    }

    impl BehaviorNode for NeverDone {
        fn tick(&mut self, _arg: BehaviorCallback, _ctx: &mut Context) -> NodeStatus {
            NodeStatus::Running
        }

        fn halt(&mut self) {
            self.halted = true;
        }
    }

    #[test]
    fn runs_to_success_and_counts_ticks() {
        let mut root = SucceedAfter { left: 2 };
        let outcome = TickEngine::new().run(&mut root, &mut |_| None, &mut Context::default());
        assert_eq!(outcome, RunOutcome::Success { ticks: 3 });
        assert!(outcome.succeeded());
    }

    #[test]
    fn budget_exhaustion_halts_the_tree() {
        let mut root = SequenceNode::default();
        root.add_child(Box::new(NeverDone { halted: false }), BBMap::new())
            .unwrap();

        let outcome =
            TickEngine::with_budget(5).run(&mut root, &mut |_| None, &mut Context::default());
        assert_eq!(outcome, RunOutcome::TimedOut { ticks: 5 });
    }

    #[test]
    fn halt_reaches_the_running_leaf() {
        let mut leaf = NeverDone { halted: false };
        let outcome =
            TickEngine::with_budget(1).run(&mut leaf, &mut |_| None, &mut Context::default());
        assert_eq!(outcome, RunOutcome::TimedOut { ticks: 1 });
        assert!(leaf.halted);
    }

    #[test]
    fn zero_budget_never_ticks() {
        let mut root = SucceedAfter { left: 0 };
        let outcome =
            TickEngine::with_budget(0).run(&mut root, &mut |_| None, &mut Context::default());
        assert_eq!(outcome, RunOutcome::TimedOut { ticks: 0 });
    }
}
