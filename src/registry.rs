use crate::error::BuildError;
use crate::nodes::{
    FallbackNode, ForceFailureNode, ForceSuccessNode, IfNode, InverterNode, IsTrueNode,
    ParallelNode, ReactiveFallbackNode, ReactiveSequenceNode, RepeatNode, RetryNode, SequenceNode,
    SetBoolNode,
};
use crate::BehaviorNode;
use std::collections::HashMap;

pub type Constructor = Box<dyn Fn() -> Box<dyn BehaviorNode>>;

/// Wraps a plain constructor closure into the boxed form the registry
/// stores.
pub fn boxify<T>(cons: impl (Fn() -> T) + 'static) -> Constructor
where
    T: BehaviorNode + 'static,
{
    Box::new(move || Box::new(cons()))
}

/// Maps node type names to constructors.
///
/// `Default` pre-registers the built-in node library, so user registrations
/// can neither shadow a built-in nor each other; a duplicate name is a
/// construction error.
pub struct Registry {
    node_types: HashMap<String, Constructor>,
}

impl Default for Registry {
    fn default() -> Self {
        let mut ret = Self {
            node_types: HashMap::new(),
        };
        ret.register_builtin("Sequence", boxify(SequenceNode::default));
        ret.register_builtin("ReactiveSequence", boxify(ReactiveSequenceNode::default));
        ret.register_builtin("Fallback", boxify(FallbackNode::default));
        ret.register_builtin("ReactiveFallback", boxify(ReactiveFallbackNode::default));
        ret.register_builtin("Parallel", boxify(ParallelNode::default));
        ret.register_builtin("ForceSuccess", boxify(ForceSuccessNode::default));
        ret.register_builtin("ForceFailure", boxify(ForceFailureNode::default));
        ret.register_builtin("Inverter", boxify(InverterNode::default));
        ret.register_builtin("Repeat", boxify(RepeatNode::default));
        ret.register_builtin("Retry", boxify(RetryNode::default));
        ret.register_builtin("if", boxify(IfNode::default));
        ret.register_builtin("SetBool", boxify(|| SetBoolNode));
        ret.register_builtin("IsTrue", boxify(|| IsTrueNode));
        ret
    }
}

impl Registry {
    fn register_builtin(&mut self, type_name: &str, constructor: Constructor) {
        self.node_types.insert(type_name.to_string(), constructor);
    }

    pub fn register(
        &mut self,
        type_name: impl ToString,
        constructor: Constructor,
    ) -> Result<(), BuildError> {
        let type_name = type_name.to_string();
        if self.node_types.contains_key(&type_name) {
            return Err(BuildError::DuplicateNode(type_name));
        }
        self.node_types.insert(type_name, constructor);
        Ok(())
    }

    pub fn build(&self, type_name: &str) -> Option<Box<dyn BehaviorNode>> {
        self.node_types
            .get(type_name)
            .map(|constructor| constructor())
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.node_types.contains_key(type_name)
    }
}
