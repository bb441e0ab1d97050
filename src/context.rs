use crate::error::PortResolutionError;
use crate::{BBMap, Blackboard, PortBinding, Symbol};
use std::any::{Any, TypeId};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::rc::Rc;
use std::str::FromStr;

/// Blackboard access as seen by one node.
///
/// Reads and writes go through the node's active port bindings, so a node
/// only ever names its own local ports; the tree description decides which
/// blackboard keys those resolve to. An entry's type is fixed by its first
/// write. A write that would change the type is refused and recorded, never
/// coerced.
#[derive(Default)]
pub struct Context {
    pub(crate) blackboard: Blackboard,
    pub(crate) port_map: BBMap,
}

impl Debug for Context {
    fn fmt(&self, fmt: &mut Formatter) -> FmtResult {
        fmt.debug_struct("Context")
            .field("blackboard", &self.blackboard.keys().collect::<Vec<_>>())
            .field("port_map", &self.port_map)
            .finish()
    }
}

impl Context {
    pub fn new(blackboard: Blackboard) -> Self {
        Self {
            blackboard,
            port_map: BBMap::new(),
        }
    }

    pub fn take_blackboard(self) -> Blackboard {
        self.blackboard
    }

    /// Reads a value through the port bindings. Returns `None` when the key
    /// is unbound and absent from the blackboard, when the stored value has
    /// a different type, or when the binding is not readable.
    pub fn get<T: 'static>(&self, key: impl Into<Symbol>) -> Option<&T> {
        let key: Symbol = key.into();
        let mapped = match self.port_map.get(&key) {
            None => &key,
            Some(PortBinding::Ref(mapped, ty)) => {
                if !ty.is_readable() {
                    tracing::warn!(port = %key, "read through an output-only binding");
                    return None;
                }
                mapped
            }
            Some(PortBinding::Literal(lit)) => {
                return (lit as &dyn Any).downcast_ref();
            }
        };

        self.blackboard.get(mapped).and_then(|val| val.downcast_ref())
    }

    /// Like [`get`](Context::get), but falls back to parsing a stored or
    /// literal string when the value is not already a `T`. This is how
    /// numeric ports accept string literals from tree descriptions.
    pub fn get_parse<T>(&self, key: impl Into<Symbol>) -> Option<T>
    where
        T: FromStr + Clone + 'static,
    {
        let key: Symbol = key.into();
        if let Some(val) = self.get::<T>(key) {
            return Some(val.clone());
        }
        self.get::<String>(key).and_then(|s| s.parse().ok())
    }

    /// Reads a mandatory input port, recording a diagnostic when it cannot
    /// be resolved. Leaves turn the error into a `Failure` status.
    pub fn require<T: 'static>(
        &self,
        key: impl Into<Symbol>,
    ) -> Result<&T, PortResolutionError> {
        let key: Symbol = key.into();
        self.get(key).ok_or_else(|| {
            let err = PortResolutionError { port: key };
            tracing::warn!(port = %key, "required input port could not be resolved");
            err
        })
    }

    /// Writes a value through the port bindings. The write is refused with a
    /// diagnostic when the binding is a literal or not writable, or when the
    /// target entry already holds a different type.
    pub fn set<T: 'static>(&mut self, key: impl Into<Symbol>, val: T) {
        let key = key.into();
        let mapped = match self.port_map.get(&key) {
            None => key,
            Some(PortBinding::Ref(mapped, ty)) => {
                if !ty.is_writable() {
                    tracing::warn!(port = %key, "refusing write through an input-only binding");
                    return;
                }
                *mapped
            }
            Some(PortBinding::Literal(_)) => {
                tracing::warn!(port = %key, "refusing write to a literal binding");
                return;
            }
        };
        if let Some(existing) = self.blackboard.get(&mapped) {
            if (**existing).type_id() != TypeId::of::<T>() {
                tracing::warn!(key = %mapped, "refusing write that would change the stored type");
                return;
            }
        }
        self.blackboard.insert(mapped, Rc::new(val));
    }

    /// Type-erased read used by subtree parameter passing.
    pub(crate) fn get_any(&self, key: Symbol) -> Option<Rc<dyn Any>> {
        match self.port_map.get(&key) {
            None => self.blackboard.get(&key).cloned(),
            Some(PortBinding::Ref(mapped, ty)) if ty.is_readable() => {
                self.blackboard.get(mapped).cloned()
            }
            Some(PortBinding::Ref(..)) => None,
            Some(PortBinding::Literal(lit)) => Some(Rc::new(lit.clone()) as Rc<dyn Any>),
        }
    }

    /// Type-erased write used by subtree parameter passing. Follows the same
    /// refusal rules as [`set`](Context::set).
    pub(crate) fn set_any(&mut self, key: Symbol, val: Rc<dyn Any>) {
        let mapped = match self.port_map.get(&key) {
            None => key,
            Some(PortBinding::Ref(mapped, ty)) if ty.is_writable() => *mapped,
            Some(PortBinding::Ref(..)) | Some(PortBinding::Literal(_)) => {
                tracing::warn!(port = %key, "refusing write through a non-writable binding");
                return;
            }
        };
        if let Some(existing) = self.blackboard.get(&mapped) {
            if (**existing).type_id() != (*val).type_id() {
                tracing::warn!(key = %mapped, "refusing write that would change the stored type");
                return;
            }
        }
        self.blackboard.insert(mapped, val);
    }
}
