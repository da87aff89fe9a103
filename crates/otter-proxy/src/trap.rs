//! Trap sets
//!
//! A [`TrapSet`] holds one optional interceptor per operation kind. A present
//! trap fully decides the outcome of its operation; an absent one lets the
//! handle forward the operation to the target unchanged.

use crate::descriptor::PropertyDescriptor;
use crate::error::ProxyResult;
use crate::handle::InterceptingHandle;
use crate::key::PropertyKey;
use crate::value::Value;
use std::fmt;
use std::rc::Rc;

/// `get(target, key, receiver)`
pub type GetTrap = dyn Fn(&Value, &PropertyKey, &InterceptingHandle) -> ProxyResult<Value>;
/// `set(target, key, value)`; `false` rejects the write
pub type SetTrap = dyn Fn(&Value, &PropertyKey, &Value) -> ProxyResult<bool>;
/// `has(target, key)`
pub type HasTrap = dyn Fn(&Value, &PropertyKey) -> ProxyResult<bool>;
/// `deleteProperty(target, key)`; the trap performs the deletion itself
pub type DeleteTrap = dyn Fn(&Value, &PropertyKey) -> ProxyResult<bool>;
/// `ownKeys(target)`
pub type EnumerateKeysTrap = dyn Fn(&Value) -> ProxyResult<Vec<PropertyKey>>;
/// `getOwnPropertyDescriptor(target, key)`
pub type DescribeKeyTrap = dyn Fn(&Value, &PropertyKey) -> ProxyResult<Option<PropertyDescriptor>>;
/// `apply(target, this, args)`
pub type CallTrap = dyn Fn(&Value, &Value, &[Value]) -> ProxyResult<Value>;

/// Operation kinds a handle can intercept
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrapKind {
    /// Property read
    Get,
    /// Property write
    Set,
    /// Membership test
    Has,
    /// Property removal
    Delete,
    /// Own key listing
    EnumerateKeys,
    /// Own property descriptor lookup
    DescribeKey,
    /// Function call
    Call,
}

impl TrapKind {
    /// All kinds, in declaration order
    pub const ALL: [TrapKind; 7] = [
        TrapKind::Get,
        TrapKind::Set,
        TrapKind::Has,
        TrapKind::Delete,
        TrapKind::EnumerateKeys,
        TrapKind::DescribeKey,
        TrapKind::Call,
    ];

    /// Handler method name, as the trap is known in `Proxy` handlers
    pub const fn name(self) -> &'static str {
        match self {
            TrapKind::Get => "get",
            TrapKind::Set => "set",
            TrapKind::Has => "has",
            TrapKind::Delete => "deleteProperty",
            TrapKind::EnumerateKeys => "ownKeys",
            TrapKind::DescribeKey => "getOwnPropertyDescriptor",
            TrapKind::Call => "apply",
        }
    }
}

impl fmt::Display for TrapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Optional interceptors, one per [`TrapKind`]
#[derive(Clone, Default)]
pub struct TrapSet {
    pub(crate) get: Option<Rc<GetTrap>>,
    pub(crate) set: Option<Rc<SetTrap>>,
    pub(crate) has: Option<Rc<HasTrap>>,
    pub(crate) delete: Option<Rc<DeleteTrap>>,
    pub(crate) enumerate_keys: Option<Rc<EnumerateKeysTrap>>,
    pub(crate) describe_key: Option<Rc<DescribeKeyTrap>>,
    pub(crate) call: Option<Rc<CallTrap>>,
}

impl TrapSet {
    /// Empty trap set: a fully transparent handle
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a `get` trap
    pub fn on_get<F>(mut self, trap: F) -> Self
    where
        F: Fn(&Value, &PropertyKey, &InterceptingHandle) -> ProxyResult<Value> + 'static,
    {
        self.get = Some(Rc::new(trap));
        self
    }

    /// Install a `set` trap
    pub fn on_set<F>(mut self, trap: F) -> Self
    where
        F: Fn(&Value, &PropertyKey, &Value) -> ProxyResult<bool> + 'static,
    {
        self.set = Some(Rc::new(trap));
        self
    }

    /// Install a `has` trap
    pub fn on_has<F>(mut self, trap: F) -> Self
    where
        F: Fn(&Value, &PropertyKey) -> ProxyResult<bool> + 'static,
    {
        self.has = Some(Rc::new(trap));
        self
    }

    /// Install a `deleteProperty` trap
    pub fn on_delete<F>(mut self, trap: F) -> Self
    where
        F: Fn(&Value, &PropertyKey) -> ProxyResult<bool> + 'static,
    {
        self.delete = Some(Rc::new(trap));
        self
    }

    /// Install an `ownKeys` trap
    pub fn on_enumerate_keys<F>(mut self, trap: F) -> Self
    where
        F: Fn(&Value) -> ProxyResult<Vec<PropertyKey>> + 'static,
    {
        self.enumerate_keys = Some(Rc::new(trap));
        self
    }

    /// Install a `getOwnPropertyDescriptor` trap
    pub fn on_describe_key<F>(mut self, trap: F) -> Self
    where
        F: Fn(&Value, &PropertyKey) -> ProxyResult<Option<PropertyDescriptor>> + 'static,
    {
        self.describe_key = Some(Rc::new(trap));
        self
    }

    /// Install an `apply` trap
    pub fn on_call<F>(mut self, trap: F) -> Self
    where
        F: Fn(&Value, &Value, &[Value]) -> ProxyResult<Value> + 'static,
    {
        self.call = Some(Rc::new(trap));
        self
    }

    /// Layer `other` on top of `self`: traps present in `other` win
    pub fn merge(self, other: TrapSet) -> Self {
        Self {
            get: other.get.or(self.get),
            set: other.set.or(self.set),
            has: other.has.or(self.has),
            delete: other.delete.or(self.delete),
            enumerate_keys: other.enumerate_keys.or(self.enumerate_keys),
            describe_key: other.describe_key.or(self.describe_key),
            call: other.call.or(self.call),
        }
    }

    /// Check if the set has a trap for `kind`
    pub fn has_trap(&self, kind: TrapKind) -> bool {
        match kind {
            TrapKind::Get => self.get.is_some(),
            TrapKind::Set => self.set.is_some(),
            TrapKind::Has => self.has.is_some(),
            TrapKind::Delete => self.delete.is_some(),
            TrapKind::EnumerateKeys => self.enumerate_keys.is_some(),
            TrapKind::DescribeKey => self.describe_key.is_some(),
            TrapKind::Call => self.call.is_some(),
        }
    }

    /// Whether no trap is installed
    pub fn is_empty(&self) -> bool {
        TrapKind::ALL.iter().all(|kind| !self.has_trap(*kind))
    }
}

impl fmt::Debug for TrapSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let installed: Vec<&str> = TrapKind::ALL
            .iter()
            .filter(|kind| self.has_trap(**kind))
            .map(|kind| kind.name())
            .collect();
        f.debug_struct("TrapSet").field("traps", &installed).finish()
    }
}
