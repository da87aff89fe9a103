//! Intercepting handles
//!
//! An [`InterceptingHandle`] stands in for its target. Every operation looks
//! up the matching trap and either runs it or forwards to the default
//! behavior in [`crate::reflect`]. The target/trap association is fixed at
//! construction; the only state a handle owns is its revocation flag.
//!
//! ## Usage
//!
//! ```
//! use otter_proxy::{InterceptingHandle, Record, TrapSet, Value};
//!
//! let numbers = Record::array([1, 2, 3, 4]).into_shared();
//! let traps = TrapSet::new().on_get(|target, key, _receiver| {
//!     let value = otter_proxy::reflect::get(target, key)?;
//!     Ok(if value.is_undefined() { Value::number(0.0) } else { value })
//! });
//! let handle = InterceptingHandle::over_record(&numbers, traps);
//!
//! assert_eq!(handle.read(1).unwrap(), Value::number(2.0));
//! assert_eq!(handle.read(100).unwrap(), Value::number(0.0));
//! ```

use crate::descriptor::PropertyDescriptor;
use crate::enumerate::{self, OwnKeys};
use crate::error::{ProxyError, ProxyResult};
use crate::function::Function;
use crate::key::PropertyKey;
use crate::record::SharedRecord;
use crate::reflect;
use crate::trap::{TrapKind, TrapSet};
use crate::value::Value;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

const TRACE_TARGET: &str = "otter::proxy";

struct HandleInner {
    /// The wrapped record or function
    target: Value,
    /// Interceptors
    traps: TrapSet,
    /// Whether this handle has been revoked
    revoked: Cell<bool>,
}

/// A proxy over a record or function
///
/// Clones share the target, the traps, and the revocation state.
#[derive(Clone)]
pub struct InterceptingHandle {
    inner: Rc<HandleInner>,
}

impl fmt::Debug for InterceptingHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_revoked() {
            write!(f, "Proxy {{ <revoked> }}")
        } else {
            write!(f, "Proxy {{ target: {:?}, {:?} }}", self.inner.target, self.inner.traps)
        }
    }
}

/// Result of creating a revocable handle
pub struct RevocableHandle {
    /// The handle
    pub handle: InterceptingHandle,
    /// Revokes the handle (internally calls `handle.revoke()`)
    pub revoke: Rc<dyn Fn()>,
}

impl InterceptingHandle {
    /// Create a handle over a record or function target
    pub fn new(target: Value, traps: TrapSet) -> ProxyResult<Self> {
        if !target.is_record() && !target.is_callable() {
            return Err(ProxyError::type_error(format!(
                "Cannot create proxy with a non-object as target ({})",
                target.type_of()
            )));
        }
        Ok(Self::from_parts(target, traps))
    }

    /// Create a handle over a shared record
    pub fn over_record(record: &SharedRecord, traps: TrapSet) -> Self {
        Self::from_parts(Value::Record(Rc::clone(record)), traps)
    }

    /// Create a handle over a function
    pub fn over_function(function: Function, traps: TrapSet) -> Self {
        Self::from_parts(Value::Function(function), traps)
    }

    /// Create a revocable handle
    pub fn revocable(target: Value, traps: TrapSet) -> ProxyResult<RevocableHandle> {
        let handle = Self::new(target, traps)?;
        let handle_for_revoke = handle.clone();
        Ok(RevocableHandle {
            handle,
            revoke: Rc::new(move || handle_for_revoke.revoke()),
        })
    }

    fn from_parts(target: Value, traps: TrapSet) -> Self {
        Self {
            inner: Rc::new(HandleInner {
                target,
                traps,
                revoked: Cell::new(false),
            }),
        }
    }

    /// Get the target
    ///
    /// Returns `None` if the handle has been revoked.
    pub fn target(&self) -> Option<&Value> {
        if self.is_revoked() {
            None
        } else {
            Some(&self.inner.target)
        }
    }

    /// Get the trap set
    pub fn traps(&self) -> &TrapSet {
        &self.inner.traps
    }

    /// Check if this handle has been revoked
    pub fn is_revoked(&self) -> bool {
        self.inner.revoked.get()
    }

    /// Revoke this handle
    ///
    /// After revocation, every operation fails with [`ProxyError::Revoked`].
    pub fn revoke(&self) {
        if !self.inner.revoked.replace(true) {
            tracing::debug!(target: TRACE_TARGET, "proxy revoked");
        }
    }

    /// Whether two handles are clones of each other
    pub fn ptr_eq(&self, other: &InterceptingHandle) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn live_target(&self, kind: TrapKind) -> ProxyResult<&Value> {
        self.target().ok_or(ProxyError::Revoked {
            operation: kind.name(),
        })
    }

    fn trace(&self, kind: TrapKind, key: Option<&PropertyKey>) {
        let intercepted = self.inner.traps.has_trap(kind);
        match key {
            Some(key) => tracing::trace!(target: TRACE_TARGET, trap = %kind, key = %key, intercepted, "proxy operation"),
            None => tracing::trace!(target: TRACE_TARGET, trap = %kind, intercepted, "proxy operation"),
        }
    }

    /// Read a property
    ///
    /// Without a `get` trap, a missing key reads as [`Value::Undefined`].
    pub fn read(&self, key: impl Into<PropertyKey>) -> ProxyResult<Value> {
        let key = key.into();
        let target = self.live_target(TrapKind::Get)?;
        self.trace(TrapKind::Get, Some(&key));
        match &self.inner.traps.get {
            Some(trap) => trap(target, &key, self),
            None => reflect::get(target, &key),
        }
    }

    /// Read a property, binding function values to the target
    ///
    /// Non-function values are returned unchanged.
    pub fn read_bound(&self, key: impl Into<PropertyKey>) -> ProxyResult<Value> {
        let value = self.read(key)?;
        match value {
            Value::Function(function) => {
                let target = self.live_target(TrapKind::Get)?.clone();
                Ok(Value::Function(function.bind(target)))
            }
            other => Ok(other),
        }
    }

    /// Write a property, reporting whether the write was accepted
    ///
    /// A `set` trap decides acceptance; accepted values are then assigned to
    /// the target. A rejected write leaves the target untouched.
    pub fn try_write(&self, key: impl Into<PropertyKey>, value: impl Into<Value>) -> ProxyResult<bool> {
        let key = key.into();
        let value = value.into();
        let target = self.live_target(TrapKind::Set)?;
        self.trace(TrapKind::Set, Some(&key));

        let accepted = match &self.inner.traps.set {
            Some(trap) => trap(target, &key, &value)?,
            None => true,
        };
        if !accepted {
            tracing::debug!(target: TRACE_TARGET, key = %key, "set trap rejected value");
            return Ok(false);
        }
        reflect::set(target, &key, value)
    }

    /// Write a property; a rejected write is a [`ProxyError::ValidationFailed`]
    pub fn write(&self, key: impl Into<PropertyKey>, value: impl Into<Value>) -> ProxyResult<()> {
        let key = key.into();
        if self.try_write(&key, value)? {
            Ok(())
        } else {
            Err(ProxyError::ValidationFailed { key })
        }
    }

    /// Append at the target's next free index through [`Self::write`]
    pub fn push(&self, value: impl Into<Value>) -> ProxyResult<u32> {
        let target = self.live_target(TrapKind::Set)?;
        let index = reflect::borrow(reflect::target_record(target, "set")?)?.next_index()?;
        self.write(index, value)?;
        Ok(index)
    }

    /// Remove a property
    ///
    /// A `deleteProperty` trap performs (or refuses) the deletion itself and
    /// may raise [`ProxyError::AccessDenied`].
    pub fn remove(&self, key: impl Into<PropertyKey>) -> ProxyResult<bool> {
        let key = key.into();
        let target = self.live_target(TrapKind::Delete)?;
        self.trace(TrapKind::Delete, Some(&key));
        match &self.inner.traps.delete {
            Some(trap) => trap(target, &key),
            None => reflect::delete_property(target, &key),
        }
    }

    /// Membership test
    ///
    /// A `has` trap may implement membership unrelated to key presence.
    pub fn contains(&self, key: impl Into<PropertyKey>) -> ProxyResult<bool> {
        let key = key.into();
        let target = self.live_target(TrapKind::Has)?;
        self.trace(TrapKind::Has, Some(&key));
        match &self.inner.traps.has {
            Some(trap) => trap(target, &key),
            None => reflect::has(target, &key),
        }
    }

    /// Own keys, in trap order or target insertion order
    pub fn list_keys(&self) -> ProxyResult<OwnKeys> {
        let target = self.live_target(TrapKind::EnumerateKeys)?;
        self.trace(TrapKind::EnumerateKeys, None);
        let keys = match &self.inner.traps.enumerate_keys {
            Some(trap) => trap(target)?,
            None => reflect::own_keys(target)?,
        };
        Ok(OwnKeys::from(keys))
    }

    /// Own property descriptor
    pub fn describe(&self, key: impl Into<PropertyKey>) -> ProxyResult<Option<PropertyDescriptor>> {
        let key = key.into();
        let target = self.live_target(TrapKind::DescribeKey)?;
        self.trace(TrapKind::DescribeKey, Some(&key));
        match &self.inner.traps.describe_key {
            Some(trap) => trap(target, &key),
            None => reflect::get_own_property_descriptor(target, &key),
        }
    }

    /// Call a function target with an explicit caller context
    ///
    /// Only valid for function targets, even when an `apply` trap is present.
    pub fn invoke(&self, args: &[Value], this: &Value) -> ProxyResult<Value> {
        let target = self.live_target(TrapKind::Call)?;
        if !target.is_callable() {
            return Err(ProxyError::not_callable(format!("{self:?}")));
        }
        self.trace(TrapKind::Call, None);
        match &self.inner.traps.call {
            Some(trap) => trap(target, this, args),
            None => reflect::apply(target, this, args),
        }
    }

    /// Keys a `for..in` loop would visit
    pub fn visible_keys(&self) -> ProxyResult<Vec<PropertyKey>> {
        enumerate::visible_keys(self)
    }

    /// Visible keys paired with their values
    pub fn visible_entries(&self) -> ProxyResult<Vec<(PropertyKey, Value)>> {
        enumerate::visible_entries(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    fn user() -> SharedRecord {
        [("name", "John")].into_iter().collect::<Record>().into_shared()
    }

    #[test]
    fn test_handle_creation() {
        let handle = InterceptingHandle::over_record(&user(), TrapSet::new());
        assert!(!handle.is_revoked());
        assert!(handle.target().is_some());
        assert!(handle.traps().is_empty());
    }

    #[test]
    fn test_primitive_target_rejected() {
        let err = InterceptingHandle::new(Value::number(1.0), TrapSet::new()).unwrap_err();
        assert!(matches!(err, ProxyError::TypeError(_)));
    }

    #[test]
    fn test_handle_revoke() {
        let handle = InterceptingHandle::over_record(&user(), TrapSet::new());
        let clone = handle.clone();
        handle.revoke();
        assert!(clone.is_revoked());
        assert!(clone.target().is_none());
        assert_eq!(
            clone.read("name").unwrap_err(),
            ProxyError::Revoked { operation: "get" }
        );
    }

    #[test]
    fn test_revocable_handle() {
        let record = user();
        let RevocableHandle { handle, revoke } =
            InterceptingHandle::revocable(Value::Record(record), TrapSet::new()).unwrap();
        assert_eq!(handle.read("name").unwrap(), Value::from("John"));
        revoke();
        assert!(handle.is_revoked());
        assert!(handle.list_keys().is_err());
    }

    #[test]
    fn test_get_trap_receives_handle() {
        let traps = TrapSet::new().on_get(|_, key, receiver| {
            if key.as_str() == Some("self") {
                Ok(Value::boolean(receiver.traps().has_trap(TrapKind::Get)))
            } else {
                Ok(Value::undefined())
            }
        });
        let handle = InterceptingHandle::over_record(&user(), traps);
        assert_eq!(handle.read("self").unwrap(), Value::boolean(true));
    }

    #[test]
    fn test_push_goes_through_set_trap() {
        let numbers = Record::array([1]).into_shared();
        let traps = TrapSet::new().on_set(|_, _, value| Ok(value.is_number()));
        let handle = InterceptingHandle::over_record(&numbers, traps);
        assert_eq!(handle.push(2).unwrap(), 1);
        assert!(handle.push("string").unwrap_err().is_validation_failed());
        assert_eq!(numbers.borrow().len(), 2);
    }

    #[test]
    fn test_number_keys_read_back_by_spelling() {
        let record = Record::new().into_shared();
        let handle = InterceptingHandle::over_record(&record, TrapSet::new());
        handle.write(1e20, "big").unwrap();
        handle.write(1e-6, "small").unwrap();
        assert_eq!(handle.read("100000000000000000000").unwrap(), Value::from("big"));
        assert_eq!(handle.read("0.000001").unwrap(), Value::from("small"));
        assert_eq!(handle.list_keys().unwrap().to_strings(), vec!["100000000000000000000", "0.000001"]);
    }

    #[test]
    fn test_push_past_last_index_fails() {
        let record = Record::new().into_shared();
        record.borrow_mut().set(u32::MAX - 1, "last");
        let handle = InterceptingHandle::over_record(&record, TrapSet::new());

        for _ in 0..2 {
            let err = handle.push("overflow").unwrap_err();
            assert!(matches!(err, ProxyError::TypeError(_)));
        }
        assert_eq!(record.borrow().len(), 1);
        assert_eq!(record.borrow().get(&PropertyKey::Index(u32::MAX - 1)), Some(Value::from("last")));
        assert!(handle.read("4294967295").unwrap().is_undefined());
    }

    #[test]
    fn test_read_bound_only_binds_functions() {
        let record = user();
        let has_name = Function::new("hasName", |this, _| {
            let name = reflect::get(this, &PropertyKey::from("name"))?;
            Ok(Value::boolean(!name.is_undefined()))
        });
        record.borrow_mut().set("hasName", has_name);
        let handle = InterceptingHandle::over_record(&record, TrapSet::new());

        assert_eq!(handle.read_bound("name").unwrap(), Value::from("John"));
        let method = handle.read_bound("hasName").unwrap();
        let method = method.as_function().unwrap();
        assert_eq!(method.call(&Value::undefined(), &[]).unwrap(), Value::boolean(true));
    }

    #[test]
    fn test_invoke_requires_function_target() {
        let traps = TrapSet::new().on_call(|_, _, _| Ok(Value::null()));
        let handle = InterceptingHandle::over_record(&user(), traps);
        let err = handle.invoke(&[], &Value::undefined()).unwrap_err();
        assert!(matches!(err, ProxyError::NotCallable(_)));
    }

    #[test]
    fn test_trap_may_reenter_handle() {
        let record = user();
        let traps = TrapSet::new().on_has(|target, key| reflect::has(target, key));
        let handle = InterceptingHandle::over_record(&record, traps);
        let reader = handle.clone();
        let outer = InterceptingHandle::over_record(
            &record,
            TrapSet::new().on_get(move |_, key, _| reader.read(key)),
        );
        assert!(handle.contains("name").unwrap());
        assert_eq!(outer.read("name").unwrap(), Value::from("John"));
    }
}
