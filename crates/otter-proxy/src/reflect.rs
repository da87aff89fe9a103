//! Default object operations
//!
//! These mirror the `Reflect` static methods and are what an
//! [`InterceptingHandle`](crate::InterceptingHandle) falls through to when a
//! trap is absent. Traps can call them to forward an operation to the target:
//! - `get(target, key)`
//! - `set(target, key, value)`
//! - `has(target, key)`
//! - `delete_property(target, key)`
//! - `own_keys(target)`
//! - `get_own_property_descriptor(target, key)`
//! - `define_property(target, key, descriptor)`
//! - `apply(target, this, args)`

use crate::descriptor::PropertyDescriptor;
use crate::error::{ProxyError, ProxyResult};
use crate::key::PropertyKey;
use crate::record::{Record, SharedRecord};
use crate::value::Value;
use std::cell::{Ref, RefMut};

/// Get the record behind a target, or a TypeError naming the operation
pub fn target_record<'a>(target: &'a Value, operation: &str) -> ProxyResult<&'a SharedRecord> {
    target.as_record().ok_or_else(|| {
        ProxyError::type_error(format!(
            "Reflect.{} requires a record target (got {})",
            operation,
            target.type_of()
        ))
    })
}

/// Borrow a shared record for reading
pub fn borrow(record: &SharedRecord) -> ProxyResult<Ref<'_, Record>> {
    record
        .try_borrow()
        .map_err(|_| ProxyError::type_error("record is being mutated"))
}

/// Borrow a shared record for writing
pub fn borrow_mut(record: &SharedRecord) -> ProxyResult<RefMut<'_, Record>> {
    record
        .try_borrow_mut()
        .map_err(|_| ProxyError::type_error("record is already borrowed"))
}

/// Reflect.get: the own value, or undefined when absent
pub fn get(target: &Value, key: &PropertyKey) -> ProxyResult<Value> {
    let record = target_record(target, "get")?;
    Ok(borrow(record)?.get(key).unwrap_or_default())
}

/// Reflect.set: assign, returning whether the assignment happened
pub fn set(target: &Value, key: &PropertyKey, value: Value) -> ProxyResult<bool> {
    let record = target_record(target, "set")?;
    Ok(borrow_mut(record)?.set(key, value))
}

/// Reflect.has: literal own-key presence
pub fn has(target: &Value, key: &PropertyKey) -> ProxyResult<bool> {
    let record = target_record(target, "has")?;
    Ok(borrow(record)?.contains_key(key))
}

/// Reflect.deleteProperty
pub fn delete_property(target: &Value, key: &PropertyKey) -> ProxyResult<bool> {
    let record = target_record(target, "deleteProperty")?;
    Ok(borrow_mut(record)?.delete(key))
}

/// Reflect.ownKeys: keys in insertion order
pub fn own_keys(target: &Value) -> ProxyResult<Vec<PropertyKey>> {
    let record = target_record(target, "ownKeys")?;
    Ok(borrow(record)?.own_keys())
}

/// Reflect.getOwnPropertyDescriptor
pub fn get_own_property_descriptor(
    target: &Value,
    key: &PropertyKey,
) -> ProxyResult<Option<PropertyDescriptor>> {
    let record = target_record(target, "getOwnPropertyDescriptor")?;
    Ok(borrow(record)?.get_own_property_descriptor(key))
}

/// Reflect.defineProperty
///
/// Redefining a non-configurable property is refused.
pub fn define_property(
    target: &Value,
    key: &PropertyKey,
    desc: PropertyDescriptor,
) -> ProxyResult<bool> {
    let record = target_record(target, "defineProperty")?;
    let mut record = borrow_mut(record)?;
    if let Some(existing) = record.get_own_property_descriptor(key)
        && !existing.is_configurable()
    {
        return Ok(false);
    }
    record.define_property(key, desc);
    Ok(true)
}

/// Reflect.apply: call a function target with an explicit caller context
pub fn apply(target: &Value, this: &Value, args: &[Value]) -> ProxyResult<Value> {
    let function = target
        .as_function()
        .ok_or_else(|| ProxyError::not_callable(format!("{:?}", target)))?;
    function.call(this, args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::Function;

    fn user() -> Value {
        Value::record([("name", "John")].into_iter().collect())
    }

    #[test]
    fn test_get_set_has() {
        let target = user();
        let name = PropertyKey::from("name");
        let age = PropertyKey::from("age");
        assert_eq!(get(&target, &name).unwrap(), Value::from("John"));
        assert!(get(&target, &age).unwrap().is_undefined());
        assert!(!has(&target, &age).unwrap());
        assert!(set(&target, &age, 30.into()).unwrap());
        assert!(has(&target, &age).unwrap());
    }

    #[test]
    fn test_define_property_respects_configurable() {
        use crate::descriptor::PropertyAttributes;

        let target = user();
        let id = PropertyKey::from("id");
        let frozen = PropertyDescriptor::data_with_attrs(1.into(), PropertyAttributes::frozen());
        assert!(define_property(&target, &id, frozen).unwrap());
        assert!(!define_property(&target, &id, PropertyDescriptor::data(2.into())).unwrap());
        assert!(!delete_property(&target, &id).unwrap());
    }

    #[test]
    fn test_record_operation_on_function_is_type_error() {
        let target = Value::function(Function::new("f", |_, _| Ok(Value::undefined())));
        let err = get(&target, &PropertyKey::from("x")).unwrap_err();
        assert!(matches!(err, ProxyError::TypeError(_)));
    }

    #[test]
    fn test_apply_requires_function() {
        let err = apply(&user(), &Value::undefined(), &[]).unwrap_err();
        assert!(matches!(err, ProxyError::NotCallable(_)));
    }

    #[test]
    fn test_borrow_conflict_is_reported() {
        let target = user();
        let record = target.as_record().unwrap();
        let _guard = record.borrow();
        let err = set(&target, &PropertyKey::from("x"), 1.into()).unwrap_err();
        assert!(matches!(err, ProxyError::TypeError(_)));
    }
}
