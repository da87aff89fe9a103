//! Ready-made trap sets
//!
//! Each preset returns a [`TrapSet`] so presets can be layered with
//! [`TrapSet::merge`].

use crate::descriptor::PropertyDescriptor;
use crate::error::{ProxyError, ProxyResult};
use crate::function::Args;
use crate::guard::KeyGuard;
use crate::key::PropertyKey;
use crate::reflect;
use crate::scheduler::Scheduler;
use crate::trap::TrapSet;
use crate::value::Value;
use std::rc::Rc;
use std::time::Duration;

/// `get` returning `fallback` for keys the target does not have
pub fn default_value(fallback: impl Into<Value>) -> TrapSet {
    let fallback = fallback.into();
    TrapSet::new().on_get(move |target, key, _receiver| read_or(target, key, fallback.clone()))
}

/// `get` returning the key itself for keys the target does not have
///
/// Turns a phrase dictionary into one that passes unknown phrases through.
pub fn echo_missing_key() -> TrapSet {
    TrapSet::new().on_get(|target, key, _receiver| {
        if reflect::has(target, key)? {
            reflect::get(target, key)
        } else {
            Ok(key.to_value())
        }
    })
}

/// `set` accepting only numbers
pub fn numbers_only() -> TrapSet {
    TrapSet::new().on_set(|_target, _key, value| Ok(value.is_number()))
}

/// `ownKeys` leaving out guarded keys
pub fn hide_keys(guard: KeyGuard) -> TrapSet {
    TrapSet::new().on_enumerate_keys(move |target| {
        let mut keys = reflect::own_keys(target)?;
        keys.retain(|key| !guard.is_protected(key));
        Ok(keys)
    })
}

/// Full protection of guarded keys
///
/// Reading, writing, or deleting a guarded key raises `AccessDenied`, and
/// guarded keys are left out of enumeration. Functions read through the
/// handle are bound to the target, so methods can still use guarded keys
/// internally.
pub fn protect(guard: KeyGuard) -> TrapSet {
    let get_guard = guard.clone();
    let set_guard = guard.clone();
    let delete_guard = guard.clone();
    TrapSet::new()
        .on_get(move |target, key, _receiver| {
            get_guard.check(key)?;
            match reflect::get(target, key)? {
                Value::Function(function) => Ok(Value::Function(function.bind(target.clone()))),
                other => Ok(other),
            }
        })
        .on_set(move |_target, key, _value| {
            set_guard.check(key)?;
            Ok(true)
        })
        .on_delete(move |target, key| {
            delete_guard.check(key)?;
            reflect::delete_property(target, key)
        })
        .merge(hide_keys(guard))
}

/// `has` treating the record as a numeric range
///
/// A key is "in" the record when it is numeric and strictly between the
/// values stored under `start_key` and `end_key`. Missing or non-numeric
/// bounds make every key fall outside the range.
pub fn range_membership(start_key: &str, end_key: &str) -> TrapSet {
    let start_key = PropertyKey::from(start_key);
    let end_key = PropertyKey::from(end_key);
    TrapSet::new().on_has(move |target, key| {
        let Some(n) = key.as_number() else {
            return Ok(false);
        };
        let start = reflect::get(target, &start_key)?.as_number();
        let end = reflect::get(target, &end_key)?.as_number();
        Ok(match (start, end) {
            (Some(start), Some(end)) => start < n && n < end,
            _ => false,
        })
    })
}

/// `getOwnPropertyDescriptor` reporting every key as enumerable and
/// configurable
///
/// Pair with an `ownKeys` trap that invents keys to make them visible to
/// `for..in` style enumeration.
pub fn always_enumerable() -> TrapSet {
    TrapSet::new().on_describe_key(|target, key| {
        let value = reflect::get(target, key)?;
        let mut desc = PropertyDescriptor::flags(true, true);
        desc.value = Some(value);
        Ok(Some(desc))
    })
}

/// `apply` that defers the call by `delay` on `scheduler`
///
/// The handle returns undefined immediately; the target runs later with the
/// caller context and arguments captured at invocation time.
pub fn delayed(scheduler: &Rc<Scheduler>, delay: Duration) -> TrapSet {
    let scheduler = Rc::clone(scheduler);
    TrapSet::new().on_call(move |target, this, args| {
        let function = target
            .as_function()
            .cloned()
            .ok_or_else(|| ProxyError::not_callable(format!("{target:?}")))?;
        let this = this.clone();
        let args: Args = args.iter().cloned().collect();
        scheduler.set_timeout(
            move || function.call(&this, &args).map(|_| ()),
            delay,
        );
        Ok(Value::undefined())
    })
}

/// `set` trap built from a predicate over the written value
pub fn validate<F>(predicate: F) -> TrapSet
where
    F: Fn(&Value) -> bool + 'static,
{
    TrapSet::new().on_set(move |_target, _key, value| Ok(predicate(value)))
}

/// The value under `key`, or `fallback` when the target does not have it
pub fn read_or(target: &Value, key: &PropertyKey, fallback: Value) -> ProxyResult<Value> {
    if reflect::has(target, key)? {
        reflect::get(target, key)
    } else {
        Ok(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::InterceptingHandle;
    use crate::record::Record;

    #[test]
    fn test_echo_missing_key() {
        let dictionary = [("hi", "hola"), ("bye", "adios")].into_iter().collect::<Record>().into_shared();
        let handle = InterceptingHandle::over_record(&dictionary, echo_missing_key());
        assert_eq!(handle.read("hi").unwrap(), Value::from("hola"));
        assert_eq!(handle.read("bye").unwrap(), Value::from("adios"));
        assert_eq!(handle.read("how are you").unwrap(), Value::from("how are you"));
    }

    #[test]
    fn test_default_value_keeps_present_falsy_values() {
        let record = [("zero", Value::number(0.0)), ("empty", Value::from(""))]
            .into_iter()
            .collect::<Record>()
            .into_shared();
        let handle = InterceptingHandle::over_record(&record, default_value("fallback"));
        assert_eq!(handle.read("empty").unwrap(), Value::from(""));
        assert_eq!(handle.read("missing").unwrap(), Value::from("fallback"));
    }

    #[test]
    fn test_protect_allows_public_writes() {
        let record = [("name", "John")].into_iter().collect::<Record>().into_shared();
        let handle = InterceptingHandle::over_record(&record, protect(KeyGuard::underscore()));
        handle.write("age", 23).unwrap();
        assert_eq!(handle.read("age").unwrap(), Value::number(23.0));
        assert!(handle.write("_age", 23).unwrap_err().is_access_denied());
        assert!(handle.remove("_age").unwrap_err().is_access_denied());
        assert!(handle.remove("age").unwrap());
        assert!(!record.borrow().contains_key(&"age".into()));
    }

    #[test]
    fn test_range_needs_numeric_keys_and_bounds() {
        let range = [("start", 1), ("end", 10)].into_iter().collect::<Record>().into_shared();
        let handle = InterceptingHandle::over_record(&range, range_membership("start", "end"));
        assert!(!handle.contains("start").unwrap());
        assert!(handle.contains(2.5).unwrap());
        assert!(!handle.contains(1).unwrap());
        assert!(!handle.contains(10).unwrap());

        let open = Record::new().into_shared();
        let handle = InterceptingHandle::over_record(&open, range_membership("start", "end"));
        assert!(!handle.contains(5).unwrap());
    }

    #[test]
    fn test_validate_predicate() {
        let record = Record::new().into_shared();
        let handle = InterceptingHandle::over_record(&record, validate(|v| v.as_str().is_some_and(|s| s.len() <= 3)));
        assert!(handle.try_write("a", "abc").unwrap());
        assert!(!handle.try_write("b", "abcd").unwrap());
        assert_eq!(record.borrow().len(), 1);
    }

    #[test]
    fn test_read_or() {
        let target = Value::record([("a", 1)].into_iter().collect());
        assert_eq!(read_or(&target, &"a".into(), Value::null()).unwrap(), Value::number(1.0));
        assert_eq!(read_or(&target, &"b".into(), Value::null()).unwrap(), Value::null());
    }
}
