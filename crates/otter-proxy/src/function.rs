//! Function values
//!
//! Functions receive their caller context explicitly as the first argument
//! instead of through an implicit receiver.

use crate::error::ProxyResult;
use crate::value::Value;
use smallvec::SmallVec;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Native function signature: `(this, args) -> result`
pub type NativeFn = dyn Fn(&Value, &[Value]) -> ProxyResult<Value>;

/// Owned argument list; most calls carry only a handful of arguments
pub type Args = SmallVec<[Value; 4]>;

/// A callable value
#[derive(Clone)]
pub struct Function {
    name: Arc<str>,
    inner: Rc<NativeFn>,
}

impl Function {
    /// Create a named function
    pub fn new<F>(name: &str, f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> ProxyResult<Value> + 'static,
    {
        Self {
            name: Arc::from(name),
            inner: Rc::new(f),
        }
    }

    /// Function name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Call with an explicit caller context
    pub fn call(&self, this: &Value, args: &[Value]) -> ProxyResult<Value> {
        (self.inner)(this, args)
    }

    /// Create a function that always runs with `this` as its caller context,
    /// ignoring the context it is later called with
    pub fn bind(&self, this: Value) -> Function {
        let target = self.clone();
        let name = format!("bound {}", self.name);
        Function::new(&name, move |_ignored, args| target.call(&this, args))
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Function: {}]", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_passes_context() {
        let f = Function::new("describe", |this, args| {
            Ok(Value::string(&format!("{}:{}", this, args.len())))
        });
        let result = f.call(&Value::from("ctx"), &[Value::number(1.0)]).unwrap();
        assert_eq!(result, Value::from("ctx:1"));
    }

    #[test]
    fn test_bind_overrides_context() {
        let f = Function::new("whoami", |this, _args| Ok(this.clone()));
        let bound = f.bind(Value::from("owner"));
        assert_eq!(bound.name(), "bound whoami");
        assert_eq!(bound.call(&Value::from("other"), &[]).unwrap(), Value::from("owner"));
    }

    #[test]
    fn test_identity() {
        let f = Function::new("f", |_, _| Ok(Value::undefined()));
        let g = Function::new("f", |_, _| Ok(Value::undefined()));
        assert!(f.ptr_eq(&f.clone()));
        assert!(!f.ptr_eq(&g));
    }
}
