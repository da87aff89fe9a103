//! Property attributes and descriptors

use crate::value::Value;

/// Property attributes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PropertyAttributes {
    /// Property is writable
    pub writable: bool,
    /// Property is enumerable
    pub enumerable: bool,
    /// Property is configurable
    pub configurable: bool,
}

impl PropertyAttributes {
    /// Default data property attributes
    pub const fn data() -> Self {
        Self {
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// Non-writable, non-enumerable, non-configurable
    pub const fn frozen() -> Self {
        Self {
            writable: false,
            enumerable: false,
            configurable: false,
        }
    }

    /// Writable and configurable, but skipped by enumeration
    pub const fn hidden() -> Self {
        Self {
            writable: true,
            enumerable: false,
            configurable: true,
        }
    }
}

/// Property descriptor
///
/// A descriptor reported by a `describe_key` trap may omit the value; only
/// the attributes matter to enumeration consumers.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyDescriptor {
    /// The value, when known
    pub value: Option<Value>,
    /// Attributes
    pub attributes: PropertyAttributes,
}

impl PropertyDescriptor {
    /// Create a data property with default attributes
    pub fn data(value: Value) -> Self {
        Self {
            value: Some(value),
            attributes: PropertyAttributes::data(),
        }
    }

    /// Create a data property with specific attributes
    pub fn data_with_attrs(value: Value, attributes: PropertyAttributes) -> Self {
        Self {
            value: Some(value),
            attributes,
        }
    }

    /// Create a value-less descriptor carrying only attribute flags
    pub fn flags(enumerable: bool, configurable: bool) -> Self {
        Self {
            value: None,
            attributes: PropertyAttributes {
                writable: false,
                enumerable,
                configurable,
            },
        }
    }

    /// Get the value
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Whether the property is enumerable
    pub fn is_enumerable(&self) -> bool {
        self.attributes.enumerable
    }

    /// Whether the property is configurable
    pub fn is_configurable(&self) -> bool {
        self.attributes.configurable
    }

    /// Whether the property is writable
    pub fn is_writable(&self) -> bool {
        self.attributes.writable
    }
}
