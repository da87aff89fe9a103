//! # Otter Proxy
//!
//! Proxy/Reflect style interception for Otter records and functions.
//!
//! An [`InterceptingHandle`] wraps a target and a [`TrapSet`]. Operations on
//! the handle (`read`, `write`, `remove`, `contains`, `list_keys`,
//! `describe`, `invoke`) run the matching trap if one is installed and
//! otherwise fall through to the default behavior in [`reflect`], so a handle
//! with no traps is indistinguishable from its target.
//!
//! ## Design Principles
//!
//! - **Single-threaded**: values are `Rc`/`RefCell` based; handles are `!Send`
//! - **Narrow value model**: a fixed [`Value`] enum instead of arbitrary shapes
//! - **Explicit receivers**: functions take their caller context as an argument
//! - **Explicit failures**: rejected writes and denied access are errors, never
//!   silent no-ops

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod descriptor;
pub mod enumerate;
pub mod error;
pub mod function;
pub mod guard;
pub mod handle;
pub mod key;
pub mod presets;
pub mod record;
pub mod reflect;
pub mod scheduler;
pub mod trap;
pub mod value;

pub use config::{ProtectionConfig, ProxyConfig, SchedulerConfig};
pub use descriptor::{PropertyAttributes, PropertyDescriptor};
pub use enumerate::OwnKeys;
pub use error::{ProxyError, ProxyResult};
pub use function::{Args, Function};
pub use guard::KeyGuard;
pub use handle::{InterceptingHandle, RevocableHandle};
pub use key::PropertyKey;
pub use record::{Record, SharedRecord};
pub use scheduler::{RunReport, Scheduler, TimerId};
pub use trap::{TrapKind, TrapSet};
pub use value::Value;
