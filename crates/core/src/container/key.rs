//! Typed keys for container entries.
//!
//! A [`ServiceKey`] pairs the string identifier an entry is stored under with
//! the Rust type stored there, so lookups are checked at compile time while the
//! container itself stays a plain name-keyed registry.
//!
//! ```rust
//! use stencil_core::container::{Container, ServiceKey};
//!
//! const GREETING: ServiceKey<String> = ServiceKey::new("greeting");
//!
//! let mut container = Container::new();
//! container.set(GREETING, "hello".to_string());
//! assert_eq!(container.get(GREETING).unwrap().as_str(), "hello");
//! ```

use std::fmt;
use std::marker::PhantomData;

/// Identifier of a container entry holding a `T`
pub struct ServiceKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ServiceKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    /// The string identifier the entry is stored under
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Type name of the stored value, used in diagnostics
    pub fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

impl<T> Clone for ServiceKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ServiceKey<T> {}

impl<T> fmt::Debug for ServiceKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceKey")
            .field("name", &self.name)
            .field("type", &self.type_name())
            .finish()
    }
}

impl<T> fmt::Display for ServiceKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
