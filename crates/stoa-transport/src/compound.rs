//! Aggregation of several service descriptors into one.
//!
//! A [`CompoundServiceDescriptor`] presents any number of child descriptors
//! as a single [`ServiceDescriptor`]: registration and configuration fan
//! out to the children in insertion order, documentation fans in through a
//! [`SwaggerJoiner`]. Compounds nest; a compound of compounds behaves like
//! the flattened list.
//!
//! # Example
//!
//! ```
//! use stoa_transport::CompoundServiceDescriptor;
//!
//! let compound = CompoundServiceDescriptor::new();
//! assert!(compound.is_empty());
//! ```

use bytes::Bytes;
use stoa_router::Router;
use tracing::trace;

use crate::error::SwaggerResult;
use crate::service::{ConfigurableServiceDescriptor, DescOption, ServiceDescriptor};
use crate::swagger::{SwaggerJoiner, SwaggerOption};

/// N service descriptors behind the [`ServiceDescriptor`] surface of one.
#[derive(Default)]
pub struct CompoundServiceDescriptor {
    children: Vec<Box<dyn ServiceDescriptor>>,
}

impl CompoundServiceDescriptor {
    /// Creates an empty compound.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a child descriptor. Order matters: registration,
    /// configuration, and documentation all walk children in insertion
    /// order.
    pub fn push(&mut self, descriptor: impl ServiceDescriptor + 'static) {
        self.children.push(Box::new(descriptor));
    }

    /// Appends an already-boxed child descriptor.
    pub fn push_boxed(&mut self, descriptor: Box<dyn ServiceDescriptor>) {
        self.children.push(descriptor);
    }

    /// Returns the number of direct children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Returns `true` if the compound has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl std::fmt::Debug for CompoundServiceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompoundServiceDescriptor")
            .field("children", &self.children.len())
            .finish()
    }
}

impl From<Vec<Box<dyn ServiceDescriptor>>> for CompoundServiceDescriptor {
    fn from(children: Vec<Box<dyn ServiceDescriptor>>) -> Self {
        Self { children }
    }
}

impl FromIterator<Box<dyn ServiceDescriptor>> for CompoundServiceDescriptor {
    fn from_iter<I: IntoIterator<Item = Box<dyn ServiceDescriptor>>>(iter: I) -> Self {
        Self {
            children: iter.into_iter().collect(),
        }
    }
}

impl ServiceDescriptor for CompoundServiceDescriptor {
    /// Registers every child on `router`, in insertion order. Children
    /// share the one router, so colliding paths resolve by the router's
    /// own rules.
    fn register_http(&self, router: &mut Router) {
        for child in &self.children {
            child.register_http(router);
        }
    }

    /// Collects every child's documentation with the same `options` and
    /// joins the blobs.
    ///
    /// Every child is asked even after one fails; the first failure is
    /// returned once the walk completes, so a broken child never hides
    /// which siblings would also break.
    fn swagger_def(&self, options: &[SwaggerOption]) -> SwaggerResult<Bytes> {
        let mut joiner = SwaggerJoiner::new();
        let mut first_error = None;
        for child in &self.children {
            match child.swagger_def(options) {
                Ok(blob) => joiner.add_definition(blob),
                Err(err) => {
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => joiner.sum_definitions(),
        }
    }

    fn as_configurable(&self) -> Option<&dyn ConfigurableServiceDescriptor> {
        Some(self)
    }
}

impl ConfigurableServiceDescriptor for CompoundServiceDescriptor {
    /// Forwards `options` to every child that takes configuration.
    ///
    /// Children without the configurable capability are skipped without
    /// error; a skip only leaves a trace event.
    fn apply(&self, options: &[DescOption]) {
        for (index, child) in self.children.iter().enumerate() {
            match child.as_configurable() {
                Some(configurable) => configurable.apply(options),
                None => trace!(child = index, "descriptor takes no options, skipping"),
            }
        }
    }
}
