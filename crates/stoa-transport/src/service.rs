//! Contracts between generated service code and the transport layer.
//!
//! A [`ServiceDescriptor`] is the handle a service hands to the server: it
//! knows how to attach the service's HTTP handlers to a router and how to
//! produce the service's documentation. Descriptors that accept runtime
//! tuning additionally implement [`ConfigurableServiceDescriptor`];
//! [`ServiceDescriptor::as_configurable`] is the probe for that capability.

use bytes::Bytes;
use stoa_router::Router;

use crate::error::SwaggerResult;
use crate::interceptor::UnaryInterceptor;
use crate::swagger::SwaggerOption;

/// Per-descriptor tuning applied before handlers are registered.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum DescOption {
    /// Wrap every unary handler of the descriptor with this interceptor.
    UnaryInterceptor(UnaryInterceptor),
}

/// The handle a service exposes to the transport layer.
pub trait ServiceDescriptor: Send + Sync {
    /// Attaches the service's HTTP handlers to `router`.
    fn register_http(&self, router: &mut Router);

    /// Produces the service's documentation as an encoded OpenAPI
    /// document, with `options` applied to the merged result.
    fn swagger_def(&self, options: &[SwaggerOption]) -> SwaggerResult<Bytes>;

    /// Returns the configurable view of this descriptor, if it has one.
    ///
    /// Descriptors that take no runtime tuning keep the default `None`;
    /// callers holding options simply skip them.
    fn as_configurable(&self) -> Option<&dyn ConfigurableServiceDescriptor> {
        None
    }
}

/// A descriptor that accepts runtime tuning.
pub trait ConfigurableServiceDescriptor: ServiceDescriptor {
    /// Applies `options` to this descriptor.
    ///
    /// Must be called before [`ServiceDescriptor::register_http`];
    /// options applied afterwards have no effect on already registered
    /// handlers.
    fn apply(&self, options: &[DescOption]);
}
