//! HTTP middleware for the gateway surface.

pub mod cors;

pub use cors::cors_layer;
