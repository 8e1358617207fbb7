//! Backend client module for the REST API

mod client;
mod traits;
pub mod wire;

pub use client::{HttpBackend, DEFAULT_API_URL};
pub use traits::BackendClientTrait;

#[cfg(test)]
pub use traits::MockBackendClientTrait;
