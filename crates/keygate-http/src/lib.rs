//! Signed CRUD gateway HTTP service for KeyGate.
//!
//! This crate turns an HTTP request into exactly one response:
//!
//! - **Request context**: headers, body, query parameters and the hydrated
//!   JSON payload
//! - **Endpoints**: the entity kind, customer field and denylist per path
//! - **Dispatcher**: authenticate, route, run one CRUD operation, respond
//! - **Service**: hyper `Service` implementation with health checks
#![allow(clippy::module_name_repetitions)]

pub mod body;
pub mod dispatch;
pub mod endpoint;
pub mod request;
pub mod resolve;
pub mod response;
pub mod service;

pub use body::GatewayResponseBody;
pub use dispatch::{Dispatcher, Responded};
pub use endpoint::{EndpointConfig, EndpointRegistry};
pub use request::RequestContext;
pub use resolve::{NotFound, ObjectResolver};
pub use service::GatewayService;
