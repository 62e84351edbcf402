//! Entity, attribute, error and JSON encoding types for KeyGate.
//!
//! Entities are typed maps from attribute name to a tagged
//! [`AttributeValue`]. Each entity kind has an [`EntitySchema`] listing the
//! attributes a write may assign; the [`FieldAuthorizer`] applies a write
//! payload against that schema and an endpoint's [`DenyList`]. The
//! [`encode`] module turns entities, dates and result sets into JSON.
#![allow(clippy::module_name_repetitions)]

pub mod encode;
pub mod entity;
pub mod error;
pub mod fields;
pub mod schema;
pub mod value;

pub use encode::{Encodable, EncodeError, JsonEncodable};
pub use entity::Entity;
pub use error::{GatewayError, GatewayErrorCode};
pub use fields::{AuthorizedUpdate, DenyList, FieldAuthorizer, FieldError};
pub use schema::{EntitySchema, SchemaRegistry};
pub use value::{AttributeKind, AttributeValue, Identity};
