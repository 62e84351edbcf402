//! Request lifecycle and CRUD dispatch.
//!
//! A request moves through typestate values, each consumed by its transition:
//!
//! ```text
//! Unauthenticated --authenticate--> Authenticated --route--> Routed --dispatch--> Responded
//!        |                               |
//!        +--------- Responded(403) ------+--- Responded(404 endpoint)
//! ```
//!
//! [`Routed::dispatch`] is a single exhaustive match over the method and
//! always yields exactly one [`Responded`].

use std::sync::Arc;

use keygate_auth::{AuthError, CredentialRecord, RequestValidator};
use keygate_model::encode::{Encodable, encode};
use keygate_model::{
    Entity, EntitySchema, GatewayError, GatewayErrorCode, SchemaRegistry, gateway_error,
};
use keygate_store::{EntityStore, OrderBy, Query, ScopeBinder, ScopedQuery};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::endpoint::{EndpointConfig, EndpointRegistry};
use crate::request::RequestContext;
use crate::resolve::{NotFound, ObjectResolver};

/// Terminal state: the status and JSON body of the one response.
#[derive(Debug, Clone, PartialEq)]
pub struct Responded {
    /// HTTP status.
    pub status: http::StatusCode,
    /// JSON body.
    pub body: Value,
}

impl Responded {
    /// A 200 response.
    #[must_use]
    pub fn ok(body: Value) -> Self {
        Self {
            status: http::StatusCode::OK,
            body,
        }
    }

    /// An error response with the uniform body. Source errors are logged
    /// here and dropped.
    #[must_use]
    pub fn error(err: &GatewayError) -> Self {
        if let Some(source) = std::error::Error::source(err) {
            error!(code = %err.code, source = %source, "request failed");
        } else {
            debug!(code = %err.code, reason = %err.message, "request rejected");
        }
        Self {
            status: err.status_code,
            body: err.to_body(),
        }
    }
}

/// A request that has not been authenticated.
#[derive(Debug)]
pub struct Unauthenticated {
    ctx: RequestContext,
}

/// A request whose signature was verified.
#[derive(Debug)]
pub struct Authenticated {
    ctx: RequestContext,
    credential: CredentialRecord,
}

/// An authenticated request matched to an endpoint, with its payload hydrated.
#[derive(Debug)]
pub struct Routed {
    ctx: RequestContext,
    credential: CredentialRecord,
    endpoint: Arc<EndpointConfig>,
    schema: Arc<EntitySchema>,
}

impl Unauthenticated {
    /// Start processing a request.
    #[must_use]
    pub fn new(ctx: RequestContext) -> Self {
        Self { ctx }
    }

    /// Verify headers and signature.
    ///
    /// # Errors
    ///
    /// Returns a 403 [`Responded`] when validation fails.
    pub fn authenticate(self, validator: &RequestValidator) -> Result<Authenticated, Responded> {
        match validator.validate(self.ctx.parts(), self.ctx.raw_body()) {
            Ok(credential) => Ok(Authenticated {
                ctx: self.ctx,
                credential,
            }),
            Err(err) => {
                warn!(
                    method = %self.ctx.method(),
                    uri = self.ctx.uri(),
                    error = %err,
                    "request authentication failed"
                );
                Err(Responded::error(&auth_error(&err)))
            }
        }
    }
}

impl Authenticated {
    /// The credential the request was signed with.
    #[must_use]
    pub fn credential(&self) -> &CredentialRecord {
        &self.credential
    }

    /// Match the request path to an endpoint and hydrate the payload.
    ///
    /// # Errors
    ///
    /// Returns a 404 [`Responded`] for an unknown path, or 500 when the
    /// endpoint's kind has no schema.
    pub fn route(
        mut self,
        endpoints: &EndpointRegistry,
        schemas: &SchemaRegistry,
    ) -> Result<Routed, Responded> {
        let Some(endpoint) = endpoints.resolve(self.ctx.path()) else {
            return Err(Responded::error(&GatewayError::not_found_endpoint()));
        };
        let Some(schema) = schemas.get(&endpoint.kind) else {
            return Err(Responded::error(&gateway_error!(
                InternalError,
                format!("No schema registered for kind {}", endpoint.kind)
            )));
        };
        self.ctx.hydrate();
        Ok(Routed {
            ctx: self.ctx,
            credential: self.credential,
            endpoint,
            schema,
        })
    }
}

impl Routed {
    /// Run the one operation the method selects.
    pub fn dispatch(self, store: &dyn EntityStore) -> Responded {
        debug!(
            method = %self.ctx.method(),
            kind = %self.endpoint.kind,
            client_id = self.credential.client_id(),
            "dispatching request"
        );
        let result = match *self.ctx.method() {
            http::Method::GET => self.list_or_get(store),
            http::Method::PUT => self.update(store),
            http::Method::DELETE => self.delete(store),
            _ => Err(GatewayError::method_not_allowed()),
        };
        match result {
            Ok(body) => Responded::ok(body),
            Err(err) => Responded::error(&err),
        }
    }

    fn scoped(&self, query: Query) -> ScopedQuery {
        ScopeBinder::bind(&self.credential, query, &self.endpoint.customer_field)
    }

    fn resolve(&self, store: &dyn EntityStore) -> Result<Entity, GatewayError> {
        let scope = self.scoped(Query::new(self.endpoint.kind.clone()));
        ObjectResolver::resolve(&self.ctx, &scope, store)
            .map_err(|NotFound| GatewayError::not_found_entity())
    }

    fn list_or_get(&self, store: &dyn EntityStore) -> Result<Value, GatewayError> {
        if !self.ctx.flag("all") && self.ctx.query_param("id").is_some() {
            let entity = self.resolve(store)?;
            return Ok(encode(Encodable::Entity(&entity))?);
        }

        let mut query = Query::new(self.endpoint.kind.clone());
        if let Some(raw) = self.ctx.query_param("order_by") {
            let order = OrderBy::parse(raw)
                .ok_or_else(|| GatewayError::invalid_parameter("Invalid order_by parameter"))?;
            query = query.order_by(order);
        }
        if let Some(raw) = self.ctx.query_param("limit") {
            let limit = raw
                .trim()
                .parse::<usize>()
                .map_err(|_| GatewayError::invalid_parameter("Invalid limit parameter"))?;
            query = query.limit(limit);
        }

        let entities = store.fetch(&self.scoped(query)).map_err(|e| {
            GatewayError::internal_error("Cannot query entities").with_source(e)
        })?;
        Ok(encode(Encodable::Entities(&entities))?)
    }

    fn update(&self, store: &dyn EntityStore) -> Result<Value, GatewayError> {
        let mut entity = self.resolve(store)?;
        let attributes = self
            .ctx
            .parsed_body()
            .and_then(|body| body.get("attributes"))
            .and_then(Value::as_object)
            .ok_or_else(GatewayError::missing_attributes)?;

        let update = self
            .endpoint
            .field_authorizer()
            .authorize(&self.schema, attributes)?;
        update.apply(&mut entity);

        store
            .put(entity)
            .map_err(|e| GatewayError::persistence_failure().with_source(e))?;

        let refreshed = self.resolve(store)?;
        Ok(encode(Encodable::Entity(&refreshed))?)
    }

    fn delete(&self, store: &dyn EntityStore) -> Result<Value, GatewayError> {
        let entity = self.resolve(store)?;
        let snapshot = encode(Encodable::Entity(&entity))?;
        store
            .delete(entity.key())
            .map_err(|e| GatewayError::deletion_failure().with_source(e))?;
        Ok(snapshot)
    }
}

/// Map an authentication failure to its client-facing error.
fn auth_error(err: &AuthError) -> GatewayError {
    let code = match err {
        AuthError::MissingHeader(_) => GatewayErrorCode::MissingHeader,
        AuthError::UnknownClient(_) => GatewayErrorCode::UnknownClient,
        AuthError::BadSignature => GatewayErrorCode::BadSignature,
    };
    GatewayError::with_message(code, err.public_reason())
}

/// Owns everything needed to turn a request context into a response.
pub struct Dispatcher {
    validator: RequestValidator,
    endpoints: EndpointRegistry,
    schemas: SchemaRegistry,
    store: Arc<dyn EntityStore>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("validator", &self.validator)
            .field("endpoints", &self.endpoints)
            .field("schemas", &self.schemas)
            .field("store", &"...")
            .finish()
    }
}

impl Dispatcher {
    /// Create a dispatcher.
    pub fn new(
        validator: RequestValidator,
        endpoints: EndpointRegistry,
        schemas: SchemaRegistry,
        store: Arc<dyn EntityStore>,
    ) -> Self {
        Self {
            validator,
            endpoints,
            schemas,
            store,
        }
    }

    /// Process one request to completion.
    #[must_use]
    pub fn handle(&self, ctx: RequestContext) -> Responded {
        let routed = Unauthenticated::new(ctx)
            .authenticate(&self.validator)
            .and_then(|authenticated| authenticated.route(&self.endpoints, &self.schemas));
        match routed {
            Ok(routed) => routed.dispatch(self.store.as_ref()),
            Err(responded) => responded,
        }
    }
}
