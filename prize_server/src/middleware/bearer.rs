//! Bearer token middleware for the admin API.
//! This middleware can be placed on any route or service.
//!
//! It checks the incoming request for an `Authorization: Bearer <token>` header and compares the
//! token against the configured API token. Tokens are compared as SHA-256 digests so that the
//! comparison is constant-length regardless of what the client sends. If the token is missing or
//! wrong, a 401 response with a JSON body is returned.
use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use ppg_common::Secret;
use sha2::{Digest, Sha256};

use crate::errors::ServerError;

pub struct BearerTokenFactory {
    expected_digest: [u8; 32],
    configured: bool,
}

impl BearerTokenFactory {
    pub fn new(token: &Secret<String>) -> Self {
        let configured = !token.reveal().is_empty();
        let expected_digest = Sha256::digest(token.reveal().as_bytes()).into();
        BearerTokenFactory { expected_digest, configured }
    }
}

impl<S, B> Transform<S, ServiceRequest> for BearerTokenFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = BearerTokenService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(BearerTokenService {
            expected_digest: self.expected_digest,
            configured: self.configured,
            service: Rc::new(service),
        })
    }
}

pub struct BearerTokenService<S> {
    expected_digest: [u8; 32],
    configured: bool,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for BearerTokenService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let expected = self.expected_digest;
        let configured = self.configured;
        Box::pin(async move {
            if !configured {
                log::warn!("💻 Rejecting request: no API token is configured");
                return Err(ServerError::Unauthorized("API token is not configured".to_string()).into());
            }
            let presented = req
                .headers()
                .get("Authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(|t| <[u8; 32]>::from(Sha256::digest(t.as_bytes())));
            match presented {
                Some(digest) if digest == expected => service.call(req).await,
                _ => Err(ServerError::Unauthorized("Invalid or missing bearer token".to_string()).into()),
            }
        })
    }
}
