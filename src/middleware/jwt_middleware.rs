/// JWT Authentication Middleware
///
/// Reads `Authorization: Bearer <token>` and, when the token validates,
/// injects an [`AuthenticatedPrincipal`] into the request extensions.
/// Requests without a valid token continue anonymously; routes that need a
/// principal reject them by extracting one.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::{AuthenticatedPrincipal, TokenValidator};

const TOKEN_PREFIX: &str = "Bearer ";

pub struct JwtMiddleware {
    validator: TokenValidator,
}

impl JwtMiddleware {
    pub fn new(validator: TokenValidator) -> Self {
        Self { validator }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            validator: self.validator.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    validator: TokenValidator,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let principal = bearer_token(&req).and_then(|token| authenticate(&self.validator, token));

        if let Some(principal) = principal {
            tracing::debug!(user_id = principal.user_id, "JWT validated successfully");
            req.extensions_mut().insert(principal);
        }

        let service = self.service.clone();
        Box::pin(async move { service.call(req).await })
    }
}

fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix(TOKEN_PREFIX))
}

fn authenticate(validator: &TokenValidator, token: &str) -> Option<AuthenticatedPrincipal> {
    if !validator.is_valid(token) {
        return None;
    }
    validator.authenticate(token).ok()
}
