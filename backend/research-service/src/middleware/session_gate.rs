/// Session gate for protected routes.
///
/// Reads the two session cookies, runs the full verification algorithm
/// (including transparent refresh rotation), and binds the researcher to the
/// request. When a rotation happened, the fresh cookies ride out on the
/// response so the client keeps a live session without re-authenticating.
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorInternalServerError, ErrorUnauthorized},
    http::header,
    web, Error, FromRequest, HttpMessage, HttpRequest,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::handlers::auth::{session_cookies, ACCESS_COOKIE, REFRESH_COOKIE};
use crate::services::AuthenticatedSession;
use crate::AppState;

/// Researcher ID bound to the request by the gate.
#[derive(Debug, Clone)]
pub struct ResearcherId(pub Uuid);

/// The verified session, carrying the live refresh token. Handlers that
/// close the session (logout) extract this instead of re-reading cookies,
/// because after a rotation the presented cookie is already spent.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub AuthenticatedSession);

/// Session gate middleware factory
pub struct SessionGate;

impl<S, B> Transform<S, ServiceRequest> for SessionGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionGateService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(SessionGateService {
            service: Rc::new(service),
        }))
    }
}

pub struct SessionGateService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for SessionGateService<S>
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
        let service = self.service.clone();

        Box::pin(async move {
            let state = req
                .app_data::<web::Data<AppState>>()
                .cloned()
                .ok_or_else(|| ErrorInternalServerError("Application state not configured"))?;

            // Owned copies first; extensions_mut() must not overlap any
            // other borrow of the request.
            let access_token = req.cookie(ACCESS_COOKIE).map(|c| c.value().to_string());
            let refresh_token = req.cookie(REFRESH_COOKIE).map(|c| c.value().to_string());

            let session = state
                .authority
                .authenticate(access_token.as_deref(), refresh_token.as_deref())
                .await
                .map_err(ApiError::from)?;

            let rotated = session.rotated.clone();
            req.extensions_mut()
                .insert(ResearcherId(session.researcher_id));
            req.extensions_mut().insert(CurrentSession(session));

            let mut res = service.call(req).await?;

            // Hand a rotated pair to the client, unless the handler already
            // rewrote the session cookies itself (logout clears them).
            if let Some(tokens) = rotated {
                if !res.response().headers().contains_key(header::SET_COOKIE) {
                    let (access, refresh) = session_cookies(&tokens, &state.settings.server);
                    let response = res.response_mut();
                    response
                        .add_cookie(&access)
                        .map_err(ErrorInternalServerError)?;
                    response
                        .add_cookie(&refresh)
                        .map_err(ErrorInternalServerError)?;
                }
            }

            Ok(res)
        })
    }
}

impl FromRequest for ResearcherId {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<ResearcherId>().cloned() {
            Some(researcher_id) => ready(Ok(researcher_id)),
            None => ready(Err(ErrorUnauthorized(
                "Researcher ID missing in request extensions",
            ))),
        }
    }
}

impl FromRequest for CurrentSession {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<CurrentSession>().cloned() {
            Some(session) => ready(Ok(session)),
            None => ready(Err(ErrorUnauthorized(
                "Session missing in request extensions",
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_researcher_id_wraps_uuid() {
        let id = Uuid::new_v4();
        let researcher_id = ResearcherId(id);
        assert_eq!(researcher_id.0, id);
    }
}
