use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::domain::access::{AccessError, RegisterCredential};
use super::caller::caller_header;
use super::errors::RequestError;
use super::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CheckQuery {
    pub phone: String,
}

pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterCredential>,
) -> Result<HttpResponse, AccessError> {
    let result = state.registry.register(body.into_inner()).await;
    state.observe_credential("register", &result);
    Ok(HttpResponse::Created().json(result?))
}

pub async fn check(
    state: web::Data<AppState>,
    query: web::Query<CheckQuery>,
) -> Result<HttpResponse, AccessError> {
    let result = state.registry.check_by_phone(query.phone.trim()).await;
    state.observe_credential("check", &result);
    Ok(HttpResponse::Ok().json(result?))
}

/// Role of the calling access code. A missing header is 401, not 400.
pub async fn me(state: web::Data<AppState>, req: HttpRequest) -> actix_web::Result<HttpResponse> {
    let code = caller_header(&req).ok_or(RequestError::Unauthenticated)?;

    let result = state.registry.get_role_for_credential(&code).await;
    state.observe_credential("me", &result);
    let role = result?;

    Ok(HttpResponse::Ok().json(json!({ "role": role })))
}

pub async fn roster(state: web::Data<AppState>) -> Result<HttpResponse, AccessError> {
    let result = state.registry.roster().await;
    state.observe_credential("roster", &result);
    Ok(HttpResponse::Ok().json(result?))
}
