pub mod caller;
pub mod errors;
pub mod guests;
pub mod users;

use std::sync::Arc;

use actix_web::middleware::DefaultHeaders;
use actix_web::{guard, web, HttpResponse};

use crate::domain::access::AccessRegistry;
use crate::domain::errors::ErrorKind;
use crate::domain::guest::GuestDirectory;
use crate::metrics::{self, Metrics};
use errors::{error_body, RequestError};

pub use caller::{CallerCredential, CALLER_HEADER};

// ============================================================================
// HTTP Surface
// ============================================================================
//
// Thin actix-web adapter over the two domain services. Handlers decode,
// call one operation, count the outcome and render. No business rules here.
//
// ============================================================================

pub struct AppState {
    pub directory: Arc<GuestDirectory>,
    pub registry: Arc<AccessRegistry>,
    pub metrics: Arc<Metrics>,
    pub require_family_group: bool,
}

/// Outcome of any domain result, for the metrics `outcome` label
trait Classified {
    fn failure_kind(&self) -> Option<ErrorKind>;
}

impl<T> Classified for Result<T, crate::domain::guest::GuestError> {
    fn failure_kind(&self) -> Option<ErrorKind> {
        self.as_ref().err().map(|e| e.kind())
    }
}

impl<T> Classified for Result<T, crate::domain::access::AccessError> {
    fn failure_kind(&self) -> Option<ErrorKind> {
        self.as_ref().err().map(|e| e.kind())
    }
}

impl AppState {
    fn observe_guest(&self, operation: &str, result: &impl Classified) {
        self.metrics.record_guest_operation(operation, result.failure_kind());
    }

    fn observe_credential(&self, operation: &str, result: &impl Classified) {
        self.metrics.record_credential_operation(operation, result.failure_kind());
    }
}

/// `Access-Control-*` headers added to every response
pub fn cors_headers(origin: &str) -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", origin.to_string()))
        .add(("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, OPTIONS"))
        .add(("Access-Control-Allow-Headers", "Content-Type, Authorization, user-racf"))
}

async fn preflight() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

/// Fallback for unmatched paths
pub async fn not_found() -> HttpResponse {
    error_body(actix_web::http::StatusCode::NOT_FOUND, "not found")
}

/// Mount every route. `expose_roster` is false in production.
pub fn routes(cfg: &mut web::ServiceConfig, expose_roster: bool) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        RequestError::InvalidBody(err.to_string()).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|_err, _req| RequestError::InvalidId.into()))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        RequestError::InvalidBody(err.to_string()).into()
    }))
    // Any OPTIONS request is a CORS preflight
    .service(web::resource("/{tail:.*}").guard(guard::Options()).to(preflight))
    .route("/health", web::get().to(metrics::health_handler))
    .route("/metrics", web::get().to(metrics::metrics_handler))
    .service(
        web::resource("/api/guests")
            .route(web::get().to(guests::list))
            .route(web::post().to(guests::create)),
    )
    .service(web::resource("/api/guests/import").route(web::post().to(guests::import)))
    .service(
        web::resource("/api/guests/{id}")
            .route(web::get().to(guests::get))
            .route(web::put().to(guests::update))
            .route(web::delete().to(guests::delete)),
    )
    .service(web::resource("/api/users/check").route(web::get().to(users::check)))
    .service(web::resource("/api/users/me").route(web::get().to(users::me)));

    if expose_roster {
        cfg.service(
            web::resource("/api/users")
                .route(web::post().to(users::register))
                .route(web::get().to(users::roster)),
        );
    } else {
        cfg.service(web::resource("/api/users").route(web::post().to(users::register)));
    }
}

// ============================================================================
// Route Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::{json, Value};

    use crate::storage::MemoryStore;

    const GROOM: &str = "GRM01";

    async fn state() -> web::Data<AppState> {
        let store = Arc::new(MemoryStore::new());
        let registry = Arc::new(AccessRegistry::new(store.clone(), store.clone()));
        registry.seed_bootstrap(GROOM, "BRD01").await;
        let directory = Arc::new(GuestDirectory::new(store, registry.clone()));
        web::Data::new(AppState {
            directory,
            registry,
            metrics: Arc::new(Metrics::new().unwrap()),
            require_family_group: true,
        })
    }

    macro_rules! app {
        ($state:expr, $expose:expr) => {
            test::init_service(
                App::new()
                    .wrap(cors_headers("http://localhost:5173"))
                    .app_data($state.clone())
                    .app_data(web::Data::new($state.metrics.clone()))
                    .configure(|cfg| routes(cfg, $expose))
                    .default_service(web::to(not_found)),
            )
            .await
        };
    }

    fn maria() -> Value {
        json!({
            "first_name": "Maria",
            "last_name": "Santos",
            "phone": "11988888888",
            "relationship": "R"
        })
    }

    fn multipart(filename: &str, content: &str) -> (String, Vec<u8>) {
        let boundary = "XBOUNDARYX";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\
             {content}\r\n\
             --{boundary}--\r\n"
        );
        (format!("multipart/form-data; boundary={boundary}"), body.into_bytes())
    }

    #[actix_web::test]
    async fn test_guest_crud_flow() {
        let state = state().await;
        let app = app!(state, true);

        let req = test::TestRequest::post()
            .uri("/api/guests")
            .insert_header((CALLER_HEADER, "grm01"))
            .set_json(maria())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        let id = created["id"].as_i64().unwrap();
        assert_eq!(created["family_group"], 1);
        assert_eq!(created["created_by"], GROOM);

        let req = test::TestRequest::put()
            .uri(&format!("/api/guests/{id}"))
            .insert_header((CALLER_HEADER, GROOM))
            .set_json(json!({"confirmed": true}))
            .to_request();
        let updated: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated["confirmed"], true);

        let req = test::TestRequest::get().uri(&format!("/api/guests/{id}")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/guests/{id}"))
            .insert_header((CALLER_HEADER, GROOM))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::get().uri(&format!("/api/guests/{id}")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].is_string());
    }

    #[actix_web::test]
    async fn test_create_error_statuses() {
        let state = state().await;
        let app = app!(state, true);

        let req = test::TestRequest::post().uri("/api/guests").set_json(maria()).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/guests")
            .insert_header((CALLER_HEADER, "NOPE1"))
            .set_json(maria())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::post()
            .uri("/api/guests")
            .insert_header((CALLER_HEADER, GROOM))
            .set_json(maria())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = test::TestRequest::post()
            .uri("/api/guests")
            .insert_header((CALLER_HEADER, GROOM))
            .set_json(maria())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::post()
            .uri("/api/guests")
            .insert_header((CALLER_HEADER, GROOM))
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get().uri("/api/guests/abc").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_registration_flow() {
        let state = state().await;
        let app = app!(state, true);

        let req = test::TestRequest::post()
            .uri("/api/guests")
            .insert_header((CALLER_HEADER, GROOM))
            .set_json(maria())
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get().uri("/api/users/check?phone=11988888888").to_request();
        let check: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(check, json!({"exists": false}));

        let req = test::TestRequest::post()
            .uri("/api/users")
            .set_json(json!({"phone": "11988888888", "uracf": "usr01"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let credential: Value = test::read_body_json(resp).await;
        assert_eq!(credential["uracf"], "USR01");
        assert_eq!(credential["role"], "guest");

        let req = test::TestRequest::post()
            .uri("/api/users")
            .set_json(json!({"phone": "11988888888", "uracf": "OTHR1"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::get().uri("/api/users/check?phone=11988888888").to_request();
        let check: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(check, json!({"exists": true, "role": "guest"}));

        let req = test::TestRequest::get().uri("/api/users/check?phone=123").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_me_endpoint() {
        let state = state().await;
        let app = app!(state, true);

        let req = test::TestRequest::get().uri("/api/users/me").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/api/users/me")
            .insert_header((CALLER_HEADER, "brd01"))
            .to_request();
        let me: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(me, json!({"role": "bride"}));

        let req = test::TestRequest::get()
            .uri("/api/users/me")
            .insert_header((CALLER_HEADER, "ZZZ99"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_roster_hidden_in_production() {
        let state = state().await;

        let app = app!(state, true);
        let req = test::TestRequest::get().uri("/api/users").to_request();
        let roster: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(roster.as_array().unwrap().len(), 2);

        let app = app!(state, false);
        let req = test::TestRequest::get().uri("/api/users").to_request();
        assert!(test::call_service(&app, req).await.status().is_client_error());
    }

    #[actix_web::test]
    async fn test_cors_preflight_and_headers() {
        let state = state().await;
        let app = app!(state, true);

        let req = test::TestRequest::default()
            .method(actix_web::http::Method::OPTIONS)
            .uri("/api/guests")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            resp.headers().get("Access-Control-Allow-Origin").unwrap(),
            "http://localhost:5173"
        );

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.headers().contains_key("Access-Control-Allow-Methods"));
    }

    #[actix_web::test]
    async fn test_import_endpoint() {
        let state = state().await;
        let app = app!(state, true);

        let (content_type, body) = multipart(
            "convidados.csv",
            "first_name,last_name,phone,relationship\nJoão,Silva,11999999999,P\nAna,Lima,,X\n",
        );
        let relaxed = web::Data::new(AppState {
            directory: state.directory.clone(),
            registry: state.registry.clone(),
            metrics: state.metrics.clone(),
            require_family_group: false,
        });
        let relaxed_app = app!(relaxed, true);

        let req = test::TestRequest::post()
            .uri("/api/guests/import")
            .insert_header((CALLER_HEADER, GROOM))
            .insert_header(("content-type", content_type.clone()))
            .set_payload(body.clone())
            .to_request();
        let resp = test::call_service(&relaxed_app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let report: Value = test::read_body_json(resp).await;
        assert_eq!(report["total"], 2);
        assert_eq!(report["imported"], 1);
        assert_eq!(report["errors"][0]["row"], 3);

        // family_group column required by default
        let req = test::TestRequest::post()
            .uri("/api/guests/import")
            .insert_header((CALLER_HEADER, GROOM))
            .insert_header(("content-type", content_type))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let error: Value = test::read_body_json(resp).await;
        assert!(error["error"].as_str().unwrap().contains("family_group"));

        let (content_type, body) = multipart("convidados.txt", "irrelevant");
        let req = test::TestRequest::post()
            .uri("/api/guests/import")
            .insert_header((CALLER_HEADER, GROOM))
            .insert_header(("content-type", content_type))
            .set_payload(body)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_metrics_endpoint_counts_outcomes() {
        let state = state().await;
        let app = app!(state, true);

        let req = test::TestRequest::post()
            .uri("/api/guests")
            .insert_header((CALLER_HEADER, "NOPE1"))
            .set_json(maria())
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get().uri("/metrics").to_request();
        let body = test::call_and_read_body(&app, req).await;
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("guest_operations_total{operation=\"create\",outcome=\"forbidden\"} 1"));
    }
}
