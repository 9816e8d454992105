use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

/// Full router: every route at the root and again under `/api`
pub fn app(state: AppState) -> Router {
    let routes = api_routes(state.clone());
    let cors = cors_layer(&state.config.security);

    Router::new()
        .merge(routes.clone())
        .nest("/api", routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(public_routes())
        .merge(protected_routes(state))
}

fn public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/", get(public::system::root))
        .route("/health", get(public::system::health))
        .route("/auth/register", post(auth::register_post))
        .route("/auth/login", post(auth::login_post))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{auth, forms, patient, patients, responses};

    Router::new()
        .route("/auth/me", get(auth::whoami_get))
        .route("/forms", get(forms::forms_get).post(forms::forms_post))
        .route(
            "/forms/:id",
            get(forms::form_get).put(forms::form_put).delete(forms::form_delete),
        )
        .route("/forms/:id/responses", get(forms::form_responses_get))
        .route("/patients", get(patients::get))
        .route("/patient/forms", get(patient::patient_forms_get))
        .route("/responses", post(responses::responses_post))
        .route("/responses/my", get(responses::my_responses_get))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter(|origin| origin.as_str() != "*")
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::database::MemoryRepository;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_app() -> Router {
        app(AppState::new(AppConfig::development(), Arc::new(MemoryRepository::new())))
    }

    #[tokio::test]
    async fn health_is_public_at_both_mounts() {
        for path in ["/health", "/api/health"] {
            let res = test_app()
                .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::OK, "{}", path);
        }
    }

    #[tokio::test]
    async fn protected_route_without_token_is_unauthorized() {
        let res = test_app()
            .oneshot(Request::builder().uri("/api/patients").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    #[test]
    fn cors_layer_tolerates_bad_origins() {
        let mut security = AppConfig::development().security;
        security.cors_origins = vec!["https://ok.example.com".into(), "bad\norigin".into()];
        let _ = cors_layer(&security);
    }
}
