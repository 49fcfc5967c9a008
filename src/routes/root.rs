use super::{auth, health, invite};
use crate::middleware::auth as auth_middleware;
use crate::state::auth_state::AuthState;
use crate::state::health_state::HealthState;
use crate::state::invite_state::InviteState;
use axum::http::StatusCode;
use axum::{Router, middleware};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub fn routes(
    auth_state: AuthState,
    invite_state: InviteState,
    health_state: HealthState,
    request_timeout: Duration,
) -> Router {
    let guarded_invites = invite::managed_routes()
        .route_layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn_with_state(
                    auth_state.clone(),
                    auth_middleware::auth,
                ))
                .layer(middleware::from_fn(auth_middleware::require_invite_manager)),
        )
        .with_state(invite_state.clone());

    let merged_router = auth::routes()
        .with_state(auth_state)
        .merge(invite::public_routes().with_state(invite_state))
        .merge(guarded_invites)
        .merge(health::routes().with_state(health_state));

    with_http_layers(Router::new().nest("/api", merged_router), request_timeout)
}

fn with_http_layers(router: Router, request_timeout: Duration) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::auth::AuthConfig;
    use crate::entity::role::UserRole;
    use crate::entity::user::NewUser;
    use crate::repository::invite_repository::InMemoryInviteRepository;
    use crate::repository::user_repository::{InMemoryUserRepository, UserRepositoryTrait};
    use crate::service::test_support::RecordingHasher;
    use crate::service::token_service::JwtSigner;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, header};
    use axum::routing::get;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn app() -> Router {
        let users = Arc::new(InMemoryUserRepository::new());
        for (email, role) in [("hr@example.com", UserRole::Hr), ("student@example.com", UserRole::Student)] {
            users
                .insert(
                    NewUser {
                        email: email.to_string(),
                        first_name: None,
                        last_name: None,
                        password: RecordingHasher::digest_of("pass-word"),
                        role,
                    },
                    chrono::Utc::now(),
                )
                .await
                .unwrap();
        }
        let config = AuthConfig::new(
            "access-secret-access-secret-0001",
            chrono::Duration::minutes(15),
            "refresh-secret-refresh-secret-01",
            chrono::Duration::days(7),
        )
        .unwrap();

        let auth_state = AuthState::with_parts(
            users,
            Arc::new(RecordingHasher::new()),
            Arc::new(JwtSigner::new()),
            Arc::new(config),
        );
        let invite_state = InviteState::with_parts(
            InMemoryInviteRepository::new_shared(),
            Arc::new(RecordingHasher::new()),
            chrono::Duration::hours(72),
        );
        routes(auth_state, invite_state, HealthState::default(), Duration::from_secs(5))
    }

    async fn send(app: &Router, method: Method, uri: &str, bearer: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn login(app: &Router, email: &str) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": email, "password": "pass-word"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["access_token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_slow_requests_time_out() {
        let slow = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                "done"
            }),
        );
        let app = with_http_layers(slow, Duration::from_millis(10));

        let (status, _) = send(&app, Method::GET, "/slow", None, None).await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn test_empty_public_token_is_not_found() {
        let app = app().await;

        let (status, body) = send(&app, Method::POST, "/api/invites/redeem", None, Some(json!({"token": ""}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Invite not found");

        let (status, body) = send(&app, Method::GET, "/api/invites/validate?token=", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Invite not found");
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = app().await;
        let (status, body) = send(&app, Method::GET, "/api/health", None, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "ok");
        assert_eq!(body["data"]["database"]["status"], "in-memory");
    }

    #[tokio::test]
    async fn test_login_failures_are_generic() {
        let app = app().await;
        let (wrong_status, wrong) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "hr@example.com", "password": "nope"})),
        )
        .await;
        let (unknown_status, unknown) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "ghost@example.com", "password": "nope"})),
        )
        .await;

        assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong, unknown);
        assert_eq!(wrong["message"], "Email or password is invalid");
    }

    #[tokio::test]
    async fn test_login_validates_body() {
        let app = app().await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "not-an-email", "password": "x"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["field"], "email");
    }

    #[tokio::test]
    async fn test_invite_management_requires_bearer_and_role() {
        let app = app().await;
        let create = json!({"email": "new@example.com", "role": "student"});

        let (status, _) = send(&app, Method::POST, "/api/invites", None, Some(create.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, Method::GET, "/api/invites", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let student = login(&app, "student@example.com").await;
        let (status, body) = send(&app, Method::POST, "/api/invites", Some(&student), Some(create)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_invite_lifecycle_over_http() {
        let app = app().await;
        let hr = login(&app, "hr@example.com").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/invites",
            Some(&hr),
            Some(json!({"email": "new@example.com", "first_name": "Grace", "role": "instructor"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let raw = body["data"]["token"].as_str().unwrap().to_string();
        let id = body["data"]["invite"]["id"].as_str().unwrap().to_string();
        assert_eq!(body["data"]["invite"]["status"], "active");
        assert!(body["data"]["invite"].get("token").is_none());

        let (status, body) = send(&app, Method::GET, &format!("/api/invites/validate?token={raw}"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], id.as_str());

        let (status, body) = send(&app, Method::POST, "/api/invites/redeem", None, Some(json!({"token": raw}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "used");

        let (status, body) = send(&app, Method::POST, "/api/invites/redeem", None, Some(json!({"token": raw}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Invite not found");

        let (status, body) = send(&app, Method::GET, &format!("/api/invites/{id}"), Some(&hr), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "used");

        let (status, body) = send(&app, Method::GET, "/api/invites", Some(&hr), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_revoke_and_patch_over_http() {
        let app = app().await;
        let hr = login(&app, "hr@example.com").await;

        let (_, body) = send(
            &app,
            Method::POST,
            "/api/invites",
            Some(&hr),
            Some(json!({"email": "new@example.com", "first_name": "Grace", "role": "student", "expires_in_hours": 1})),
        )
        .await;
        let raw = body["data"]["token"].as_str().unwrap().to_string();
        let id = body["data"]["invite"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            Method::PATCH,
            &format!("/api/invites/{id}"),
            Some(&hr),
            Some(json!({"first_name": null})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["first_name"], Value::Null);

        let (status, body) = send(&app, Method::POST, &format!("/api/invites/{id}/revoke"), Some(&hr), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "revoked");

        let (status, _) = send(&app, Method::POST, "/api/invites/redeem", None, Some(json!({"token": raw}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::GET, "/api/invites/not-a-uuid", Some(&hr), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            Method::GET,
            &format!("/api/invites/{}", uuid::Uuid::now_v7()),
            Some(&hr),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
