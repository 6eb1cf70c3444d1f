use std::net::SocketAddr;

use axum::{
    extract::Request,
    http::{Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::state::AppState;
use crate::users;

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Hello, GIG!" }))
        .route("/health", get(|| async { "ok" }))
        .merge(users::router())
        .with_state(state)
        .layer(middleware::from_fn(reject_unsupported_methods))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

/// Only GET, POST, PUT and DELETE are served; anything else is 405 on every path.
async fn reject_unsupported_methods(req: Request, next: Next) -> Response {
    match *req.method() {
        Method::GET | Method::POST | Method::PUT | Method::DELETE => next.run(req).await,
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

/// Resolves on SIGTERM (sent by the hosting platform) or Ctrl-C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = sigterm => {}
    }
    tracing::info!("shutdown signal received, draining connections");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::header::CONTENT_LENGTH;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::users::dto::User;

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>) {
        let builder = axum::http::Request::builder().method(method).uri(uri);
        let req = match body {
            Some(v) => {
                let bytes = serde_json::to_vec(&v).unwrap();
                builder
                    .header(CONTENT_LENGTH, bytes.len())
                    .body(Body::from(bytes))
                    .unwrap()
            }
            None => builder.body(Body::empty()).unwrap(),
        };
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn create(app: &Router, email: &str, name: &str) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/users",
            Some(json!({"email": email, "name": name})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let text = String::from_utf8(body).unwrap();
        let id = text
            .strip_prefix("success: id is ")
            .and_then(|rest| rest.strip_suffix('\n'))
            .unwrap_or_else(|| panic!("unexpected create reply: {text:?}"));
        id.to_string()
    }

    async fn get_user(app: &Router, id: &str) -> (StatusCode, Option<User>) {
        let (status, body) = send(app, "GET", &format!("/users/{id}"), None).await;
        let user = (status == StatusCode::OK).then(|| serde_json::from_slice(&body).unwrap());
        (status, user)
    }

    #[tokio::test]
    async fn index_and_health() {
        let app = build_app(AppState::fake());
        let (status, body) = send(&app, "GET", "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"Hello, GIG!");

        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let app = build_app(AppState::fake());
        let id = create(&app, "a@x.com", "A").await;
        assert!(!id.is_empty());

        let (status, user) = get_user(&app, &id).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            user,
            Some(User {
                id,
                email: "a@x.com".into(),
                name: "A".into()
            })
        );
    }

    #[tokio::test]
    async fn create_ignores_client_id() {
        let app = build_app(AppState::fake());
        let (status, body) = send(
            &app,
            "POST",
            "/users",
            Some(json!({"id": "mine", "email": "a@x.com", "name": "A"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(!String::from_utf8(body).unwrap().contains("mine"));

        let (status, _) = get_user(&app, "mine").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn round_trip_preserves_unusual_strings() {
        let app = build_app(AppState::fake());
        let email = "  Ünïcødé+tag@例え.jp ";
        let name = "\"quoted\" \\ back\nslash";
        let id = create(&app, email, name).await;
        let (_, user) = get_user(&app, &id).await;
        let user = user.unwrap();
        assert_eq!(user.email, email);
        assert_eq!(user.name, name);
    }

    #[tokio::test]
    async fn empty_list_is_no_content() {
        let app = build_app(AppState::fake());
        let (status, body) = send(&app, "GET", "/users", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn list_returns_every_created_user() {
        let app = build_app(AppState::fake());
        let mut ids = Vec::new();
        for i in 0..3 {
            ids.push(create(&app, &format!("u{i}@x.com"), &format!("U{i}")).await);
        }

        let (status, body) = send(&app, "GET", "/users", None).await;
        assert_eq!(status, StatusCode::OK);
        let users: Vec<User> = serde_json::from_slice(&body).unwrap();
        assert_eq!(users.len(), 3);

        let mut listed: Vec<String> = users.into_iter().map(|u| u.id).collect();
        listed.sort();
        ids.sort();
        assert_eq!(listed, ids);

        let (status, _) = send(&app, "GET", "/users/", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn update_replaces_all_fields() {
        let app = build_app(AppState::fake());
        let id = create(&app, "a@x.com", "A").await;

        let (status, body) = send(
            &app,
            "PUT",
            &format!("/users/{id}"),
            Some(json!({"email": "b@x.com", "name": "B"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"success updating\n");

        let (_, user) = get_user(&app, &id).await;
        assert_eq!(
            user,
            Some(User {
                id: id.clone(),
                email: "b@x.com".into(),
                name: "B".into()
            })
        );

        // A partial body clears the omitted field rather than keeping it.
        send(&app, "PUT", &format!("/users/{id}"), Some(json!({"name": "C"}))).await;
        let (_, user) = get_user(&app, &id).await;
        let user = user.unwrap();
        assert_eq!(user.email, "");
        assert_eq!(user.name, "C");
    }

    #[tokio::test]
    async fn update_creates_absent_user() {
        let app = build_app(AppState::fake());
        let (status, _) = send(
            &app,
            "PUT",
            "/users/chosen",
            Some(json!({"email": "c@x.com", "name": "C"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, user) = get_user(&app, "chosen").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(user.unwrap().email, "c@x.com");
    }

    #[tokio::test]
    async fn delete_then_get_fails_and_delete_is_idempotent() {
        let app = build_app(AppState::fake());
        let id = create(&app, "a@x.com", "A").await;

        let (status, body) = send(&app, "DELETE", &format!("/users/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"success deleting\n");

        let (status, _) = get_user(&app, &id).await;
        assert!(status.is_client_error() || status.is_server_error());

        let (status, _) = send(&app, "DELETE", &format!("/users/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "DELETE", "/users/never-existed", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn unsupported_methods_are_rejected_without_mutation() {
        let state = AppState::fake();
        let app = build_app(state.clone());
        let id = create(&app, "a@x.com", "A").await;
        let item = format!("/users/{id}");

        for uri in ["/", "/users", item.as_str(), "/nowhere"] {
            let (status, body) = send(
                &app,
                "PATCH",
                uri,
                Some(json!({"email": "z@x.com", "name": "Z"})),
            )
            .await;
            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "PATCH {uri}");
            assert!(body.is_empty());

            for method in ["HEAD", "OPTIONS"] {
                let (status, body) = send(&app, method, uri, None).await;
                assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method} {uri}");
                assert!(body.is_empty());
            }

            let preflight = axum::http::Request::builder()
                .method("OPTIONS")
                .uri(uri)
                .header("origin", "https://example.com")
                .header("access-control-request-method", "PUT")
                .body(Body::empty())
                .unwrap();
            let res = app.clone().oneshot(preflight).await.unwrap();
            assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED, "preflight {uri}");
        }

        let docs = state.store.list(crate::users::services::COLLECTION).await.unwrap();
        assert_eq!(docs.len(), 1);
        let (_, user) = get_user(&app, &id).await;
        assert_eq!(user.unwrap().email, "a@x.com");
    }

    #[tokio::test]
    async fn known_path_with_wrong_verb_is_method_not_allowed() {
        let app = build_app(AppState::fake());
        let (status, _) = send(&app, "PUT", "/users", Some(json!({}))).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        let (status, _) = send(&app, "POST", "/users/abc", Some(json!({}))).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn malformed_body_is_internal_error_and_server_stays_up() {
        let app = build_app(AppState::fake());
        let req = axum::http::Request::builder()
            .method("POST")
            .uri("/users")
            .header(CONTENT_LENGTH, 5)
            .body(Body::from("{oops"))
            .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let req = axum::http::Request::builder()
            .method("POST")
            .uri("/users")
            .body(Body::from(r#"{"email":"a@x.com"}"#))
            .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let (status, _) = send(&app, "GET", "/users", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let app = build_app(AppState::fake());
        let (status, body) = send(&app, "GET", "/firestore", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.is_empty());
    }
}
