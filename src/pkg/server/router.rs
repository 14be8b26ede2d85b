use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

use super::handlers::{self, admin, auth, jobs, posters, probes};
use super::middlewares::authn;
use super::state::AppState;

pub fn build_routes(state: AppState, max_body_bytes: usize) -> Router {
    let admin_routes = Router::new()
        .route("/admin/dashboard", get(admin::dashboard))
        .route("/admin/users", get(admin::users))
        .route("/admin/jobs", get(admin::jobs))
        .route("/admin/jobs/{id}", delete(admin::delete_job))
        .route("/admin/check", get(admin::check))
        .route_layer(from_fn(authn::require_admin));

    Router::new()
        .route("/jobs", get(jobs::list).post(jobs::create))
        .route("/jobs/{id}", get(jobs::show).delete(jobs::destroy))
        .route("/jobs/{id}/update", post(jobs::update))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/user", get(auth::me))
        .route("/test", get(probes::ping))
        .route("/healthz", get(probes::healthz))
        .route("/livez", get(probes::livez))
        .merge(admin_routes)
        .route("/uploads/posters/{key}", get(posters::show))
        .fallback(handlers::fallback)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .layer(from_fn_with_state(state.clone(), authn::authenticate))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use chrono::Duration;
    use serde_json::{Value, json};
    use tempfile::TempDir;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::build_routes;
    use crate::pkg::{
        internal::{
            adaptors::{
                jobs::memory::MemoryJobRepository,
                users::{memory::MemoryUserRepository, spec::Role},
            },
            posters::tests::{png, poster_store},
        },
        server::state::AppState,
    };

    struct TestApp {
        dir: TempDir,
        users: Arc<MemoryUserRepository>,
        router: Router,
    }

    impl TestApp {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let users = Arc::new(MemoryUserRepository::default());
            let state = AppState::from_parts(
                Arc::new(MemoryJobRepository::default()),
                users.clone(),
                Arc::new(poster_store(&dir)),
                Duration::hours(1),
            );
            TestApp {
                router: build_routes(state, 10 * 1024 * 1024),
                users,
                dir,
            }
        }

        async fn token(&self, email: &str, role: Role) -> Uuid {
            self.users.seed(email, role).await
        }

        async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, body)
        }
    }

    fn json_request(method: &str, uri: &str, token: Option<Uuid>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get(uri: &str, token: Option<Uuid>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn job() -> Value {
        json!({
            "title": "Backend Engineer",
            "category": "Engineering",
            "company": "Acme",
            "level": "Mid",
            "skill": "Rust",
            "type": "Full-time",
            "salary": 65000,
            "location": "Remote",
            "job_description": "Build the api.",
            "requirements": "Rust.",
            "responsibilities": "Own services.",
            "benefits": "Remote first.",
            "experience": "3 years"
        })
    }

    #[tokio::test]
    async fn writes_need_a_token() {
        let app = TestApp::new();
        let (status, body) = app.send(json_request("POST", "/jobs", None, job())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "message": "Unauthenticated." }));

        let (status, _) = app
            .send(json_request("POST", "/jobs", Some(Uuid::new_v4()), job()))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unauthenticated_write_is_rejected_before_the_body_is_read() {
        let app = TestApp::new();
        let request = Request::builder()
            .method("POST")
            .uri("/jobs")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, _) = app.send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_routes_and_methods_answer_in_json() {
        let app = TestApp::new();
        let (status, body) = app.send(get("/nowhere", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Route not found");

        let (status, body) = app.send(json_request("PUT", "/jobs", None, json!({}))).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["message"], "Method not allowed");
    }

    #[tokio::test]
    async fn job_lifecycle_over_json() {
        let app = TestApp::new();
        let token = app.token("ada@example.com", Role::User).await;

        let (status, body) = app
            .send(json_request("POST", "/jobs", Some(token), job()))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Job created successfully");
        assert_eq!(body["data"]["poster"], Value::Null);
        assert_eq!(body["data"]["type"], "Full-time");
        let id = body["data"]["id"].as_i64().unwrap();

        let (status, body) = app
            .send(json_request(
                "POST",
                &format!("/jobs/{}/update", id),
                Some(token),
                json!({ "salary": "70000" }),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Job updated successfully");
        assert_eq!(body["data"]["salary"], 70000.0);
        assert_eq!(body["data"]["title"], "Backend Engineer");

        let (status, body) = app.send(get(&format!("/jobs/{}", id), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["salary"], 70000.0);

        let (status, body) = app.send(get("/jobs", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, body) = app
            .send(json_request("DELETE", &format!("/jobs/{}", id), Some(token), json!({})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Job deleted successfully");

        let (status, body) = app.send(get(&format!("/jobs/{}", id), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "Job not found" }));
    }

    #[tokio::test]
    async fn invalid_jobs_list_every_problem() {
        let app = TestApp::new();
        let token = app.token("ada@example.com", Role::User).await;
        let (status, body) = app
            .send(json_request("POST", "/jobs", Some(token), json!({ "title": "Only" })))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["message"], "The given data was invalid.");
        let errors = body["errors"].as_object().unwrap();
        assert!(errors.contains_key("company"));
        assert!(errors.contains_key("salary"));
        assert!(!errors.contains_key("title"));
    }

    #[tokio::test]
    async fn non_integer_ids_are_not_found() {
        let app = TestApp::new();
        let token = app.token("ada@example.com", Role::User).await;
        let (status, body) = app.send(get("/jobs/abc", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Job not found");

        let (status, _) = app
            .send(json_request("POST", "/jobs/42/update", Some(token), job()))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn admin_routes_check_the_role() {
        let app = TestApp::new();
        let member = app.token("ada@example.com", Role::User).await;
        let admin = app.token("root@example.com", Role::Admin).await;

        let (status, _) = app.send(get("/admin/dashboard", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = app.send(get("/admin/dashboard", Some(member))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({ "message": "Access denied. Admin role required." }));

        let (status, body) = app.send(get("/admin/dashboard", Some(admin))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Welcome to Admin Dashboard");
        assert_eq!(body["data"]["total_users"], 2);
        assert_eq!(body["data"]["total_jobs"], 0);

        let (status, body) = app.send(get("/admin/users", Some(admin))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);
        assert_eq!(body["data"][0]["email"], "root@example.com");

        let (status, body) = app.send(get("/admin/check", Some(admin))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["role"], "admin");
    }

    #[tokio::test]
    async fn admin_deletes_any_job() {
        let app = TestApp::new();
        let member = app.token("ada@example.com", Role::User).await;
        let admin = app.token("root@example.com", Role::Admin).await;
        let (_, body) = app
            .send(json_request("POST", "/jobs", Some(member), job()))
            .await;
        let id = body["data"]["id"].as_i64().unwrap();

        let (status, body) = app.send(get("/admin/jobs", Some(admin))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Admin jobs retrieved successfully");
        assert_eq!(body["count"], 1);

        let uri = format!("/admin/jobs/{}", id);
        let (status, _) = app
            .send(json_request("DELETE", &uri, Some(member), json!({})))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = app
            .send(json_request("DELETE", &uri, Some(admin), json!({})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Job deleted by admin successfully");

        let (status, _) = app
            .send(json_request("DELETE", &uri, Some(admin), json!({})))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn register_login_logout() {
        let app = TestApp::new();
        let credentials = json!({
            "name": "Ada",
            "email": "ada@example.com",
            "password": "correct horse"
        });
        let (status, body) = app
            .send(json_request("POST", "/register", None, credentials.clone()))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user"]["role"], "user");

        let (status, body) = app
            .send(json_request("POST", "/register", None, credentials))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["errors"]["email"].is_array());

        let (status, body) = app
            .send(json_request(
                "POST",
                "/login",
                None,
                json!({ "email": "ada@example.com", "password": "wrong password" }),
            ))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid credentials");

        let (status, body) = app
            .send(json_request(
                "POST",
                "/login",
                None,
                json!({ "email": "ada@example.com", "password": "correct horse" }),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        let token: Uuid = body["token"].as_str().unwrap().parse().unwrap();

        let (status, body) = app.send(get("/user", Some(token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "ada@example.com");

        let (status, _) = app
            .send(json_request("POST", "/logout", Some(token), json!({})))
            .await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = app.send(get("/user", Some(token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn registration_validates_input() {
        let app = TestApp::new();
        let (status, body) = app
            .send(json_request(
                "POST",
                "/register",
                None,
                json!({ "email": "not-an-email", "password": "short" }),
            ))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let errors = body["errors"].as_object().unwrap();
        assert!(errors.contains_key("name"));
        assert!(errors.contains_key("email"));
        assert!(errors.contains_key("password"));
    }

    #[tokio::test]
    async fn multipart_poster_is_stored_and_served() {
        let app = TestApp::new();
        let token = app.token("ada@example.com", Role::User).await;

        let boundary = "XBOUNDARY";
        let mut body = Vec::new();
        for (name, value) in job().as_object().unwrap() {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"poster\"; filename=\"p.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(&png(64));
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let request = Request::builder()
            .method("POST")
            .uri("/jobs")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        let (status, body) = app.send(request).await;
        assert_eq!(status, StatusCode::CREATED);
        let reference = body["data"]["poster"].as_str().unwrap().to_string();
        assert!(reference.starts_with("http://localhost:8000/uploads/posters/"));
        assert!(reference.ends_with(".png"));
        assert_eq!(std::fs::read_dir(app.dir.path()).unwrap().count(), 1);

        let key = reference.rsplit('/').next().unwrap();
        let response = app
            .router
            .clone()
            .oneshot(get(&format!("/uploads/posters/{}", key), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let served = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(served.as_ref(), png(64).as_slice());
    }

    #[tokio::test]
    async fn urlencoded_update_reaches_the_store() {
        let app = TestApp::new();
        let token = app.token("ada@example.com", Role::User).await;
        let (_, body) = app
            .send(json_request("POST", "/jobs", Some(token), job()))
            .await;
        let id = body["data"]["id"].as_i64().unwrap();

        let request = Request::builder()
            .method("POST")
            .uri(format!("/jobs/{}/update", id))
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("salary=99999&level=Senior"))
            .unwrap();
        let (status, body) = app.send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["salary"], 99999.0);
        assert_eq!(body["data"]["level"], "Senior");
        assert_eq!(body["data"]["title"], "Backend Engineer");
    }

    #[tokio::test]
    async fn wrongly_typed_json_lists_every_field() {
        let app = TestApp::new();
        let token = app.token("ada@example.com", Role::User).await;
        let (status, body) = app
            .send(json_request(
                "POST",
                "/jobs",
                Some(token),
                json!({ "title": 5, "company": "" }),
            ))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"]["title"][0], "The title field must be a string.");
        assert_eq!(body["errors"]["company"][0], "The company field is required.");
        assert_eq!(body["errors"].as_object().unwrap().len(), 13);
    }

    #[tokio::test]
    async fn missing_and_staging_posters_are_json_404s() {
        let app = TestApp::new();
        let key = format!("{}.png", Uuid::new_v4());
        std::fs::write(app.dir.path().join(format!(".{}.part", key)), png(16)).unwrap();

        let (status, body) = app.send(get(&format!("/uploads/posters/{}", key), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "Poster not found" }));

        let (status, _) = app
            .send(get(&format!("/uploads/posters/.{}.part", key), None))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn ping_reports_a_timestamp() {
        let app = TestApp::new();
        let (status, body) = app.send(get("/test", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "API is working!");
        assert!(body["timestamp"].is_string());
    }
}
