use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::{header, StatusCode};
use actix_web::{middleware, test, web, App};
use chrono::{Duration, Utc};
use microblog_server::auth::SESSION_COOKIE;
use microblog_server::views::flash::FLASH_COOKIE;
use microblog_server::{load_session, routes, AppState, MemoryUserStore, Settings, User, UserStore};
use serde_json::Value;
use std::sync::Arc;

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data($state.clone())
                .wrap(middleware::from_fn(load_session))
                .configure(routes::configure),
        )
        .await
    };
}

async fn seeded_state() -> (web::Data<AppState>, Arc<MemoryUserStore>) {
    let store = Arc::new(MemoryUserStore::new());
    let alice = User::new("alice".into(), "alice@example.com".into(), "wonderland").unwrap();
    store.create(&alice).await.unwrap();

    let config = Settings::new_for_test().expect("Failed to load test config");
    let state = AppState::with_store(config, store.clone());
    (web::Data::new(state), store)
}

fn login_request(uri: &str, username: &str, password: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri(uri)
        .set_form([("username", username), ("password", password)])
}

fn cookie_named<B>(resp: &ServiceResponse<B>, name: &str) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == name)
        .map(|c| c.into_owned())
}

fn location<B>(resp: &ServiceResponse<B>) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[actix_web::test]
async fn test_register_then_login() {
    let (state, store) = seeded_state().await;
    let app = init_app!(state);

    let resp = test::TestRequest::post()
        .uri("/register")
        .set_form([
            ("username", "bob"),
            ("email", "bob@example.com"),
            ("password", "builder"),
            ("password2", "builder"),
        ])
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/login");
    let flash = cookie_named(&resp, FLASH_COOKIE).expect("registration queues a flash");

    let stored = store.find_by_username("bob").await.unwrap().expect("bob was persisted");
    assert_eq!(stored.email, "bob@example.com");
    assert_ne!(stored.password_hash, "builder");

    let resp = test::TestRequest::get().uri("/login").cookie(flash).send_request(&app).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["template"], "login.html");
    assert_eq!(body["flashes"][0], "Congratulations, bob, you are now a registered user!");

    let resp = login_request("/login", "bob", "builder").send_request(&app).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");
    let session = cookie_named(&resp, SESSION_COOKIE).expect("login sets a session cookie");

    let resp = test::TestRequest::get().uri("/").cookie(session).send_request(&app).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["template"], "index.html");
    assert_eq!(body["title"], "Home");
    assert_eq!(body["current_user"]["username"], "bob");
    assert_eq!(body["context"]["posts"].as_array().unwrap().len(), 7);
}

#[actix_web::test]
async fn test_invalid_login_is_generic() {
    let (state, _) = seeded_state().await;
    let app = init_app!(state);

    let unknown = login_request("/login", "mallory", "wonderland").send_request(&app).await;
    let wrong = login_request("/login", "alice", "looking-glass").send_request(&app).await;

    for resp in [&unknown, &wrong] {
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(cookie_named(resp, SESSION_COOKIE).is_none());
    }

    let unknown: Value = test::read_body_json(unknown).await;
    let wrong: Value = test::read_body_json(wrong).await;
    assert_eq!(unknown["template"], "login.html");
    assert_eq!(unknown["flashes"], serde_json::json!(["Invalid username or password"]));
    assert_eq!(unknown["flashes"], wrong["flashes"]);
}

#[actix_web::test]
async fn test_login_missing_fields_rerenders() {
    let (state, _) = seeded_state().await;
    let app = init_app!(state);

    let resp = login_request("/login", "", "").send_request(&app).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["context"]["errors"]["username"][0], "This field is required.");
    assert_eq!(body["context"]["errors"]["password"][0], "This field is required.");
}

#[actix_web::test]
async fn test_login_follows_same_origin_next() {
    let (state, _) = seeded_state().await;
    let app = init_app!(state);

    let resp = login_request("/login?next=%2Fuser%2Falice", "alice", "wonderland")
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/user/alice");
}

#[actix_web::test]
async fn test_login_ignores_foreign_next() {
    let (state, _) = seeded_state().await;
    let app = init_app!(state);

    for next in [
        "https%3A%2F%2Fevil.example%2Fx",
        "%2F%2Fevil.example%2Fx",
        "%2F%5Cevil.example",
        "%2Fx%0D%0Ay",
        "%2Fx%0D%0ASet-Cookie%3A%20a%3Db",
    ] {
        let uri = format!("/login?next={next}");
        let resp = login_request(&uri, "alice", "wonderland").send_request(&app).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "/", "next={next}");
    }
}

#[actix_web::test]
async fn test_login_required_round_trip() {
    let (state, _) = seeded_state().await;
    let app = init_app!(state);

    let resp = test::TestRequest::get().uri("/edit/profile").send_request(&app).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/login?next=%2Fedit%2Fprofile");

    let resp = login_request("/login?next=%2Fedit%2Fprofile", "alice", "wonderland")
        .send_request(&app)
        .await;
    assert_eq!(location(&resp), "/edit/profile");

    let resp = test::TestRequest::get().uri("/").send_request(&app).await;
    assert_eq!(location(&resp), "/login?next=%2F");
}

#[actix_web::test]
async fn test_authenticated_user_skips_login_and_register() {
    let (state, _) = seeded_state().await;
    let app = init_app!(state);

    let resp = login_request("/login", "alice", "wonderland").send_request(&app).await;
    let session = cookie_named(&resp, SESSION_COOKIE).unwrap();

    for uri in ["/login", "/register"] {
        let resp = test::TestRequest::get().uri(uri).cookie(session.clone()).send_request(&app).await;
        assert_eq!(resp.status(), StatusCode::FOUND, "{uri}");
        assert_eq!(location(&resp), "/", "{uri}");
    }

    let resp = login_request("/login?next=%2Fuser%2Falice", "alice", "wonderland")
        .cookie(session)
        .send_request(&app)
        .await;
    assert_eq!(location(&resp), "/");
}

#[actix_web::test]
async fn test_remember_me_sets_persistent_cookie() {
    let (state, _) = seeded_state().await;
    let app = init_app!(state);

    let resp = login_request("/login", "alice", "wonderland").send_request(&app).await;
    assert!(cookie_named(&resp, SESSION_COOKIE).unwrap().max_age().is_none());

    let resp = test::TestRequest::post()
        .uri("/login")
        .set_form([("username", "alice"), ("password", "wonderland"), ("remember_me", "y")])
        .send_request(&app)
        .await;
    let cookie = cookie_named(&resp, SESSION_COOKIE).unwrap();
    assert!(cookie.max_age().unwrap().whole_days() > 0);
}

#[actix_web::test]
async fn test_logout_ends_session() {
    let (state, _) = seeded_state().await;
    let app = init_app!(state);

    let resp = login_request("/login", "alice", "wonderland").send_request(&app).await;
    let session = cookie_named(&resp, SESSION_COOKIE).unwrap();

    let resp = test::TestRequest::get().uri("/logout").cookie(session).send_request(&app).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");
    let cleared = cookie_named(&resp, SESSION_COOKIE).expect("logout clears the session cookie");
    assert_eq!(cleared.value(), "");

    // The client now presents the cleared cookie.
    let resp = test::TestRequest::get().uri("/").cookie(cleared).send_request(&app).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/login?next=%2F");

    // Logging out again is harmless.
    let resp = test::TestRequest::get().uri("/logout").send_request(&app).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");
}

#[actix_web::test]
async fn test_last_seen_refreshed_per_request() {
    let (state, store) = seeded_state().await;
    let app = init_app!(state);

    test::TestRequest::get().uri("/login").send_request(&app).await;
    let alice = store.find_by_username("alice").await.unwrap().unwrap();
    assert!(alice.last_seen.is_none(), "anonymous requests leave last_seen alone");

    let resp = login_request("/login", "alice", "wonderland").send_request(&app).await;
    let session = cookie_named(&resp, SESSION_COOKIE).unwrap();

    test::TestRequest::get().uri("/").cookie(session.clone()).send_request(&app).await;
    let alice = store.find_by_username("alice").await.unwrap().unwrap();
    assert!(alice.last_seen.is_some());

    let long_ago = Utc::now() - Duration::days(30);
    store.touch_last_seen(alice.id, long_ago).await.unwrap();

    test::TestRequest::get().uri("/user/alice").cookie(session).send_request(&app).await;
    let refreshed = store.find_by_username("alice").await.unwrap().unwrap().last_seen.unwrap();
    assert!(refreshed > long_ago + Duration::days(29));
}

#[actix_web::test]
async fn test_registration_rejects_duplicates() {
    let (state, _) = seeded_state().await;
    let app = init_app!(state);

    let resp = test::TestRequest::post()
        .uri("/register")
        .set_form([
            ("username", "alice"),
            ("email", "alice@example.com"),
            ("password", "x"),
            ("password2", "y"),
        ])
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["template"], "register.html");
    let errors = &body["context"]["errors"];
    assert_eq!(errors["username"][0], "Please use a different username.");
    assert_eq!(errors["email"][0], "Please use a different email address.");
    assert_eq!(errors["password2"][0], "Field must be equal to password.");
    assert!(body["context"]["form"].get("password").is_none());
}

#[actix_web::test]
async fn test_non_form_body_is_rejected() {
    let (state, _) = seeded_state().await;
    let app = init_app!(state);

    let resp = test::TestRequest::post()
        .uri("/login")
        .set_json(serde_json::json!({ "username": "alice", "password": "wonderland" }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(cookie_named(&resp, SESSION_COOKIE).is_none());
}
