//! End-to-end flows through the full router

mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;
use std::time::Duration;

const SIGN_IN: &str = "/api/user/sign_in";

#[tokio::test]
async fn test_sliding_window_admission() {
    let app = TestApp::with_args(&["--limit-search-vacancies", "5/60"]);
    let token = app.account("ann@example.com", "Ann", "applicant").await;
    let uri = "/api/search/search_vacancies";

    for i in 0..5 {
        let reply = app.send(Method::GET, uri, Some(&token), None).await;
        assert_eq!(reply.status, StatusCode::OK, "request {} should pass", i + 1);
    }

    let denied = app.send(Method::GET, uri, Some(&token), None).await;
    assert_eq!(denied.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(denied.body["detail"], "Requests exceeded");
    assert_eq!(denied.headers["retry-after"], "60");

    app.advance(Duration::from_secs(61));

    let reply = app.send(Method::GET, uri, Some(&token), None).await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn test_limits_are_isolated_per_identity() {
    let app = TestApp::with_args(&["--limit-search-vacancies", "2/60"]);
    let ann = app.account("ann@example.com", "Ann", "applicant").await;
    let bob = app.account("bob@example.com", "Bob", "applicant").await;
    let uri = "/api/search/search_vacancies";

    for _ in 0..2 {
        assert_eq!(app.send(Method::GET, uri, Some(&ann), None).await.status, StatusCode::OK);
    }
    assert_eq!(
        app.send(Method::GET, uri, Some(&ann), None).await.status,
        StatusCode::TOO_MANY_REQUESTS
    );

    // Bob has his own window
    assert_eq!(app.send(Method::GET, uri, Some(&bob), None).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_limits_are_isolated_per_endpoint() {
    let app = TestApp::with_args(&["--limit-search-vacancies", "1/60", "--limit-set-status", "1/60"]);
    let token = app.account("ann@example.com", "Ann", "applicant").await;

    let search = "/api/search/search_vacancies";
    assert_eq!(app.send(Method::GET, search, Some(&token), None).await.status, StatusCode::OK);
    assert_eq!(
        app.send(Method::GET, search, Some(&token), None).await.status,
        StatusCode::TOO_MANY_REQUESTS
    );

    // Exhausting search leaves set_status untouched; the role check answers instead
    let reply = app
        .send(
            Method::PUT,
            "/api/response/set_status/1",
            Some(&token),
            Some(json!({ "status": "viewed" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_sign_in_is_limited_per_address() {
    let app = TestApp::with_args(&["--limit-sign-in", "2/60"]);
    app.sign_up("ann@example.com", "Ann", "applicant").await;
    let body = json!({ "email": "ann@example.com", "password": "wrong" });

    for _ in 0..2 {
        let reply = app
            .send_from(Method::POST, SIGN_IN, None, Some(body.clone()), "10.0.0.1:50000", None)
            .await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    }

    // A new source port is the same client
    let reply = app
        .send_from(Method::POST, SIGN_IN, None, Some(body.clone()), "10.0.0.1:50001", None)
        .await;
    assert_eq!(reply.status, StatusCode::TOO_MANY_REQUESTS);

    // Another address still gets through
    let reply = app
        .send_from(Method::POST, SIGN_IN, None, Some(body), "10.0.0.2:50000", None)
        .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_rotating_forwarded_for_does_not_reset_limit() {
    let app = TestApp::with_args(&["--limit-sign-in", "2/60"]);
    app.sign_up("ann@example.com", "Ann", "applicant").await;
    let body = json!({ "email": "ann@example.com", "password": "wrong" });

    let mut statuses = Vec::new();
    for i in 1..=5 {
        let forwarded_for = format!("203.0.113.{i}");
        let reply = app
            .send_from(
                Method::POST,
                SIGN_IN,
                None,
                Some(body.clone()),
                "198.51.100.50:41000",
                Some(&forwarded_for),
            )
            .await;
        statuses.push(reply.status);
    }

    assert_eq!(&statuses[..2], &[StatusCode::UNAUTHORIZED; 2]);
    assert!(statuses[2..].iter().all(|s| *s == StatusCode::TOO_MANY_REQUESTS));
}

#[tokio::test]
async fn test_loopback_proxy_forwards_client_address() {
    let app = TestApp::with_args(&["--limit-sign-in", "1/60"]);
    app.sign_up("ann@example.com", "Ann", "applicant").await;
    let body = json!({ "email": "ann@example.com", "password": "wrong" });
    let proxy = "127.0.0.1:40000";

    let reply = app
        .send_from(Method::POST, SIGN_IN, None, Some(body.clone()), proxy, Some("203.0.113.1"))
        .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    // Distinct clients behind the proxy are limited separately
    let reply = app
        .send_from(Method::POST, SIGN_IN, None, Some(body.clone()), proxy, Some("203.0.113.2"))
        .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    let reply = app
        .send_from(Method::POST, SIGN_IN, None, Some(body.clone()), proxy, Some("203.0.113.1"))
        .await;
    assert_eq!(reply.status, StatusCode::TOO_MANY_REQUESTS);

    // A loopback value in the header falls back to the proxy's own address
    let reply = app
        .send_from(Method::POST, SIGN_IN, None, Some(body.clone()), proxy, Some("127.0.0.1"))
        .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    let reply = app
        .send_from(Method::POST, SIGN_IN, None, Some(body), proxy, None)
        .await;
    assert_eq!(reply.status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_vacancy_search_cache_is_versioned() {
    let app = TestApp::new();
    let tenant = app.account("hr@example.com", "HR", "tenant").await;
    let applicant = app.account("ann@example.com", "Ann", "applicant").await;
    let uri = "/api/search/search_vacancies";

    let v1 = app.create_vacancy(&tenant, "Python developer", "Almaty", 500_000).await;

    let first = app.send(Method::GET, uri, Some(&applicant), None).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["source"], "db");
    assert_eq!(first.body["vacancies"][0]["id"], v1);

    let second = app.send(Method::GET, uri, Some(&applicant), None).await;
    assert_eq!(second.body["source"], "cache");
    assert_eq!(second.body["vacancies"], first.body["vacancies"]);

    let v2 = app
        .create_vacancy(&tenant, "Senior Python Developer", "Almaty", 800_000)
        .await;

    let third = app.send(Method::GET, uri, Some(&applicant), None).await;
    assert_eq!(third.body["source"], "db");
    let ids: Vec<i64> = third.body["vacancies"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![v1, v2]);
}

#[tokio::test]
async fn test_search_cache_keys_include_filters() {
    let app = TestApp::new();
    let tenant = app.account("hr@example.com", "HR", "tenant").await;
    let applicant = app.account("ann@example.com", "Ann", "applicant").await;

    app.create_vacancy(&tenant, "Python developer", "Almaty", 500_000).await;
    app.create_vacancy(&tenant, "Go developer", "Astana", 300_000).await;

    let almaty = app
        .send(Method::GET, "/api/search/search_vacancies?city=almaty", Some(&applicant), None)
        .await;
    assert_eq!(almaty.body["source"], "db");
    assert_eq!(almaty.body["vacancies"].as_array().unwrap().len(), 1);

    // Different filter, different key
    let paid = app
        .send(
            Method::GET,
            "/api/search/search_vacancies?compensation=400000",
            Some(&applicant),
            None,
        )
        .await;
    assert_eq!(paid.body["source"], "db");
    assert_eq!(paid.body["vacancies"][0]["title"], "Python developer");

    let almaty_again = app
        .send(Method::GET, "/api/search/search_vacancies?city=almaty", Some(&applicant), None)
        .await;
    assert_eq!(almaty_again.body["source"], "cache");
}

#[tokio::test]
async fn test_resume_search_cache_is_versioned() {
    let app = TestApp::new();
    let tenant = app.account("hr@example.com", "HR", "tenant").await;
    let applicant = app.account("ann@example.com", "Ann", "applicant").await;
    let uri = "/api/search/search_resumes?stack=rust";

    let resume = app.create_resume(&applicant, "Backend", "Almaty", "Rust, Tokio").await;

    let first = app.send(Method::GET, uri, Some(&tenant), None).await;
    assert_eq!(first.body["source"], "db");
    assert_eq!(first.body["resumes"][0]["id"], resume);

    assert_eq!(app.send(Method::GET, uri, Some(&tenant), None).await.body["source"], "cache");

    let reply = app
        .send(
            Method::PUT,
            &format!("/api/resume/edit_resume/{resume}"),
            Some(&applicant),
            Some(json!({ "new_stack": "Go" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);

    let after = app.send(Method::GET, uri, Some(&tenant), None).await;
    assert_eq!(after.body["source"], "db");
    assert!(after.body["resumes"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_search_cache_expires() {
    let app = TestApp::with_args(&["--search-cache-ttl", "30"]);
    let applicant = app.account("ann@example.com", "Ann", "applicant").await;
    let uri = "/api/search/search_vacancies";

    assert_eq!(app.send(Method::GET, uri, Some(&applicant), None).await.body["source"], "db");
    assert_eq!(app.send(Method::GET, uri, Some(&applicant), None).await.body["source"], "cache");

    app.advance(Duration::from_secs(31));

    assert_eq!(app.send(Method::GET, uri, Some(&applicant), None).await.body["source"], "db");
}

#[tokio::test]
async fn test_profile_cache_invalidated_on_edit() {
    let app = TestApp::new();
    let token = app.account("ann@example.com", "Ann", "applicant").await;
    let uri = "/api/user/get_info";

    let first = app.send(Method::GET, uri, Some(&token), None).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["source"], "db");
    assert_eq!(first.body["info"]["name"], "Ann");

    let second = app.send(Method::GET, uri, Some(&token), None).await;
    assert_eq!(second.body["source"], "cache");

    let reply = app
        .send(
            Method::PUT,
            "/api/user/edit_name",
            Some(&token),
            Some(json!({ "new_name": "Anna", "password": common::PASSWORD })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);

    let third = app.send(Method::GET, uri, Some(&token), None).await;
    assert_eq!(third.body["source"], "db");
    assert_eq!(third.body["info"]["name"], "Anna");
}

#[tokio::test]
async fn test_response_lifecycle() {
    let app = TestApp::new();
    let tenant = app.account("hr@example.com", "HR", "tenant").await;
    let applicant = app.account("ann@example.com", "Ann", "applicant").await;

    let vacancy = app.create_vacancy(&tenant, "Python developer", "Almaty", 500_000).await;
    let resume = app.create_resume(&applicant, "Backend", "Almaty", "Python").await;
    let apply = format!("/api/response/apply_to_vacancy/{vacancy}");
    let body = json!({ "resume_id": resume, "cover_letter": "Hello" });

    let applied = app.send(Method::POST, &apply, Some(&applicant), Some(body.clone())).await;
    assert_eq!(applied.status, StatusCode::OK);
    assert_eq!(applied.body["response"]["status"], "send");
    let response_id = applied.body["response"]["id"].as_i64().unwrap();

    let duplicate = app.send(Method::POST, &apply, Some(&applicant), Some(body)).await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);

    let listed = app
        .send(
            Method::GET,
            &format!("/api/response/{vacancy}/get_responses"),
            Some(&tenant),
            None,
        )
        .await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body[0]["resume"]["stack"], "Python");
    assert_eq!(listed.body[0]["user"]["email"], "ann@example.com");

    let updated = app
        .send(
            Method::PUT,
            &format!("/api/response/set_status/{response_id}"),
            Some(&tenant),
            Some(json!({ "status": "interview" })),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["message"], "Status was updated");

    let listed = app
        .send(
            Method::GET,
            &format!("/api/response/{vacancy}/get_responses"),
            Some(&tenant),
            None,
        )
        .await;
    assert_eq!(listed.body[0]["status"], "interview");
}

#[tokio::test]
async fn test_status_send_cannot_be_set() {
    let app = TestApp::new();
    let tenant = app.account("hr@example.com", "HR", "tenant").await;

    let reply = app
        .send(
            Method::PUT,
            "/api/response/set_status/1",
            Some(&tenant),
            Some(json!({ "status": "send" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_authorization_failures() {
    let app = TestApp::new();
    let tenant = app.account("hr@example.com", "HR", "tenant").await;
    let other = app.account("rival@example.com", "Rival", "tenant").await;
    let applicant = app.account("ann@example.com", "Ann", "applicant").await;

    let reply = app.send(Method::GET, "/api/user/get_info", None, None).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["detail"], "No token");

    let reply = app.send(Method::GET, "/api/user/get_info", Some("garbage"), None).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    let reply = app
        .send(Method::GET, "/api/search/search_resumes", Some(&applicant), None)
        .await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.body["detail"], "Only tenants can search resumes");

    let vacancy = app.create_vacancy(&tenant, "Python developer", "Almaty", 500_000).await;
    let reply = app
        .send(
            Method::DELETE,
            &format!("/api/vacancy/delete_vacancy/{vacancy}"),
            Some(&other),
            None,
        )
        .await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.body["detail"], "This is not your vacancy");

    let reply = app
        .send(Method::DELETE, "/api/vacancy/delete_vacancy/999", Some(&tenant), None)
        .await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body["detail"], "Vacancy not found");

    let reply = app.send(Method::GET, "/api/admin/get_users", Some(&tenant), None).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.body["detail"], "You are not an admin");
}

#[tokio::test]
async fn test_deleted_account_token_is_rejected() {
    let app = TestApp::new();
    let tenant = app.account("hr@example.com", "HR", "tenant").await;
    let applicant = app.account("ann@example.com", "Ann", "applicant").await;

    app.create_vacancy(&tenant, "Python developer", "Almaty", 500_000).await;
    let uri = "/api/search/search_vacancies";
    assert_eq!(app.send(Method::GET, uri, Some(&applicant), None).await.body["source"], "db");
    assert_eq!(app.send(Method::GET, uri, Some(&applicant), None).await.body["source"], "cache");

    let reply = app
        .send(
            Method::DELETE,
            "/api/user/delete_user",
            Some(&tenant),
            Some(json!({ "password": common::PASSWORD })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);

    let reply = app.send(Method::GET, "/api/user/get_info", Some(&tenant), None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);

    // The cascade removed a vacancy, so cached searches are stale
    let after = app.send(Method::GET, uri, Some(&applicant), None).await;
    assert_eq!(after.body["source"], "db");
    assert!(after.body["vacancies"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_sign_in_sets_cookie() {
    let app = TestApp::new();
    app.sign_up("ann@example.com", "Ann", "applicant").await;

    let reply = app
        .send(
            Method::POST,
            "/api/user/sign_in",
            None,
            Some(json!({ "email": "ann@example.com", "password": common::PASSWORD })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);

    let cookie = reply.headers["set-cookie"].to_str().unwrap();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));
}
