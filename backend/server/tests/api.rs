use std::sync::Arc;

use attendance_server::{
    attendance::MarkPolicy,
    database::{Database, MemoryDatabase},
    router,
    state::AppState,
    utils::password_digest,
};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use geofence::{DEFAULT_CLASSROOM, Geofence};
use serde_json::{Value, json};
use tower::ServiceExt;

const PASSWORD: &str = "chalk";

struct Harness {
    app: Router,
    database: Arc<MemoryDatabase>,
}

async fn harness(once_per_day: bool) -> Harness {
    let database = Arc::new(MemoryDatabase::new());
    database
        .add_users(&["21CS001".to_string(), "21CS002".to_string()])
        .await
        .unwrap();
    database
        .save_credential(&password_digest(PASSWORD))
        .await
        .unwrap();

    let policy = MarkPolicy {
        geofence: Geofence::default(),
        once_per_day,
    };
    let state = AppState::with_database(policy, database.clone());

    Harness {
        app: router(state),
        database,
    }
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn open(app: &Router) {
    let (status, _) = send(
        app,
        "POST",
        "/authenticateTeacher",
        Some(json!({ "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

fn near(roll_number: &str) -> Value {
    json!({
        "rollNumber": roll_number,
        "latitude": DEFAULT_CLASSROOM.latitude + 0.00003,
        "longitude": DEFAULT_CLASSROOM.longitude,
    })
}

#[tokio::test]
async fn test_authenticate_opens_and_logout_closes() {
    let Harness { app, .. } = harness(true).await;

    let (_, status) = send(&app, "GET", "/teacherAuthenticationStatus", None).await;
    assert_eq!(status, json!({ "success": false }));

    let (code, body) = send(
        &app,
        "POST",
        "/authenticateTeacher",
        Some(json!({ "password": PASSWORD })),
    )
    .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Teacher authenticated successfully.");

    let (_, status) = send(&app, "GET", "/teacherAuthenticationStatus", None).await;
    assert_eq!(status, json!({ "success": true }));

    let (code, body) = send(&app, "POST", "/logout", None).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["message"], "Teacher logged out successfully.");

    let (_, status) = send(&app, "GET", "/teacherAuthenticationStatus", None).await;
    assert_eq!(status, json!({ "success": false }));
}

#[tokio::test]
async fn test_wrong_password_is_forbidden() {
    let Harness { app, database } = harness(true).await;

    let (code, body) = send(
        &app,
        "POST",
        "/authenticateTeacher",
        Some(json!({ "password": "eraser" })),
    )
    .await;

    assert_eq!(code, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
    assert_eq!(
        body["message"],
        "Invalid credentials. Only teachers are allowed to authenticate."
    );
    assert!(!database.accessible().await.unwrap());
}

#[tokio::test]
async fn test_authenticate_without_stored_credential() {
    let database = Arc::new(MemoryDatabase::new());
    let policy = MarkPolicy {
        geofence: Geofence::default(),
        once_per_day: true,
    };
    let app = router(AppState::with_database(policy, database));

    let (code, _) = send(
        &app,
        "POST",
        "/authenticateTeacher",
        Some(json!({ "password": "" })),
    )
    .await;
    assert_eq!(code, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_authenticate_malformed_body() {
    let Harness { app, .. } = harness(true).await;

    let (code, body) = send(&app, "POST", "/authenticateTeacher", Some(json!({}))).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_mark_rejected_while_closed() {
    let Harness { app, database } = harness(true).await;

    let (code, body) = send(&app, "POST", "/markAttendance", Some(near("21CS001"))).await;
    assert_eq!(code, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Attendance is not open.");
    assert!(database.results().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_first_mark_then_same_day_rejected() {
    let Harness { app, .. } = harness(true).await;
    open(&app).await;

    let (code, body) = send(&app, "POST", "/markAttendance", Some(near("21CS001"))).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Attendance marked successfully.");
    assert_eq!(body["attendanceCount"], 1);

    let distance = body["distance"].as_f64().unwrap();
    assert!(distance > 3.0 && distance < 4.0);

    let (code, body) = send(&app, "POST", "/markAttendance", Some(near("21CS001"))).await;
    assert_eq!(code, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Attendance already marked for today.");

    let (_, results) = send(&app, "GET", "/getResults", None).await;
    assert_eq!(results["success"], true);
    assert_eq!(results["results"].as_array().unwrap().len(), 1);
    assert_eq!(results["results"][0]["rollNumber"], "21CS001");
    assert_eq!(results["results"][0]["attendanceCount"], 1);
}

#[tokio::test]
async fn test_repeat_mark_without_daily_guard() {
    let Harness { app, database } = harness(false).await;
    open(&app).await;

    send(&app, "POST", "/markAttendance", Some(near("21CS002"))).await;
    let (code, body) = send(&app, "POST", "/markAttendance", Some(near("21CS002"))).await;

    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["attendanceCount"], 2);

    let record = database.result("21CS002").await.unwrap().unwrap();
    assert_eq!(record.attendance_count, 2);
}

#[tokio::test]
async fn test_out_of_range_is_not_persisted() {
    let Harness { app, database } = harness(true).await;
    open(&app).await;

    let far = json!({
        "rollNumber": "21CS001",
        "latitude": DEFAULT_CLASSROOM.latitude + 0.01,
        "longitude": DEFAULT_CLASSROOM.longitude,
    });

    let (code, body) = send(&app, "POST", "/markAttendance", Some(far)).await;
    assert_eq!(code, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You are not within the attendance range.");
    assert_eq!(database.result("21CS001").await.unwrap(), None);
}

#[tokio::test]
async fn test_unknown_roll_number() {
    let Harness { app, .. } = harness(true).await;
    open(&app).await;

    let (code, body) = send(&app, "POST", "/markAttendance", Some(near("99XX999"))).await;
    assert_eq!(code, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found.");
}

#[tokio::test]
async fn test_mark_accepts_string_coordinates_and_trims_roll() {
    let Harness { app, .. } = harness(true).await;
    open(&app).await;

    let payload = json!({
        "rollNumber": " 21CS002 ",
        "latitude": DEFAULT_CLASSROOM.latitude.to_string(),
        "longitude": DEFAULT_CLASSROOM.longitude.to_string(),
    });

    let (code, body) = send(&app, "POST", "/markAttendance", Some(payload)).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["distance"], 0.0);
}

#[tokio::test]
async fn test_mark_rejects_bad_payloads() {
    let Harness { app, .. } = harness(true).await;
    open(&app).await;

    let blank = json!({ "rollNumber": "  ", "latitude": 21.2486, "longitude": 81.6094 });
    let (code, _) = send(&app, "POST", "/markAttendance", Some(blank)).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);

    let impossible = json!({ "rollNumber": "21CS001", "latitude": 123.0, "longitude": 81.6094 });
    let (code, body) = send(&app, "POST", "/markAttendance", Some(impossible)).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let missing = json!({ "rollNumber": "21CS001" });
    let (code, _) = send(&app, "POST", "/markAttendance", Some(missing)).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let Harness { app, .. } = harness(true).await;

    let (first, _) = send(&app, "POST", "/logout", None).await;
    let (second, _) = send(&app, "POST", "/logout", None).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
}
