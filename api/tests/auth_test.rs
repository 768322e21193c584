mod helpers;

use axum::{
    body::Body as AxumBody,
    http::{Request, StatusCode},
};
use chrono::Utc;
use serde_json::{Value, json};
use tower::ServiceExt;

use api::auth::generate_jwt;
use db::models::{
    course::Model as CourseModel,
    course_student::Model as EnrollmentModel,
    department::Model as DepartmentModel,
    user::{Model as UserModel, Role},
};

use helpers::app::make_test_app;

fn json_request(method: &str, uri: &str, body: Value) -> Request<AxumBody> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(AxumBody::from(body.to_string()))
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_register_student_requires_face_data_and_department() {
    let (app, app_state) = make_test_app().await;
    let dept = DepartmentModel::create(app_state.db(), "Physics")
        .await
        .unwrap();

    // Missing descriptor.
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            json!({
                "first_name": "Sam",
                "last_name": "Ncube",
                "email": "sam@test.com",
                "password": "supersecret",
                "role": "student",
                "department_id": dept.id,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert!(json["message"].as_str().unwrap().contains("Face data"));

    // Missing department.
    let resp = app
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            json!({
                "first_name": "Sam",
                "last_name": "Ncube",
                "email": "sam@test.com",
                "password": "supersecret",
                "role": "student",
                "face_descriptor": [0.1, 0.2],
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert!(json["message"].as_str().unwrap().contains("Department"));
}

#[tokio::test]
async fn test_register_login_profile_round_trip() {
    let (app, app_state) = make_test_app().await;
    let db = app_state.db();

    let dept = DepartmentModel::create(db, "Mathematics").await.unwrap();
    let teacher = UserModel::create(
        db,
        "Thandi",
        "Dube",
        "thandi@test.com",
        "password",
        Role::Teacher,
        None,
        None,
    )
    .await
    .unwrap();
    let course = CourseModel::create(
        db,
        "Linear Algebra",
        "MATH214",
        teacher.id,
        dept.id,
        Utc::now().date_naive(),
        6,
    )
    .await
    .unwrap();

    // Registration enrolls the student in the department's courses.
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            json!({
                "first_name": "Lebo",
                "last_name": "Mokoena",
                "email": "lebo@test.com",
                "password": "supersecret",
                "role": "student",
                "department_id": dept.id,
                "face_descriptor": [0.3, 0.1, 0.4],
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let json = body_json(resp).await;
    assert_eq!(json["success"], true);
    let student_id = json["data"]["id"].as_i64().unwrap();
    let code = json["data"]["unique_code"].as_str().unwrap();
    assert!(code.starts_with('B'));
    assert!(!json["data"]["token"].as_str().unwrap().is_empty());

    assert!(
        EnrollmentModel::is_enrolled(db, course.id, student_id)
            .await
            .unwrap()
    );

    // Login with the same credentials.
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            json!({ "email": "lebo@test.com", "password": "supersecret" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    let token = json["data"]["token"].as_str().unwrap().to_owned();

    // Token works against the profile endpoint.
    let resp = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/auth/profile")
                .header("Authorization", format!("Bearer {token}"))
                .body(AxumBody::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["email"], "lebo@test.com");
    assert_eq!(json["data"]["role"], "student");
    assert_eq!(json["data"]["course_ids"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_register_duplicate_email_conflict() {
    let (app, app_state) = make_test_app().await;
    UserModel::create(
        app_state.db(),
        "First",
        "Taken",
        "taken@test.com",
        "password",
        Role::Teacher,
        None,
        None,
    )
    .await
    .unwrap();

    let resp = app
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            json!({
                "first_name": "Second",
                "last_name": "Taker",
                "email": "taken@test.com",
                "password": "supersecret",
                "role": "teacher",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_teacher_needs_no_face_data() {
    let (app, _state) = make_test_app().await;

    let resp = app
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            json!({
                "first_name": "Tau",
                "last_name": "Kgomo",
                "email": "tau@test.com",
                "password": "supersecret",
                "role": "teacher",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let json = body_json(resp).await;
    assert!(json["data"]["unique_code"].as_str().unwrap().starts_with('S'));
}

#[tokio::test]
async fn test_login_wrong_password_unauthorized() {
    let (app, app_state) = make_test_app().await;
    UserModel::create(
        app_state.db(),
        "Nina",
        "Pillay",
        "nina@test.com",
        "password",
        Role::Teacher,
        None,
        None,
    )
    .await
    .unwrap();

    let resp = app
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            json!({ "email": "nina@test.com", "password": "wrong-password" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_update_rehashes_password() {
    let (app, app_state) = make_test_app().await;
    let db = app_state.db();
    let user = UserModel::create(
        db,
        "Zain",
        "Omar",
        "zain@test.com",
        "oldpassword",
        Role::Teacher,
        None,
        None,
    )
    .await
    .unwrap();

    let (token, _) = generate_jwt(user.id, Role::Teacher);
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/auth/profile")
                .header("Authorization", format!("Bearer {token}"))
                .header("Content-Type", "application/json")
                .body(AxumBody::from(
                    json!({ "password": "newpassword", "first_name": "Zane" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let updated = UserModel::find_by_id(db, user.id).await.unwrap().unwrap();
    assert_eq!(updated.first_name, "Zane");
    assert!(updated.verify_password("newpassword"));
    assert!(!updated.verify_password("oldpassword"));
}

#[tokio::test]
async fn test_profile_requires_token() {
    let (app, _state) = make_test_app().await;

    let resp = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/auth/profile")
                .body(AxumBody::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
