mod helpers;

use axum::{
    body::Body as AxumBody,
    http::{Request, StatusCode},
};
use chrono::{Datelike, Duration, Utc};
use serde_json::{Value, json};
use tower::ServiceExt;

use api::auth::generate_jwt;
use db::models::{
    attendance_record::{Column as RecordCol, Entity as RecordEntity, Model as RecordModel, Status},
    attendance_session::Model as SessionModel,
    course::Model as CourseModel,
    course_schedule_slot::{Model as SlotModel, SessionWindow},
    course_student::Model as EnrollmentModel,
    department::Model as DepartmentModel,
    user::{Model as UserModel, Role},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

use helpers::app::make_test_app;

struct TestCtx {
    teacher: UserModel,
    student_a: UserModel,
    student_b: UserModel,
    student_c: UserModel,
    course: CourseModel,
}

async fn setup(db: &DatabaseConnection) -> TestCtx {
    let dept = DepartmentModel::create(db, "Computer Science")
        .await
        .expect("create department");

    let teacher = UserModel::create(
        db,
        "Tessa",
        "Hill",
        "tessa.hill@test.com",
        "password",
        Role::Teacher,
        None,
        None,
    )
    .await
    .expect("create teacher");

    let course = CourseModel::create(
        db,
        "Operating Systems",
        "CS240",
        teacher.id,
        dept.id,
        Utc::now().date_naive(),
        5,
    )
    .await
    .expect("create course");

    // A slot covering the whole of today keeps "now" inside the window.
    let today = Utc::now().weekday().num_days_from_monday() as i16;
    SlotModel::create(db, course.id, today, Some("00:00"), Some("23:59"))
        .await
        .expect("create slot");

    let student_a = UserModel::create(
        db,
        "Ada",
        "Moyo",
        "ada@test.com",
        "password",
        Role::Student,
        Some(dept.id),
        Some(json!([0.0, 0.0, 0.0, 0.0])),
    )
    .await
    .expect("create student a");
    let student_b = UserModel::create(
        db,
        "Ben",
        "Naidoo",
        "ben@test.com",
        "password",
        Role::Student,
        Some(dept.id),
        Some(json!([1.0, 1.0, 1.0, 1.0])),
    )
    .await
    .expect("create student b");
    let student_c = UserModel::create(
        db,
        "Cara",
        "Smit",
        "cara@test.com",
        "password",
        Role::Student,
        Some(dept.id),
        None,
    )
    .await
    .expect("create student c");

    for s in [&student_a, &student_b, &student_c] {
        EnrollmentModel::enroll(db, course.id, s.id)
            .await
            .expect("enroll");
    }

    TestCtx {
        teacher,
        student_a,
        student_b,
        student_c,
        course,
    }
}

/// Opens a session directly through the model layer with a window that is
/// currently open, and materializes the roster.
async fn open_session(db: &DatabaseConnection, ctx: &TestCtx) -> SessionModel {
    let now = Utc::now();
    let window = SessionWindow {
        weekday: now.weekday(),
        start_label: "00:00".to_owned(),
        start: now - Duration::minutes(30),
        end: now + Duration::minutes(30),
    };
    let session = SessionModel::create(db, ctx.course.id, ctx.teacher.id, &window, now)
        .await
        .expect("create session");
    let students = CourseModel::enrolled_students(db, ctx.course.id)
        .await
        .expect("load roster");
    RecordModel::materialize_roster(db, &session, ctx.teacher.id, &students, now)
        .await
        .expect("materialize roster");
    session
}

fn request(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<AxumBody> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"));
    match body {
        Some(v) => builder
            .header("Content-Type", "application/json")
            .body(AxumBody::from(v.to_string()))
            .unwrap(),
        None => builder.body(AxumBody::empty()).unwrap(),
    }
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------
// create_session
// ---------------------------

#[tokio::test]
async fn test_create_session_materializes_full_roster() {
    let (app, app_state) = make_test_app().await;
    let ctx = setup(app_state.db()).await;

    let (token, _) = generate_jwt(ctx.teacher.id, Role::Teacher);
    let uri = format!("/api/attendance/create/{}", ctx.course.id);

    let resp = app
        .clone()
        .oneshot(request("POST", &uri, &token, Some(json!({}))))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let json = body_json(resp).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Attendance session created successfully");
    assert_eq!(json["data"]["records_created"], 3);
    assert_eq!(json["data"]["active"], true);

    let session_id = json["data"]["id"].as_i64().expect("session id");
    let records = RecordEntity::find()
        .filter(RecordCol::SessionId.eq(session_id))
        .all(app_state.db())
        .await
        .unwrap();
    assert_eq!(records.len(), 3);
    for record in &records {
        assert_eq!(record.status, Status::Pending);
        assert_eq!(record.teacher_id, ctx.teacher.id);
    }

    // Descriptors are copied per student; the descriptorless student stays null.
    let by_student = |id: i64| records.iter().find(|r| r.student_id == id).unwrap();
    assert_eq!(
        by_student(ctx.student_a.id).descriptor(),
        Some(vec![0.0, 0.0, 0.0, 0.0])
    );
    assert_eq!(
        by_student(ctx.student_b.id).descriptor(),
        Some(vec![1.0, 1.0, 1.0, 1.0])
    );
    assert!(by_student(ctx.student_c.id).face_descriptor.is_none());
}

#[tokio::test]
async fn test_create_session_forbidden_for_student() {
    let (app, app_state) = make_test_app().await;
    let ctx = setup(app_state.db()).await;

    let (token, _) = generate_jwt(ctx.student_a.id, Role::Student);
    let uri = format!("/api/attendance/create/{}", ctx.course.id);

    let resp = app
        .oneshot(request("POST", &uri, &token, Some(json!({}))))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_session_unknown_course_404() {
    let (app, app_state) = make_test_app().await;
    let ctx = setup(app_state.db()).await;

    let (token, _) = generate_jwt(ctx.teacher.id, Role::Teacher);
    let resp = app
        .oneshot(request(
            "POST",
            "/api/attendance/create/999999",
            &token,
            Some(json!({})),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_session_rejected_when_no_class_today() {
    let (app, app_state) = make_test_app().await;
    let db = app_state.db();
    let ctx = setup(db).await;

    // A second course scheduled only for tomorrow's weekday.
    let other = CourseModel::create(
        db,
        "Databases",
        "CS244",
        ctx.teacher.id,
        ctx.course.department_id,
        Utc::now().date_naive(),
        5,
    )
    .await
    .unwrap();
    let tomorrow = (Utc::now().weekday().num_days_from_monday() as i16 + 1) % 7;
    SlotModel::create(db, other.id, tomorrow, Some("09:00"), Some("10:00"))
        .await
        .unwrap();

    let (token, _) = generate_jwt(ctx.teacher.id, Role::Teacher);
    let uri = format!("/api/attendance/create/{}", other.id);
    let resp = app
        .oneshot(request("POST", &uri, &token, Some(json!({}))))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let json = body_json(resp).await;
    assert_eq!(json["success"], false);
    assert!(
        json["message"]
            .as_str()
            .unwrap()
            .contains("No class scheduled")
    );
}

#[tokio::test]
async fn test_create_session_rejected_on_incomplete_schedule() {
    let (app, app_state) = make_test_app().await;
    let db = app_state.db();
    let ctx = setup(db).await;

    let other = CourseModel::create(
        db,
        "Networks",
        "CS248",
        ctx.teacher.id,
        ctx.course.department_id,
        Utc::now().date_naive(),
        5,
    )
    .await
    .unwrap();
    let today = Utc::now().weekday().num_days_from_monday() as i16;
    SlotModel::create(db, other.id, today, Some("00:00"), None)
        .await
        .unwrap();

    let (token, _) = generate_jwt(ctx.teacher.id, Role::Teacher);
    let uri = format!("/api/attendance/create/{}", other.id);
    let resp = app
        .oneshot(request("POST", &uri, &token, Some(json!({}))))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let json = body_json(resp).await;
    assert!(json["message"].as_str().unwrap().contains("incomplete"));
}

// ---------------------------
// mark_attendance
// ---------------------------

#[tokio::test]
async fn test_mark_manual_marks_caller_present() {
    let (app, app_state) = make_test_app().await;
    let db = app_state.db();
    let ctx = setup(db).await;
    let session = open_session(db, &ctx).await;

    let (token, _) = generate_jwt(ctx.student_a.id, Role::Student);
    let uri = format!("/api/attendance/mark/{}", session.session_identifier);

    let resp = app
        .oneshot(request("PUT", &uri, &token, Some(json!({}))))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    assert_eq!(json["message"], "Attendance marked successfully");
    assert_eq!(json["data"]["student_id"], ctx.student_a.id);
    assert_eq!(json["data"]["verification_method"], "manual");

    let record = RecordModel::find_for_session_and_student(db, session.id, ctx.student_a.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, Status::Present);
    assert!(record.marked_at.is_some());
}

#[tokio::test]
async fn test_mark_face_identifies_nearest_pending_student() {
    let (app, app_state) = make_test_app().await;
    let db = app_state.db();
    let ctx = setup(db).await;
    let session = open_session(db, &ctx).await;

    // Probe within 0.6 of student B's stored descriptor only.
    let (token, _) = generate_jwt(ctx.teacher.id, Role::Teacher);
    let uri = format!("/api/attendance/mark/{}", session.session_identifier);
    let body = json!({ "descriptor": [1.0, 1.0, 1.0, 1.2] });

    let resp = app
        .clone()
        .oneshot(request("PUT", &uri, &token, Some(body)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    assert_eq!(json["data"]["student_id"], ctx.student_b.id);
    assert_eq!(json["data"]["verification_method"], "face");

    let record = RecordModel::find_for_session_and_student(db, session.id, ctx.student_b.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, Status::Present);

    // Nobody else was touched.
    let pending = RecordEntity::find()
        .filter(RecordCol::SessionId.eq(session.id))
        .filter(RecordCol::Status.eq(Status::Pending))
        .count(db)
        .await
        .unwrap();
    assert_eq!(pending, 2);
}

#[tokio::test]
async fn test_mark_face_no_match_within_threshold() {
    let (app, app_state) = make_test_app().await;
    let db = app_state.db();
    let ctx = setup(db).await;
    let session = open_session(db, &ctx).await;

    let (token, _) = generate_jwt(ctx.teacher.id, Role::Teacher);
    let uri = format!("/api/attendance/mark/{}", session.session_identifier);
    let body = json!({ "descriptor": [5.0, 5.0, 5.0, 5.0] });

    let resp = app
        .oneshot(request("PUT", &uri, &token, Some(body)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let json = body_json(resp).await;
    assert!(
        json["message"]
            .as_str()
            .unwrap()
            .contains("No matching student")
    );
}

#[tokio::test]
async fn test_mark_face_dimension_mismatch_is_bad_request() {
    let (app, app_state) = make_test_app().await;
    let db = app_state.db();
    let ctx = setup(db).await;
    let session = open_session(db, &ctx).await;

    let (token, _) = generate_jwt(ctx.teacher.id, Role::Teacher);
    let uri = format!("/api/attendance/mark/{}", session.session_identifier);
    let body = json!({ "descriptor": [0.0, 0.0] }); // stored descriptors have 4 values

    let resp = app
        .oneshot(request("PUT", &uri, &token, Some(body)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_mark_twice_is_rejected() {
    let (app, app_state) = make_test_app().await;
    let db = app_state.db();
    let ctx = setup(db).await;
    let session = open_session(db, &ctx).await;

    let (token, _) = generate_jwt(ctx.student_a.id, Role::Student);
    let uri = format!("/api/attendance/mark/{}", session.session_identifier);

    let first = app
        .clone()
        .oneshot(request("PUT", &uri, &token, Some(json!({}))))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(request("PUT", &uri, &token, Some(json!({}))))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);

    let json = body_json(second).await;
    assert_eq!(json["message"], "Attendance already marked");
}

#[tokio::test]
async fn test_mark_unknown_identifier_404() {
    let (app, app_state) = make_test_app().await;
    let ctx = setup(app_state.db()).await;

    let (token, _) = generate_jwt(ctx.student_a.id, Role::Student);
    let resp = app
        .oneshot(request(
            "PUT",
            "/api/attendance/mark/nope_Monday_09:00_0",
            &token,
            Some(json!({})),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mark_deactivated_session_forbidden() {
    let (app, app_state) = make_test_app().await;
    let db = app_state.db();
    let ctx = setup(db).await;
    let session = open_session(db, &ctx).await;

    SessionModel::deactivate(db, session.id).await.unwrap();

    let (token, _) = generate_jwt(ctx.student_a.id, Role::Student);
    let uri = format!("/api/attendance/mark/{}", session.session_identifier);
    let resp = app
        .oneshot(request("PUT", &uri, &token, Some(json!({}))))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let json = body_json(resp).await;
    assert!(json["message"].as_str().unwrap().contains("not active"));
}

// ---------------------------
// reporting views
// ---------------------------

#[tokio::test]
async fn test_student_course_attendance_view() {
    let (app, app_state) = make_test_app().await;
    let db = app_state.db();
    let ctx = setup(db).await;
    let session = open_session(db, &ctx).await;

    let (token, _) = generate_jwt(ctx.student_a.id, Role::Student);
    let mark_uri = format!("/api/attendance/mark/{}", session.session_identifier);
    let resp = app
        .clone()
        .oneshot(request("PUT", &mark_uri, &token, Some(json!({}))))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let uri = format!("/api/attendance/student/{}", ctx.course.id);
    let resp = app
        .clone()
        .oneshot(request("GET", &uri, &token, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    assert_eq!(json["data"]["course_code"], "CS240");
    let list = json["data"]["attendance_list"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["status"], "present");
    assert_eq!(list[0]["is_active"], true);

    // A non-enrolled caller is turned away.
    let outsider = UserModel::create(
        db,
        "Out",
        "Sider",
        "out@test.com",
        "password",
        Role::Student,
        None,
        None,
    )
    .await
    .unwrap();
    let (outsider_token, _) = generate_jwt(outsider.id, Role::Student);
    let resp = app
        .oneshot(request("GET", &uri, &outsider_token, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_summaries_after_expiry_sweep() {
    let (app, app_state) = make_test_app().await;
    let db = app_state.db();
    let ctx = setup(db).await;
    let session = open_session(db, &ctx).await;

    // Student A marks present while the window is open.
    let (student_token, _) = generate_jwt(ctx.student_a.id, Role::Student);
    let mark_uri = format!("/api/attendance/mark/{}", session.session_identifier);
    let resp = app
        .clone()
        .oneshot(request("PUT", &mark_uri, &student_token, Some(json!({}))))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // The lecture window closes and the sweep runs.
    let now = Utc::now();
    let mut active: db::models::attendance_session::ActiveModel = session.into();
    active.end_time = sea_orm::Set(now - Duration::seconds(1));
    sea_orm::ActiveModelTrait::update(active, db).await.unwrap();

    assert_eq!(SessionModel::expire_overdue(db, now).await.unwrap(), 1);
    assert_eq!(RecordModel::absent_overdue(db, now).await.unwrap(), 2);

    // Teacher-side summary counts one present, two absent.
    let (teacher_token, _) = generate_jwt(ctx.teacher.id, Role::Teacher);
    let resp = app
        .clone()
        .oneshot(request(
            "GET",
            "/api/attendance/attendance-summary",
            &teacher_token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["total_present"], 1);
    assert_eq!(json["data"]["total_absent"], 2);

    let resp = app
        .clone()
        .oneshot(request(
            "GET",
            "/api/attendance/total-courses",
            &teacher_token,
            None,
        ))
        .await
        .unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["data"]["total_courses"], 1);

    // Student B sees a single absent class.
    let (b_token, _) = generate_jwt(ctx.student_b.id, Role::Student);
    let resp = app
        .clone()
        .oneshot(request(
            "GET",
            "/api/attendance/attendance-summary/student",
            &b_token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["total_classes"], 1);
    assert_eq!(json["data"]["total_absent"], 1);
    assert_eq!(json["data"]["total_present"], 0);

    // Student history shows the absent entry for student C too.
    let (c_token, _) = generate_jwt(ctx.student_c.id, Role::Student);
    let resp = app
        .clone()
        .oneshot(request(
            "GET",
            "/api/attendance/student/history",
            &c_token,
            None,
        ))
        .await
        .unwrap();
    let json = body_json(resp).await;
    let history = json["data"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["status"], "absent");
    assert_eq!(history[0]["course_code"], "CS240");

    // Teacher history lists all three outcomes.
    let uri = format!("/api/attendance/teacher/history/{}", ctx.course.id);
    let resp = app
        .oneshot(request("GET", &uri, &teacher_token, None))
        .await
        .unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 3);
}
