use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Default)]
pub struct AttendanceSessionResponse {
    pub id: i64,
    pub course_id: i64,
    pub created_by: i64,
    pub lecture_date: Option<NaiveDate>,
    pub start_time: String,
    pub end_time: String,
    pub active: bool,
    pub session_identifier: String,
    /// How many pending records were issued when the roster was snapshotted.
    pub records_created: u64,
}

impl AttendanceSessionResponse {
    pub fn from_session(m: db::models::attendance_session::Model, records_created: u64) -> Self {
        Self {
            id: m.id,
            course_id: m.course_id,
            created_by: m.created_by,
            lecture_date: Some(m.lecture_date),
            start_time: m.start_time.to_rfc3339(),
            end_time: m.end_time.to_rfc3339(),
            active: m.active,
            session_identifier: m.session_identifier,
            records_created,
        }
    }
}

/// PUT mark body. With a descriptor the face path runs; without one the
/// caller marks themselves.
#[derive(Debug, Deserialize, Default)]
pub struct MarkAttendanceRequest {
    pub descriptor: Option<Vec<f64>>,
}

#[derive(Debug, Serialize, Default)]
pub struct MarkAttendanceResponse {
    pub student_id: i64,
    pub verification_method: String,
}

#[derive(Debug, Serialize, Default)]
pub struct StudentAttendanceEntry {
    pub lecture_date: Option<NaiveDate>,
    pub status: String,
    pub is_active: bool,
    pub is_within_timeframe: bool,
}

#[derive(Debug, Serialize, Default)]
pub struct StudentCourseAttendanceResponse {
    pub course_name: String,
    pub course_code: String,
    pub attendance_list: Vec<StudentAttendanceEntry>,
}

#[derive(Debug, Serialize, Default)]
pub struct StudentHistoryEntry {
    pub course_name: String,
    pub course_code: String,
    pub lecture_date: Option<NaiveDate>,
    pub status: String,
}

#[derive(Debug, Serialize, Default)]
pub struct TeacherHistoryEntry {
    pub lecture_date: Option<NaiveDate>,
    pub student_name: String,
    pub status: String,
}

#[derive(Debug, Serialize, Default)]
pub struct AttendanceSummaryResponse {
    pub total_present: u64,
    pub total_absent: u64,
}

#[derive(Debug, Serialize, Default)]
pub struct StudentSummaryResponse {
    pub total_classes: u64,
    pub total_present: u64,
    pub total_absent: u64,
    pub total_late: u64,
}

#[derive(Debug, Serialize, Default)]
pub struct TotalCoursesResponse {
    pub total_courses: u64,
}
