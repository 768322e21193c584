use chrono::NaiveDate;
use db::models::{course, course_schedule_slot};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct ScheduleSlotRequest {
    /// Full weekday name, e.g. "Monday".
    pub day: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, message = "Course name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "Course code is required"))]
    pub code: String,

    pub department_id: i64,
    pub schedule: Vec<ScheduleSlotRequest>,
    pub semester_start: NaiveDate,
    pub semester_months: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCourseRequest {
    pub name: Option<String>,
    pub schedule: Option<Vec<ScheduleSlotRequest>>,
    pub semester_start: Option<NaiveDate>,
    pub semester_months: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterCoursesRequest {
    pub department_id: i64,
}

#[derive(Debug, Serialize, Default)]
pub struct ScheduleSlotResponse {
    pub day: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl From<course_schedule_slot::Model> for ScheduleSlotResponse {
    fn from(m: course_schedule_slot::Model) -> Self {
        Self {
            day: course_schedule_slot::weekday_name_from_index(m.weekday).to_owned(),
            start_time: m.start_time,
            end_time: m.end_time,
        }
    }
}

#[derive(Debug, Serialize, Default)]
pub struct CourseResponse {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub teacher_id: i64,
    pub department_id: i64,
    pub semester_start: Option<NaiveDate>,
    pub semester_months: i32,
    pub schedule: Vec<ScheduleSlotResponse>,
}

impl CourseResponse {
    pub fn from_with_schedule(
        course: course::Model,
        slots: Vec<course_schedule_slot::Model>,
    ) -> Self {
        Self {
            id: course.id,
            name: course.name,
            code: course.code,
            teacher_id: course.teacher_id,
            department_id: course.department_id,
            semester_start: Some(course.semester_start),
            semester_months: course.semester_months,
            schedule: slots.into_iter().map(ScheduleSlotResponse::from).collect(),
        }
    }
}

/// Per-course attendance report grouped by lecture date.
#[derive(Debug, Serialize, Default)]
pub struct CourseReportResponse {
    pub course_name: String,
    pub course_code: String,
    pub total_students: u64,
    pub attendance_by_date: Vec<db::models::attendance_record::DateCounts>,
}
