use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc, Weekday};
use sea_orm::entity::prelude::*;
use sea_orm::{DatabaseConnection, QueryOrder, Set};
use thiserror::Error;

/// One weekly lecture slot for a course. Times are `HH:MM` strings in UTC;
/// either may be missing when a course was saved with a partial timetable.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, serde::Serialize)]
#[sea_orm(table_name = "course_schedule_slots")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub course_id: i64,
    /// 0 = Monday … 6 = Sunday.
    pub weekday: i16,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id"
    )]
    Course,
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// How long before the scheduled start a session may already be opened.
pub const OPEN_EARLY_GRACE_MINUTES: i64 = 5;

/// Why a session could not be opened right now.
///
/// Every variant maps to a distinct client-facing message so callers can
/// branch on the reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("No class scheduled for {0}. Please select a correct lecture date.")]
    NoClassScheduledToday(String),
    #[error("Schedule for the day is incomplete. Start or End time is missing.")]
    IncompleteSchedule,
    #[error("Cannot create attendance session more than 5 minutes before the lecture time.")]
    TooEarly,
    #[error("Cannot create attendance session after the lecture has ended.")]
    TooLate,
}

/// The resolved lecture window for "today". The caller persists these
/// instants verbatim on the new session; they are never re-derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionWindow {
    pub weekday: Weekday,
    /// The slot's raw `HH:MM` start label, kept for the session identifier.
    pub start_label: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Decides whether an attendance session may be opened at `now`, and computes
/// the lecture window for today's date.
///
/// Rules, in order:
/// - no slot for `now`'s weekday: [`ScheduleError::NoClassScheduledToday`]
/// - slot missing (or unparseable) start/end: [`ScheduleError::IncompleteSchedule`]
/// - more than 5 minutes before start: [`ScheduleError::TooEarly`]
/// - after end: [`ScheduleError::TooLate`]
pub fn resolve_session_window(
    slots: &[Model],
    now: DateTime<Utc>,
) -> Result<SessionWindow, ScheduleError> {
    let weekday = now.weekday();
    let index = weekday.num_days_from_monday() as i16;

    let slot = slots
        .iter()
        .find(|s| s.weekday == index)
        .ok_or_else(|| ScheduleError::NoClassScheduledToday(weekday_name(weekday).to_owned()))?;

    let (Some(start_raw), Some(end_raw)) = (slot.start_time.as_deref(), slot.end_time.as_deref())
    else {
        return Err(ScheduleError::IncompleteSchedule);
    };

    // Parsing with %H:%M zeroes seconds and sub-seconds.
    let start_tod = parse_hhmm(start_raw).ok_or(ScheduleError::IncompleteSchedule)?;
    let end_tod = parse_hhmm(end_raw).ok_or(ScheduleError::IncompleteSchedule)?;

    let date = now.date_naive();
    let start = Utc.from_utc_datetime(&date.and_time(start_tod));
    let end = Utc.from_utc_datetime(&date.and_time(end_tod));

    if now < start - Duration::minutes(OPEN_EARLY_GRACE_MINUTES) {
        return Err(ScheduleError::TooEarly);
    }
    if now > end {
        return Err(ScheduleError::TooLate);
    }

    Ok(SessionWindow {
        weekday,
        start_label: start_raw.trim().to_owned(),
        start,
        end,
    })
}

fn parse_hhmm(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").ok()
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Parses a full weekday name as used in course-creation payloads.
pub fn weekday_index_from_name(name: &str) -> Option<i16> {
    let index = match name.trim().to_ascii_lowercase().as_str() {
        "monday" => 0,
        "tuesday" => 1,
        "wednesday" => 2,
        "thursday" => 3,
        "friday" => 4,
        "saturday" => 5,
        "sunday" => 6,
        _ => return None,
    };
    Some(index)
}

pub fn weekday_name_from_index(index: i16) -> &'static str {
    match index {
        0 => "Monday",
        1 => "Tuesday",
        2 => "Wednesday",
        3 => "Thursday",
        4 => "Friday",
        5 => "Saturday",
        _ => "Sunday",
    }
}

impl Model {
    pub async fn for_course(
        db: &DatabaseConnection,
        course_id: i64,
    ) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::CourseId.eq(course_id))
            .order_by_asc(Column::Weekday)
            .all(db)
            .await
    }

    pub async fn create(
        db: &DatabaseConnection,
        course_id: i64,
        weekday: i16,
        start_time: Option<&str>,
        end_time: Option<&str>,
    ) -> Result<Self, DbErr> {
        let now = Utc::now();
        ActiveModel {
            course_id: Set(course_id),
            weekday: Set(weekday),
            start_time: Set(start_time.map(|s| s.to_owned())),
            end_time: Set(end_time.map(|s| s.to_owned())),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
    }
}
