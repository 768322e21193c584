use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::{Expr, Func, OnConflict};
use sea_orm::{DatabaseConnection, FromQueryResult, QueryOrder, QuerySelect, QueryTrait, Set};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::face;
use super::{attendance_session, user};

/// One student's attendance outcome for one session.
///
/// Exactly one record exists per (session, student) pair; the unique index on
/// those columns is what makes bulk materialization retry-safe. Status leaves
/// `pending` at most once, through a conditional update, and is immutable
/// afterwards.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub course_id: i64,
    pub student_id: i64,
    pub session_id: i64,
    pub teacher_id: i64,
    pub lecture_date: NaiveDate,
    pub status: Status,
    /// Set when the record is marked present; the absent sweep leaves it null.
    pub marked_at: Option<DateTime<Utc>>,
    pub verification_method: Option<VerificationMethod>,
    /// Copy of the student's descriptor taken when the roster was
    /// materialized. Deliberately a snapshot, not a live link.
    pub face_descriptor: Option<Json>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(
    Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "attendance_status_type")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Status {
    #[sea_orm(string_value = "pending")]
    Pending,

    #[sea_orm(string_value = "present")]
    Present,

    #[sea_orm(string_value = "absent")]
    Absent,

    #[sea_orm(string_value = "late")]
    Late,
}

#[derive(
    Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(
    rs_type = "String",
    db_type = "Enum",
    enum_name = "verification_method_type"
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum VerificationMethod {
    #[sea_orm(string_value = "face")]
    Face,

    #[sea_orm(string_value = "manual")]
    Manual,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::attendance_session::Entity",
        from = "Column::SessionId",
        to = "super::attendance_session::Column::Id"
    )]
    Session,
    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id"
    )]
    Course,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::StudentId",
        to = "super::user::Column::Id"
    )]
    Student,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::TeacherId",
        to = "super::user::Column::Id"
    )]
    Teacher,
}

impl Related<super::attendance_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Outcome of a failed mark attempt. All variants except `Db` are expected
/// rejections surfaced to the caller as-is.
#[derive(Debug, Error)]
pub enum MarkError {
    #[error("Attendance session is not active or out of allowed timeframe")]
    SessionClosed,
    #[error("Attendance record not found")]
    NotFound,
    #[error("Attendance already marked")]
    AlreadyMarked,
    #[error(transparent)]
    Db(#[from] DbErr),
}

#[derive(Debug, Error)]
pub enum IdentifyError {
    #[error(transparent)]
    Dimension(#[from] face::DimensionMismatch),
    #[error(transparent)]
    Db(#[from] DbErr),
}

impl Model {
    pub fn descriptor(&self) -> Option<Vec<f64>> {
        self.face_descriptor
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Bulk-creates one pending record per enrolled student, snapshotting each
    /// student's current descriptor. Conflicting (session, student) pairs are
    /// skipped, so a retry after partial failure completes the batch without
    /// ever duplicating a record.
    ///
    /// Returns the number of records actually inserted.
    pub async fn materialize_roster(
        db: &DatabaseConnection,
        session: &attendance_session::Model,
        teacher_id: i64,
        students: &[user::Model],
        now: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        if students.is_empty() {
            return Ok(0);
        }

        let rows = students.iter().map(|student| ActiveModel {
            course_id: Set(session.course_id),
            student_id: Set(student.id),
            session_id: Set(session.id),
            teacher_id: Set(teacher_id),
            lecture_date: Set(session.lecture_date),
            status: Set(Status::Pending),
            marked_at: Set(None),
            verification_method: Set(None),
            face_descriptor: Set(student.face_descriptor.clone()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        });

        Entity::insert_many(rows)
            .on_conflict(
                OnConflict::columns([Column::SessionId, Column::StudentId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await
    }

    pub async fn find_for_session_and_student(
        db: &DatabaseConnection,
        session_id: i64,
        student_id: i64,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::SessionId.eq(session_id))
            .filter(Column::StudentId.eq(student_id))
            .one(db)
            .await
    }

    /// One-shot pending -> present transition.
    ///
    /// The mutation is a single conditional update guarded on
    /// `status = 'pending'`, so a concurrent absent sweep and a mark request
    /// can never both win: whichever lands first resolves the record and the
    /// other observes [`MarkError::AlreadyMarked`].
    pub async fn mark_present(
        db: &DatabaseConnection,
        session: &attendance_session::Model,
        student_id: i64,
        method: VerificationMethod,
        now: DateTime<Utc>,
    ) -> Result<(), MarkError> {
        if !session.is_open_at(now) {
            return Err(MarkError::SessionClosed);
        }

        let result = Entity::update_many()
            .col_expr(Column::Status, Expr::value(Status::Present))
            .col_expr(Column::VerificationMethod, Expr::value(method))
            .col_expr(Column::MarkedAt, Expr::value(now))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::SessionId.eq(session.id))
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::Status.eq(Status::Pending))
            .exec(db)
            .await?;

        if result.rows_affected > 0 {
            return Ok(());
        }

        // Nothing matched: either there is no record at all, or it has
        // already been resolved.
        match Self::find_for_session_and_student(db, session.id, student_id).await? {
            None => Err(MarkError::NotFound),
            Some(_) => Err(MarkError::AlreadyMarked),
        }
    }

    /// Auto-absent sweep: flips records still pending for sessions whose
    /// lecture window has closed. Records already present/absent/late are
    /// untouched, and re-running the sweep over the same state is a no-op.
    pub async fn absent_overdue(
        db: &DatabaseConnection,
        now: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        let expired_sessions = attendance_session::Entity::find()
            .select_only()
            .column(attendance_session::Column::Id)
            .filter(attendance_session::Column::EndTime.lt(now))
            .into_query();

        let result = Entity::update_many()
            .col_expr(Column::Status, Expr::value(Status::Absent))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Status.eq(Status::Pending))
            .filter(Column::SessionId.in_subquery(expired_sessions))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Resolves a probe descriptor to a student via nearest-descriptor
    /// matching over the session's still-pending records.
    ///
    /// This is first-match, not best-match: candidates are scanned in
    /// ascending record id order (the order the roster was materialized in)
    /// and the first one within [`face::MATCH_THRESHOLD`] wins, which keeps
    /// repeated identifications reproducible.
    pub async fn identify(
        db: &DatabaseConnection,
        session_id: i64,
        probe: &[f64],
    ) -> Result<Option<i64>, IdentifyError> {
        let candidates = Entity::find()
            .filter(Column::SessionId.eq(session_id))
            .filter(Column::Status.eq(Status::Pending))
            .filter(Column::FaceDescriptor.is_not_null())
            .order_by_asc(Column::Id)
            .all(db)
            .await?;

        for record in candidates {
            let Some(stored) = record.descriptor() else {
                continue;
            };
            if stored.is_empty() {
                continue;
            }
            if face::within_threshold(probe, &stored)? {
                return Ok(Some(record.student_id));
            }
        }
        Ok(None)
    }

    pub async fn find_for_student_in_course(
        db: &DatabaseConnection,
        student_id: i64,
        course_id: i64,
    ) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::CourseId.eq(course_id))
            .order_by_asc(Column::LectureDate)
            .all(db)
            .await
    }

    pub async fn count_by_status_for_student(
        db: &DatabaseConnection,
        student_id: i64,
        status: Status,
    ) -> Result<u64, DbErr> {
        Entity::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::Status.eq(status))
            .count(db)
            .await
    }

    pub async fn count_for_student(
        db: &DatabaseConnection,
        student_id: i64,
    ) -> Result<u64, DbErr> {
        Entity::find()
            .filter(Column::StudentId.eq(student_id))
            .count(db)
            .await
    }

    /// Count of records with `status` across every course the teacher owns.
    pub async fn count_by_status_for_teacher(
        db: &DatabaseConnection,
        teacher_id: i64,
        status: Status,
    ) -> Result<u64, DbErr> {
        Entity::find()
            .filter(Column::Status.eq(status))
            .filter(Column::CourseId.in_subquery(super::course::Model::ids_for_teacher_query(
                teacher_id,
            )))
            .count(db)
            .await
    }

    /// Present/absent counts per lecture date for one course, oldest first.
    pub async fn per_date_counts(
        db: &DatabaseConnection,
        course_id: i64,
    ) -> Result<Vec<DateCounts>, DbErr> {
        #[derive(FromQueryResult)]
        struct Row {
            lecture_date: NaiveDate,
            status: Status,
            cnt: i64,
        }

        let rows: Vec<Row> = Entity::find()
            .select_only()
            .column(Column::LectureDate)
            .column(Column::Status)
            .column_as(Expr::expr(Func::count(Expr::col(Column::Id))), "cnt")
            .filter(Column::CourseId.eq(course_id))
            .group_by(Column::LectureDate)
            .group_by(Column::Status)
            .order_by_asc(Column::LectureDate)
            .into_model::<Row>()
            .all(db)
            .await?;

        let mut out: Vec<DateCounts> = Vec::new();
        for row in rows {
            if out.last().map(|d| d.lecture_date) != Some(row.lecture_date) {
                out.push(DateCounts {
                    lecture_date: row.lecture_date,
                    present_count: 0,
                    absent_count: 0,
                });
            }
            let entry = out.last_mut().expect("entry just pushed");
            match row.status {
                Status::Present => entry.present_count += row.cnt,
                Status::Absent => entry.absent_count += row.cnt,
                _ => {}
            }
        }
        Ok(out)
    }
}

/// Aggregated attendance for one lecture date of a course.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateCounts {
    pub lecture_date: NaiveDate,
    pub present_count: i64,
    pub absent_count: i64,
}
