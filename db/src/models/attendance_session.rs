use chrono::{DateTime, NaiveDate, Utc, Weekday};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{DatabaseConnection, Set};

use super::course_schedule_slot::{SessionWindow, weekday_name};

/// A single day's open attendance window for one course.
///
/// Sessions are created by a teacher while the lecture window is open and are
/// only ever mutated once afterwards: the expiry sweep flips `active` to
/// false once `end_time` has passed.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, serde::Serialize)]
#[sea_orm(table_name = "attendance_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub course_id: i64,
    pub created_by: i64,
    /// Calendar date this session covers.
    pub lecture_date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub active: bool,
    /// Lookup key handed to students: course, weekday and slot start plus a
    /// creation timestamp so reopening the same slot never collides.
    pub session_identifier: String,
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
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id"
    )]
    Creator,
    #[sea_orm(has_many = "super::attendance_record::Entity")]
    Records,
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn build_identifier(
        course_id: i64,
        weekday: Weekday,
        start_label: &str,
        now: DateTime<Utc>,
    ) -> String {
        format!(
            "{course_id}_{}_{start_label}_{}",
            weekday_name(weekday),
            now.timestamp()
        )
    }

    /// Persists a new active session for the resolved lecture window. The
    /// window instants are stored verbatim; nothing re-derives them later.
    pub async fn create(
        db: &DatabaseConnection,
        course_id: i64,
        created_by: i64,
        window: &SessionWindow,
        now: DateTime<Utc>,
    ) -> Result<Self, DbErr> {
        let identifier =
            Self::build_identifier(course_id, window.weekday, &window.start_label, now);

        ActiveModel {
            course_id: Set(course_id),
            created_by: Set(created_by),
            lecture_date: Set(now.date_naive()),
            start_time: Set(window.start),
            end_time: Set(window.end),
            active: Set(true),
            session_identifier: Set(identifier),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    pub async fn find_by_id(db: &DatabaseConnection, id: i64) -> Result<Option<Self>, DbErr> {
        Entity::find_by_id(id).one(db).await
    }

    pub async fn find_by_identifier(
        db: &DatabaseConnection,
        identifier: &str,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::SessionIdentifier.eq(identifier))
            .one(db)
            .await
    }

    /// Looks up the in-progress session a student is marking against.
    pub async fn find_active_by_identifier(
        db: &DatabaseConnection,
        identifier: &str,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::SessionIdentifier.eq(identifier))
            .filter(Column::Active.eq(true))
            .one(db)
            .await
    }

    /// Idempotent active -> inactive transition. Returns whether this call
    /// performed the flip; an already-inactive session is a no-op.
    pub async fn deactivate(db: &DatabaseConnection, id: i64) -> Result<bool, DbErr> {
        let result = Entity::update_many()
            .col_expr(Column::Active, Expr::value(false))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Column::Id.eq(id))
            .filter(Column::Active.eq(true))
            .exec(db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Expiry sweep: deactivates every active session whose end time has
    /// passed. The query excludes already-inactive sessions, so running the
    /// sweep repeatedly cannot double-transition anything.
    pub async fn expire_overdue(
        db: &DatabaseConnection,
        now: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        let result = Entity::update_many()
            .col_expr(Column::Active, Expr::value(false))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Active.eq(true))
            .filter(Column::EndTime.lt(now))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Whether attendance may be marked against this session at `now`.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.active && now >= self.start_time && now <= self.end_time
    }
}
