use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::SelectStatement;
use sea_orm::{DatabaseConnection, QueryOrder, QuerySelect, QueryTrait, Set};

use super::course_student::{Column as EnrollmentCol, Entity as EnrollmentEntity};
use super::user;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, serde::Serialize)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    /// Globally unique course code, e.g. "CS101".
    pub code: String,
    pub teacher_id: i64,
    pub department_id: i64,
    pub semester_start: NaiveDate,
    pub semester_months: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::TeacherId",
        to = "super::user::Column::Id"
    )]
    Teacher,
    #[sea_orm(
        belongs_to = "super::department::Entity",
        from = "Column::DepartmentId",
        to = "super::department::Column::Id"
    )]
    Department,
    #[sea_orm(has_many = "super::course_schedule_slot::Entity")]
    ScheduleSlots,
    #[sea_orm(has_many = "super::course_student::Entity")]
    Enrollments,
    #[sea_orm(has_many = "super::attendance_session::Entity")]
    Sessions,
}

impl Related<super::department::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Department.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl Related<super::course_schedule_slot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ScheduleSlots.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl Related<super::course_student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollments.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        db: &DatabaseConnection,
        name: &str,
        code: &str,
        teacher_id: i64,
        department_id: i64,
        semester_start: NaiveDate,
        semester_months: i32,
    ) -> Result<Self, DbErr> {
        let now = Utc::now();
        ActiveModel {
            name: Set(name.to_owned()),
            code: Set(code.to_owned()),
            teacher_id: Set(teacher_id),
            department_id: Set(department_id),
            semester_start: Set(semester_start),
            semester_months: Set(semester_months),
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

    pub async fn find_by_code(db: &DatabaseConnection, code: &str) -> Result<Option<Self>, DbErr> {
        Entity::find().filter(Column::Code.eq(code)).one(db).await
    }

    pub async fn find_all(db: &DatabaseConnection) -> Result<Vec<Self>, DbErr> {
        Entity::find().order_by_asc(Column::Id).all(db).await
    }

    pub async fn find_for_teacher(
        db: &DatabaseConnection,
        teacher_id: i64,
    ) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::TeacherId.eq(teacher_id))
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }

    pub async fn find_for_department(
        db: &DatabaseConnection,
        department_id: i64,
    ) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::DepartmentId.eq(department_id))
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }

    /// Courses the given student is enrolled in.
    pub async fn find_for_student(
        db: &DatabaseConnection,
        student_id: i64,
    ) -> Result<Vec<Self>, DbErr> {
        let enrolled = EnrollmentEntity::find()
            .select_only()
            .column(EnrollmentCol::CourseId)
            .filter(EnrollmentCol::StudentId.eq(student_id))
            .into_query();

        Entity::find()
            .filter(Column::Id.in_subquery(enrolled))
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }

    pub async fn count_for_teacher(db: &DatabaseConnection, teacher_id: i64) -> Result<u64, DbErr> {
        Entity::find()
            .filter(Column::TeacherId.eq(teacher_id))
            .count(db)
            .await
    }

    /// Subquery selecting the ids of all courses taught by `teacher_id`.
    /// Used to scope attendance-record aggregations.
    pub fn ids_for_teacher_query(teacher_id: i64) -> SelectStatement {
        Entity::find()
            .select_only()
            .column(Column::Id)
            .filter(Column::TeacherId.eq(teacher_id))
            .into_query()
    }

    /// Currently enrolled students, in stable enrollment (user id) order.
    ///
    /// The ordering matters: attendance records are materialized in this order,
    /// which in turn fixes the candidate order seen by face verification.
    pub async fn enrolled_students(
        db: &DatabaseConnection,
        course_id: i64,
    ) -> Result<Vec<user::Model>, DbErr> {
        let enrolled = EnrollmentEntity::find()
            .select_only()
            .column(EnrollmentCol::StudentId)
            .filter(EnrollmentCol::CourseId.eq(course_id))
            .into_query();

        user::Entity::find()
            .filter(user::Column::Id.in_subquery(enrolled))
            .order_by_asc(user::Column::Id)
            .all(db)
            .await
    }
}
