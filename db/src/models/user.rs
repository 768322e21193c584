use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::rngs::OsRng;
use sea_orm::entity::prelude::*;
use sea_orm::{DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Represents a user in the `users` table.
///
/// Students carry a department reference and a stored face descriptor;
/// teachers carry neither.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Primary key ID (auto-incremented).
    #[sea_orm(primary_key)]
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    /// User's unique email address.
    pub email: String,
    /// Securely hashed password string.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    /// Human-facing identifier: `B#####` for students, `S#####` for teachers.
    pub unique_code: String,
    /// Required for students, absent for teachers.
    pub department_id: Option<i64>,
    /// Stored face-embedding vector (JSON array of numbers).
    pub face_descriptor: Option<Json>,
    pub profile_picture: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Global account role. Unlike a per-course role table, a user is exactly one
/// of these for the lifetime of the account.
#[derive(
    Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role_type")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    #[sea_orm(string_value = "student")]
    Student,

    #[sea_orm(string_value = "teacher")]
    Teacher,

    #[sea_orm(string_value = "admin")]
    Admin,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::department::Entity",
        from = "Column::DepartmentId",
        to = "super::department::Column::Id"
    )]
    Department,
}

impl Related<super::department::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Department.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Hashes a plaintext password with argon2 and a fresh random salt.
    pub fn hash_password(password: &str) -> Result<String, DbErr> {
        let salt = SaltString::generate(&mut OsRng);
        Ok(Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| DbErr::Custom(format!("Failed to hash password: {e}")))?
            .to_string())
    }

    /// Creates a new user with an argon2-hashed password and a generated
    /// unique code.
    pub async fn create(
        db: &DatabaseConnection,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
        role: Role,
        department_id: Option<i64>,
        face_descriptor: Option<Json>,
    ) -> Result<Self, DbErr> {
        let password_hash = Self::hash_password(password)?;

        let now = Utc::now();
        ActiveModel {
            first_name: Set(first_name.to_owned()),
            last_name: Set(last_name.to_owned()),
            email: Set(email.to_owned()),
            password_hash: Set(password_hash),
            unique_code: Set(generate_unique_code(&role)),
            role: Set(role),
            department_id: Set(department_id),
            face_descriptor: Set(face_descriptor),
            profile_picture: Set(None),
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

    pub async fn find_by_email(
        db: &DatabaseConnection,
        email: &str,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::Email.eq(email))
            .one(db)
            .await
    }

    /// Verifies a plaintext password against the stored argon2 hash.
    pub fn verify_password(&self, password: &str) -> bool {
        PasswordHash::new(&self.password_hash)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }

    /// Decodes the stored face descriptor into a numeric vector, if present.
    pub fn descriptor(&self) -> Option<Vec<f64>> {
        self.face_descriptor
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// `B` prefix for students, `S` for teachers/admins, plus a 5-digit suffix.
fn generate_unique_code(role: &Role) -> String {
    let prefix = match role {
        Role::Student => 'B',
        _ => 'S',
    };
    let suffix: u32 = rand::thread_rng().gen_range(10_000..100_000);
    format!("{prefix}{suffix}")
}
