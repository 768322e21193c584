use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateDepartmentRequest {
    pub name: String,
}

#[derive(Debug, Serialize, Default)]
pub struct DepartmentResponse {
    pub id: i64,
    pub name: String,
}

impl From<db::models::department::Model> for DepartmentResponse {
    fn from(m: db::models::department::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
        }
    }
}
