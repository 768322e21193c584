use sea_orm_migration::prelude::*;

use crate::migrations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(migrations::m202607010001_create_departments::Migration),
            Box::new(migrations::m202607010002_create_users::Migration),
            Box::new(migrations::m202607020001_create_courses::Migration),
            Box::new(migrations::m202607020002_create_course_students::Migration),
            Box::new(migrations::m202607030001_create_attendance::Migration),
        ]
    }
}
