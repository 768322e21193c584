pub mod m202607010001_create_departments;
pub mod m202607010002_create_users;
pub mod m202607020001_create_courses;
pub mod m202607020002_create_course_students;
pub mod m202607030001_create_attendance;
