pub mod attendance_record;
pub mod attendance_session;
pub mod course;
pub mod course_schedule_slot;
pub mod course_student;
pub mod department;
pub mod user;
