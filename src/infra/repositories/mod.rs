pub mod sqlite_availability_repo;
pub mod sqlite_member_repo;
pub mod sqlite_outbox_repo;
pub mod sqlite_school_repo;
pub mod sqlite_session_repo;
pub mod sqlite_template_repo;
