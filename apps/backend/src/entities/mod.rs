pub mod projects;
pub mod subprojects;
