pub mod subprojects;
