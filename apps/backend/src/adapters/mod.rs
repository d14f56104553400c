pub mod subprojects_sea;
