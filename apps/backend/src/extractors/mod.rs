pub mod project_id;

pub use project_id::ProjectId;
