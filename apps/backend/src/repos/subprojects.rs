//! Repository layer for subprojects.

use db_infra::{DbInfraError, DbPool};
use serde::{Deserialize, Serialize};

use crate::adapters::subprojects_sea as adapter;
use crate::entities::subprojects;

/// A subproject as served over the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subproject {
    pub id: i64,
    pub name: String,
    pub project_id: i64,
    pub description: Option<String>,
}

impl From<subprojects::Model> for Subproject {
    fn from(model: subprojects::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            project_id: model.project_id,
            description: model.description,
        }
    }
}

/// All subprojects of `project_id` in name order. An unknown project yields
/// an empty list, not an error.
pub async fn list_for_project(
    pool: &DbPool,
    project_id: i64,
) -> Result<Vec<Subproject>, DbInfraError> {
    let db = pool.accessor().await?;
    let models = adapter::find_by_project_id(&*db, project_id).await?;
    Ok(models.into_iter().map(Subproject::from).collect())
}
