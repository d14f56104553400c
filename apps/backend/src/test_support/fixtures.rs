use db_infra::DbPool;
use sea_orm::{ActiveModelTrait, Set};

use crate::entities::{projects, subprojects};
use crate::error::AppError;

pub async fn seed_project(pool: &DbPool, id: i64, name: &str) -> Result<projects::Model, AppError> {
    let db = pool.accessor().await?;
    let model = projects::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
    }
    .insert(&*db)
    .await?;
    Ok(model)
}

pub async fn seed_subproject(
    pool: &DbPool,
    id: i64,
    project_id: i64,
    name: &str,
    description: Option<&str>,
) -> Result<subprojects::Model, AppError> {
    let db = pool.accessor().await?;
    let model = subprojects::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        project_id: Set(project_id),
        description: Set(description.map(str::to_string)),
    }
    .insert(&*db)
    .await?;
    Ok(model)
}
