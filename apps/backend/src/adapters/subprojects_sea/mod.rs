//! SeaORM adapter for subprojects.

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::entities::subprojects;

/// Subprojects of `project_id`, ordered by name with id as the tie-breaker.
pub async fn find_by_project_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    project_id: i64,
) -> Result<Vec<subprojects::Model>, sea_orm::DbErr> {
    subprojects::Entity::find()
        .filter(subprojects::Column::ProjectId.eq(project_id))
        .order_by_asc(subprojects::Column::Name)
        .order_by_asc(subprojects::Column::Id)
        .all(conn)
        .await
}
