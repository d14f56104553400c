use db_infra::DbPool;
use sea_orm::{ConnectionTrait, EntityTrait, Schema};

use crate::entities::{projects, subprojects};
use crate::error::AppError;

/// Create the tables the entities describe. Parents first, so foreign keys
/// resolve.
pub async fn create_schema(pool: &DbPool) -> Result<(), AppError> {
    let db = pool.accessor().await?;
    create_table(&*db, projects::Entity).await?;
    create_table(&*db, subprojects::Entity).await?;
    Ok(())
}

async fn create_table<C, E>(db: &C, entity: E) -> Result<(), AppError>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let mut stmt = Schema::new(backend).create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}
