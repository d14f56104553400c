use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::subprojects::Entity")]
    Subprojects,
}

impl Related<super::subprojects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subprojects.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
