use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, Set};
use serde::Serialize;

/// A student from the uploaded roster.
///
/// `user_id` is the short login id (e.g. `abc123`) that also appears in
/// gradebook archive filenames; it is the only link between a file and a row.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    pub name: String,
    pub drexel_id: String,
    pub group_id: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::group::Entity",
        from = "Column::GroupId",
        to = "super::group::Column::Id"
    )]
    Group,

    #[sea_orm(has_many = "super::submission::Entity")]
    Submissions,
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl Related<super::submission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        user_id: &str,
        name: &str,
        drexel_id: &str,
        group_id: Option<i64>,
    ) -> Result<Self, DbErr> {
        ActiveModel {
            user_id: Set(user_id.to_string()),
            name: Set(name.to_string()),
            drexel_id: Set(drexel_id.to_string()),
            group_id: Set(group_id),
        }
        .insert(db)
        .await
    }

    pub async fn get_by_user_id<C: ConnectionTrait>(
        db: &C,
        user_id: &str,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find_by_id(user_id.to_string()).one(db).await
    }
}
