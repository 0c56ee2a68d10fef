use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set};
use serde::Serialize;

/// A roster group (`Group <n>` header in the uploaded roster).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "groups")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub group_number: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::student::Entity")]
    Students,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Students.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create<C: ConnectionTrait>(db: &C, group_number: i32) -> Result<Self, DbErr> {
        ActiveModel {
            group_number: Set(group_number),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    pub async fn get_by_number<C: ConnectionTrait>(
        db: &C,
        group_number: i32,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::GroupNumber.eq(group_number))
            .one(db)
            .await
    }
}
