use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, IntoActiveModel, Set};
use serde::{Deserialize, Serialize};

/// An assignment and its rubric document.
///
/// The rubric is stored as the uploaded JSON (`{"files": [...], "test_cases": {...}}`);
/// typed access lives in the code runner.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "assignments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub name: String,
    pub rubric: Json,
    pub due_date: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::submission::Entity")]
    Submissions,
}

impl Related<super::submission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Fields of an assignment that may be changed after creation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignmentPatch {
    pub name: Option<String>,
    pub rubric: Option<Json>,
    pub due_date: Option<NaiveDateTime>,
}

impl Model {
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        id: i64,
        name: &str,
        rubric: Json,
        due_date: NaiveDateTime,
    ) -> Result<Self, DbErr> {
        ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            rubric: Set(rubric),
            due_date: Set(due_date),
        }
        .insert(db)
        .await
    }

    pub async fn get_by_id<C: ConnectionTrait>(db: &C, id: i64) -> Result<Option<Self>, DbErr> {
        Entity::find_by_id(id).one(db).await
    }

    /// Writes only the fields present in `patch`.
    pub async fn edit<C: ConnectionTrait>(
        db: &C,
        id: i64,
        patch: AssignmentPatch,
    ) -> Result<Self, DbErr> {
        let Some(assignment) = Self::get_by_id(db, id).await? else {
            return Err(DbErr::RecordNotFound(format!("Assignment {id} not found")));
        };

        let mut active = assignment.into_active_model();
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(rubric) = patch.rubric {
            active.rubric = Set(rubric);
        }
        if let Some(due_date) = patch.due_date {
            active.due_date = Set(due_date);
        }
        active.update(db).await
    }

    /// Creates the assignment, or replaces name/rubric/due date when the id exists.
    pub async fn upsert<C: ConnectionTrait>(
        db: &C,
        id: i64,
        name: &str,
        rubric: Json,
        due_date: NaiveDateTime,
    ) -> Result<Self, DbErr> {
        if Self::get_by_id(db, id).await?.is_some() {
            let patch = AssignmentPatch {
                name: Some(name.to_string()),
                rubric: Some(rubric),
                due_date: Some(due_date),
            };
            Self::edit(db, id, patch).await
        } else {
            Self::create(db, id, name, rubric, due_date).await
        }
    }
}
