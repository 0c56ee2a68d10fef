use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use sea_orm::{
    ConnectionTrait, DbErr, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// One student's submission to one assignment.
///
/// `file_path` is the student's organized directory (the folder holding
/// `submission/` and `submission.log`). A student has at most one row per
/// assignment; the unique index enforces it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "submissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub student_id: String,
    pub assignment_id: i64,
    pub grade: Option<f64>,
    pub submission_date: NaiveDateTime,
    pub feedback: Json,
    pub test_cases: Json,
    pub file_path: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::UserId"
    )]
    Student,

    #[sea_orm(
        belongs_to = "super::assignment::Entity",
        from = "Column::AssignmentId",
        to = "super::assignment::Column::Id"
    )]
    Assignment,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Grader edits applied through `PATCH /api/submissions/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionPatch {
    pub grade: Option<f64>,
    pub feedback: Option<Json>,
    pub test_cases: Option<Json>,
}

impl SubmissionPatch {
    pub fn is_empty(&self) -> bool {
        self.grade.is_none() && self.feedback.is_none() && self.test_cases.is_none()
    }
}

impl Model {
    /// Records a freshly organized submission with a zero grade and empty feedback.
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        student_id: &str,
        assignment_id: i64,
        submission_date: NaiveDateTime,
        test_cases: Json,
        file_path: &str,
    ) -> Result<Self, DbErr> {
        ActiveModel {
            student_id: Set(student_id.to_string()),
            assignment_id: Set(assignment_id),
            grade: Set(Some(0.0)),
            submission_date: Set(submission_date),
            feedback: Set(json!({})),
            test_cases: Set(test_cases),
            file_path: Set(file_path.to_string()),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    pub async fn get_by_id<C: ConnectionTrait>(db: &C, id: i64) -> Result<Option<Self>, DbErr> {
        Entity::find_by_id(id).one(db).await
    }

    pub async fn find_for_student<C: ConnectionTrait>(
        db: &C,
        assignment_id: i64,
        student_id: &str,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::AssignmentId.eq(assignment_id))
            .filter(Column::StudentId.eq(student_id))
            .one(db)
            .await
    }

    pub async fn list_for_assignment<C: ConnectionTrait>(
        db: &C,
        assignment_id: i64,
    ) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::AssignmentId.eq(assignment_id))
            .order_by_asc(Column::StudentId)
            .all(db)
            .await
    }

    pub async fn apply_patch<C: ConnectionTrait>(
        db: &C,
        id: i64,
        patch: SubmissionPatch,
    ) -> Result<Self, DbErr> {
        let Some(submission) = Self::get_by_id(db, id).await? else {
            return Err(DbErr::RecordNotFound(format!("Submission {id} not found")));
        };

        let mut active = submission.into_active_model();
        if let Some(grade) = patch.grade {
            active.grade = Set(Some(grade));
        }
        if let Some(feedback) = patch.feedback {
            active.feedback = Set(feedback);
        }
        if let Some(test_cases) = patch.test_cases {
            active.test_cases = Set(test_cases);
        }
        active.update(db).await
    }
}
