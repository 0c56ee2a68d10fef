#[cfg(test)]
mod tests {
    use crate::helpers::{body_json, make_app};
    use axum::{
        body::Body,
        http::{Request, StatusCode, header::CONTENT_TYPE},
    };
    use chrono::NaiveDate;
    use db::models::{
        assignment::Model as AssignmentModel, student::Model as StudentModel,
        submission::Model as SubmissionModel,
    };
    use db::test_utils::setup_test_db;
    use sea_orm::DatabaseConnection;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn seed(db: &DatabaseConnection) -> SubmissionModel {
        let due = NaiveDate::from_ymd_opt(2025, 1, 31)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        AssignmentModel::create(db, 3, "Sorting", json!({"files": [], "test_cases": {}}), due)
            .await
            .unwrap();
        StudentModel::create(db, "abc123", "Ada Lovelace", "14000001", None)
            .await
            .unwrap();
        SubmissionModel::create(db, "abc123", 3, due, json!({}), "/tmp/abc123")
            .await
            .unwrap()
    }

    fn patch(id: i64, body: Value) -> Request<Body> {
        Request::builder()
            .method("PATCH")
            .uri(format!("/api/submissions/{id}"))
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn patch_updates_only_the_given_fields() {
        let db = setup_test_db().await;
        let submission = seed(&db).await;

        let response = make_app(db.clone())
            .oneshot(patch(
                submission.id,
                json!({"grade": 87.5, "feedback": {"sort.py": "tidy"}}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["grade"], 87.5);

        let stored = SubmissionModel::get_by_id(&db, submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.grade, Some(87.5));
        assert_eq!(stored.feedback, json!({"sort.py": "tidy"}));
        assert_eq!(stored.test_cases, submission.test_cases);
    }

    #[tokio::test]
    async fn patch_unknown_submission_is_not_found() {
        let db = setup_test_db().await;

        let response = make_app(db)
            .oneshot(patch(404, json!({"grade": 10.0})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn empty_patch_is_rejected() {
        let db = setup_test_db().await;
        let submission = seed(&db).await;

        let response = make_app(db)
            .oneshot(patch(submission.id, json!({})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
