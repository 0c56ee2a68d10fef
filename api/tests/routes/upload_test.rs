#[cfg(test)]
mod tests {
    use crate::helpers::{MultipartBuilder, body_json, make_app, zip_bytes};
    use axum::http::StatusCode;
    use chrono::NaiveDate;
    use db::models::{
        assignment::Model as AssignmentModel, student::Model as StudentModel,
        submission::Model as SubmissionModel,
    };
    use db::test_utils::setup_test_db;
    use serde_json::json;
    use serial_test::serial;
    use tempfile::{TempDir, tempdir};
    use tower::ServiceExt;
    use util::config::AppConfig;

    const RUBRIC: &[u8] =
        br#"{"files": ["search.py"], "test_cases": {"search.py": {"bfs": "A B C"}}}"#;

    fn storage() -> TempDir {
        let dir = tempdir().unwrap();
        AppConfig::set_storage_root(dir.path().to_str().unwrap());
        dir
    }

    fn gradebook() -> Vec<u8> {
        let submission = zip_bytes(&[("search.py", b"print('A B C')")]);
        zip_bytes(&[
            ("Search_abc123_attempt_2025-01-06.zip", &submission),
            (
                "Search_abc123_attempt_2025-01-06.txt",
                b"Name: Ada\nDate Submitted: Monday, January 06, 2025 11:59:59 PM EST\n",
            ),
        ])
    }

    #[tokio::test]
    #[serial]
    async fn non_zip_gradebook_is_rejected_before_anything_is_written() {
        let storage = storage();
        let db = setup_test_db().await;
        let app = make_app(db);

        let req = MultipartBuilder::new()
            .text("assignment_id", "4")
            .file("gradebook_file", "grades.txt", b"not an archive")
            .request("/api/upload/gradebook");
        let response = app.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert!(json["message"].as_str().unwrap().contains(".zip"));
        assert_eq!(std::fs::read_dir(storage.path()).unwrap().count(), 0);

        AppConfig::reset();
    }

    #[tokio::test]
    #[serial]
    async fn corrupt_zip_leaves_no_assignment_and_no_upload() {
        let storage = storage();
        let db = setup_test_db().await;

        let req = MultipartBuilder::new()
            .text("assignment_id", "4")
            .text("assignment_name", "Search")
            .text("due_date", "2025-01-31")
            .file("rubric_file", "rubric.json", RUBRIC)
            .file("gradebook_file", "g.zip", b"not really a zip")
            .request("/api/upload/all");
        let response = make_app(db.clone()).oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(AssignmentModel::get_by_id(&db, 4).await.unwrap().is_none());
        assert_eq!(std::fs::read_dir(storage.path()).unwrap().count(), 0);

        AppConfig::reset();
    }

    #[tokio::test]
    #[serial]
    async fn gradebook_for_unknown_assignment_is_not_found() {
        let _storage = storage();
        let db = setup_test_db().await;
        let app = make_app(db);

        let req = MultipartBuilder::new()
            .text("assignment_id", "99")
            .file("gradebook_file", "grades.zip", &gradebook())
            .request("/api/upload/gradebook");
        let response = app.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        AppConfig::reset();
    }

    #[tokio::test]
    #[serial]
    async fn rubric_upload_creates_then_replaces_the_assignment() {
        let _storage = storage();
        let db = setup_test_db().await;

        let req = MultipartBuilder::new()
            .text("assignment_id", "4")
            .text("assignment_name", "Search")
            .text("due_date", "2025-01-31")
            .file("rubric_file", "rubric.json", RUBRIC)
            .request("/api/upload/rubric");
        let response = make_app(db.clone()).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let req = MultipartBuilder::new()
            .text("assignment_id", "4")
            .text("assignment_name", "Search v2")
            .text("due_date", "2025-02-07")
            .file("rubric_file", "rubric.json", RUBRIC)
            .request("/api/upload/rubric");
        let response = make_app(db.clone()).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let stored = AssignmentModel::get_by_id(&db, 4).await.unwrap().unwrap();
        assert_eq!(stored.name, "Search v2");
        assert_eq!(stored.due_date.date(), NaiveDate::from_ymd_opt(2025, 2, 7).unwrap());
        assert_eq!(stored.rubric["test_cases"]["search.py"]["bfs"], "A B C");

        AppConfig::reset();
    }

    #[tokio::test]
    #[serial]
    async fn rubric_upload_rejects_bad_json_and_bad_dates() {
        let _storage = storage();
        let db = setup_test_db().await;

        let req = MultipartBuilder::new()
            .text("assignment_id", "4")
            .text("assignment_name", "Search")
            .text("due_date", "2025-01-31")
            .file("rubric_file", "rubric.json", b"{not json")
            .request("/api/upload/rubric");
        let response = make_app(db.clone()).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let req = MultipartBuilder::new()
            .text("assignment_id", "4")
            .text("assignment_name", "Search")
            .text("due_date", "31 January")
            .file("rubric_file", "rubric.json", RUBRIC)
            .request("/api/upload/rubric");
        let response = make_app(db.clone()).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        assert!(AssignmentModel::get_by_id(&db, 4).await.unwrap().is_none());
        AppConfig::reset();
    }

    #[tokio::test]
    #[serial]
    async fn upload_all_creates_assignment_and_records_submissions() {
        let storage = storage();
        let db = setup_test_db().await;
        StudentModel::create(&db, "abc123", "Ada Lovelace", "14000001", None)
            .await
            .unwrap();

        let req = MultipartBuilder::new()
            .text("assignment_id", "4")
            .text("assignment_name", "Search")
            .text("due_date", "2025-01-31")
            .file("rubric_file", "rubric.json", RUBRIC)
            .file("gradebook_file", "gradebook.zip", &gradebook())
            .request("/api/upload/all");
        let response = make_app(db.clone()).oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["assignment_id"], 4);
        assert_eq!(json["data"]["organize"]["recorded"], 1);

        let student_dir = storage.path().join("unzip/assignment_4/abc123");
        assert!(student_dir.join("submission/search.py").is_file());

        let submission = SubmissionModel::find_for_student(&db, 4, "abc123")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(submission.test_cases, json!({"search.py": {"bfs": null}}));
        assert_eq!(
            submission.submission_date,
            NaiveDate::from_ymd_opt(2025, 1, 6)
                .unwrap()
                .and_hms_opt(23, 59, 59)
                .unwrap()
        );

        AppConfig::reset();
    }

    #[tokio::test]
    #[serial]
    async fn roster_upload_creates_groups_and_rejects_duplicates() {
        let _storage = storage();
        let db = setup_test_db().await;
        let roster = b"Group 1\n14000001 Ada Lovelace abc123\n14000002 Alan Turing at456\n\
                       Group 2\n14000003 Grace Hopper gh789\n";

        let req = MultipartBuilder::new()
            .file("group_file", "groups.txt", roster)
            .request("/api/upload/group");
        let response = make_app(db.clone()).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["groups_created"], 2);
        assert_eq!(json["data"]["students_created"], 3);

        let req = MultipartBuilder::new()
            .file("group_file", "groups.txt", roster)
            .request("/api/upload/group");
        let response = make_app(db.clone()).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let grace = StudentModel::get_by_user_id(&db, "gh789").await.unwrap();
        assert!(grace.is_some());
        AppConfig::reset();
    }
}
