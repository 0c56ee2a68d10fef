#[cfg(test)]
mod tests {
    use crate::helpers::{body_json, body_text, make_app};
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
    use serde_json::json;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::{TempDir, tempdir};
    use tower::ServiceExt;

    struct Fixture {
        _root: TempDir,
        student_dir: PathBuf,
        counter: PathBuf,
    }

    /// One student with a script that logs each run to a counter file.
    async fn seed(db: &DatabaseConnection) -> Fixture {
        let root = tempdir().unwrap();
        let counter = root.path().join("runs.txt");
        let student_dir = root.path().join("abc123");
        let work = student_dir.join("submission/hw");
        fs::create_dir_all(&work).unwrap();
        fs::write(
            work.join("greet.sh"),
            format!("echo run >> '{}'\necho \"hello $1\"\n", counter.display()),
        )
        .unwrap();

        let due = NaiveDate::from_ymd_opt(2025, 1, 31)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        AssignmentModel::create(
            db,
            7,
            "Greetings",
            json!({
                "files": ["greet.sh"],
                "test_cases": {"greet.sh": {"world": "hello world"}}
            }),
            due,
        )
        .await
        .unwrap();
        StudentModel::create(db, "abc123", "Ada Lovelace", "14000001", None)
            .await
            .unwrap();
        SubmissionModel::create(
            db,
            "abc123",
            7,
            due,
            json!({"greet.sh": {"world": null}}),
            &student_dir.to_string_lossy(),
        )
        .await
        .unwrap();

        Fixture {
            _root: root,
            student_dir,
            counter,
        }
    }

    fn runs(counter: &Path) -> usize {
        fs::read_to_string(counter)
            .map(|s| s.lines().count())
            .unwrap_or(0)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn post(uri: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    const REPORT: &str = "/api/grade/assignments/7/students/abc123/submission";

    #[tokio::test]
    async fn report_is_rendered_once_then_served_from_cache() {
        let db = setup_test_db().await;
        let fixture = seed(&db).await;

        let response = make_app(db.clone()).oneshot(get(REPORT)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("hello world"));
        assert!(html.contains("Ada Lovelace"));
        assert!(fixture.student_dir.join("result.html").is_file());
        assert_eq!(runs(&fixture.counter), 1);

        let response = make_app(db.clone()).oneshot(get(REPORT)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, html);
        assert_eq!(runs(&fixture.counter), 1);

        let forced = format!("{REPORT}?force_rerender=true");
        let response = make_app(db.clone()).oneshot(get(&forced)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(runs(&fixture.counter), 2);
    }

    #[tokio::test]
    async fn regrading_does_not_leave_a_stale_grade_in_the_cached_report() {
        let db = setup_test_db().await;
        let fixture = seed(&db).await;

        let response = make_app(db.clone()).oneshot(get(REPORT)).await.unwrap();
        let first = body_text(response).await;

        let submission = SubmissionModel::find_for_student(&db, 7, "abc123")
            .await
            .unwrap()
            .unwrap();
        let patch = Request::builder()
            .method("PATCH")
            .uri(format!("/api/submissions/{}", submission.id))
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"grade": 87.5}).to_string()))
            .unwrap();
        let response = make_app(db.clone()).oneshot(patch).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = make_app(db.clone()).oneshot(get(REPORT)).await.unwrap();
        let second = body_text(response).await;
        assert_eq!(runs(&fixture.counter), 1);
        assert_eq!(second, first);
        assert!(!second.contains("87.5"));
    }

    #[tokio::test]
    async fn report_for_unknown_student_or_assignment_is_not_found() {
        let db = setup_test_db().await;
        let _fixture = seed(&db).await;

        let response = make_app(db.clone())
            .oneshot(get("/api/grade/assignments/7/students/nobody/submission"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = make_app(db.clone())
            .oneshot(get("/api/grade/assignments/8/students/abc123/submission"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn report_with_missing_directory_is_not_found() {
        let db = setup_test_db().await;
        let fixture = seed(&db).await;
        fs::remove_dir_all(&fixture.student_dir).unwrap();

        let response = make_app(db.clone()).oneshot(get(REPORT)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(runs(&fixture.counter), 0);
    }

    #[tokio::test]
    async fn process_accepts_known_assignment() {
        let db = setup_test_db().await;
        let _fixture = seed(&db).await;

        let response = make_app(db.clone())
            .oneshot(post("/api/grade/assignments/7/process"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let json = body_json(response).await;
        assert_eq!(json["data"]["submissions"], 1);
    }

    #[tokio::test]
    async fn process_without_submissions_is_not_found() {
        let db = setup_test_db().await;

        let response = make_app(db)
            .oneshot(post("/api/grade/assignments/7/process"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
