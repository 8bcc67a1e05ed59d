mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::{admin, professor, spawn_app, student};

#[tokio::test]
async fn new_project_starts_active_at_zero_whatever_the_caller_sends() -> Result<()> {
    let app = spawn_app().await?;
    let (_, token) = student(&app, "Amina", "amina@test.local").await?;

    let (status, body) = app
        .post(
            "/projects",
            &token,
            json!({
                "title": "Fraud detection on transaction graphs",
                "status": "Completed",
                "progress_percentage": 80.0,
                "department": "CS"
            }),
        )
        .await?;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "Active");
    assert_eq!(body["progress_percentage"], 0.0);
    assert_eq!(body["department"], "CS");
    Ok(())
}

#[tokio::test]
async fn second_active_project_is_rejected_with_conflict() -> Result<()> {
    let app = spawn_app().await?;
    let (_, token) = student(&app, "Amina", "amina@test.local").await?;

    let (status, _) = app.post("/projects", &token, json!({ "title": "First" })).await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.post("/projects", &token, json!({ "title": "Second" })).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
    Ok(())
}

#[tokio::test]
async fn concurrent_creates_yield_exactly_one_active_project() -> Result<()> {
    let app = spawn_app().await?;
    let (_, token) = student(&app, "Amina", "amina@test.local").await?;

    let (first, second) = tokio::join!(
        app.post("/projects", &token, json!({ "title": "First" })),
        app.post("/projects", &token, json!({ "title": "Second" })),
    );
    let mut statuses = [first?.0, second?.0];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT]);

    let active: i64 = sqlx::query_scalar(
        "SELECT COUNT(1) FROM projects WHERE status = 'Active'",
    )
    .fetch_one(&app.pool)
    .await?;
    assert_eq!(active, 1);
    Ok(())
}

#[tokio::test]
async fn reactivating_alongside_another_active_project_is_a_conflict() -> Result<()> {
    let app = spawn_app().await?;
    let (_, token) = student(&app, "Amina", "amina@test.local").await?;
    let (_, prof_token) = professor(&app, "Karim", "karim@test.local").await?;

    let (_, first) = app.post("/projects", &token, json!({ "title": "First" })).await?;
    let first_id = first["id"].as_str().unwrap().to_string();

    app.put(
        &format!("/projects/{first_id}"),
        &prof_token,
        json!({ "status": "Completed" }),
    )
    .await?;
    app.post("/projects", &token, json!({ "title": "Second" })).await?;

    let (status, body) = app
        .put(&format!("/projects/{first_id}"), &prof_token, json!({ "status": "Active" }))
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    // The stored row is untouched.
    let (_, stored) = app.get(&format!("/projects/{first_id}"), &prof_token).await?;
    assert_eq!(stored["status"], "Completed");
    Ok(())
}

#[tokio::test]
async fn completing_a_project_frees_the_student_for_a_new_one() -> Result<()> {
    let app = spawn_app().await?;
    let (_, token) = student(&app, "Amina", "amina@test.local").await?;
    let (_, prof_token) = professor(&app, "Karim", "karim@test.local").await?;

    let (_, created) = app.post("/projects", &token, json!({ "title": "First" })).await?;
    let project_id = created["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .put(
            &format!("/projects/{project_id}"),
            &prof_token,
            json!({ "status": "Completed", "final_grade": 17.5 }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.post("/projects", &token, json!({ "title": "Second" })).await?;
    assert_eq!(status, StatusCode::CREATED);

    // Both projects remain visible to the student.
    let (status, body) = app.get("/projects/my-projects", &token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
    Ok(())
}

#[tokio::test]
async fn own_update_merges_only_supplied_fields() -> Result<()> {
    let app = spawn_app().await?;
    let (_, token) = student(&app, "Amina", "amina@test.local").await?;

    app.post(
        "/projects",
        &token,
        json!({ "title": "Initial title", "description": "original" }),
    )
    .await?;

    let (status, body) = app
        .put(
            "/projects/my-project",
            &token,
            json!({ "progress_percentage": 40.0, "current_phase": "Implementation" }),
        )
        .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Initial title");
    assert_eq!(body["description"], "original");
    assert_eq!(body["progress_percentage"], 40.0);
    assert_eq!(body["current_phase"], "Implementation");
    Ok(())
}

#[tokio::test]
async fn out_of_range_progress_is_a_bad_request() -> Result<()> {
    let app = spawn_app().await?;
    let (_, token) = student(&app, "Amina", "amina@test.local").await?;
    app.post("/projects", &token, json!({ "title": "P" })).await?;

    let (status, _) = app
        .put("/projects/my-project", &token, json!({ "progress_percentage": 101.0 }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .put("/projects/my-project", &token, json!({ "progress_percentage": -1.0 }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn empty_or_oversized_title_is_rejected() -> Result<()> {
    let app = spawn_app().await?;
    let (_, token) = student(&app, "Amina", "amina@test.local").await?;

    let (status, _) = app.post("/projects", &token, json!({ "title": "   " })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let long_title = "x".repeat(201);
    let (status, _) = app.post("/projects", &token, json!({ "title": long_title })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn my_project_returns_404_without_an_active_project() -> Result<()> {
    let app = spawn_app().await?;
    let (_, token) = student(&app, "Amina", "amina@test.local").await?;

    let (status, _) = app.get("/projects/my-project", &token).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn delete_cascades_to_milestones_and_is_admin_only() -> Result<()> {
    let app = spawn_app().await?;
    let (_, token) = student(&app, "Amina", "amina@test.local").await?;
    let (_, prof_token) = professor(&app, "Karim", "karim@test.local").await?;
    let (_, admin_token) = admin(&app, "Root", "root@test.local").await?;

    let (_, created) = app.post("/projects", &token, json!({ "title": "Doomed" })).await?;
    let project_id = created["id"].as_str().unwrap().to_string();

    app.post(
        &format!("/project-milestones/project/{project_id}"),
        &token,
        json!({ "title": "M1" }),
    )
    .await?;

    let (status, _) = app.delete(&format!("/projects/{project_id}"), &prof_token).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.delete(&format!("/projects/{project_id}"), &admin_token).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&format!("/projects/{project_id}"), &admin_token).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM project_milestones")
        .fetch_one(&app.pool)
        .await?;
    assert_eq!(remaining, 0);
    Ok(())
}

#[tokio::test]
async fn deleting_a_missing_project_is_404() -> Result<()> {
    let app = spawn_app().await?;
    let (_, admin_token) = admin(&app, "Root", "root@test.local").await?;

    let (status, _) = app
        .delete(&format!("/projects/{}", uuid::Uuid::new_v4()), &admin_token)
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}
