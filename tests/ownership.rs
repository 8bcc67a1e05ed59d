mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::{admin, professor, spawn_app, student};

#[tokio::test]
async fn requests_without_a_token_are_unauthorized() -> Result<()> {
    let app = spawn_app().await?;

    let (status, _) = app.request("GET", "/projects/my-project", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .request("POST", "/projects", None, Some(json!({ "title": "P" })))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn garbage_tokens_are_unauthorized() -> Result<()> {
    let app = spawn_app().await?;
    let (status, _) = app.get("/projects/my-project", "not-a-jwt").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn a_student_cannot_read_another_students_project() -> Result<()> {
    let app = spawn_app().await?;
    let (_, owner_token) = student(&app, "Amina", "amina@test.local").await?;
    let (_, other_token) = student(&app, "Youssef", "youssef@test.local").await?;
    let (_, prof_token) = professor(&app, "Karim", "karim@test.local").await?;

    let (_, created) = app.post("/projects", &owner_token, json!({ "title": "Mine" })).await?;
    let project_id = created["id"].as_str().unwrap().to_string();

    let (status, _) = app.get(&format!("/projects/{project_id}"), &other_token).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.get(&format!("/projects/{project_id}"), &owner_token).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get(&format!("/projects/{project_id}"), &prof_token).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn milestone_ownership_follows_the_parent_project() -> Result<()> {
    let app = spawn_app().await?;
    let (_, owner_token) = student(&app, "Amina", "amina@test.local").await?;
    let (_, other_token) = student(&app, "Youssef", "youssef@test.local").await?;

    let (_, created) = app.post("/projects", &owner_token, json!({ "title": "Mine" })).await?;
    let project_id = created["id"].as_str().unwrap().to_string();

    let (_, milestone) = app
        .post(
            &format!("/project-milestones/project/{project_id}"),
            &owner_token,
            json!({ "title": "M1" }),
        )
        .await?;
    let milestone_id = milestone["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .get(&format!("/project-milestones/{milestone_id}"), &other_token)
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .put(
            &format!("/project-milestones/{milestone_id}"),
            &other_token,
            json!({ "progress_percentage": 99.0 }),
        )
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .patch(&format!("/project-milestones/{milestone_id}/complete"), &other_token)
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .get(&format!("/project-milestones/project/{project_id}"), &other_token)
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn listings_and_statistics_are_staff_only() -> Result<()> {
    let app = spawn_app().await?;
    let (_, student_token) = student(&app, "Amina", "amina@test.local").await?;
    let (_, prof_token) = professor(&app, "Karim", "karim@test.local").await?;

    for uri in [
        "/projects",
        "/projects/overdue",
        "/projects/due-soon",
        "/projects/search?keyword=x",
        "/projects/statistics/average-progress",
        "/projects/statistics/count-by-status/Active",
        "/projects/departments",
        "/projects/phases",
        "/project-milestones",
        "/project-milestones/status/Pending",
        "/project-milestones/priority/High",
        "/project-milestones/search?keyword=x",
        "/project-milestones/overdue",
        "/project-milestones/due-soon",
        "/project-milestones/statuses",
        "/project-milestones/priorities",
    ] {
        let (status, _) = app.get(uri, &student_token).await?;
        assert_eq!(status, StatusCode::FORBIDDEN, "student allowed on {uri}");

        let (status, _) = app.get(uri, &prof_token).await?;
        assert_eq!(status, StatusCode::OK, "professor refused on {uri}");
    }
    Ok(())
}

#[tokio::test]
async fn user_listing_is_admin_only() -> Result<()> {
    let app = spawn_app().await?;
    let (_, student_token) = student(&app, "Amina", "amina@test.local").await?;
    let (_, prof_token) = professor(&app, "Karim", "karim@test.local").await?;
    let (_, admin_token) = admin(&app, "Root", "root@test.local").await?;

    let (status, _) = app.get("/users", &student_token).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.get("/users", &prof_token).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, listed) = app.get("/users", &admin_token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 3);
    Ok(())
}

#[tokio::test]
async fn completion_is_reserved_for_the_owning_student() -> Result<()> {
    let app = spawn_app().await?;
    let (_, owner_token) = student(&app, "Amina", "amina@test.local").await?;
    let (_, prof_token) = professor(&app, "Karim", "karim@test.local").await?;

    let (_, created) = app.post("/projects", &owner_token, json!({ "title": "Mine" })).await?;
    let project_id = created["id"].as_str().unwrap().to_string();
    let (_, milestone) = app
        .post(
            &format!("/project-milestones/project/{project_id}"),
            &owner_token,
            json!({ "title": "M1" }),
        )
        .await?;
    let milestone_id = milestone["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .patch(&format!("/project-milestones/{milestone_id}/complete"), &prof_token)
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .patch(&format!("/project-milestones/{milestone_id}/complete"), &owner_token)
        .await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn professors_cannot_create_projects() -> Result<()> {
    let app = spawn_app().await?;
    let (_, prof_token) = professor(&app, "Karim", "karim@test.local").await?;

    let (status, _) = app.post("/projects", &prof_token, json!({ "title": "P" })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn students_cannot_use_the_privileged_project_update() -> Result<()> {
    let app = spawn_app().await?;
    let (_, token) = student(&app, "Amina", "amina@test.local").await?;

    let (_, created) = app.post("/projects", &token, json!({ "title": "Mine" })).await?;
    let project_id = created["id"].as_str().unwrap().to_string();

    // Even the owner cannot touch the full-update endpoint.
    let (status, _) = app
        .put(&format!("/projects/{project_id}"), &token, json!({ "final_grade": 20.0 }))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn users_can_read_themselves_but_not_others() -> Result<()> {
    let app = spawn_app().await?;
    let (amina_id, amina_token) = student(&app, "Amina", "amina@test.local").await?;
    let (youssef_id, _) = student(&app, "Youssef", "youssef@test.local").await?;
    let (_, admin_token) = admin(&app, "Root", "root@test.local").await?;

    let (status, body) = app.get(&format!("/users/{amina_id}"), &amina_token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "amina@test.local");

    let (status, _) = app.get(&format!("/users/{youssef_id}"), &amina_token).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.get(&format!("/users/{youssef_id}"), &admin_token).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn role_changes_are_admin_only() -> Result<()> {
    let app = spawn_app().await?;
    let (amina_id, amina_token) = student(&app, "Amina", "amina@test.local").await?;
    let (_, admin_token) = admin(&app, "Root", "root@test.local").await?;

    let (status, _) = app
        .put(&format!("/users/{amina_id}"), &amina_token, json!({ "role": "Professor" }))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .put(&format!("/users/{amina_id}"), &admin_token, json!({ "role": "Professor" }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "Professor");
    Ok(())
}
