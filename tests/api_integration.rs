mod common;

use anyhow::{Context, Result};
use axum::http::StatusCode;
use serde_json::json;

use common::{admin, professor, spawn_app, student};

#[tokio::test]
async fn full_api_flow() -> Result<()> {
    let app = spawn_app().await?;

    // -- register a student through the API
    let (status, registered) = app
        .request(
            "POST",
            "/auth/register",
            None,
            Some(json!({
                "name": "Test Student",
                "email": "Test@Example.com",
                "password": "password123"
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    // Emails are normalized and self-registration never grants privilege.
    assert_eq!(registered["user"]["email"], "test@example.com");
    assert_eq!(registered["user"]["role"], "Student");
    let token = registered["token"].as_str().context("missing token")?.to_string();

    // -- duplicate email is a conflict
    let (status, _) = app
        .request(
            "POST",
            "/auth/register",
            None,
            Some(json!({
                "name": "Someone Else",
                "email": "test@example.com",
                "password": "password123"
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    // -- login and identity
    let (status, logged_in) = app
        .request(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "test@example.com", "password": "password123" })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    let token = logged_in["token"].as_str().unwrap_or(&token).to_string();

    let (status, _) = app
        .request(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "test@example.com", "password": "wrong-password" })),
        )
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, me) = app.get("/auth/me", &token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["name"], "Test Student");
    let student_id = me["id"].as_str().context("missing user id")?.to_string();

    // -- staff accounts
    let (_, prof_token) = professor(&app, "Prof", "prof@test.local").await?;
    let (_, admin_token) = admin(&app, "Root", "root@test.local").await?;

    // -- topic catalog and application flow
    let (status, topic) = app
        .post(
            "/topics",
            &prof_token,
            json!({ "title": "Stream processing engine", "supervisor": "Prof", "max_students": 1 }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    let topic_id = topic["id"].as_str().unwrap().to_string();

    let (status, application) = app
        .post(
            &format!("/topics/{topic_id}/apply"),
            &token,
            json!({ "motivation": "I like streams" }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    let application_id = application["id"].as_str().unwrap().to_string();

    let (status, reviewed) = app
        .put(
            &format!("/topics/applications/{application_id}/review"),
            &prof_token,
            json!({ "status": "Approved", "reviewer_comments": "good fit" }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reviewed["status"], "Approved");

    // Approval filled the only seat, so the topic is now Taken.
    let (_, topic) = app.get(&format!("/topics/{topic_id}"), &token).await?;
    assert_eq!(topic["status"], "Taken");
    assert_eq!(topic["current_students"], 1);

    let (status, _) = app
        .post(&format!("/topics/{topic_id}/apply"), &token, json!({}))
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    // -- project and milestones
    let (status, project) = app
        .post(
            "/projects",
            &token,
            json!({ "title": "Stream processing engine", "topic_id": topic_id }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    let project_id = project["id"].as_str().unwrap().to_string();

    let (_, milestone) = app
        .post(
            &format!("/project-milestones/project/{project_id}"),
            &token,
            json!({ "title": "Design doc", "due_date": "2025-04-01" }),
        )
        .await?;
    let milestone_id = milestone["id"].as_str().unwrap().to_string();

    let (status, completed) = app
        .patch(&format!("/project-milestones/{milestone_id}/complete"), &token)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completed["progress_percentage"], 100.0);

    let (_, rate) = app
        .get(
            &format!("/project-milestones/project/{project_id}/statistics/completion"),
            &token,
        )
        .await?;
    assert_eq!(rate, 100.0);

    // -- grades: students only see published rows, GPA is credit-weighted
    let (status, _) = app
        .post(
            "/grades",
            &prof_token,
            json!({
                "student_id": student_id,
                "subject_name": "Distributed Systems",
                "grade_value": 16.0,
                "credits": 6,
                "is_published": true
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    app.post(
        "/grades",
        &prof_token,
        json!({
            "student_id": student_id,
            "subject_name": "Compilers",
            "grade_value": 12.0,
            "credits": 3,
            "is_published": true
        }),
    )
    .await?;
    app.post(
        "/grades",
        &prof_token,
        json!({
            "student_id": student_id,
            "subject_name": "Secret draft grade",
            "grade_value": 5.0,
            "credits": 9,
            "is_published": false
        }),
    )
    .await?;

    let (_, my_grades) = app.get("/grades/my", &token).await?;
    assert_eq!(my_grades.as_array().unwrap().len(), 2);

    let (_, gpa) = app.get("/grades/my/gpa", &token).await?;
    // (16*6 + 12*3) / 9
    assert_eq!(gpa, (16.0 * 6.0 + 12.0 * 3.0) / 9.0);

    // -- reports: draft, submit, then frozen
    let (status, report) = app
        .post("/reports", &token, json!({ "title": "Midterm report", "content": "..." }))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(report["status"], "Draft");
    let report_id = report["id"].as_str().unwrap().to_string();

    let (status, submitted) = app.patch(&format!("/reports/{report_id}/submit"), &token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(submitted["status"], "Submitted");
    assert!(submitted["submitted_at"].is_string());

    let (status, _) = app
        .put(&format!("/reports/{report_id}"), &token, json!({ "content": "edited" }))
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    // -- events: private by default, staff sees everything
    let (_, event) = app
        .post("/events", &token, json!({ "title": "Advisor sync", "event_date": "2025-03-20" }))
        .await?;
    assert_eq!(event["is_public"], false);

    app.post(
        "/events",
        &admin_token,
        json!({ "title": "Defense week", "event_date": "2025-04-02", "is_public": true }),
    )
    .await?;

    let (_, upcoming) = app.get("/events/upcoming", &token).await?;
    assert_eq!(upcoming.as_array().unwrap().len(), 2);

    // -- achievements: pending until verified, points count verified only
    let (_, achievement) = app
        .post(
            "/achievements",
            &token,
            json!({ "title": "Best poster", "points_awarded": 50 }),
        )
        .await?;
    assert_eq!(achievement["status"], "Pending");
    let achievement_id = achievement["id"].as_str().unwrap().to_string();

    let (_, points) = app.get("/achievements/my/points", &token).await?;
    assert_eq!(points, 0);

    app.patch(&format!("/achievements/{achievement_id}/verify"), &prof_token).await?;
    let (_, points) = app.get("/achievements/my/points", &token).await?;
    assert_eq!(points, 50);

    // -- settings: lazy defaults, partial update, reset
    let (status, settings) = app.get("/settings", &token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["theme"], "system");
    assert_eq!(settings["reminder_advance_days"], 3);

    let (_, updated) = app.put("/settings", &token, json!({ "theme": "dark" })).await?;
    assert_eq!(updated["theme"], "dark");
    assert_eq!(updated["language"], "en");

    let (status, _) = app.put("/settings", &token, json!({ "theme": "neon" })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, reset) = app.request("POST", "/settings/reset", Some(&token), None).await?;
    assert_eq!(reset["theme"], "system");

    // -- health
    let (status, health) = app.request("GET", "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "ok");

    Ok(())
}
