mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::{professor, spawn_app, student, TestApp};

async fn seed_projects(app: &TestApp) -> Result<String> {
    let fixtures = [
        (
            "amina@test.local",
            json!({
                "title": "Graph anomaly detection",
                "department": "CS",
                "supervisor": "Karim Mansour",
                "type": "Research",
                "current_phase": "Implementation",
                "expected_completion_date": "2025-03-10"
            }),
        ),
        (
            "youssef@test.local",
            json!({
                "title": "Warehouse robot scheduling",
                "department": "EE",
                "supervisor": "Karim Mansour",
                "type": "Industrial",
                "current_phase": "Design",
                "expected_completion_date": "2025-03-20"
            }),
        ),
        (
            "leila@test.local",
            json!({
                "title": "Campus energy dashboard",
                "department": "CS",
                "supervisor": "Sonia Ben Ali",
                "type": "Industrial",
                "current_phase": "Implementation",
                "expected_completion_date": "2025-06-01"
            }),
        ),
    ];

    for (idx, (email, body)) in fixtures.iter().enumerate() {
        let (_, token) = student(app, &format!("Student {idx}"), email).await?;
        let (status, _) = app.post("/projects", &token, body.clone()).await?;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, prof_token) = professor(app, "Karim", "karim@test.local").await?;
    Ok(prof_token)
}

#[tokio::test]
async fn filters_are_anded_and_omitted_filters_match_everything() -> Result<()> {
    let app = spawn_app().await?;
    let token = seed_projects(&app).await?;

    let (_, all) = app.get("/projects", &token).await?;
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (_, cs) = app.get("/projects?department=CS", &token).await?;
    assert_eq!(cs.as_array().unwrap().len(), 2);

    let (_, cs_industrial) = app.get("/projects?department=CS&type=Industrial", &token).await?;
    let titles: Vec<&str> = cs_industrial
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Campus energy dashboard"]);

    let (_, karim_cs) = app
        .get("/projects?supervisor=Karim%20Mansour&department=CS", &token)
        .await?;
    assert_eq!(karim_cs.as_array().unwrap().len(), 1);

    let (_, none) = app.get("/projects?department=Math", &token).await?;
    assert_eq!(none.as_array().unwrap().len(), 0);
    Ok(())
}

#[tokio::test]
async fn keyword_search_is_case_sensitive() -> Result<()> {
    let app = spawn_app().await?;
    let token = seed_projects(&app).await?;

    let (_, hits) = app.get("/projects/search?keyword=Graph", &token).await?;
    assert_eq!(hits.as_array().unwrap().len(), 1);

    let (_, misses) = app.get("/projects/search?keyword=graph", &token).await?;
    assert_eq!(misses.as_array().unwrap().len(), 0);

    // The keyword also matches supervisor and department.
    let (_, by_supervisor) = app.get("/projects/search?keyword=Mansour", &token).await?;
    assert_eq!(by_supervisor.as_array().unwrap().len(), 2);
    Ok(())
}

#[tokio::test]
async fn overdue_and_due_soon_split_on_the_frozen_date() -> Result<()> {
    let app = spawn_app().await?;
    let token = seed_projects(&app).await?;

    // Frozen today is 2025-03-15; the 2025-03-10 project is overdue.
    let (_, overdue) = app.get("/projects/overdue", &token).await?;
    let titles: Vec<&str> = overdue
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Graph anomaly detection"]);

    // Due-soon looks fourteen days ahead: 2025-03-20 is in, 2025-06-01 is not.
    let (_, due_soon) = app.get("/projects/due-soon", &token).await?;
    let titles: Vec<&str> = due_soon
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Warehouse robot scheduling"]);
    Ok(())
}

#[tokio::test]
async fn status_counts_and_average_progress() -> Result<()> {
    let app = spawn_app().await?;
    let token = seed_projects(&app).await?;

    let (_, count) = app.get("/projects/statistics/count-by-status/Active", &token).await?;
    assert_eq!(count, 3);
    let (_, count) = app.get("/projects/statistics/count-by-status/Completed", &token).await?;
    assert_eq!(count, 0);

    let (status, _) = app.get("/projects/statistics/count-by-status/Bogus", &token).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Fresh projects all sit at 0%.
    let (_, average) = app.get("/projects/statistics/average-progress", &token).await?;
    assert_eq!(average, 0.0);
    Ok(())
}

#[tokio::test]
async fn department_and_phase_listings_are_distinct_and_sorted() -> Result<()> {
    let app = spawn_app().await?;
    let token = seed_projects(&app).await?;

    let (_, departments) = app.get("/projects/departments", &token).await?;
    assert_eq!(departments, json!(["CS", "EE"]));

    let (_, phases) = app.get("/projects/phases", &token).await?;
    assert_eq!(phases, json!(["Design", "Implementation"]));
    Ok(())
}

#[tokio::test]
async fn path_based_lookups_match_their_field() -> Result<()> {
    let app = spawn_app().await?;
    let token = seed_projects(&app).await?;

    let (_, by_status) = app.get("/projects/status/Active", &token).await?;
    assert_eq!(by_status.as_array().unwrap().len(), 3);

    let (status, _) = app.get("/projects/status/running", &token).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, by_department) = app.get("/projects/department/EE", &token).await?;
    assert_eq!(by_department.as_array().unwrap().len(), 1);

    let (_, by_supervisor) = app.get("/projects/supervisor/Sonia%20Ben%20Ali", &token).await?;
    assert_eq!(by_supervisor.as_array().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn average_progress_ignores_non_active_projects() -> Result<()> {
    let app = spawn_app().await?;
    let (_, token) = student(&app, "Amina", "amina@test.local").await?;
    let (_, prof_token) = professor(&app, "Karim", "karim@test.local").await?;

    let (_, created) = app.post("/projects", &token, json!({ "title": "First" })).await?;
    let first_id = created["id"].as_str().unwrap().to_string();
    app.put("/projects/my-project", &token, json!({ "progress_percentage": 60.0 })).await?;
    app.put(
        &format!("/projects/{first_id}"),
        &prof_token,
        json!({ "status": "Suspended" }),
    )
    .await?;

    app.post("/projects", &token, json!({ "title": "Second" })).await?;
    app.put("/projects/my-project", &token, json!({ "progress_percentage": 40.0 })).await?;

    // Only the Active project's 40% counts.
    let (_, average) = app.get("/projects/statistics/average-progress", &prof_token).await?;
    assert_eq!(average, 40.0);
    Ok(())
}
