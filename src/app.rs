use std::sync::Arc;

use axum::routing::{get, patch, post, put};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::clock::Clock;
use crate::jwt::JwtConfig;
use crate::routes;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: Arc<JwtConfig>,
    pub clock: Clock,
}

pub fn create_app(pool: SqlitePool, jwt: JwtConfig) -> Router {
    create_app_with_clock(pool, jwt, Clock::system())
}

/// Variant taking an explicit clock so date-sensitive behavior (overdue
/// views, completion stamping) can be pinned in tests.
pub fn create_app_with_clock(pool: SqlitePool, jwt: JwtConfig, clock: Clock) -> Router {
    let state = AppState {
        pool,
        jwt: Arc::new(jwt),
        clock,
    };

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/me", get(routes::auth::me))
        .route("/logout", post(routes::auth::logout));

    let user_routes = Router::new()
        .route("/", get(routes::users::list_users))
        .route(
            "/:id",
            get(routes::users::get_user)
                .put(routes::users::update_user)
                .delete(routes::users::delete_user),
        );

    let project_routes = Router::new()
        .route("/", get(routes::projects::list_projects).post(routes::projects::create_project))
        .route(
            "/my-project",
            get(routes::projects::get_my_project).put(routes::projects::update_my_project),
        )
        .route("/my-projects", get(routes::projects::get_my_projects))
        .route("/overdue", get(routes::projects::get_overdue_projects))
        .route("/due-soon", get(routes::projects::get_projects_due_soon))
        .route("/search", get(routes::projects::search_projects))
        .route("/departments", get(routes::projects::get_departments))
        .route("/phases", get(routes::projects::get_active_phases))
        .route("/statistics/average-progress", get(routes::projects::get_average_progress))
        .route(
            "/statistics/count-by-status/:status",
            get(routes::projects::get_count_by_status),
        )
        .route("/status/:status", get(routes::projects::get_projects_by_status))
        .route("/department/:department", get(routes::projects::get_projects_by_department))
        .route("/supervisor/:supervisor", get(routes::projects::get_projects_by_supervisor))
        .route(
            "/:id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        );

    let milestone_routes = Router::new()
        .route(
            "/",
            get(routes::milestones::list_milestones).post(routes::milestones::create_my_milestone),
        )
        .route("/my-milestones", get(routes::milestones::get_my_milestones))
        .route(
            "/my-milestones/upcoming",
            get(routes::milestones::get_my_upcoming_milestones),
        )
        .route("/status/:status", get(routes::milestones::list_milestones_by_status))
        .route("/priority/:priority", get(routes::milestones::list_milestones_by_priority))
        .route("/search", get(routes::milestones::search_milestones))
        .route("/overdue", get(routes::milestones::get_all_overdue_milestones))
        .route("/due-soon", get(routes::milestones::get_all_milestones_due_soon))
        .route("/statuses", get(routes::milestones::list_milestone_statuses))
        .route("/priorities", get(routes::milestones::list_milestone_priorities))
        .route(
            "/project/:project_id",
            get(routes::milestones::list_project_milestones)
                .post(routes::milestones::create_milestone),
        )
        .route(
            "/project/:project_id/status/:status",
            get(routes::milestones::get_milestones_by_status),
        )
        .route(
            "/project/:project_id/overdue",
            get(routes::milestones::get_overdue_milestones),
        )
        .route(
            "/project/:project_id/due-soon",
            get(routes::milestones::get_milestones_due_soon),
        )
        .route(
            "/project/:project_id/statistics/progress",
            get(routes::milestones::get_average_milestone_progress),
        )
        .route(
            "/project/:project_id/statistics/completion",
            get(routes::milestones::get_milestone_completion_rate),
        )
        .route(
            "/:id/complete",
            put(routes::milestones::complete_milestone).patch(routes::milestones::complete_milestone),
        )
        .route(
            "/:id",
            get(routes::milestones::get_milestone)
                .put(routes::milestones::update_milestone)
                .delete(routes::milestones::delete_milestone),
        );

    let topic_routes = Router::new()
        .route("/", get(routes::topics::list_topics).post(routes::topics::create_topic))
        .route("/available", get(routes::topics::list_available_topics))
        .route("/applications/my", get(routes::topics::list_my_applications))
        .route("/applications/:id/review", put(routes::topics::review_application))
        .route("/:id/apply", post(routes::topics::apply_to_topic))
        .route("/:id/applications", get(routes::topics::list_topic_applications))
        .route(
            "/:id",
            get(routes::topics::get_topic)
                .put(routes::topics::update_topic)
                .delete(routes::topics::delete_topic),
        );

    let grade_routes = Router::new()
        .route("/", get(routes::grades::list_grades).post(routes::grades::create_grade))
        .route("/my", get(routes::grades::list_my_grades))
        .route("/my/gpa", get(routes::grades::get_my_gpa))
        .route("/student/:student_id", get(routes::grades::list_student_grades))
        .route(
            "/:id",
            put(routes::grades::update_grade).delete(routes::grades::delete_grade),
        );

    let report_routes = Router::new()
        .route("/", get(routes::reports::list_reports).post(routes::reports::create_report))
        .route("/my", get(routes::reports::list_my_reports))
        .route("/student/:student_id", get(routes::reports::list_student_reports))
        .route("/:id/submit", patch(routes::reports::submit_report))
        .route(
            "/:id",
            get(routes::reports::get_report)
                .put(routes::reports::update_report)
                .delete(routes::reports::delete_report),
        );

    let event_routes = Router::new()
        .route("/", get(routes::events::list_events).post(routes::events::create_event))
        .route("/upcoming", get(routes::events::list_upcoming_events))
        .route("/date/:date", get(routes::events::list_events_by_date))
        .route(
            "/:id",
            get(routes::events::get_event)
                .put(routes::events::update_event)
                .delete(routes::events::delete_event),
        );

    let achievement_routes = Router::new()
        .route("/", post(routes::achievements::create_achievement))
        .route("/my", get(routes::achievements::list_my_achievements))
        .route("/my/recent", get(routes::achievements::list_my_recent_achievements))
        .route("/my/points", get(routes::achievements::get_my_points))
        .route(
            "/student/:student_id",
            get(routes::achievements::list_student_achievements),
        )
        .route("/:id/verify", patch(routes::achievements::verify_achievement))
        .route(
            "/:id",
            put(routes::achievements::update_achievement)
                .delete(routes::achievements::delete_achievement),
        );

    let settings_routes = Router::new()
        .route(
            "/",
            get(routes::settings::get_settings)
                .put(routes::settings::update_settings)
                .delete(routes::settings::delete_settings),
        )
        .route("/all", get(routes::settings::list_settings))
        .route("/reset", post(routes::settings::reset_settings));

    Router::new()
        .route("/health", get(routes::health::health))
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/projects", project_routes)
        .nest("/project-milestones", milestone_routes)
        .nest("/topics", topic_routes)
        .nest("/grades", grade_routes)
        .nest("/reports", report_routes)
        .nest("/events", event_routes)
        .nest("/achievements", achievement_routes)
        .nest("/settings", settings_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
