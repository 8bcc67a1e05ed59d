use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use pfe_track::models::achievement::{Achievement, AchievementCreateRequest, AchievementUpdateRequest};
use pfe_track::models::event::{Event, EventCreateRequest, EventUpdateRequest};
use pfe_track::models::grade::{Grade, GradeCreateRequest, GradeUpdateRequest};
use pfe_track::models::milestone::{
    Milestone, MilestoneCreateRequest, MilestonePriority, MilestoneStatus, MilestoneUpdateRequest,
};
use pfe_track::models::project::{
    OwnProjectUpdateRequest, Project, ProjectCreateRequest, ProjectStatus, ProjectUpdateRequest,
};
use pfe_track::models::report::{Report, ReportCreateRequest, ReportUpdateRequest};
use pfe_track::models::settings::{SettingsUpdateRequest, StudentSettings};
use pfe_track::models::topic::{
    ApplicationReviewRequest, Topic, TopicApplication, TopicApplyRequest, TopicCreateRequest,
    TopicUpdateRequest,
};
use pfe_track::models::user::{
    AuthResponse, LoginRequest, RegisterRequest, Role, User, UserUpdateRequest,
};
use pfe_track::routes;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health::health,
        routes::auth::register,
        routes::auth::login,
        routes::auth::me,
        routes::auth::logout,
        routes::users::list_users,
        routes::users::get_user,
        routes::users::update_user,
        routes::users::delete_user,
        routes::projects::list_projects,
        routes::projects::get_my_project,
        routes::projects::get_my_projects,
        routes::projects::get_project,
        routes::projects::create_project,
        routes::projects::update_my_project,
        routes::projects::update_project,
        routes::projects::delete_project,
        routes::projects::get_projects_by_status,
        routes::projects::get_projects_by_department,
        routes::projects::get_projects_by_supervisor,
        routes::projects::get_overdue_projects,
        routes::projects::get_projects_due_soon,
        routes::projects::search_projects,
        routes::projects::get_average_progress,
        routes::projects::get_count_by_status,
        routes::projects::get_departments,
        routes::projects::get_active_phases,
        routes::milestones::list_milestones,
        routes::milestones::get_my_milestones,
        routes::milestones::get_my_upcoming_milestones,
        routes::milestones::create_my_milestone,
        routes::milestones::list_milestones_by_status,
        routes::milestones::list_milestones_by_priority,
        routes::milestones::search_milestones,
        routes::milestones::get_all_overdue_milestones,
        routes::milestones::get_all_milestones_due_soon,
        routes::milestones::list_milestone_statuses,
        routes::milestones::list_milestone_priorities,
        routes::milestones::list_project_milestones,
        routes::milestones::get_milestone,
        routes::milestones::create_milestone,
        routes::milestones::update_milestone,
        routes::milestones::complete_milestone,
        routes::milestones::delete_milestone,
        routes::milestones::get_milestones_by_status,
        routes::milestones::get_overdue_milestones,
        routes::milestones::get_milestones_due_soon,
        routes::milestones::get_average_milestone_progress,
        routes::milestones::get_milestone_completion_rate,
        routes::topics::list_topics,
        routes::topics::list_available_topics,
        routes::topics::get_topic,
        routes::topics::create_topic,
        routes::topics::update_topic,
        routes::topics::delete_topic,
        routes::topics::apply_to_topic,
        routes::topics::list_my_applications,
        routes::topics::list_topic_applications,
        routes::topics::review_application,
        routes::grades::list_grades,
        routes::grades::list_my_grades,
        routes::grades::get_my_gpa,
        routes::grades::list_student_grades,
        routes::grades::create_grade,
        routes::grades::update_grade,
        routes::grades::delete_grade,
        routes::reports::list_reports,
        routes::reports::list_my_reports,
        routes::reports::list_student_reports,
        routes::reports::get_report,
        routes::reports::create_report,
        routes::reports::update_report,
        routes::reports::submit_report,
        routes::reports::delete_report,
        routes::events::list_events,
        routes::events::list_upcoming_events,
        routes::events::list_events_by_date,
        routes::events::get_event,
        routes::events::create_event,
        routes::events::update_event,
        routes::events::delete_event,
        routes::achievements::list_my_achievements,
        routes::achievements::list_my_recent_achievements,
        routes::achievements::get_my_points,
        routes::achievements::list_student_achievements,
        routes::achievements::create_achievement,
        routes::achievements::update_achievement,
        routes::achievements::verify_achievement,
        routes::achievements::delete_achievement,
        routes::settings::get_settings,
        routes::settings::update_settings,
        routes::settings::reset_settings,
        routes::settings::delete_settings,
        routes::settings::list_settings,
    ),
    components(schemas(
        Role,
        User,
        RegisterRequest,
        LoginRequest,
        AuthResponse,
        UserUpdateRequest,
        ProjectStatus,
        Project,
        ProjectCreateRequest,
        OwnProjectUpdateRequest,
        ProjectUpdateRequest,
        MilestoneStatus,
        MilestonePriority,
        Milestone,
        MilestoneCreateRequest,
        MilestoneUpdateRequest,
        Topic,
        TopicApplication,
        TopicCreateRequest,
        TopicUpdateRequest,
        TopicApplyRequest,
        ApplicationReviewRequest,
        Grade,
        GradeCreateRequest,
        GradeUpdateRequest,
        Report,
        ReportCreateRequest,
        ReportUpdateRequest,
        Event,
        EventCreateRequest,
        EventUpdateRequest,
        StudentSettings,
        SettingsUpdateRequest,
    )),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Auth", description = "Registration, login and identity"),
        (name = "Users", description = "Account administration"),
        (name = "Projects", description = "Final-year project lifecycle"),
        (name = "Milestones", description = "Project milestones and progress"),
        (name = "Topics", description = "Topic catalog and applications"),
        (name = "Grades", description = "Grades and averages"),
        (name = "Reports", description = "Progress reports"),
        (name = "Events", description = "Calendar events"),
        (name = "Achievements", description = "Student achievements"),
        (name = "Settings", description = "Per-student preferences"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,sqlx=warn".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pool = pfe_track::db::init().await?;
    pfe_track::db::migrate(&pool).await?;

    let jwt = pfe_track::jwt::JwtConfig::from_env()?;

    let app = pfe_track::create_app(pool, jwt)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let port: u16 = std::env::var("APP_PORT")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(8000);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
