use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::auth::auth_middleware;
use crate::config::Config;
use crate::db::DbPool;
use crate::handlers::{
    auth as auth_handlers, health as health_handlers, projects as project_handlers,
    tasks as task_handlers, users as user_handlers,
};
use crate::repo::{ProjectRepo, TaskRepo};
use crate::services::{ProjectService, TaskService};

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub tasks: TaskService,
    pub projects: ProjectService,
}

pub fn create_router(db: DbPool, config: Config) -> Router {
    let state = AppState {
        tasks: TaskService::new(TaskRepo::new(db.clone())),
        projects: ProjectService::new(ProjectRepo::new(db.clone())),
        db,
        config,
    };

    // Public auth routes (no middleware)
    let public_auth_routes = Router::new()
        .route("/register", post(auth_handlers::register))
        .route("/login", post(auth_handlers::login));

    // Protected auth routes (need auth)
    let protected_auth_routes = Router::new()
        .route("/logout", post(auth_handlers::logout))
        .route("/me", get(auth_handlers::me))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let auth_routes = Router::new()
        .merge(public_auth_routes)
        .merge(protected_auth_routes);

    let task_routes = Router::new()
        .route("/", get(task_handlers::list_tasks))
        .route("/", post(task_handlers::create_task))
        .route("/:task_id", get(task_handlers::get_task))
        .route("/:task_id", put(task_handlers::update_task))
        .route("/:task_id", delete(task_handlers::delete_task))
        .route("/:task_id/assign", post(task_handlers::assign_task))
        .route("/:task_id/unassign", post(task_handlers::unassign_task));

    let project_routes = Router::new()
        .route("/", get(project_handlers::list_projects))
        .route("/", post(project_handlers::create_project))
        .route("/:project_id", get(project_handlers::get_project))
        .route("/:project_id", put(project_handlers::update_project))
        .route("/:project_id", delete(project_handlers::delete_project))
        .route("/:project_id/tasks", get(project_handlers::list_project_tasks));

    // `/users/current` before `/users/:user_id` so it does not get captured
    let user_routes = Router::new()
        .route("/", get(user_handlers::list_users))
        .route("/current", get(user_handlers::current_user))
        .route("/:user_id", get(user_handlers::get_user))
        .route("/:user_id/roles", put(user_handlers::update_user_roles));

    let protected_routes = Router::new()
        .nest("/tasks", task_routes)
        .nest("/projects", project_routes)
        .nest("/users", user_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_handlers::health_check))
        .route("/health/db", get(health_handlers::db_status))
        .nest("/api/v1/auth", auth_routes)
        .nest("/api/v1", protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
