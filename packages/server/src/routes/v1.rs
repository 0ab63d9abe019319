use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .nest("/files", file_routes(config))
        .nest("/shares", share_routes())
        .nest("/admin", admin_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::me))
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::users::get_quota))
}

fn file_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let crud = OpenApiRouter::new()
        .routes(routes!(handlers::files::list_files))
        .routes(routes!(handlers::files::check_duplicate))
        .routes(routes!(
            handlers::files::get_file,
            handlers::files::delete_file
        ))
        .routes(routes!(handlers::files::download_file))
        .routes(routes!(handlers::shares::create_share));

    let upload = OpenApiRouter::new()
        .routes(routes!(handlers::files::upload_file))
        .layer(handlers::files::upload_body_limit(
            config.storage.max_upload_size,
        ));

    crud.merge(upload)
}

fn share_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::shares::get_share))
        .routes(routes!(handlers::shares::download_share))
}

fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::admin::get_stats))
        .routes(routes!(handlers::admin::list_all_files))
        .routes(routes!(handlers::admin::list_users))
}
