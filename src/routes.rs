use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::{
    AppState,
    handler::{
        comment::comment_handler, ingredient::ingredient_handler, rating::ratings_handler,
        recipe::recipe_handler, users::users_handler,
    },
};

pub fn create_router(app_state: AppState) -> Router {
    let api_route = Router::new()
        .nest("/recipes", recipe_handler(app_state.clone()))
        .nest("/comments", comment_handler(app_state.clone()))
        .nest("/ratings", ratings_handler(app_state.clone()))
        .nest("/ingredients", ingredient_handler())
        .nest("/users", users_handler(app_state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state.clone());

    // Uploaded recipe images are served straight from disk
    let uploads_dir = format!("{}/uploads", app_state.env.upload_dir);

    Router::new()
        .nest("/api", api_route)
        .nest_service("/uploads", ServeDir::new(uploads_dir))
}
