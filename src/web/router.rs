use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use crate::web::{AppState, auth, library};

pub fn build_router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.max_upload_bytes());

    Router::new()
        .route("/", get(library::library_page))
        .route("/library", get(library::library_page))
        .route("/filter", get(library::filter_page))
        .route("/proposed_words", get(library::proposed_words))
        .route("/item/:id", get(library::show_item))
        .route(
            "/new_word",
            get(library::new_word_page).post(library::create_word),
        )
        .route("/edit_item/:id", get(library::edit_item_page))
        .route("/update_word/:id", post(library::update_word))
        .route("/remove/:id", get(library::remove_confirm_page))
        .route("/remove_word/:id", get(library::remove_word))
        .route("/approve_word", post(library::approve_word))
        .route("/image/:name", get(library::serve_image))
        .route("/login", get(auth::login_page).post(auth::process_login))
        .route("/logout", get(auth::logout))
        .route("/healthz", get(healthz))
        .layer(upload_limit)
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}
