use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::LibraryResult,
    library::ModerationDecision,
    session::Viewer,
    store::WordStatus,
    web::{
        AppState,
        responses::{ApiMessage, ForViewer, PageError, api_error},
        templates::{
            render_edit_page, render_item_page, render_listing_page, render_new_word_page,
            render_remove_confirm_page,
        },
        uploads::read_word_form,
    },
};

#[derive(Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Deserialize)]
pub struct FilterQuery {
    pub filter: String,
    #[serde(default)]
    pub page: u32,
}

#[derive(Default, Deserialize)]
pub struct NewWordQuery {
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct ApproveRequest {
    pub word_id: Uuid,
    pub approve: i32,
}

pub async fn library_page(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(params): Query<ListQuery>,
) -> Result<Html<String>, PageError> {
    let listing = state
        .library()
        .list(&viewer, WordStatus::Approved, params.page, params.filter)
        .await
        .for_viewer(&viewer)?;

    Ok(Html(render_listing_page(&listing, &viewer)))
}

pub async fn filter_page(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(params): Query<FilterQuery>,
) -> Result<Html<String>, PageError> {
    let listing = state
        .library()
        .list(&viewer, WordStatus::Approved, params.page, Some(params.filter))
        .await
        .for_viewer(&viewer)?;

    Ok(Html(render_listing_page(&listing, &viewer)))
}

pub async fn proposed_words(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(params): Query<ListQuery>,
) -> Result<Html<String>, PageError> {
    let listing = state
        .library()
        .list(&viewer, WordStatus::Pending, params.page, params.filter)
        .await
        .for_viewer(&viewer)?;

    Ok(Html(render_listing_page(&listing, &viewer)))
}

pub async fn show_item(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, PageError> {
    let word = state.library().get(id).await.for_viewer(&viewer)?;
    Ok(Html(render_item_page(&word, &viewer)))
}

pub async fn new_word_page(viewer: Viewer, Query(params): Query<NewWordQuery>) -> Html<String> {
    let flash = match params.status.as_deref() {
        Some("published") => Some("The word was added to the library."),
        Some("proposed") => Some("Thank you! Your word is awaiting moderation."),
        _ => None,
    };

    Html(render_new_word_page(&viewer, flash))
}

pub async fn create_word(
    State(state): State<AppState>,
    viewer: Viewer,
    multipart: Multipart,
) -> Result<Redirect, PageError> {
    let mut form = read_word_form(multipart).await.for_viewer(&viewer)?;
    let image = form.require_image().for_viewer(&viewer)?;

    state
        .library()
        .propose(&viewer, &form.word, &form.description, image)
        .await
        .for_viewer(&viewer)?;

    let status = if viewer.is_admin {
        "published"
    } else {
        "proposed"
    };
    Ok(Redirect::to(&format!("/new_word?status={status}")))
}

pub async fn edit_item_page(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, PageError> {
    viewer.require_admin().for_viewer(&viewer)?;
    let word = state.library().get(id).await.for_viewer(&viewer)?;
    Ok(Html(render_edit_page(&word, &viewer)))
}

pub async fn update_word(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Redirect, PageError> {
    viewer.require_admin().for_viewer(&viewer)?;
    let form = read_word_form(multipart).await.for_viewer(&viewer)?;

    state
        .library()
        .edit(&viewer, id, &form.word, &form.description, form.image)
        .await
        .for_viewer(&viewer)?;

    Ok(Redirect::to(&format!("/item/{id}")))
}

pub async fn remove_confirm_page(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, PageError> {
    viewer.require_admin().for_viewer(&viewer)?;
    let word = state.library().get(id).await.for_viewer(&viewer)?;
    Ok(Html(render_remove_confirm_page(&word, &viewer)))
}

pub async fn remove_word(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
) -> Result<Redirect, PageError> {
    state.library().remove(&viewer, id).await.for_viewer(&viewer)?;
    Ok(Redirect::to("/library"))
}

pub async fn approve_word(
    State(state): State<AppState>,
    viewer: Viewer,
    Json(request): Json<ApproveRequest>,
) -> Result<Json<ApiMessage>, (StatusCode, Json<ApiMessage>)> {
    viewer.require_admin().map_err(api_error)?;
    let decision = ModerationDecision::try_from(request.approve).map_err(api_error)?;

    state
        .library()
        .moderate(&viewer, request.word_id, decision)
        .await
        .map_err(api_error)?;

    let message = match decision {
        ModerationDecision::Approve => "approved",
        ModerationDecision::Reject => "rejected",
    };
    Ok(Json(ApiMessage::new(message)))
}

pub async fn serve_image(
    State(state): State<AppState>,
    Path(image_name): Path<String>,
) -> LibraryResult<Response> {
    let (bytes, content_type) = state.library().images().read(&image_name).await?;

    let mut headers = HeaderMap::new();
    let content_type = HeaderValue::from_str(content_type.as_ref())
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    headers.insert(header::CONTENT_TYPE, content_type);

    Ok((headers, bytes).into_response())
}
