//! Review, registry and catalogue routes under `/api/code`.
//!
//! Review and listing routes need a session; model and prompt mutation need
//! an administrator.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::middleware;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use tracing::info;
use utoipa::OpenApi;

use crate::entities::{ModelStore, PromptStore, Session};
use crate::error::ServerError;
use crate::middleware::auth;
use crate::schemas::code::{
    review_messages_response, FollowUpRequest, ModelResponse, ModelsResponse, NewReviewRequest, NewReviewResponse,
    PromptResponse, PromptsResponse, ReviewIdInput, ReviewMessageResponse, ReviewMessagesResponse, ReviewResponse,
    SuccessResponse, UpsertModelRequest, UpsertPromptRequest,
};
use crate::schemas::ValidatedJson;
use crate::services::registry;
use crate::services::review::parse_review_id;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        new_review,
        follow_up_review,
        get_review_messages,
        list_prompts,
        list_models,
        update_prompt,
        update_model
    ),
    components(schemas(
        NewReviewRequest,
        NewReviewResponse,
        FollowUpRequest,
        ReviewIdInput,
        SuccessResponse,
        ReviewMessagesResponse,
        ReviewMessageResponse,
        ReviewResponse,
        PromptsResponse,
        PromptResponse,
        ModelsResponse,
        ModelResponse,
        UpsertModelRequest,
        UpsertPromptRequest
    ))
)]
pub struct CodeApi;

/// Routes nested under `/api/code`.
pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let reviewer = Router::new()
        .route("/new-review", post(new_review))
        .route("/follow-up-review", post(follow_up_review))
        .route("/review/{review_id}", get(get_review_messages))
        .route("/prompts", get(list_prompts))
        .route("/models", get(list_models))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_session));

    let admin = Router::new()
        .route("/prompt/update", post(update_prompt))
        .route("/model/update", post(update_model))
        .route_layer(middleware::from_fn_with_state(state, auth::require_admin));

    reviewer.merge(admin)
}

#[utoipa::path(
    post,
    path = "/api/code/new-review",
    tag = "review",
    request_body = NewReviewRequest,
    responses(
        (status = 200, description = "Review created", body = NewReviewResponse),
        (status = 400, description = "Invalid body or model not found"),
        (status = 401, description = "No session"),
    )
)]
pub async fn new_review(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    ValidatedJson(req): ValidatedJson<NewReviewRequest>,
) -> Result<Json<NewReviewResponse>, ServerError> {
    let review_id = state
        .reviews()
        .start_review(&req.model, &req.prompt, &req.code, &session)
        .await?;
    Ok(Json(NewReviewResponse { review_id }))
}

#[utoipa::path(
    post,
    path = "/api/code/follow-up-review",
    tag = "review",
    request_body = FollowUpRequest,
    responses(
        (status = 200, description = "Turn recorded", body = SuccessResponse),
        (status = 400, description = "Invalid body, review not found or model not found"),
        (status = 401, description = "No session"),
    )
)]
pub async fn follow_up_review(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<FollowUpRequest>,
) -> Result<Json<SuccessResponse>, ServerError> {
    let review_id = req.review_id.resolve()?;
    state
        .reviews()
        .continue_review(review_id, &req.model, &req.prompt)
        .await?;
    Ok(Json(SuccessResponse::ok()))
}

#[utoipa::path(
    get,
    path = "/api/code/review/{review_id}",
    tag = "review",
    params(("review_id" = String, Path, description = "Review id")),
    responses(
        (status = 200, description = "Messages in display order, plus the review", body = ReviewMessagesResponse),
        (status = 400, description = "Malformed review id"),
        (status = 401, description = "No session"),
    )
)]
pub async fn get_review_messages(
    State(state): State<Arc<AppState>>,
    Path(review_id): Path<String>,
) -> Result<Json<ReviewMessagesResponse>, ServerError> {
    let review_id = parse_review_id(&review_id)?;
    let (messages, review) = state.reviews().list_messages(review_id).await?;
    Ok(Json(review_messages_response(messages, review)))
}

#[utoipa::path(
    get,
    path = "/api/code/prompts",
    tag = "registry",
    responses(
        (status = 200, description = "All prompt templates", body = PromptsResponse),
        (status = 401, description = "No session"),
    )
)]
pub async fn list_prompts(State(state): State<Arc<AppState>>) -> Result<Json<PromptsResponse>, ServerError> {
    let prompts = state.store.list_prompts().await?;
    Ok(Json(PromptsResponse {
        prompts: prompts.iter().map(|p| p.to_response()).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/code/models",
    tag = "registry",
    responses(
        (status = 200, description = "All model references", body = ModelsResponse),
        (status = 401, description = "No session"),
    )
)]
pub async fn list_models(State(state): State<Arc<AppState>>) -> Result<Json<ModelsResponse>, ServerError> {
    let models = state.store.list_models().await?;
    Ok(Json(ModelsResponse {
        models: models.iter().map(|m| m.to_response()).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/code/prompt/update",
    tag = "registry",
    request_body = UpsertPromptRequest,
    responses(
        (status = 200, description = "Prompt template saved", body = SuccessResponse),
        (status = 400, description = "Name and prompt are required"),
        (status = 401, description = "Administrator session required"),
    )
)]
pub async fn update_prompt(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    ValidatedJson(req): ValidatedJson<UpsertPromptRequest>,
) -> Result<Json<SuccessResponse>, ServerError> {
    let saved = registry::upsert_prompt_template(state.store.as_ref(), &req.name, &req.prompt, req.id).await?;
    info!(prompt_id = saved.id, admin = %session.username, "prompt template saved");
    Ok(Json(SuccessResponse::ok()))
}

#[utoipa::path(
    post,
    path = "/api/code/model/update",
    tag = "registry",
    request_body = UpsertModelRequest,
    responses(
        (status = 200, description = "Model reference saved", body = SuccessResponse),
        (status = 400, description = "Name and model are required"),
        (status = 401, description = "Administrator session required"),
    )
)]
pub async fn update_model(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    ValidatedJson(req): ValidatedJson<UpsertModelRequest>,
) -> Result<Json<SuccessResponse>, ServerError> {
    let saved = registry::upsert_model_reference(state.store.as_ref(), &req.name, &req.model, req.id).await?;
    info!(model_id = saved.id, model = %saved.model, admin = %session.username, "model reference saved");
    Ok(Json(SuccessResponse::ok()))
}
