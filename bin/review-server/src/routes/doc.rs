use crate::routes::{code, health, user};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(info(
    title = "review-server",
    description = "Code review conversations against a local Ollama model",
    version = "0.1.0"
))]
pub struct ApiDoc;

pub fn get_docs() -> utoipa::openapi::OpenApi {
    let mut root = ApiDoc::openapi();
    root.merge(health::HealthApi::openapi());
    root.merge(user::UserApi::openapi());
    root.merge(code::CodeApi::openapi());
    root
}
