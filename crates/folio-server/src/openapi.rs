use utoipa::OpenApi;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};

use crate::auth::cookies::ACCESS_COOKIE;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Folio API",
        version = "0.1.0",
        description = "Developer blog backend: posts, technology stacks, uploads, and cookie-based JWT auth."
    ),
    paths(
        crate::routes::auth::login,
        crate::routes::auth::refresh,
        crate::routes::auth::logout,
        crate::routes::auth::signup,
        crate::routes::me::get_me,
        crate::routes::me::update_profile,
        crate::routes::me::change_password,
        crate::routes::me::get_public_user,
        crate::routes::my_posts::create,
        crate::routes::my_posts::list,
        crate::routes::my_posts::list_deleted,
        crate::routes::my_posts::edit_view,
        crate::routes::my_posts::update,
        crate::routes::my_posts::delete,
        crate::routes::my_posts::restore,
        crate::routes::posts::search,
        crate::routes::posts::autocomplete,
        crate::routes::posts::list_by_user,
        crate::routes::posts::get_post,
        crate::routes::stacks::list,
        crate::routes::stacks::list_by_group,
        crate::routes::stacks::with_count,
        crate::routes::stacks::grouped,
        crate::routes::stacks::popular,
        crate::routes::stacks::create,
        crate::routes::stacks::update,
        crate::routes::stacks::delete,
        crate::routes::files::upload,
        crate::routes::health,
    ),
    components(schemas(
        crate::dto::LoginRequest,
        crate::dto::SignupRequest,
        crate::dto::AuthResponse,
        crate::dto::MeResponse,
        crate::dto::PublicUserResponse,
        crate::dto::UpdateProfileRequest,
        crate::dto::ChangePasswordRequest,
        crate::dto::PostRequest,
        crate::dto::AuthorResponse,
        crate::dto::PostSummaryResponse,
        crate::dto::PostDetailResponse,
        crate::dto::PostPageResponse,
        crate::dto::SuggestionResponse,
        crate::dto::StackRequest,
        crate::dto::StackResponse,
        crate::dto::StackCountResponse,
        crate::dto::PopularStackResponse,
        crate::dto::FileUploadForm,
        crate::dto::FileUploadResponse,
        crate::dto::HealthResponse,
        crate::dto::ErrorResponse,
    )),
    tags(
        (name = "auth", description = "Login, token refresh, logout, and admin signup"),
        (name = "users", description = "Own account and public profiles"),
        (name = "my-posts", description = "Authoring: the caller's own posts and trash"),
        (name = "posts", description = "Public reading and search"),
        (name = "stacks", description = "Technology stack catalog"),
        (name = "files", description = "File uploads"),
        (name = "system", description = "Health and system status"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Registers the two ways an access token can be presented.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access token in the Authorization header."))
                        .build(),
                ),
            );
            components.add_security_scheme(
                "cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    ACCESS_COOKIE,
                    "Access token cookie set by /api/auth/login.",
                ))),
            );
        }
    }
}
