//! OpenAPI documentation configuration.
//!
//! Provides Swagger UI for API exploration and the document written by
//! the `openapi` command.

use utoipa::OpenApi;

use crate::api::handlers::user_handler;
use crate::api::schemas::{UserCreate, UserRead, UserUpdate};
use crate::errors::ErrorResponse;

/// OpenAPI documentation for the users API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Users API",
        version = "0.1.0",
        description = "CRUD service for user accounts built with Axum and SeaORM",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        user_handler::list_users,
        user_handler::get_user,
        user_handler::create_user,
        user_handler::update_user,
        user_handler::delete_user,
    ),
    components(
        schemas(
            UserCreate,
            UserUpdate,
            UserRead,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Users", description = "User management operations")
    )
)]
pub struct ApiDoc;
