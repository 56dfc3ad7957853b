use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Hospital Inventory API",
        version = "1.0.0",
        description = r#"
# Hospital Inventory API

Stock tracking for hospital departments: bulk intake of item batches,
listing, quantity and expiry corrections, and removal.

## Sessions

Every inventory endpoint requires a session, sent either as

```
Authorization: Bearer <session-token>
```

or as a `session` cookie. The session's subject is the hospital id that
scopes list, update and delete.

## Errors

Failures use one body shape:

```json
{
  "error": "Item not found or access denied.",
  "request_id": "0f4b6c1e-...",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "inventory", description = "Hospital inventory records"),
        (name = "health", description = "Service health")
    ),
    paths(
        crate::handlers::inventory::create_inventory,
        crate::handlers::inventory::list_inventory,
        crate::handlers::inventory::update_inventory,
        crate::handlers::inventory::delete_inventory,
        crate::handlers::inventory::inventory_table,
        crate::handlers::health::health_check,
    ),
    components(
        schemas(
            crate::errors::ErrorResponse,
            crate::dto::inventory::InventoryLineRequest,
            crate::dto::inventory::UpdateInventoryRequest,
            crate::dto::inventory::InventoryRow,
            crate::dto::inventory::CreatedCount,
            crate::dto::inventory::DeleteConfirmation,
            crate::entities::medical_inventory::Model,
            crate::presentation::InventoryTable,
            crate::presentation::InventoryRowView,
            crate::presentation::Badge,
            crate::presentation::BadgeTone,
            crate::presentation::QuantityTier,
            crate::presentation::ExpiryTier,
            crate::presentation::EditMenu,
            crate::presentation::MenuAction,
            crate::presentation::RevealAnimation,
            crate::handlers::health::HealthResponse,
        )
    ),
    modifiers(&SessionSecurity)
)]
pub struct ApiDocV1;

struct SessionSecurity;

impl Modify for SessionSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_session",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(
                crate::auth::SESSION_COOKIE,
            ))),
        );
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
