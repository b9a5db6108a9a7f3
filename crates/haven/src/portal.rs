//! Portal page serving.
//!
//! The desktop shell is a single HTML page compiled into the binary and
//! served with `{{KEY}}` placeholders substituted from branding config.

use axum::extract::State;
use axum::response::Html;

use crate::api::state::AppState;
use crate::config::BrandingConfig;

/// Embedded portal page (compiled into the binary).
const PORTAL_TEMPLATE: &str = include_str!("portal.html");

/// Substitute branding placeholders into the portal template.
fn render(template: &str, branding: &BrandingConfig) -> String {
    let replacements = [
        ("{{OS_NAME}}", branding.os_name.as_str()),
        ("{{OS_ICON}}", branding.os_icon.as_str()),
        ("{{API_BASE}}", branding.api_base.as_str()),
        ("{{TERMINAL_ICON}}", branding.terminal_icon.as_str()),
        ("{{FOLDER_ICON}}", branding.folder_icon.as_str()),
        ("{{SETTINGS_ICON}}", branding.settings_icon.as_str()),
        ("{{LOGOUT_ICON}}", branding.logout_icon.as_str()),
    ];

    let mut html = template.to_string();
    for (key, value) in replacements {
        html = html.replace(key, value);
    }
    html
}

/// GET /
pub async fn serve(State(state): State<AppState>) -> Html<String> {
    Html(render(PORTAL_TEMPLATE, &state.config.branding))
}
