use axum::http::HeaderMap;

use sentinel_domain::RuntimeConfig;

pub fn authorize(config: &RuntimeConfig, headers: &HeaderMap) -> bool {
    if let Some(api_token) = &config.api_token {
        return extract_bearer(headers)
            .map(|v| v == *api_token)
            .unwrap_or(false);
    }
    true
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("Authorization")?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}
