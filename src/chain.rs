//! One-shot chain height fetch
//!
//! At startup the shell fires a single unauthenticated GET against the
//! skin's public endpoint and reads one integer-like field out of the
//! JSON body, used only to offset the HUD height counter. Every failure
//! mode (network error, non-2xx, malformed body, missing field) collapses
//! to the skin's fallback constant. No retry, no backoff, no timeout
//! beyond the platform default.

use serde_json::Value;

/// Pull the integer-like `field` out of a JSON object body. APIs disagree
/// on whether counters are numbers or decimal strings; both are accepted.
pub fn parse_height(body: &str, field: &str) -> Option<u64> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get(field)? {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm::fetch_base_height;

#[cfg(target_arch = "wasm32")]
mod wasm {
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::Response;

    use super::parse_height;
    use crate::theme::ThemeConfig;

    /// GET the skin's endpoint and extract the height field.
    pub async fn fetch_base_height(cfg: &'static ThemeConfig) -> Result<u64, String> {
        let window = web_sys::window().ok_or("no window")?;

        let resp_value = JsFuture::from(window.fetch_with_str(cfg.height_endpoint))
            .await
            .map_err(|_| format!("fetch failed: {}", cfg.height_endpoint))?;
        let resp: Response = resp_value
            .dyn_into()
            .map_err(|_| "fetch returned a non-Response".to_string())?;

        if !resp.ok() {
            return Err(format!("endpoint returned HTTP {}", resp.status()));
        }

        let text_promise = resp.text().map_err(|_| "text() threw".to_string())?;
        let text_value = JsFuture::from(text_promise)
            .await
            .map_err(|_| "body read failed".to_string())?;
        let body = text_value.as_string().ok_or("body was not a string")?;

        parse_height(&body, cfg.height_field)
            .ok_or_else(|| format!("field '{}' missing or malformed", cfg.height_field))
    }
}
