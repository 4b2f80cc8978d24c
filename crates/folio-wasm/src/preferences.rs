//! The selected document language, the only state kept across reloads.

use folio_core::Locale;
use wasm_bindgen::prelude::*;

/// `localStorage` key holding the language code.
pub const LANGUAGE_KEY: &str = "folio_language";

fn storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok()?
}

/// Stored value to locale. Missing or unknown values fall back to the default.
pub(crate) fn locale_from_stored(value: Option<String>) -> Locale {
    value
        .and_then(|v| v.parse::<Locale>().ok())
        .unwrap_or_default()
}

/// Read the saved language code, e.g. `"pt"`.
///
/// ```typescript
/// const lang = load_locale();
/// ```
#[wasm_bindgen]
pub fn load_locale() -> String {
    let stored = storage().and_then(|s| s.get_item(LANGUAGE_KEY).ok().flatten());
    locale_from_stored(stored).as_str().to_string()
}

/// Validate and persist a language code. Returns the normalized code.
#[wasm_bindgen]
pub fn save_locale(code: &str) -> Result<String, JsValue> {
    let locale: Locale = code.parse().map_err(|e| JsValue::from_str(&format!("{e}")))?;
    let storage = storage().ok_or_else(|| JsValue::from_str("localStorage is unavailable"))?;
    storage.set_item(LANGUAGE_KEY, locale.as_str())?;
    tracing::debug!(%locale, "saved language preference");
    Ok(locale.as_str().to_string())
}
