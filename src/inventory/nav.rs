//! Navigation link extraction

use crate::browser::{decode_eval_output, BrowserSession};
use crate::{ItemError, ItemResult};
use serde_json::Value;

/// Session used for the one-off navigation read
pub const NAV_SESSION: &str = "nav-inventory";

/// Reads the raw navigation link list from the site's home page
///
/// Opens `site_url`, evaluates `script` and decodes its result as a JSON
/// array. Non-string entries are ignored. Canonicalization and first-party
/// filtering happen in [`resolve`](crate::inventory::resolve).
pub async fn collect_nav_urls<S: BrowserSession>(
    session: &mut S,
    site_url: &str,
    script: &str,
) -> ItemResult<Vec<String>> {
    session.open(site_url).await?;
    let raw = session.eval(script).await?;

    let value = decode_eval_output(&raw)
        .map_err(|e| ItemError::DataShape(format!("navigation output is not JSON: {}", e)))?;

    match value {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect()),
        other => Err(ItemError::DataShape(format!(
            "navigation output must be an array, got {}",
            json_kind(&other)
        ))),
    }
}

/// Name of a JSON value's type, for error messages
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::testing::ScriptedSession;

    #[tokio::test]
    async fn test_collect_nav_urls() {
        let mut session = ScriptedSession::new("nav-inventory")
            .with_eval(r#"["https://a.test/", "/about", 3, null]"#);
        let urls = collect_nav_urls(&mut session, "https://a.test/", "nav()")
            .await
            .unwrap();
        assert_eq!(urls, vec!["https://a.test/", "/about"]);
        assert_eq!(session.opened(), vec!["https://a.test/"]);
    }

    #[tokio::test]
    async fn test_collect_nav_urls_double_encoded() {
        let mut session = ScriptedSession::new("nav-inventory")
            .with_eval(r#""[\"https://a.test/shop\"]""#);
        let urls = collect_nav_urls(&mut session, "https://a.test/", "nav()")
            .await
            .unwrap();
        assert_eq!(urls, vec!["https://a.test/shop"]);
    }

    #[tokio::test]
    async fn test_collect_nav_urls_wrong_shape() {
        let mut session = ScriptedSession::new("nav-inventory").with_eval(r#"{"links": []}"#);
        let err = collect_nav_urls(&mut session, "https://a.test/", "nav()")
            .await
            .unwrap_err();
        assert!(matches!(err, ItemError::DataShape(_)));
        assert!(err.to_string().contains("object"));
    }
}
