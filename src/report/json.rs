//! JSON reporter

use super::EngineReport;
use anyhow::Result;

/// Render reports as a pretty-printed JSON array
pub fn render(reports: &[EngineReport]) -> Result<String> {
    Ok(serde_json::to_string_pretty(reports)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::test_reports;

    #[test]
    fn test_json_render_valid() {
        let json_str = render(&test_reports()).expect("render JSON");
        let parsed: serde_json::Value = serde_json::from_str(&json_str).expect("parse JSON");
        let arr = parsed.as_array().expect("array");
        assert_eq!(arr.len(), 2);
        assert_eq!(arr[0]["engine"], "charikar");
        assert_eq!(arr[0]["score"], 1.5);
        assert_eq!(arr[0]["vertices"], serde_json::json!([0, 1, 2, 3]));
        assert!(arr[1].get("elapsed_ms").is_none());
    }

    #[test]
    fn test_json_empty() {
        assert_eq!(render(&[]).expect("render JSON"), "[]");
    }
}
