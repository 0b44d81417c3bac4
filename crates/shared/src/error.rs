use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error body returned by the doorbell service on non-2xx responses.
///
/// `detail` is usually a string, but validation failures carry a list of objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceErrorBody {
    pub detail: Value,
}

impl ServiceErrorBody {
    pub fn message(&self) -> String {
        match &self.detail {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_detail_is_used_verbatim() {
        let body: ServiceErrorBody =
            serde_json::from_str(r#"{"detail":"Invalid API key"}"#).expect("body");
        assert_eq!(body.message(), "Invalid API key");
    }

    #[test]
    fn structured_detail_is_rendered_as_json() {
        let body: ServiceErrorBody =
            serde_json::from_str(r#"{"detail":[{"loc":["query","limit"]}]}"#).expect("body");
        assert_eq!(body.message(), r#"[{"loc":["query","limit"]}]"#);
    }
}
