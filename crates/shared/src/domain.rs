use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Wire format of [`Visit::timestamp`]: server local time, no zone marker.
pub const VISIT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VisitId(pub i64);

impl fmt::Display for VisitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One recorded doorbell ring, as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    pub id: VisitId,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub photo_download_url: Option<String>,
    pub timestamp: String,
}

impl Visit {
    /// The URL the photo should be fetched from. A non-empty download URL always wins
    /// over `photo_url`.
    pub fn effective_photo_url(&self) -> Option<&str> {
        match self.photo_download_url.as_deref() {
            Some(url) if !url.is_empty() => Some(url),
            _ => self.photo_url.as_deref(),
        }
    }

    pub fn recorded_at(&self) -> Result<NaiveDateTime, chrono::ParseError> {
        NaiveDateTime::parse_from_str(&self.timestamp, VISIT_TIMESTAMP_FORMAT)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    fn visit(photo_url: Option<&str>, photo_download_url: Option<&str>) -> Visit {
        Visit {
            id: VisitId(7),
            photo_url: photo_url.map(str::to_string),
            photo_download_url: photo_download_url.map(str::to_string),
            timestamp: "2025-03-14T09:26:53".into(),
        }
    }

    #[test]
    fn download_url_wins_when_present() {
        let v = visit(Some("visits/7.jpg"), Some("/doorbell/visit/7/photo"));
        assert_eq!(v.effective_photo_url(), Some("/doorbell/visit/7/photo"));

        let v = visit(None, Some("http://cdn/7.jpg"));
        assert_eq!(v.effective_photo_url(), Some("http://cdn/7.jpg"));
    }

    #[test]
    fn falls_back_to_photo_url_when_download_url_missing_or_empty() {
        let v = visit(Some("/photos/7.jpg"), None);
        assert_eq!(v.effective_photo_url(), Some("/photos/7.jpg"));

        let v = visit(Some("/photos/7.jpg"), Some(""));
        assert_eq!(v.effective_photo_url(), Some("/photos/7.jpg"));

        let v = visit(None, Some(""));
        assert_eq!(v.effective_photo_url(), None);
    }

    #[test]
    fn decodes_wire_shape_with_null_urls() {
        let raw = r#"{"id":3,"photo_url":null,"photo_download_url":null,"timestamp":"2025-01-02T03:04:05"}"#;
        let v: Visit = serde_json::from_str(raw).expect("visit");
        assert_eq!(v.id, VisitId(3));
        assert_eq!(v.effective_photo_url(), None);

        let encoded = serde_json::to_value(&v).expect("encode");
        assert_eq!(encoded["id"], 3);
        assert!(encoded["photo_download_url"].is_null());
    }

    #[test]
    fn rejects_payload_without_id() {
        let raw = r#"{"photo_url":"/p.jpg","timestamp":"2025-01-02T03:04:05"}"#;
        assert!(serde_json::from_str::<Visit>(raw).is_err());
    }

    #[test]
    fn parses_timestamp_with_and_without_fraction() {
        let at = visit(None, None).recorded_at().expect("timestamp");
        assert_eq!((at.year(), at.month(), at.day()), (2025, 3, 14));
        assert_eq!((at.hour(), at.minute(), at.second()), (9, 26, 53));

        let mut v = visit(None, None);
        v.timestamp = "2025-03-14T09:26:53.123456".into();
        assert_eq!(v.recorded_at().expect("fractional").second(), 53);

        v.timestamp = "yesterday".into();
        assert!(v.recorded_at().is_err());
    }
}
