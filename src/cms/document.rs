//! Repository documents and search responses

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A document as returned by the repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,

    #[serde(default)]
    pub uid: Option<String>,

    #[serde(rename = "type")]
    pub doc_type: String,

    #[serde(default, with = "timestamp")]
    pub first_publication_date: Option<DateTime<Utc>>,

    #[serde(default, with = "timestamp")]
    pub last_publication_date: Option<DateTime<Utc>>,

    /// Custom type fields
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Document {
    /// A string field from `data`
    pub fn text_field(&self, name: &str) -> Option<&str> {
        self.data.get(name).and_then(|v| v.as_str())
    }

    /// A field from `data`
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.data.get(name)
    }
}

/// One page of search results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub page: usize,
    #[serde(default)]
    pub results_per_page: usize,
    #[serde(default)]
    pub results_size: usize,
    #[serde(default)]
    pub total_results_size: usize,
    #[serde(default)]
    pub total_pages: usize,
    /// Cursor for the following page
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub prev_page: Option<String>,
    #[serde(default)]
    pub results: Vec<Document>,
}

/// Repository timestamps: `2021-03-25T19:25:28+0000`, RFC 3339 also accepted
pub(crate) mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

    pub fn parse(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .or_else(|_| DateTime::parse_from_str(s, FORMAT))
            .ok()
            .map(|d| d.with_timezone(&Utc))
    }

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_str(&date.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) => parse(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_decode_document() {
        let json = r#"{
            "id": "YF1",
            "uid": "como-utilizar-hooks",
            "type": "posts",
            "first_publication_date": "2021-03-15T19:25:28+0000",
            "last_publication_date": "2021-03-25T19:25:28.000Z",
            "data": { "title": "Como utilizar Hooks", "author": "Joseph Oliveira" }
        }"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.uid.as_deref(), Some("como-utilizar-hooks"));
        assert_eq!(doc.doc_type, "posts");
        assert_eq!(
            doc.first_publication_date,
            Some(Utc.with_ymd_and_hms(2021, 3, 15, 19, 25, 28).unwrap())
        );
        assert_eq!(
            doc.last_publication_date,
            Some(Utc.with_ymd_and_hms(2021, 3, 25, 19, 25, 28).unwrap())
        );
        assert_eq!(doc.text_field("author"), Some("Joseph Oliveira"));
    }

    #[test]
    fn test_null_dates() {
        let json = r#"{"id": "X", "type": "posts", "first_publication_date": null}"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        assert!(doc.first_publication_date.is_none());
        assert!(doc.last_publication_date.is_none());
        assert!(doc.uid.is_none());
    }

    #[test]
    fn test_response_without_next_page() {
        let json = r#"{"page": 1, "total_pages": 1, "next_page": null, "results": []}"#;
        let response: ApiResponse = serde_json::from_str(json).unwrap();
        assert!(response.next_page.is_none());
        assert!(response.results.is_empty());
    }
}
