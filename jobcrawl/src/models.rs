//! Data models for scraped job listings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One scraped job listing.
///
/// Serialized with the field names consumers of the crawler output expect
/// (`postedTime`, `applyUrl`, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    /// Job posting identifier, unique within a crawl.
    pub id: String,
    /// Job title.
    pub title: Option<String>,
    /// Hiring company name.
    pub company: Option<String>,
    /// Job location.
    pub location: Option<String>,
    /// Relative posting time as displayed ("2 days ago").
    #[serde(rename = "postedTime")]
    pub posted_time_text: Option<String>,
    /// Posting date from the `datetime` attribute.
    #[serde(rename = "postedDate")]
    pub posted_date_iso: Option<String>,
    /// Absolute URL of the posting.
    pub apply_url: Option<String>,
    /// Absolute URL of the company page.
    pub company_url: Option<String>,
    /// Benefit badges in document order.
    #[serde(default)]
    pub benefits: Vec<String>,
    /// When the record was extracted.
    #[serde(with = "iso_millis")]
    pub scraped_at: DateTime<Utc>,
}

impl JobRecord {
    /// Creates a record with only an identifier, stamped now.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self::new_at(id, Utc::now())
    }

    /// Creates a record with only an identifier and an explicit timestamp.
    #[must_use]
    pub fn new_at(id: impl Into<String>, scraped_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: None,
            company: None,
            location: None,
            posted_time_text: None,
            posted_date_iso: None,
            apply_url: None,
            company_url: None,
            benefits: Vec::new(),
            scraped_at,
        }
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the company.
    #[must_use]
    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    /// Sets the apply URL.
    #[must_use]
    pub fn with_apply_url(mut self, url: impl Into<String>) -> Self {
        self.apply_url = Some(url.into());
        self
    }

    /// Whether the record may be emitted.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.id.is_empty()
    }

    /// Converts to dictionary.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map.into_iter().collect(),
            _ => HashMap::new(),
        }
    }
}

/// RFC3339 UTC timestamps with millisecond precision and a `Z` suffix.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap()
    }

    #[test]
    fn test_serialized_field_names() {
        let mut record = JobRecord::new_at("42", fixed_time())
            .with_title("Rust Engineer")
            .with_company("Acme");
        record.posted_time_text = Some("1 day ago".to_string());
        record.posted_date_iso = Some("2024-02-29".to_string());

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["id"], "42");
        assert_eq!(value["postedTime"], "1 day ago");
        assert_eq!(value["postedDate"], "2024-02-29");
        assert_eq!(value["applyUrl"], serde_json::Value::Null);
        assert_eq!(value["companyUrl"], serde_json::Value::Null);
        assert_eq!(value["benefits"], serde_json::json!([]));
        assert_eq!(value["scrapedAt"], "2024-03-01T12:30:05.000Z");
    }

    #[test]
    fn test_json_round_trip_keeps_timestamp() {
        let record = JobRecord::new_at("7", fixed_time()).with_apply_url("https://x/jobs/view/7");
        let json = serde_json::to_string(&record).unwrap();
        let back: JobRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_validity_requires_id() {
        assert!(JobRecord::new("1").is_valid());
        assert!(!JobRecord::new("").is_valid());
    }

    #[test]
    fn test_to_dict() {
        let dict = JobRecord::new_at("9", fixed_time()).with_company("Acme").to_dict();
        assert_eq!(dict.get("company"), Some(&serde_json::json!("Acme")));
        assert!(dict.contains_key("scrapedAt"));
    }
}
