//! Store-level property filter
//!
//! A `PropertyFilter` is the query language shared by every store backend.
//! Each populated field is one clause; clauses are AND-ed together.

use crate::db::record::{PropertyRecord, PropertyStatus};
use serde_json::{json, Map, Value};

/// How a text clause compares against the stored value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMode {
    /// Case-insensitive substring
    Contains,
    /// Exact, case-sensitive equality
    Exact,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextMatch {
    pub value: String,
    pub mode: TextMode,
}

impl TextMatch {
    pub fn contains(value: impl Into<String>) -> Self {
        Self { value: value.into(), mode: TextMode::Contains }
    }

    pub fn exact(value: impl Into<String>) -> Self {
        Self { value: value.into(), mode: TextMode::Exact }
    }

    pub fn matches(&self, candidate: &str) -> bool {
        match self.mode {
            TextMode::Contains => candidate
                .to_lowercase()
                .contains(&self.value.to_lowercase()),
            TextMode::Exact => candidate == self.value,
        }
    }

    fn to_document(&self) -> Value {
        match self.mode {
            TextMode::Contains => json!({
                "$regex": regex_lite::escape(&self.value),
                "$options": "i",
            }),
            TextMode::Exact => Value::String(self.value.clone()),
        }
    }
}

/// Inclusive numeric range; either bound may be open
///
/// `min > max` is kept as given and simply matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NumericRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumericRange {
    /// Build a range from optional bounds; `None` when both are absent
    pub fn from_bounds(min: Option<f64>, max: Option<f64>) -> Option<Self> {
        if min.is_none() && max.is_none() {
            None
        } else {
            Some(Self { min, max })
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }

    fn to_document(self) -> Value {
        let mut range = Map::new();
        if let Some(min) = self.min {
            range.insert("$gte".to_string(), json!(min));
        }
        if let Some(max) = self.max {
            range.insert("$lte".to_string(), json!(max));
        }
        Value::Object(range)
    }
}

/// Filter over property records
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertyFilter {
    pub status: Option<PropertyStatus>,
    pub location: Option<TextMatch>,
    pub property_type: Option<TextMatch>,
    pub price: Option<NumericRange>,
    pub bedrooms: Option<u32>,
    pub halls: Option<u32>,
    pub bathrooms: Option<u32>,
    pub area: Option<NumericRange>,
    pub furnished: Option<bool>,
    pub parking: Option<bool>,
    pub balcony: Option<bool>,
    /// Matches records carrying at least one of these tags
    pub features_any: Option<Vec<String>>,
}

impl PropertyFilter {
    /// Number of clauses in this filter
    pub fn clause_count(&self) -> usize {
        [
            self.status.is_some(),
            self.location.is_some(),
            self.property_type.is_some(),
            self.price.is_some(),
            self.bedrooms.is_some(),
            self.halls.is_some(),
            self.bathrooms.is_some(),
            self.area.is_some(),
            self.furnished.is_some(),
            self.parking.is_some(),
            self.balcony.is_some(),
            self.features_any.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }

    /// Evaluate the filter against a single record
    pub fn matches(&self, record: &PropertyRecord) -> bool {
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        if let Some(ref location) = self.location {
            if !location.matches(&record.location) {
                return false;
            }
        }
        if let Some(ref property_type) = self.property_type {
            if !property_type.matches(&record.property_type) {
                return false;
            }
        }
        if let Some(price) = self.price {
            if !price.contains(record.price) {
                return false;
            }
        }
        let counts = [
            (self.bedrooms, record.bedrooms),
            (self.halls, record.halls),
            (self.bathrooms, record.bathrooms),
        ];
        if counts
            .iter()
            .any(|(wanted, actual)| wanted.is_some_and(|w| w != *actual))
        {
            return false;
        }
        if let Some(area) = self.area {
            // Records without an area cannot satisfy an area range
            match record.area {
                Some(value) if area.contains(value) => {}
                _ => return false,
            }
        }
        let flags = [
            (self.furnished, record.furnished),
            (self.parking, record.parking),
            (self.balcony, record.balcony),
        ];
        if flags
            .iter()
            .any(|(wanted, actual)| wanted.is_some_and(|w| w != *actual))
        {
            return false;
        }
        if let Some(ref features) = self.features_any {
            if !features.iter().any(|tag| record.features.contains(tag)) {
                return false;
            }
        }
        true
    }

    /// Render as a Mongo-style query document, mainly for logs and responses
    pub fn to_document(&self) -> Value {
        let mut doc = Map::new();
        if let Some(status) = self.status {
            doc.insert("status".to_string(), json!(status.as_str()));
        }
        if let Some(ref location) = self.location {
            doc.insert("location".to_string(), location.to_document());
        }
        if let Some(ref property_type) = self.property_type {
            doc.insert("type".to_string(), property_type.to_document());
        }
        if let Some(price) = self.price {
            doc.insert("price".to_string(), price.to_document());
        }
        for (key, value) in [
            ("bedrooms", self.bedrooms),
            ("halls", self.halls),
            ("bathrooms", self.bathrooms),
        ] {
            if let Some(value) = value {
                doc.insert(key.to_string(), json!(value));
            }
        }
        if let Some(area) = self.area {
            doc.insert("area".to_string(), area.to_document());
        }
        for (key, value) in [
            ("furnished", self.furnished),
            ("parking", self.parking),
            ("balcony", self.balcony),
        ] {
            if let Some(value) = value {
                doc.insert(key.to_string(), json!(value));
            }
        }
        if let Some(ref features) = self.features_any {
            doc.insert("features".to_string(), json!({ "$in": features }));
        }
        Value::Object(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn record() -> PropertyRecord {
        PropertyRecord {
            id: Uuid::new_v4(),
            title: "Garden villa".into(),
            description: "Quiet street".into(),
            price: 9_000_000.0,
            location: "Sector 54, Gurgaon".into(),
            property_type: "Villa".into(),
            status: PropertyStatus::Available,
            bedrooms: 4,
            halls: 1,
            bathrooms: 3,
            area: Some(2400.0),
            furnished: false,
            parking: true,
            balcony: false,
            features: vec!["garden".into(), "security".into()],
            images: vec![],
            contact_info: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_contains_is_case_insensitive() {
        let filter = PropertyFilter {
            location: Some(TextMatch::contains("gurgaon")),
            property_type: Some(TextMatch::contains("VILL")),
            ..Default::default()
        };
        assert!(filter.matches(&record()));
    }

    #[test]
    fn test_exact_text_is_case_sensitive() {
        let filter = PropertyFilter {
            property_type: Some(TextMatch::exact("villa")),
            ..Default::default()
        };
        assert!(!filter.matches(&record()));
    }

    #[test]
    fn test_inverted_range_matches_nothing() {
        let filter = PropertyFilter {
            price: NumericRange::from_bounds(Some(10_000_000.0), Some(1_000_000.0)),
            ..Default::default()
        };
        assert!(!filter.matches(&record()));
    }

    #[test]
    fn test_features_any_of() {
        let mut filter = PropertyFilter {
            features_any: Some(vec!["pool".into(), "garden".into()]),
            ..Default::default()
        };
        assert!(filter.matches(&record()));
        filter.features_any = Some(vec!["pool".into()]);
        assert!(!filter.matches(&record()));
    }

    #[test]
    fn test_area_range_excludes_records_without_area() {
        let filter = PropertyFilter {
            area: NumericRange::from_bounds(Some(1000.0), None),
            ..Default::default()
        };
        let mut r = record();
        assert!(filter.matches(&r));
        r.area = None;
        assert!(!filter.matches(&r));
    }

    #[test]
    fn test_document_escapes_regex_metacharacters() {
        let filter = PropertyFilter {
            location: Some(TextMatch::contains("St. John's (East)")),
            ..Default::default()
        };
        let doc = filter.to_document();
        assert_eq!(doc["location"]["$regex"], r"St\. John's \(East\)");
        assert_eq!(doc["location"]["$options"], "i");
    }

    #[test]
    fn test_empty_filter_has_no_clauses() {
        let filter = PropertyFilter::default();
        assert_eq!(filter.clause_count(), 0);
        assert_eq!(filter.to_document(), json!({}));
        assert!(filter.matches(&record()));
    }
}
