//! Structured search criteria extracted from a chat message
//!
//! Every field is optional and presence is meaningful: an absent field adds no
//! constraint, while a present one (even `0` or `false`) always does.

use crate::db::PropertyStatus;
use crate::errors::AppError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Property categories understood by the extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Apartment,
    House,
    Villa,
    Studio,
    Penthouse,
    Townhouse,
    Condo,
    Duplex,
}

impl PropertyType {
    pub const ALL: [PropertyType; 8] = [
        PropertyType::Apartment,
        PropertyType::House,
        PropertyType::Villa,
        PropertyType::Studio,
        PropertyType::Penthouse,
        PropertyType::Townhouse,
        PropertyType::Condo,
        PropertyType::Duplex,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Apartment => "apartment",
            PropertyType::House => "house",
            PropertyType::Villa => "villa",
            PropertyType::Studio => "studio",
            PropertyType::Penthouse => "penthouse",
            PropertyType::Townhouse => "townhouse",
            PropertyType::Condo => "condo",
            PropertyType::Duplex => "duplex",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyType {
    type Err = AppError;

    /// Case-insensitive; a trailing plural `s` is accepted ("Villas")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        let singular = needle.strip_suffix('s').unwrap_or(&needle);
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == needle || kind.as_str() == singular)
            .ok_or_else(|| AppError::InvalidFormat {
                message: format!("unknown property type '{}'", s),
            })
    }
}

/// Search criteria; all fields optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub property_type: Option<PropertyType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub halls: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PropertyStatus>,

    /// Feature tags, deduplicated in first-seen order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub furnished: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parking: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub balcony: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_area: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_area: Option<f64>,
}

impl SearchCriteria {
    /// Coerce an untrusted JSON object into criteria
    ///
    /// Fields with the wrong JSON type, negative numbers, fractional room
    /// counts and unknown enum values are dropped rather than rejected.
    /// Anything other than an object yields empty criteria.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        Self {
            location: text(obj, "location"),
            property_type: text(obj, "type").and_then(|t| t.parse().ok()),
            min_price: amount(obj, "minPrice"),
            max_price: amount(obj, "maxPrice"),
            bedrooms: count(obj, "bedrooms"),
            halls: count(obj, "halls"),
            bathrooms: count(obj, "bathrooms"),
            status: text(obj, "status").and_then(|s| s.parse().ok()),
            features: tags(obj, "features"),
            furnished: obj.get("furnished").and_then(Value::as_bool),
            parking: obj.get("parking").and_then(Value::as_bool),
            balcony: obj.get("balcony").and_then(Value::as_bool),
            min_area: amount(obj, "minArea"),
            max_area: amount(obj, "maxArea"),
        }
    }

    /// No field is present
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn text(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn amount(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    obj.get(key)
        .and_then(Value::as_f64)
        .filter(|n| n.is_finite() && *n >= 0.0)
}

fn count(obj: &Map<String, Value>, key: &str) -> Option<u32> {
    let value = obj.get(key)?;
    if let Some(n) = value.as_u64() {
        return u32::try_from(n).ok();
    }
    // 2.0 is a count, 2.5 is not
    value
        .as_f64()
        .filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n <= f64::from(u32::MAX))
        .map(|n| n as u32)
}

fn tags(obj: &Map<String, Value>, key: &str) -> Option<Vec<String>> {
    let items = obj.get(key)?.as_array()?;
    let mut tags: Vec<String> = Vec::with_capacity(items.len());
    for tag in items.iter().filter_map(Value::as_str).map(str::trim) {
        if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    Some(tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_well_typed() {
        let criteria = SearchCriteria::from_value(&json!({
            "location": "Mumbai",
            "type": "apartment",
            "bedrooms": 2,
            "maxPrice": 5000000,
            "furnished": false,
            "features": ["gym", "pool", "gym"]
        }));

        assert_eq!(criteria.location.as_deref(), Some("Mumbai"));
        assert_eq!(criteria.property_type, Some(PropertyType::Apartment));
        assert_eq!(criteria.bedrooms, Some(2));
        assert_eq!(criteria.max_price, Some(5_000_000.0));
        assert_eq!(criteria.min_price, None);
        assert_eq!(criteria.furnished, Some(false));
        assert_eq!(criteria.features, Some(vec!["gym".to_string(), "pool".to_string()]));
    }

    #[test]
    fn test_wrong_types_become_absent() {
        let criteria = SearchCriteria::from_value(&json!({
            "location": 42,
            "bedrooms": "two",
            "halls": 1.5,
            "bathrooms": -1,
            "maxPrice": "50 lakhs",
            "minArea": -200,
            "parking": "yes",
            "features": "gym",
            "type": "castle",
            "status": "archived"
        }));

        assert!(criteria.is_empty(), "{:?}", criteria);
    }

    #[test]
    fn test_zero_values_are_present() {
        let criteria = SearchCriteria::from_value(&json!({
            "bedrooms": 0,
            "minPrice": 0,
            "balcony": false
        }));
        assert_eq!(criteria.bedrooms, Some(0));
        assert_eq!(criteria.min_price, Some(0.0));
        assert_eq!(criteria.balcony, Some(false));
        assert!(!criteria.is_empty());
    }

    #[test]
    fn test_integral_float_count_accepted() {
        let criteria = SearchCriteria::from_value(&json!({ "bedrooms": 3.0 }));
        assert_eq!(criteria.bedrooms, Some(3));
    }

    #[test]
    fn test_non_object_is_empty() {
        assert!(SearchCriteria::from_value(&json!([1, 2])).is_empty());
        assert!(SearchCriteria::from_value(&Value::Null).is_empty());
    }

    #[test]
    fn test_property_type_parsing() {
        assert_eq!("Villas".parse::<PropertyType>().unwrap(), PropertyType::Villa);
        assert_eq!(" HOUSE ".parse::<PropertyType>().unwrap(), PropertyType::House);
        assert_eq!("studio".parse::<PropertyType>().unwrap(), PropertyType::Studio);
        assert!("bungalow".parse::<PropertyType>().is_err());
    }

    #[test]
    fn test_serialization_skips_absent_fields() {
        let criteria = SearchCriteria {
            property_type: Some(PropertyType::House),
            max_price: Some(100.0),
            ..Default::default()
        };
        let value = serde_json::to_value(&criteria).unwrap();
        assert_eq!(value, json!({ "type": "house", "maxPrice": 100.0 }));
    }
}
