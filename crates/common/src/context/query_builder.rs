//! Criteria to store filter translation

use crate::context::criteria::SearchCriteria;
use crate::db::{NumericRange, PropertyFilter, PropertyStatus, TextMatch};

/// Maps search criteria onto a `PropertyFilter`
///
/// Pure and total: every criteria value produces a filter, and the same
/// criteria always produce an equal filter.
pub struct QueryBuilder;

impl QueryBuilder {
    /// Status that applies when the criteria do not name one
    pub const DEFAULT_STATUS: PropertyStatus = PropertyStatus::Available;

    pub fn build(criteria: &SearchCriteria) -> PropertyFilter {
        PropertyFilter {
            status: Some(criteria.status.unwrap_or(Self::DEFAULT_STATUS)),
            location: criteria.location.as_deref().map(TextMatch::contains),
            property_type: criteria
                .property_type
                .map(|kind| TextMatch::contains(kind.as_str())),
            price: NumericRange::from_bounds(criteria.min_price, criteria.max_price),
            bedrooms: criteria.bedrooms,
            halls: criteria.halls,
            bathrooms: criteria.bathrooms,
            area: NumericRange::from_bounds(criteria.min_area, criteria.max_area),
            furnished: criteria.furnished,
            parking: criteria.parking,
            balcony: criteria.balcony,
            features_any: criteria
                .features
                .as_ref()
                .filter(|tags| !tags.is_empty())
                .cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::criteria::PropertyType;
    use serde_json::json;

    #[test]
    fn test_empty_criteria_only_constrains_status() {
        let filter = QueryBuilder::build(&SearchCriteria::default());
        assert_eq!(filter.clause_count(), 1);
        assert_eq!(filter.to_document(), json!({ "status": "available" }));
    }

    #[test]
    fn test_explicit_status_overrides_default() {
        let criteria = SearchCriteria {
            status: Some(PropertyStatus::Rented),
            ..Default::default()
        };
        assert_eq!(
            QueryBuilder::build(&criteria).status,
            Some(PropertyStatus::Rented)
        );
    }

    #[test]
    fn test_zero_bedrooms_is_exact_clause() {
        let criteria = SearchCriteria {
            bedrooms: Some(0),
            ..Default::default()
        };
        let doc = QueryBuilder::build(&criteria).to_document();
        assert_eq!(doc["bedrooms"], json!(0));
    }

    #[test]
    fn test_max_price_only_has_no_lower_bound() {
        let criteria = SearchCriteria {
            max_price: Some(3_000_000.0),
            ..Default::default()
        };
        let filter = QueryBuilder::build(&criteria);
        assert_eq!(
            filter.price,
            Some(NumericRange { min: None, max: Some(3_000_000.0) })
        );
        assert_eq!(filter.to_document()["price"], json!({ "$lte": 3_000_000.0 }));
    }

    #[test]
    fn test_min_above_max_passes_through() {
        let criteria = SearchCriteria {
            min_area: Some(2000.0),
            max_area: Some(1000.0),
            ..Default::default()
        };
        let range = QueryBuilder::build(&criteria).area.unwrap();
        assert_eq!(range.min, Some(2000.0));
        assert_eq!(range.max, Some(1000.0));
        assert!(!range.contains(1500.0));
    }

    #[test]
    fn test_features_only_when_non_empty() {
        let empty = SearchCriteria {
            features: Some(vec![]),
            ..Default::default()
        };
        assert!(QueryBuilder::build(&empty).features_any.is_none());

        let some = SearchCriteria {
            features: Some(vec!["gym".into(), "pool".into()]),
            ..Default::default()
        };
        assert_eq!(
            QueryBuilder::build(&some).to_document()["features"],
            json!({ "$in": ["gym", "pool"] })
        );
    }

    #[test]
    fn test_boolean_false_is_a_clause() {
        let criteria = SearchCriteria {
            furnished: Some(false),
            ..Default::default()
        };
        let filter = QueryBuilder::build(&criteria);
        assert_eq!(filter.furnished, Some(false));
        assert_eq!(filter.clause_count(), 2);
    }

    #[test]
    fn test_build_is_deterministic() {
        let criteria = SearchCriteria {
            location: Some("Pune".into()),
            min_price: Some(1.0),
            features: Some(vec!["lift".into()]),
            ..Default::default()
        };
        assert_eq!(QueryBuilder::build(&criteria), QueryBuilder::build(&criteria));
    }

    #[test]
    fn test_mumbai_apartment_query_document() {
        let criteria = SearchCriteria {
            location: Some("Mumbai".into()),
            property_type: Some(PropertyType::Apartment),
            bedrooms: Some(2),
            max_price: Some(5_000_000.0),
            ..Default::default()
        };

        assert_eq!(
            QueryBuilder::build(&criteria).to_document(),
            json!({
                "status": "available",
                "location": { "$regex": "Mumbai", "$options": "i" },
                "type": { "$regex": "apartment", "$options": "i" },
                "bedrooms": 2,
                "price": { "$lte": 5_000_000.0 }
            })
        );
    }
}
