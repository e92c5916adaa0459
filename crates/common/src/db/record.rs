//! Property records as seen by the chat pipeline and the listing API

use crate::db::models::Property;
use crate::errors::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Listing status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyStatus {
    Available,
    Sold,
    Rented,
    Pending,
}

impl PropertyStatus {
    pub const ALL: [PropertyStatus; 4] = [
        PropertyStatus::Available,
        PropertyStatus::Sold,
        PropertyStatus::Rented,
        PropertyStatus::Pending,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyStatus::Available => "available",
            PropertyStatus::Sold => "sold",
            PropertyStatus::Rented => "rented",
            PropertyStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for PropertyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| AppError::InvalidFormat {
                message: format!("unknown property status '{}'", s),
            })
    }
}

/// Contact details for a listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A property listing owned by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRecord {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub location: String,
    #[serde(rename = "type")]
    pub property_type: String,
    pub status: PropertyStatus,
    pub bedrooms: u32,
    pub halls: u32,
    pub bathrooms: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
    pub furnished: bool,
    pub parking: bool,
    pub balcony: bool,
    pub features: Vec<String>,
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<ContactInfo>,
    pub created_at: DateTime<Utc>,
}

fn string_list(value: serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn non_negative(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

impl TryFrom<Property> for PropertyRecord {
    type Error = AppError;

    fn try_from(model: Property) -> Result<Self, Self::Error> {
        let status = model.status.parse::<PropertyStatus>()?;

        let contact_info = if model.contact_name.is_some()
            || model.contact_phone.is_some()
            || model.contact_email.is_some()
        {
            Some(ContactInfo {
                name: model.contact_name,
                phone: model.contact_phone,
                email: model.contact_email,
            })
        } else {
            None
        };

        Ok(Self {
            id: model.id,
            title: model.title,
            description: model.description,
            price: model.price,
            location: model.location,
            property_type: model.property_type,
            status,
            bedrooms: non_negative(model.bedrooms),
            halls: non_negative(model.halls),
            bathrooms: non_negative(model.bathrooms),
            area: model.area,
            furnished: model.furnished,
            parking: model.parking,
            balcony: model.balcony,
            features: string_list(model.features),
            images: string_list(model.images),
            contact_info,
            created_at: model.created_at.with_timezone(&Utc),
        })
    }
}
