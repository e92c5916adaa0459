//! Property entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "properties")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub price: f64,

    #[sea_orm(column_type = "Text")]
    pub location: String,

    /// Category such as apartment or villa; stored as free text
    #[sea_orm(column_name = "type", column_type = "Text")]
    pub property_type: String,

    #[sea_orm(column_type = "Text")]
    pub status: String,

    pub bedrooms: i32,

    pub halls: i32,

    pub bathrooms: i32,

    /// Area in square feet
    pub area: Option<f64>,

    pub furnished: bool,

    pub parking: bool,

    pub balcony: bool,

    /// Feature tags as a JSONB string array
    #[sea_orm(column_type = "JsonBinary")]
    pub features: Json,

    /// Image URLs as a JSONB string array
    #[sea_orm(column_type = "JsonBinary")]
    pub images: Json,

    #[sea_orm(column_type = "Text", nullable)]
    pub contact_name: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub contact_phone: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub contact_email: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
