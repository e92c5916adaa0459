//! Property listing handler

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use proppilot_common::{
    db::{Page, PropertyFilter, PropertyRecord, PropertyStatus, TextMatch},
    errors::{AppError, Result},
};

const DEFAULT_LIMIT: u64 = 10;

/// Listing query parameters
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ListPropertiesQuery {
    #[validate(range(min = 1))]
    pub page: Option<u64>,

    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u64>,

    pub status: Option<String>,

    #[serde(rename = "type")]
    pub property_type: Option<String>,

    pub location: Option<String>,
}

impl ListPropertiesQuery {
    /// Status and type match exactly, location as a substring
    fn filter(&self) -> Result<PropertyFilter> {
        let status = non_blank(&self.status)
            .map(str::parse::<PropertyStatus>)
            .transpose()?;

        Ok(PropertyFilter {
            status,
            property_type: non_blank(&self.property_type).map(TextMatch::exact),
            location: non_blank(&self.location).map(TextMatch::contains),
            ..Default::default()
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current: u64,
    /// Number of pages
    pub total: u64,
    pub count: usize,
    pub total_properties: u64,
}

#[derive(Debug, Serialize)]
pub struct ListPropertiesResponse {
    pub properties: Vec<PropertyRecord>,
    pub pagination: Pagination,
}

/// List properties, newest first
pub async fn list_properties(
    State(state): State<AppState>,
    Query(query): Query<ListPropertiesQuery>,
) -> Result<Json<ListPropertiesResponse>> {
    query.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    let filter = query.filter()?;

    let store = state.pipeline.store();
    let expose_details = state.config.expose_error_details();
    let failed = |e: AppError| {
        tracing::error!(error = %e, backend = store.backend(), "Property listing failed");
        AppError::operation_failed(&e).redact(expose_details)
    };

    let properties = store
        .find(&filter, Page::number(page, limit))
        .await
        .map_err(failed)?;
    let total_properties = store.count(&filter).await.map_err(failed)?;

    Ok(Json(ListPropertiesResponse {
        pagination: Pagination {
            current: page,
            total: total_properties.div_ceil(limit),
            count: properties.len(),
            total_properties,
        },
        properties,
    }))
}
