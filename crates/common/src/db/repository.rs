//! Repository pattern for property store access
//!
//! `PropertyStore` is the seam the chat pipeline and the listing API talk to.
//! `Repository` implements it over PostgreSQL via SeaORM.

use crate::db::filter::{PropertyFilter, TextMatch, TextMode};
use crate::db::models::*;
use crate::db::record::PropertyRecord;
use crate::db::DbPool;
use crate::errors::Result;
use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use std::time::Instant;

/// Skip/limit window over a newest-first result set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: u64,
    pub limit: u64,
}

impl Page {
    /// First `limit` records
    pub fn first(limit: u64) -> Self {
        Self { skip: 0, limit }
    }

    /// 1-based page number of size `limit`
    pub fn number(page: u64, limit: u64) -> Self {
        Self {
            skip: page.saturating_sub(1).saturating_mul(limit),
            limit,
        }
    }
}

/// Read access to property listings
#[async_trait]
pub trait PropertyStore: Send + Sync {
    /// Records matching `filter`, newest first, windowed by `page`
    async fn find(&self, filter: &PropertyFilter, page: Page) -> Result<Vec<PropertyRecord>>;

    /// Number of records matching `filter`
    async fn count(&self, filter: &PropertyFilter) -> Result<u64>;

    /// Check connectivity
    async fn ping(&self) -> Result<()>;

    /// Backend name for logs and health output
    fn backend(&self) -> &'static str;
}

/// PostgreSQL-backed property repository
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }
}

/// Escape `%`, `_` and the escape character itself for a LIKE pattern
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn text_condition(column: PropertyColumn, text: &TextMatch) -> SimpleExpr {
    match text.mode {
        TextMode::Exact => column.eq(text.value.clone()),
        TextMode::Contains => Expr::expr(Func::lower(Expr::col(column)))
            .like(format!("%{}%", escape_like(&text.value.to_lowercase()))),
    }
}

/// Translate a store filter into a SeaORM condition
pub(crate) fn to_condition(filter: &PropertyFilter) -> Condition {
    let mut condition = Condition::all();

    if let Some(status) = filter.status {
        condition = condition.add(PropertyColumn::Status.eq(status.as_str()));
    }
    if let Some(ref location) = filter.location {
        condition = condition.add(text_condition(PropertyColumn::Location, location));
    }
    if let Some(ref property_type) = filter.property_type {
        condition = condition.add(text_condition(PropertyColumn::PropertyType, property_type));
    }

    for (column, range) in [
        (PropertyColumn::Price, filter.price),
        (PropertyColumn::Area, filter.area),
    ] {
        if let Some(range) = range {
            if let Some(min) = range.min {
                condition = condition.add(column.gte(min));
            }
            if let Some(max) = range.max {
                condition = condition.add(column.lte(max));
            }
        }
    }

    for (column, wanted) in [
        (PropertyColumn::Bedrooms, filter.bedrooms),
        (PropertyColumn::Halls, filter.halls),
        (PropertyColumn::Bathrooms, filter.bathrooms),
    ] {
        if let Some(count) = wanted {
            condition = condition.add(column.eq(i64::from(count)));
        }
    }

    for (column, wanted) in [
        (PropertyColumn::Furnished, filter.furnished),
        (PropertyColumn::Parking, filter.parking),
        (PropertyColumn::Balcony, filter.balcony),
    ] {
        if let Some(flag) = wanted {
            condition = condition.add(column.eq(flag));
        }
    }

    if let Some(ref features) = filter.features_any {
        let mut any = Condition::any();
        for tag in features {
            any = any.add(Expr::cust_with_values(
                "features @> $1::jsonb",
                [serde_json::json!([tag]).to_string()],
            ));
        }
        condition = condition.add(any);
    }

    condition
}

#[async_trait]
impl PropertyStore for Repository {
    async fn find(&self, filter: &PropertyFilter, page: Page) -> Result<Vec<PropertyRecord>> {
        let start = Instant::now();

        let models = PropertyEntity::find()
            .filter(to_condition(filter))
            .order_by_desc(PropertyColumn::CreatedAt)
            .offset(page.skip)
            .limit(page.limit)
            .all(self.read_conn())
            .await?;

        crate::metrics::record_store_query(
            start.elapsed().as_secs_f64(),
            self.backend(),
            models.len(),
        );

        models.into_iter().map(PropertyRecord::try_from).collect()
    }

    async fn count(&self, filter: &PropertyFilter) -> Result<u64> {
        PropertyEntity::find()
            .filter(to_condition(filter))
            .count(self.read_conn())
            .await
            .map_err(Into::into)
    }

    async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::filter::NumericRange;
    use crate::db::record::PropertyStatus;
    use sea_orm::{DbBackend, QueryTrait};

    fn sql_for(filter: &PropertyFilter) -> String {
        PropertyEntity::find()
            .filter(to_condition(filter))
            .build(DbBackend::Postgres)
            .to_string()
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("Mumbai"), "Mumbai");
    }

    #[test]
    fn test_page_numbering() {
        assert_eq!(Page::number(1, 10), Page { skip: 0, limit: 10 });
        assert_eq!(Page::number(3, 10), Page { skip: 20, limit: 10 });
        assert_eq!(Page::number(0, 10), Page { skip: 0, limit: 10 });
    }

    #[test]
    fn test_condition_sql() {
        let filter = PropertyFilter {
            status: Some(PropertyStatus::Available),
            location: Some(TextMatch::contains("Mumbai")),
            price: NumericRange::from_bounds(None, Some(5_000_000.0)),
            bedrooms: Some(0),
            ..Default::default()
        };
        let sql = sql_for(&filter);
        assert!(sql.contains("'available'"));
        assert!(sql.contains("LOWER("));
        assert!(sql.contains("LIKE"));
        assert!(sql.contains("%mumbai%"));
        assert!(sql.contains(r#""price" <="#));
        assert!(sql.contains(r#""bedrooms" = 0"#));
        assert!(!sql.contains(">="));
    }

    #[test]
    fn test_features_condition_uses_jsonb_containment() {
        let filter = PropertyFilter {
            features_any: Some(vec!["gym".into(), "pool".into()]),
            ..Default::default()
        };
        let sql = sql_for(&filter);
        assert!(sql.contains("features @>"));
        assert!(sql.contains("gym"));
        assert!(sql.contains("pool"));
        assert!(sql.contains(" OR "));
    }
}
