//! Catalog entries: products and categories
//!
//! Both carry per-language translations. Reads resolve to a single language;
//! the stores fall back to the default language when the requested one has
//! no translation.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use crate::domain::value_objects::{CategoryId, Price, ProductId};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub language_code: String,
    pub name: String,
    pub slug: String,
    pub created: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub category: CategoryId,
    pub language_code: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Price,
    pub available: bool,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTranslation { pub name: String, pub slug: String }

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductTranslation { pub name: String, pub slug: String, pub description: String }

#[derive(Clone, Debug)]
pub struct NewCategory { pub language_code: String, pub translation: CategoryTranslation }

#[derive(Clone, Debug)]
pub struct NewProduct {
    pub category: CategoryId,
    pub price: Price,
    pub available: bool,
    pub language_code: String,
    pub translation: ProductTranslation,
}

/// Inline edit of the list-editable product columns.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProductEdit { pub price: Option<Price>, pub available: Option<bool> }

impl ProductEdit {
    pub fn is_empty(&self) -> bool { self.price.is_none() && self.available.is_none() }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub available: Option<bool>,
    pub category: Option<CategoryId>,
    pub created_since: Option<DateTime<Utc>>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        self.available.map_or(true, |a| product.available == a)
            && self.category.map_or(true, |c| product.category == c)
            && self.created_since.map_or(true, |since| product.created >= since)
    }
}

/// Date-hierarchy choices for the `created` admin filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreatedFilter {
    #[serde(rename = "today")]
    Today,
    #[serde(rename = "past_7_days")]
    PastSevenDays,
    #[serde(rename = "this_month")]
    ThisMonth,
    #[serde(rename = "this_year")]
    ThisYear,
}

impl CreatedFilter {
    /// Lower bound (inclusive) of the window this choice selects.
    pub fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.date_naive();
        let start = match self {
            Self::Today => today,
            Self::PastSevenDays => today - Duration::days(7),
            Self::ThisMonth => NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today),
            Self::ThisYear => NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
        };
        Utc.from_utc_datetime(&start.and_time(NaiveTime::MIN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn product(available: bool, created: DateTime<Utc>) -> Product {
        Product {
            id: ProductId::new(), category: CategoryId::new(), language_code: "en".into(),
            name: "Tea".into(), slug: "tea".into(), description: String::new(),
            price: Price::new(Decimal::new(450, 2)).unwrap(), available, created, updated: created,
        }
    }

    #[test]
    fn test_created_filter_bounds() {
        let now = Utc.with_ymd_and_hms(2024, 5, 17, 15, 30, 0).unwrap();
        assert_eq!(CreatedFilter::Today.since(now), Utc.with_ymd_and_hms(2024, 5, 17, 0, 0, 0).unwrap());
        assert_eq!(CreatedFilter::PastSevenDays.since(now), Utc.with_ymd_and_hms(2024, 5, 10, 0, 0, 0).unwrap());
        assert_eq!(CreatedFilter::ThisMonth.since(now), Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());
        assert_eq!(CreatedFilter::ThisYear.since(now), Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_filter_matches() {
        let now = Utc::now();
        let p = product(true, now);
        assert!(ProductFilter::default().matches(&p));
        assert!(!ProductFilter { available: Some(false), ..Default::default() }.matches(&p));
        assert!(!ProductFilter { category: Some(CategoryId::new()), ..Default::default() }.matches(&p));
        assert!(!ProductFilter { created_since: Some(now + Duration::seconds(1)), ..Default::default() }.matches(&p));
    }

    #[test]
    fn test_created_filter_serde_names() {
        let f: CreatedFilter = serde_json::from_str("\"past_7_days\"").unwrap();
        assert_eq!(f, CreatedFilter::PastSevenDays);
    }
}
