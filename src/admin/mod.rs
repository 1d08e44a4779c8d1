//! Catalog admin configuration
//!
//! Declarative descriptors for the category and product admin screens:
//! which columns a listing shows, which filters it offers, which columns can
//! be edited inline, and which fields are prepopulated as slugs. The HTTP
//! layer (`crate::http::admin`) drives its responses from these.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{Result, ShopError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ModelAdmin {
    pub model: &'static str,
    pub list_display: &'static [&'static str],
    pub list_filter: &'static [&'static str],
    pub list_editable: &'static [&'static str],
    /// `(target, sources)`: `target` defaults to the slug of `sources`.
    pub prepopulated_fields: &'static [(&'static str, &'static [&'static str])],
}

pub const CATEGORY_ADMIN: ModelAdmin = ModelAdmin {
    model: "category",
    list_display: &["name", "slug"],
    list_filter: &[],
    list_editable: &[],
    prepopulated_fields: &[("slug", &["name"])],
};

pub const PRODUCT_ADMIN: ModelAdmin = ModelAdmin {
    model: "product",
    list_display: &["name", "slug", "price", "category", "available", "created"],
    list_filter: &["available", "created", "category"],
    list_editable: &["price", "available"],
    prepopulated_fields: &[("slug", &["name"])],
};

impl ModelAdmin {
    /// `row` reduced to the `list_display` columns, plus its `id`.
    pub fn project<T: Serialize>(&self, row: &T) -> Result<Map<String, Value>> {
        let Value::Object(mut fields) = serde_json::to_value(row)? else {
            return Err(ShopError::Validation(format!("{} row is not an object", self.model)));
        };
        let mut out = Map::new();
        if let Some(id) = fields.remove("id") {
            out.insert("id".to_string(), id);
        }
        for column in self.list_display {
            out.insert(column.to_string(), fields.remove(*column).unwrap_or(Value::Null));
        }
        Ok(out)
    }

    /// Reject any field that is not inline-editable.
    pub fn check_editable<'a>(&self, fields: impl IntoIterator<Item = &'a str>) -> Result<()> {
        let rejected: Vec<&str> = fields.into_iter().filter(|f| !self.list_editable.iter().any(|e| e == f)).collect();
        if rejected.is_empty() {
            Ok(())
        } else {
            Err(ShopError::Validation(format!("{} fields not editable: {}", self.model, rejected.join(", "))))
        }
    }

    /// Value for `target`: `given` when non-blank, else the slug of its sources.
    pub fn prepopulate(&self, target: &str, given: Option<&str>, values: &[(&str, &str)]) -> Option<String> {
        if let Some(given) = given.map(str::trim).filter(|g| !g.is_empty()) {
            return Some(given.to_string());
        }
        let (_, sources) = self.prepopulated_fields.iter().find(|(t, _)| *t == target)?;
        let joined: Vec<&str> = sources
            .iter()
            .filter_map(|s| values.iter().find(|(name, _)| name == s).map(|(_, v)| *v))
            .collect();
        Some(slugify(&joined.join(" ")))
    }
}

/// Lowercase ASCII slug: word characters kept, runs of whitespace and hyphens
/// collapsed to one hyphen, leading and trailing separators trimmed.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_sep = false;
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_sep && !slug.is_empty() {
                slug.push('-');
            }
            pending_sep = false;
            slug.push(c);
        } else if c.is_whitespace() || c == '-' {
            pending_sep = true;
        }
    }
    slug
}
