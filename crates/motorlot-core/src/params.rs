//! Search parameters: the untyped request form and the validated value object.
//!
//! Every numeric filter arrives as text. [`validate`] is the only place that
//! text is interpreted; [`RawSearchParams::parse`] runs it and, when it passes,
//! produces a [`SearchParameters`] whose fields are already typed. Nothing
//! past this module ever sees raw filter text.
//!
//! A field counts as *supplied* when it is non-empty after trimming. Decimal
//! fields (prices) must parse as a finite `f64`; integer fields (mileage,
//! year) as `i64`. Trailing garbage such as `"12abc"` is rejected.

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Sentinel meaning "do not restrict by this field".
pub const ALL: &str = "all";

/// Search parameters exactly as received from a query string or form body.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RawSearchParams {
    #[serde(alias = "search_query")]
    pub q: String,
    pub classification_id: String,
    pub min_price: String,
    pub max_price: String,
    pub min_miles: String,
    pub max_miles: String,
    pub min_year: String,
    pub max_year: String,
    pub color: String,
}

/// All messages produced by a failed [`validate`] run, in check order.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{}", messages.join(", "))]
pub struct ValidationError {
    pub messages: Vec<String>,
}

/// Classification restriction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClassificationFilter {
    #[default]
    All,
    Only(i64),
}

/// Color restriction. Matching is exact and case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ColorFilter {
    #[default]
    All,
    Only(String),
}

impl Serialize for ClassificationFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ClassificationFilter::All => serializer.serialize_str(ALL),
            ClassificationFilter::Only(id) => serializer.serialize_i64(*id),
        }
    }
}

impl Serialize for ColorFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ColorFilter::All => serializer.serialize_str(ALL),
            ColorFilter::Only(color) => serializer.serialize_str(color),
        }
    }
}

/// Validated, typed search parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchParameters {
    /// Trimmed free-text query; `None` when empty.
    pub query: Option<String>,
    pub classification: ClassificationFilter,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_miles: Option<i64>,
    pub max_miles: Option<i64>,
    pub min_year: Option<i64>,
    pub max_year: Option<i64>,
    pub color: ColorFilter,
}

impl SearchParameters {
    /// Parameters restricting only by free text.
    pub fn text_only(query: &str) -> Self {
        Self {
            query: supplied(query).map(str::to_string),
            ..Self::default()
        }
    }
}

impl RawSearchParams {
    /// Validate and convert to [`SearchParameters`].
    ///
    /// Returns every validation message at once rather than the first.
    pub fn parse(&self) -> Result<SearchParameters, ValidationError> {
        let messages = validate(self);
        if !messages.is_empty() {
            return Err(ValidationError { messages });
        }

        Ok(SearchParameters {
            query: supplied(&self.q).map(str::to_string),
            classification: match sentinel_or_value(&self.classification_id) {
                None => ClassificationFilter::All,
                Some(id) => match parse_integer(id) {
                    Some(id) => ClassificationFilter::Only(id),
                    None => ClassificationFilter::All,
                },
            },
            min_price: supplied(&self.min_price).and_then(parse_decimal),
            max_price: supplied(&self.max_price).and_then(parse_decimal),
            min_miles: supplied(&self.min_miles).and_then(parse_integer),
            max_miles: supplied(&self.max_miles).and_then(parse_integer),
            min_year: supplied(&self.min_year).and_then(parse_integer),
            max_year: supplied(&self.max_year).and_then(parse_integer),
            color: match sentinel_or_value(&self.color) {
                None => ColorFilter::All,
                Some(color) => ColorFilter::Only(color.to_string()),
            },
        })
    }
}

/// Check raw parameters and return every failure, in order.
///
/// Range consistency checks come first (price, mileage, year; each only when
/// both ends parse), then well-formedness of the six numeric fields, then the
/// classification identifier. An empty vector means the parameters are
/// accepted.
pub fn validate(raw: &RawSearchParams) -> Vec<String> {
    let mut errors = Vec::new();

    let min_price = supplied(&raw.min_price);
    let max_price = supplied(&raw.max_price);
    let min_miles = supplied(&raw.min_miles);
    let max_miles = supplied(&raw.max_miles);
    let min_year = supplied(&raw.min_year);
    let max_year = supplied(&raw.max_year);

    if let (Some(min), Some(max)) = (
        min_price.and_then(parse_decimal),
        max_price.and_then(parse_decimal),
    ) {
        if min > max {
            errors.push("Minimum price cannot be greater than maximum price".to_string());
        }
    }

    if let (Some(min), Some(max)) = (
        min_miles.and_then(parse_integer),
        max_miles.and_then(parse_integer),
    ) {
        if min > max {
            errors.push("Minimum mileage cannot be greater than maximum mileage".to_string());
        }
    }

    if let (Some(min), Some(max)) = (
        min_year.and_then(parse_integer),
        max_year.and_then(parse_integer),
    ) {
        if min > max {
            errors.push("Minimum year cannot be greater than maximum year".to_string());
        }
    }

    let decimal_fields = [
        (min_price, "Minimum price"),
        (max_price, "Maximum price"),
    ];
    for (value, label) in decimal_fields {
        if value.is_some_and(|v| parse_decimal(v).is_none()) {
            errors.push(format!("{} must be a valid number", label));
        }
    }

    let integer_fields = [
        (min_miles, "Minimum mileage"),
        (max_miles, "Maximum mileage"),
        (min_year, "Minimum year"),
        (max_year, "Maximum year"),
    ];
    for (value, label) in integer_fields {
        if value.is_some_and(|v| parse_integer(v).is_none()) {
            errors.push(format!("{} must be a valid number", label));
        }
    }

    if sentinel_or_value(&raw.classification_id).is_some_and(|v| parse_integer(v).is_none()) {
        errors.push("Classification must be a valid identifier".to_string());
    }

    errors
}

fn supplied(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// `None` for empty or the `all` sentinel.
fn sentinel_or_value(value: &str) -> Option<&str> {
    supplied(value).filter(|v| *v != ALL)
}

fn parse_decimal(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_integer(value: &str) -> Option<i64> {
    value.parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawSearchParams {
        RawSearchParams {
            classification_id: ALL.to_string(),
            color: ALL.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_params_accepted() {
        assert!(validate(&raw()).is_empty());
        let params = raw().parse().unwrap();
        assert_eq!(params, SearchParameters::default());
    }

    #[test]
    fn test_invalid_min_price() {
        let mut p = raw();
        p.min_price = "abc".to_string();
        assert_eq!(validate(&p), vec!["Minimum price must be a valid number"]);
        let err = p.parse().unwrap_err();
        assert_eq!(err.messages, vec!["Minimum price must be a valid number"]);
    }

    #[test]
    fn test_price_range_inverted() {
        let mut p = raw();
        p.min_price = "30000".to_string();
        p.max_price = "20000".to_string();
        assert_eq!(
            validate(&p),
            vec!["Minimum price cannot be greater than maximum price"]
        );
    }

    #[test]
    fn test_equal_bounds_accepted() {
        let mut p = raw();
        p.min_year = "2020".to_string();
        p.max_year = "2020".to_string();
        assert!(validate(&p).is_empty());
    }

    #[test]
    fn test_all_failures_collected_in_order() {
        let p = RawSearchParams {
            min_price: "50".to_string(),
            max_price: "10".to_string(),
            min_miles: "900".to_string(),
            max_miles: "100".to_string(),
            min_year: "x".to_string(),
            max_year: "2019.5".to_string(),
            classification_id: "suv".to_string(),
            ..raw()
        };
        assert_eq!(
            validate(&p),
            vec![
                "Minimum price cannot be greater than maximum price",
                "Minimum mileage cannot be greater than maximum mileage",
                "Minimum year must be a valid number",
                "Maximum year must be a valid number",
                "Classification must be a valid identifier",
            ]
        );
    }

    #[test]
    fn test_range_check_skipped_when_one_side_unparseable() {
        let mut p = raw();
        p.min_miles = "lots".to_string();
        p.max_miles = "10".to_string();
        assert_eq!(validate(&p), vec!["Minimum mileage must be a valid number"]);
    }

    #[test]
    fn test_whitespace_counts_as_absent() {
        let mut p = raw();
        p.max_price = "   ".to_string();
        p.q = "  camry ".to_string();
        let params = p.parse().unwrap();
        assert_eq!(params.max_price, None);
        assert_eq!(params.query.as_deref(), Some("camry"));
    }

    #[test]
    fn test_parse_types_fields() {
        let p = RawSearchParams {
            q: "Honda".to_string(),
            classification_id: "1".to_string(),
            min_price: "20000".to_string(),
            max_price: "30000.50".to_string(),
            min_miles: "0".to_string(),
            max_year: "2021".to_string(),
            color: "White".to_string(),
            ..Default::default()
        };
        let params = p.parse().unwrap();
        assert_eq!(params.classification, ClassificationFilter::Only(1));
        assert_eq!(params.min_price, Some(20000.0));
        assert_eq!(params.max_price, Some(30000.5));
        assert_eq!(params.min_miles, Some(0));
        assert_eq!(params.max_miles, None);
        assert_eq!(params.max_year, Some(2021));
        assert_eq!(params.color, ColorFilter::Only("White".to_string()));
    }

    #[test]
    fn test_infinite_price_rejected() {
        let mut p = raw();
        p.max_price = "inf".to_string();
        assert_eq!(validate(&p), vec!["Maximum price must be a valid number"]);
    }

    #[test]
    fn test_error_display_joins_messages() {
        let err = ValidationError {
            messages: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "a, b");
    }

    #[test]
    fn test_snapshot_serializes_sentinels() {
        let params = SearchParameters {
            min_price: Some(100.0),
            classification: ClassificationFilter::Only(2),
            ..Default::default()
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["classification"], 2);
        assert_eq!(json["color"], "all");
        assert_eq!(json["min_price"], 100.0);
        assert!(json["max_price"].is_null());
    }
}
