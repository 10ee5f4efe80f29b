//! Filter predicates built from validated search parameters.
//!
//! A search is an ordered conjunction of [`Predicate`]s. An empty list
//! matches every vehicle. Predicates are plain data, so a store can either
//! evaluate them in memory with [`Predicate::matches`] or translate each one
//! into a parameterized query fragment.

use serde::Serialize;

use crate::models::VehicleListing;
use crate::params::{ClassificationFilter, ColorFilter, SearchParameters};

/// One restriction on the inventory.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Predicate {
    /// Case-insensitive substring of make, model, year, or description.
    Text(String),
    Classification(i64),
    MinPrice(f64),
    MaxPrice(f64),
    MinMileage(i64),
    MaxMileage(i64),
    MinYear(i64),
    MaxYear(i64),
    /// Exact, case-sensitive color.
    Color(String),
}

/// Build the predicate list for a search.
///
/// Order is fixed: text, classification, price, mileage, year, color (min
/// before max).
pub fn build_predicates(params: &SearchParameters) -> Vec<Predicate> {
    let mut predicates = Vec::new();

    if let Some(query) = params.query.as_deref().map(str::trim) {
        if !query.is_empty() {
            predicates.push(Predicate::Text(query.to_string()));
        }
    }

    if let ClassificationFilter::Only(id) = params.classification {
        predicates.push(Predicate::Classification(id));
    }

    if let Some(v) = params.min_price {
        predicates.push(Predicate::MinPrice(v));
    }
    if let Some(v) = params.max_price {
        predicates.push(Predicate::MaxPrice(v));
    }
    if let Some(v) = params.min_miles {
        predicates.push(Predicate::MinMileage(v));
    }
    if let Some(v) = params.max_miles {
        predicates.push(Predicate::MaxMileage(v));
    }
    if let Some(v) = params.min_year {
        predicates.push(Predicate::MinYear(v));
    }
    if let Some(v) = params.max_year {
        predicates.push(Predicate::MaxYear(v));
    }

    if let ColorFilter::Only(color) = &params.color {
        if !color.is_empty() {
            predicates.push(Predicate::Color(color.clone()));
        }
    }

    predicates
}

impl Predicate {
    pub fn matches(&self, vehicle: &VehicleListing) -> bool {
        match self {
            Predicate::Text(query) => {
                let needle = query.to_lowercase();
                let year = vehicle.year.to_string();
                [
                    vehicle.make.as_str(),
                    vehicle.model.as_str(),
                    year.as_str(),
                    vehicle.description.as_str(),
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
            }
            Predicate::Classification(id) => vehicle.classification_id == *id,
            Predicate::MinPrice(v) => vehicle.price >= *v,
            Predicate::MaxPrice(v) => vehicle.price <= *v,
            Predicate::MinMileage(v) => vehicle.miles >= *v,
            Predicate::MaxMileage(v) => vehicle.miles <= *v,
            Predicate::MinYear(v) => vehicle.year >= *v,
            Predicate::MaxYear(v) => vehicle.year <= *v,
            Predicate::Color(color) => vehicle.color.as_deref() == Some(color.as_str()),
        }
    }
}

/// True when every predicate matches.
pub fn matches_all(predicates: &[Predicate], vehicle: &VehicleListing) -> bool {
    predicates.iter().all(|p| p.matches(vehicle))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camry() -> VehicleListing {
        VehicleListing {
            id: 4,
            make: "Toyota".to_string(),
            model: "Camry".to_string(),
            year: 2022,
            description: "Comfortable and reliable sedan with modern features.".to_string(),
            image: String::new(),
            thumbnail: String::new(),
            price: 27999.0,
            miles: 12000,
            color: Some("Black".to_string()),
            classification_id: 2,
            classification_name: "Sedan".to_string(),
        }
    }

    #[test]
    fn test_default_params_build_nothing() {
        assert!(build_predicates(&SearchParameters::default()).is_empty());
        assert!(matches_all(&[], &camry()));
    }

    #[test]
    fn test_construction_order_is_stable() {
        let params = SearchParameters {
            query: Some("camry".to_string()),
            classification: ClassificationFilter::Only(2),
            min_price: Some(1.0),
            max_price: Some(2.0),
            min_miles: Some(3),
            max_miles: Some(4),
            min_year: Some(5),
            max_year: Some(6),
            color: ColorFilter::Only("Black".to_string()),
        };
        assert_eq!(
            build_predicates(&params),
            vec![
                Predicate::Text("camry".to_string()),
                Predicate::Classification(2),
                Predicate::MinPrice(1.0),
                Predicate::MaxPrice(2.0),
                Predicate::MinMileage(3),
                Predicate::MaxMileage(4),
                Predicate::MinYear(5),
                Predicate::MaxYear(6),
                Predicate::Color("Black".to_string()),
            ]
        );
    }

    #[test]
    fn test_blank_query_builds_no_text_predicate() {
        let params = SearchParameters {
            query: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(build_predicates(&params).is_empty());
    }

    #[test]
    fn test_text_matches_any_field_case_insensitively() {
        let v = camry();
        assert!(Predicate::Text("CAMRY".to_string()).matches(&v));
        assert!(Predicate::Text("toyo".to_string()).matches(&v));
        assert!(Predicate::Text("2022".to_string()).matches(&v));
        assert!(Predicate::Text("MODERN feat".to_string()).matches(&v));
        assert!(!Predicate::Text("honda".to_string()).matches(&v));
    }

    #[test]
    fn test_numeric_bounds_inclusive() {
        let v = camry();
        assert!(Predicate::MinPrice(27999.0).matches(&v));
        assert!(Predicate::MaxPrice(27999.0).matches(&v));
        assert!(!Predicate::MaxPrice(27998.99).matches(&v));
        assert!(Predicate::MinMileage(12000).matches(&v));
        assert!(!Predicate::MinMileage(12001).matches(&v));
        assert!(Predicate::MaxYear(2022).matches(&v));
        assert!(!Predicate::MinYear(2025).matches(&v));
    }

    #[test]
    fn test_color_is_case_sensitive() {
        let mut v = camry();
        assert!(Predicate::Color("Black".to_string()).matches(&v));
        assert!(!Predicate::Color("black".to_string()).matches(&v));
        v.color = None;
        assert!(!Predicate::Color("Black".to_string()).matches(&v));
    }

    #[test]
    fn test_conjunction() {
        let v = camry();
        let preds = vec![Predicate::Classification(2), Predicate::MaxMileage(10000)];
        assert!(!matches_all(&preds, &v));
        let preds = vec![Predicate::Classification(2), Predicate::MaxMileage(20000)];
        assert!(matches_all(&preds, &v));
    }
}
