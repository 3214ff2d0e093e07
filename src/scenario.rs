// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Bookstore Management Simulation - Scenario Descriptor
//
// The seeding input: books with their initial stock, employees and customers.
// Omitted optional fields take their value from `ModelConfig` at seeding.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("malformed scenario JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot read scenario: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid scenario: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSpec {
    pub name: String,
    pub author: String,
    /// Accepts a single string or a list.
    #[serde(rename = "genre", deserialize_with = "one_or_many", default)]
    pub genres: Vec<String>,
    pub price: f64,
    pub qty: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployeeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerSpec {
    #[serde(default)]
    pub prefs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub books: Vec<BookSpec>,
    #[serde(default)]
    pub employees: Vec<EmployeeSpec>,
    #[serde(default)]
    pub customers: Vec<CustomerSpec>,
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        let scenario: Self = serde_json::from_str(json)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Reject data the fact store would refuse halfway through seeding.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let mut names = BTreeSet::new();
        for book in &self.books {
            if book.name.is_empty() {
                return Err(ScenarioError::Invalid("book with empty name".into()));
            }
            if !names.insert(book.name.as_str()) {
                return Err(ScenarioError::Invalid(format!(
                    "book `{}` listed twice",
                    book.name
                )));
            }
            if !book.price.is_finite() || book.price < 0.0 {
                return Err(ScenarioError::Invalid(format!(
                    "book `{}` has price {}",
                    book.name, book.price
                )));
            }
            if book.qty < 0 || book.threshold.map_or(false, |t| t < 0) {
                return Err(ScenarioError::Invalid(format!(
                    "book `{}` has negative stock settings",
                    book.name
                )));
            }
        }
        for (i, employee) in self.employees.iter().enumerate() {
            if employee.amount.map_or(false, |a| a < 0) {
                return Err(ScenarioError::Invalid(format!(
                    "employee {} has a negative restock amount",
                    i + 1
                )));
            }
        }
        for (i, customer) in self.customers.iter().enumerate() {
            if customer.budget.map_or(false, |b| !b.is_finite()) {
                return Err(ScenarioError::Invalid(format!(
                    "customer {} has a non-finite budget",
                    i + 1
                )));
            }
        }
        Ok(())
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(genre) => vec![genre],
        OneOrMany::Many(genres) => genres,
    })
}

/// Small catalogue used when no scenario file is given.
pub fn default_scenario() -> Scenario {
    let book = |name: &str, author: &str, genre: &str, price: f64, qty: i64| BookSpec {
        name: name.to_string(),
        author: author.to_string(),
        genres: vec![genre.to_string()],
        price,
        qty,
        threshold: None,
    };
    let customer = |prefs: &[&str], budget: f64| CustomerSpec {
        prefs: prefs.iter().map(|p| p.to_string()).collect(),
        budget: Some(budget),
    };

    Scenario {
        books: vec![
            book("Dune", "Frank Herbert", "SciFi", 12.0, 15),
            book("Neuromancer", "William Gibson", "SciFi", 10.0, 10),
            book("Emma", "Jane Austen", "Romance", 8.0, 12),
            book("Dracula", "Bram Stoker", "Horror", 9.0, 8),
            book("Sapiens", "Yuval Noah Harari", "History", 18.0, 6),
            book("Gone_Girl", "Gillian Flynn", "Thriller", 11.0, 9),
        ],
        employees: vec![EmployeeSpec { amount: Some(10) }, EmployeeSpec { amount: Some(8) }],
        customers: vec![
            customer(&["SciFi"], 60.0),
            customer(&["Romance", "History"], 40.0),
            customer(&["Horror"], 25.0),
            customer(&["Thriller", "SciFi"], 50.0),
            customer(&[], 30.0),
            customer(&["History"], 20.0),
            customer(&["Romance"], 15.0),
            customer(&["SciFi", "Horror"], 80.0),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genre_accepts_string_or_list() {
        let scenario = Scenario::from_json(
            r#"{
                "books": [
                    { "name": "A", "author": "x", "genre": "SciFi", "price": 5, "qty": 1 },
                    { "name": "B", "author": "y", "genre": ["Horror", "Gothic"], "price": 6.5, "qty": 2, "threshold": 1 }
                ],
                "employees": [{}],
                "customers": [{ "prefs": ["SciFi"] }]
            }"#,
        )
        .unwrap();
        assert_eq!(scenario.books[0].genres, vec!["SciFi"]);
        assert_eq!(scenario.books[1].genres, vec!["Horror", "Gothic"]);
        assert_eq!(scenario.books[1].threshold, Some(1));
        assert_eq!(scenario.employees[0].amount, None);
        assert_eq!(scenario.customers[0].budget, None);
    }

    #[test]
    fn test_duplicate_book_rejected() {
        let err = Scenario::from_json(
            r#"{ "books": [
                { "name": "A", "author": "x", "genre": "g", "price": 1, "qty": 1 },
                { "name": "A", "author": "x", "genre": "g", "price": 1, "qty": 1 }
            ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ScenarioError::Invalid(_)));
    }

    #[test]
    fn test_malformed_json_reported() {
        assert!(matches!(
            Scenario::from_json("{ books: "),
            Err(ScenarioError::Json(_))
        ));
    }

    #[test]
    fn test_default_scenario_is_valid() {
        let scenario = default_scenario();
        assert!(scenario.validate().is_ok());
        let json = serde_json::to_string(&scenario).unwrap();
        assert_eq!(Scenario::from_json(&json).unwrap(), scenario);
    }
}
