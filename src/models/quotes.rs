use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{constants::ALL_CATEGORIES, error::QuoteError};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Quote {
    pub text: String,
    pub category: String,
}

impl Quote {
    pub fn new(text: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: category.into(),
        }
    }

    /// builds a quote from user input, rejecting blank fields.
    pub fn validated(text: &str, category: &str) -> Result<Self, QuoteError> {
        let text = text.trim();
        let category = category.trim();

        if text.is_empty() {
            return Err(QuoteError::Validation { field: "quote" });
        }

        if category.is_empty() {
            return Err(QuoteError::Validation { field: "category" });
        }

        Ok(Self::new(text, category))
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" - {}", self.text, self.category)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    pub fn matches(&self, quote: &Quote) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => quote.category == *category,
        }
    }
}

impl From<String> for CategoryFilter {
    fn from(value: String) -> Self {
        if value == ALL_CATEGORIES {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(value)
        }
    }
}

impl From<&str> for CategoryFilter {
    fn from(value: &str) -> Self {
        CategoryFilter::from(value.to_string())
    }
}

impl From<CategoryFilter> for String {
    fn from(value: CategoryFilter) -> Self {
        match value {
            CategoryFilter::All => ALL_CATEGORIES.to_string(),
            CategoryFilter::Only(category) => category,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("all categories"),
            CategoryFilter::Only(category) => f.write_str(category),
        }
    }
}

/// what an import does with the quotes already in the store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, poise::ChoiceParameter)]
pub enum ImportMode {
    #[default]
    #[name = "append"]
    Append,
    #[name = "replace"]
    Replace,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validated_rejects_blank_fields() {
        assert!(matches!(
            Quote::validated("   ", "Life"),
            Err(QuoteError::Validation { field: "quote" })
        ));
        assert!(matches!(
            Quote::validated("carpe diem", ""),
            Err(QuoteError::Validation { field: "category" })
        ));
    }

    #[test]
    fn validated_trims_input() {
        let quote = Quote::validated("  carpe diem ", " Latin ").unwrap();
        assert_eq!(quote, Quote::new("carpe diem", "Latin"));
    }

    #[test]
    fn all_sentinel_parses_to_all() {
        assert_eq!(CategoryFilter::from("all"), CategoryFilter::All);
        assert_eq!(
            CategoryFilter::from("All"),
            CategoryFilter::Only("All".to_string())
        );
    }

    #[test]
    fn filter_serializes_as_plain_string() {
        let json = serde_json::to_string(&CategoryFilter::Only("Life".into())).unwrap();
        assert_eq!(json, "\"Life\"");

        let filter: CategoryFilter = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(filter, CategoryFilter::All);
    }
}
