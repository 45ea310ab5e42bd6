//! Search query model and validation.
//!
//! Both front ends hand raw, loosely-typed parameters to [`SearchParams::validate`] and get back
//! either a [`SearchQuery`] that is safe to forward upstream or a [`ValidationError`] whose
//! message can be returned to the caller verbatim.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use std::str::FromStr;

pub const KEYWORD_MIN_CHARS: usize = 2;
pub const KEYWORD_MAX_CHARS: usize = 255;

/// Keyword used when a caller wants "everything" (overview statistics).
pub const DEFAULT_KEYWORD: &str = "補助金";

/// Upstream field to sort results by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    CreatedDate,
    AcceptanceStartDatetime,
    #[default]
    AcceptanceEndDatetime,
}

impl SortField {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreatedDate => "created_date",
            Self::AcceptanceStartDatetime => "acceptance_start_datetime",
            Self::AcceptanceEndDatetime => "acceptance_end_datetime",
        }
    }
}

impl FromStr for SortField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created_date" => Ok(Self::CreatedDate),
            "acceptance_start_datetime" => Ok(Self::AcceptanceStartDatetime),
            "acceptance_end_datetime" => Ok(Self::AcceptanceEndDatetime),
            _ => Err(ValidationError::new(
                "sort must be one of created_date / acceptance_start_datetime / acceptance_end_datetime",
            )),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = ValidationError;

    /// Case-insensitive: `desc` and `DESC` are the same order.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(Self::Asc),
            "DESC" => Ok(Self::Desc),
            _ => Err(ValidationError::new("order must be ASC or DESC")),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether to restrict results to subsidies currently accepting applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Acceptance {
    /// `0`: every subsidy, open or not.
    All,
    /// `1`: only subsidies currently accepting applications.
    #[default]
    Open,
}

impl Acceptance {
    /// # Errors
    ///
    /// Returns an error unless `flag` is `0` or `1`.
    pub fn from_flag(flag: i64) -> Result<Self, ValidationError> {
        match flag {
            0 => Ok(Self::All),
            1 => Ok(Self::Open),
            _ => Err(Self::invalid()),
        }
    }

    #[must_use]
    pub fn flag(self) -> u8 {
        match self {
            Self::All => 0,
            Self::Open => 1,
        }
    }

    fn invalid() -> ValidationError {
        ValidationError::new("acceptance must be 0 or 1")
    }
}

impl FromStr for Acceptance {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let flag: i64 = s.trim().parse().map_err(|_| Self::invalid())?;
        Self::from_flag(flag)
    }
}

/// A validated search request, ready to be sent upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    keyword: String,
    pub use_purpose: Option<String>,
    pub industry: Option<String>,
    pub target_number_of_employees: Option<String>,
    pub target_area_search: Option<String>,
    pub sort: SortField,
    pub order: SortOrder,
    pub acceptance: Acceptance,
}

impl SearchQuery {
    /// Build a query with default sorting and acceptance.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed keyword is not 2 to 255 characters long.
    pub fn new(keyword: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            keyword: validate_keyword(keyword)?,
            use_purpose: None,
            industry: None,
            target_number_of_employees: None,
            target_area_search: None,
            sort: SortField::default(),
            order: SortOrder::default(),
            acceptance: Acceptance::default(),
        })
    }

    /// The broad query used to compute overview statistics.
    #[must_use]
    pub fn broad() -> Self {
        Self {
            keyword: DEFAULT_KEYWORD.to_string(),
            use_purpose: None,
            industry: None,
            target_number_of_employees: None,
            target_area_search: None,
            sort: SortField::default(),
            order: SortOrder::default(),
            acceptance: Acceptance::default(),
        }
    }

    #[must_use]
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Query string pairs for the upstream `/subsidies` endpoint.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("keyword", self.keyword.clone()),
            ("sort", self.sort.as_str().to_string()),
            ("order", self.order.as_str().to_string()),
            ("acceptance", self.acceptance.flag().to_string()),
        ];
        let filters = [
            ("use_purpose", &self.use_purpose),
            ("industry", &self.industry),
            ("target_number_of_employees", &self.target_number_of_employees),
            ("target_area_search", &self.target_area_search),
        ];
        for (name, value) in filters {
            if let Some(v) = value {
                pairs.push((name, v.clone()));
            }
        }
        pairs
    }

    /// Echo of the effective conditions, returned alongside search results.
    #[must_use]
    pub fn conditions(&self) -> Value {
        json!({
            "keyword": self.keyword,
            "use_purpose": self.use_purpose,
            "industry": self.industry,
            "target_number_of_employees": self.target_number_of_employees,
            "target_area_search": self.target_area_search,
            "sort": self.sort.as_str(),
            "order": self.order.as_str(),
            "acceptance": self.acceptance.flag(),
        })
    }
}

/// Raw search parameters as received from a front end.
///
/// Every field is optional and stringly-typed so that malformed input (e.g. `acceptance=abc`)
/// surfaces as a [`ValidationError`] instead of a framework-level rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub use_purpose: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub target_number_of_employees: Option<String>,
    #[serde(default)]
    pub target_area_search: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default)]
    pub acceptance: Option<String>,
}

impl SearchParams {
    /// Validate in a fixed order (keyword, acceptance, sort, order) and fail on the first problem.
    ///
    /// # Errors
    ///
    /// Returns the first constraint violation found.
    pub fn validate(self) -> Result<SearchQuery, ValidationError> {
        let mut query = SearchQuery::new(self.keyword.as_deref().unwrap_or_default())?;

        if let Some(acceptance) = non_blank(self.acceptance) {
            query.acceptance = acceptance.parse()?;
        }
        if let Some(sort) = non_blank(self.sort) {
            query.sort = sort.parse()?;
        }
        if let Some(order) = non_blank(self.order) {
            query.order = order.parse()?;
        }

        query.use_purpose = non_blank(self.use_purpose);
        query.industry = non_blank(self.industry);
        query.target_number_of_employees = non_blank(self.target_number_of_employees);
        query.target_area_search = non_blank(self.target_area_search);
        Ok(query)
    }
}

fn validate_keyword(keyword: &str) -> Result<String, ValidationError> {
    let trimmed = keyword.trim();
    let len = trimmed.chars().count();
    if !(KEYWORD_MIN_CHARS..=KEYWORD_MAX_CHARS).contains(&len) {
        return Err(ValidationError::new(format!(
            "keyword must be a non-empty string of {KEYWORD_MIN_CHARS} to {KEYWORD_MAX_CHARS} characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
