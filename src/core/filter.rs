//! List parameters: tri-state active filter, sort direction, pagination

use serde::{Deserialize, Serialize};

/// Default page size for list operations
pub const DEFAULT_LIMIT: u64 = 100;

/// Tri-state filter on the active flag
///
/// This is deliberately not a boolean: `All` returns active and inactive
/// records together, which a plain flag cannot express.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveFilter {
    /// Only records whose active flag is true
    #[default]
    Active,
    /// Only records whose active flag is false
    Inactive,
    /// No filtering on the active flag
    All,
}

impl ActiveFilter {
    /// Map an optional flag: `Some(true)` → Active, `Some(false)` → Inactive,
    /// `None` → All
    pub fn from_flag(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => ActiveFilter::Active,
            Some(false) => ActiveFilter::Inactive,
            None => ActiveFilter::All,
        }
    }

    /// The flag value to match, `None` when unfiltered
    pub fn flag(&self) -> Option<bool> {
        match self {
            ActiveFilter::Active => Some(true),
            ActiveFilter::Inactive => Some(false),
            ActiveFilter::All => None,
        }
    }

    /// Whether a record with the given flag passes the filter
    pub fn admits(&self, is_active: bool) -> bool {
        self.flag().map_or(true, |wanted| wanted == is_active)
    }
}

impl std::fmt::Display for ActiveFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActiveFilter::Active => write!(f, "active"),
            ActiveFilter::Inactive => write!(f, "inactive"),
            ActiveFilter::All => write!(f, "all"),
        }
    }
}

impl std::str::FromStr for ActiveFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" | "true" => Ok(ActiveFilter::Active),
            "inactive" | "archived" | "false" => Ok(ActiveFilter::Inactive),
            "all" | "any" => Ok(ActiveFilter::All),
            _ => Err(format!(
                "Invalid status filter: {}. Use active, inactive, or all",
                s
            )),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Lenient parse: `"desc"` in any case is descending, anything else
    /// (including nothing) is ascending
    pub fn parse(order: Option<&str>) -> Self {
        match order {
            Some(o) if o.trim().eq_ignore_ascii_case("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Parameters of a list call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub skip: u64,
    pub limit: u64,
    pub active: ActiveFilter,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub direction: SortDirection,
    /// Reject unresolvable sort keys instead of falling back
    pub strict_sort: bool,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIMIT,
            active: ActiveFilter::Active,
            search: None,
            sort_by: None,
            direction: SortDirection::Asc,
            strict_sort: false,
        }
    }
}

impl ListParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn active(mut self, active: ActiveFilter) -> Self {
        self.active = active;
        self
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn sort_by(mut self, key: impl Into<String>) -> Self {
        self.sort_by = Some(key.into());
        self
    }

    /// Set the direction from a raw order string (see [`SortDirection::parse`])
    pub fn order(mut self, order: &str) -> Self {
        self.direction = SortDirection::parse(Some(order));
        self
    }

    pub fn direction(mut self, direction: SortDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn strict_sort(mut self, strict: bool) -> Self {
        self.strict_sort = strict;
        self
    }

    /// Search text with surrounding whitespace removed, `None` when blank
    pub fn search_text(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
