//! Listing query for dishes: search filter, whitelisted sort field, direction and
//! clamped pagination.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Largest page a listing ever returns.
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported sort field: {0}")]
pub struct UnsupportedSortField(pub String);

/// Columns a listing may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Id,
    Name,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub const ALL: [SortField; 4] = [
        SortField::Id,
        SortField::Name,
        SortField::CreatedAt,
        SortField::UpdatedAt,
    ];

    /// Column name in the `dishes` table.
    pub fn column(self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Name => "name",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for SortField {
    type Err = UnsupportedSortField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortField::ALL
            .into_iter()
            .find(|field| field.column() == s)
            .ok_or_else(|| UnsupportedSortField(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Case-insensitive; anything other than `desc` sorts ascending.
    pub fn parse_lenient(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A validated listing request. `limit` is kept within `[1, MAX_PAGE_SIZE]` and `offset`
/// is never negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DishListQuery {
    search: Option<String>,
    order_by: SortField,
    direction: SortDirection,
    limit: i64,
    offset: i64,
}

impl Default for DishListQuery {
    fn default() -> Self {
        Self::new(
            None,
            SortField::default(),
            SortDirection::default(),
            DEFAULT_PAGE_SIZE,
            0,
        )
    }
}

impl DishListQuery {
    pub fn new(
        search: Option<String>,
        order_by: SortField,
        direction: SortDirection,
        limit: i64,
        offset: i64,
    ) -> Self {
        Self {
            search: search.filter(|s| !s.is_empty()),
            order_by,
            direction,
            limit: limit.clamp(1, MAX_PAGE_SIZE),
            offset: offset.max(0),
        }
    }

    /// Builds a query from loosely typed inputs. Only the sort field can fail.
    pub fn parse(
        search: Option<String>,
        order_by: &str,
        direction: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Self, UnsupportedSortField> {
        let order_by = order_by.parse::<SortField>()?;
        Ok(Self::new(
            search,
            order_by,
            SortDirection::parse_lenient(direction),
            limit,
            offset,
        ))
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn order_by(&self) -> SortField {
        self.order_by
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// `ILIKE` pattern for the search term with `%`, `_` and `\` escaped.
    pub fn search_pattern(&self) -> Option<String> {
        self.search.as_ref().map(|term| {
            let mut pattern = String::with_capacity(term.len() + 2);
            pattern.push('%');
            for c in term.chars() {
                if matches!(c, '%' | '_' | '\\') {
                    pattern.push('\\');
                }
                pattern.push(c);
            }
            pattern.push('%');
            pattern
        })
    }

    /// Case-insensitive substring match, the in-process equivalent of `search_pattern`.
    pub fn matches_name(&self, name: &str) -> bool {
        match &self.search {
            Some(term) => name.to_lowercase().contains(&term.to_lowercase()),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_field_whitelist() {
        for field in SortField::ALL {
            assert_eq!(field.column().parse::<SortField>(), Ok(field));
        }
        assert_eq!(
            "price".parse::<SortField>(),
            Err(UnsupportedSortField("price".to_string()))
        );
        assert!("NAME".parse::<SortField>().is_err());
    }

    #[test]
    fn direction_is_lenient() {
        assert_eq!(SortDirection::parse_lenient("desc"), SortDirection::Desc);
        assert_eq!(SortDirection::parse_lenient("DESC"), SortDirection::Desc);
        assert_eq!(SortDirection::parse_lenient("asc"), SortDirection::Asc);
        assert_eq!(SortDirection::parse_lenient("sideways"), SortDirection::Asc);
    }

    #[test]
    fn limit_and_offset_are_clamped() {
        let q = DishListQuery::parse(None, "id", "asc", 0, -5).unwrap();
        assert_eq!(q.limit(), 1);
        assert_eq!(q.offset(), 0);

        let q = DishListQuery::parse(None, "id", "asc", 500, 7).unwrap();
        assert_eq!(q.limit(), MAX_PAGE_SIZE);
        assert_eq!(q.offset(), 7);
    }

    #[test]
    fn unsupported_sort_field_fails_parse() {
        let err = DishListQuery::parse(None, "price", "asc", 10, 0).unwrap_err();
        assert_eq!(err.to_string(), "unsupported sort field: price");
    }

    #[test]
    fn search_pattern_escapes_wildcards() {
        let q = DishListQuery::new(
            Some("50%_off\\".to_string()),
            SortField::Id,
            SortDirection::Asc,
            10,
            0,
        );
        assert_eq!(q.search_pattern().as_deref(), Some("%50\\%\\_off\\\\%"));
    }

    #[test]
    fn empty_search_means_no_filter() {
        let q = DishListQuery::new(Some(String::new()), SortField::Id, SortDirection::Asc, 10, 0);
        assert_eq!(q.search(), None);
        assert!(q.matches_name("anything"));
    }

    #[test]
    fn matches_name_ignores_case() {
        let q = DishListQuery::new(Some("PiZ".to_string()), SortField::Id, SortDirection::Asc, 10, 0);
        assert!(q.matches_name("pizza"));
        assert!(q.matches_name("Deep dish PIZZA"));
        assert!(!q.matches_name("pasta"));
    }
}
