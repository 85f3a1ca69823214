//! Saved query to table matching
//!
//! A query matches a table when its SQL contains the table name as a whole
//! word, ignoring case. This is a lexical heuristic, not SQL analysis:
//! - `orders` matches `FROM orders`, `sales.orders` and `"Orders"`
//! - `orders` does not match `backorders` or `orders_2024`
//! - a name made only of non-word characters has no word boundary to anchor
//!   on and in practice matches nothing

use gluekb_core::{HarvestError, MatchedQuery, SavedQuery};
use regex::Regex;

/// Whole-word, case-insensitive matcher for one table name
#[derive(Debug, Clone)]
pub struct QueryMatcher {
    table: String,

    /// `None` for an empty table name, which matches nothing
    pattern: Option<Regex>,
}

impl QueryMatcher {
    /// Build a matcher for `table`, escaping any regex metacharacters in it
    pub fn for_table(table: &str) -> Result<Self, HarvestError> {
        let pattern = if table.is_empty() {
            None
        } else {
            let source = format!(r"(?i)\b{}\b", regex::escape(table));
            let regex = Regex::new(&source).map_err(|e| HarvestError::InvalidPattern {
                table: table.to_string(),
                message: e.to_string(),
            })?;
            Some(regex)
        };

        Ok(Self {
            table: table.to_string(),
            pattern,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Whether `sql` mentions the table at least once
    pub fn is_match(&self, sql: &str) -> bool {
        self.pattern.as_ref().is_some_and(|p| p.is_match(sql))
    }

    /// Queries that mention the table, in input order
    pub fn select<'q>(&self, queries: &'q [SavedQuery]) -> Vec<&'q SavedQuery> {
        queries.iter().filter(|q| self.is_match(&q.sql_text)).collect()
    }

    /// Matching queries in the form embedded in table records
    pub fn matched_queries(&self, queries: &[SavedQuery]) -> Vec<MatchedQuery> {
        self.select(queries).into_iter().map(MatchedQuery::from).collect()
    }
}

/// Saved queries whose SQL mentions `table` as a whole word
pub fn match_queries(table: &str, queries: &[SavedQuery]) -> Result<Vec<SavedQuery>, HarvestError> {
    let matcher = QueryMatcher::for_table(table)?;
    Ok(matcher.select(queries).into_iter().cloned().collect())
}
