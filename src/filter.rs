// Row filter: keep rows whose title was classified relevant and whose
// state is on the allow-list, then tidy the title text for output.

use std::collections::HashSet;

use tracing::info;

use crate::schema::renames::{OCC_TITLE, STATE};
use crate::schema::Table;

/// State allow-list. Empty or unset means any row with a non-null state.
#[derive(Debug, Clone, Default)]
pub struct RowFilter {
    states: Option<HashSet<String>>,
}

impl RowFilter {
    pub fn new<I, S>(states: Option<I>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let states: Option<HashSet<String>> =
            states.map(|s| s.into_iter().map(Into::into).collect());
        Self {
            states: states.filter(|s| !s.is_empty()),
        }
    }

    /// Filter with no state restriction.
    pub fn any_state() -> Self {
        Self::default()
    }

    fn state_passes(&self, state: Option<&str>) -> bool {
        match (&self.states, state) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(allowed), Some(s)) => allowed.contains(s),
        }
    }

    /// Rows with a relevant title and an allowed state. Returns a copy;
    /// `table` is left untouched.
    pub fn filter(&self, table: &Table, relevant_titles: &HashSet<String>) -> Table {
        let titles = table.column_values(OCC_TITLE);
        let states = table.column_values(STATE);

        let filtered = table.select(|i| {
            titles[i].is_some_and(|t| relevant_titles.contains(t)) && self.state_passes(states[i])
        });

        info!(
            rows_in = table.len(),
            rows_out = filtered.len(),
            titles = relevant_titles.len(),
            "Filtered unified table"
        );
        filtered
    }
}

/// Title-case every occupation title and strip literal asterisks.
pub fn standardize_titles(table: &mut Table) {
    table.map_column(OCC_TITLE, |t| title_case(t).replace('*', ""));
}

/// Upper-case the first cased character of each word and lower-case the
/// rest. A word starts after any character that has no case, so digits and
/// apostrophes both start a new word ("o'neil" -> "O'Neil", "2nd" -> "2Nd").
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_cased = false;
    for c in text.chars() {
        let cased = c.is_lowercase() || c.is_uppercase();
        if cased && prev_cased {
            out.extend(c.to_lowercase());
        } else if cased {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        prev_cased = cased;
    }
    out
}
