use serde::{Deserialize, Serialize};

/// Date-key filter of the export listing. Day keys are fixed-width
/// `YYYY-MM-DD`, so string comparison is chronological.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateFilter {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

impl DateFilter {
    pub fn new(search: Option<String>, start: Option<String>, end: Option<String>) -> Self {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        Self {
            search: search.unwrap_or_default(),
            start: non_empty(start),
            end: non_empty(end),
        }
    }

    pub fn has_range(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    pub fn matches(&self, date: &str) -> bool {
        if !date.contains(self.search.as_str()) {
            return false;
        }
        if let Some(start) = &self.start {
            if date < start.as_str() {
                return false;
            }
        }
        if let Some(end) = &self.end {
            if date > end.as_str() {
                return false;
            }
        }
        true
    }

    /// Matching dates, newest first.
    pub fn apply<S: AsRef<str>>(&self, dates: &[S]) -> Vec<String> {
        let mut matched: Vec<String> = dates
            .iter()
            .map(AsRef::as_ref)
            .filter(|date| self.matches(date))
            .map(str::to_string)
            .collect();
        matched.sort_unstable_by(|a, b| b.cmp(a));
        matched
    }
}
