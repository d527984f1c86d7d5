//! Client-side record filtering.

use journal_supabase_gateway::LogRecord;

/// Filter over the cached record list.
///
/// Filtering is presentation-only and never touches the network: the
/// cache holds the latest fetched page and the filter narrows it.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    /// Keep only this kind. `None` keeps every kind.
    pub kind: Option<String>,
    /// Case-insensitive substring match over kind, title, body and tags.
    pub query: String,
}

impl RecordFilter {
    pub fn matches(&self, record: &LogRecord) -> bool {
        if let Some(kind) = &self.kind {
            if &record.kind != kind {
                return false;
            }
        }
        let query = self.query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        let blob = format!(
            "{} {} {} {}",
            record.kind,
            record.title,
            record.body,
            record.tags.join(" ")
        )
        .to_lowercase();
        blob.contains(&query)
    }

    pub fn apply(&self, records: &[LogRecord]) -> Vec<LogRecord> {
        records
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect()
    }
}
