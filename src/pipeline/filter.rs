use serde::Serialize;

use crate::types::MessageRecord;

/// Keeps the conversation thread of one support account.
#[derive(Debug, Clone)]
pub struct ThreadFilter {
    account: String,
    mention: String,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct FilterReport {
    pub input: usize,
    pub kept: usize,
    /// Neither authored by nor mentioning the account
    pub dropped_unrelated: usize,
    /// Flagged outbound but authored by someone else
    pub dropped_misdirected: usize,
}

impl ThreadFilter {
    pub fn new(account: &str) -> Self {
        Self {
            account: account.to_string(),
            mention: format!("@{}", account.to_lowercase()),
        }
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    /// Authored by the account, or mentions it anywhere in the body
    pub fn in_thread(&self, row: &MessageRecord) -> bool {
        row.author_id == self.account || row.text.to_lowercase().contains(&self.mention)
    }

    /// Outbound rows must come from the account itself
    pub fn is_misdirected(&self, row: &MessageRecord) -> bool {
        !row.inbound && row.author_id != self.account
    }

    pub fn apply(&self, rows: Vec<MessageRecord>) -> (Vec<MessageRecord>, FilterReport) {
        let mut report = FilterReport {
            input: rows.len(),
            ..Default::default()
        };

        let kept: Vec<MessageRecord> = rows
            .into_iter()
            .filter(|row| {
                if !self.in_thread(row) {
                    report.dropped_unrelated += 1;
                    false
                } else if self.is_misdirected(row) {
                    report.dropped_misdirected += 1;
                    false
                } else {
                    true
                }
            })
            .collect();

        report.kept = kept.len();
        (kept, report)
    }
}
