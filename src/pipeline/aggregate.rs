//! Reshapes the cleaned corpus into the three modeling views. Every view is
//! built from inbound rows only, and none of them can introduce an author
//! that is not already in its input.

use std::collections::BTreeMap;

use crate::types::{ConversationRecord, MessageRecord};

pub fn inbound_rows(rows: &[MessageRecord]) -> Vec<MessageRecord> {
    rows.iter().filter(|r| r.inbound).cloned().collect()
}

/// Each inbound message as its own document
pub fn tweet_user_view(rows: &[MessageRecord]) -> Vec<MessageRecord> {
    inbound_rows(rows)
}

/// The earliest inbound message of every author, ordered by author id.
///
/// Rows are stable-sorted by creation time then input position, so when two
/// messages share a timestamp the one that came first in the input wins.
pub fn first_tweet_user_view(rows: &[MessageRecord]) -> Vec<MessageRecord> {
    let mut ordered: Vec<(usize, &MessageRecord)> =
        rows.iter().filter(|r| r.inbound).enumerate().collect();
    ordered.sort_by_key(|(idx, row)| (row.created_at, *idx));

    let mut first: BTreeMap<&str, &MessageRecord> = BTreeMap::new();
    for (_, row) in ordered {
        first.entry(row.author_id.as_str()).or_insert(row);
    }
    first.into_values().cloned().collect()
}

struct Conversation<'a> {
    texts: Vec<&'a str>,
    clean_texts: Vec<&'a str>,
    min_day: chrono::NaiveDate,
    max_day: chrono::NaiveDate,
}

/// All inbound messages of an author joined into one document, ordered by
/// author id. Texts keep input order within the author.
pub fn convo_user_view(rows: &[MessageRecord]) -> Vec<ConversationRecord> {
    let mut groups: BTreeMap<&str, Conversation> = BTreeMap::new();

    for row in rows.iter().filter(|r| r.inbound) {
        let day = row.day();
        let clean = row.text_clean.as_deref().unwrap_or_default();
        groups
            .entry(row.author_id.as_str())
            .and_modify(|c| {
                c.texts.push(&row.text);
                c.clean_texts.push(clean);
                c.min_day = c.min_day.min(day);
                c.max_day = c.max_day.max(day);
            })
            .or_insert_with(|| Conversation {
                texts: vec![&row.text],
                clean_texts: vec![clean],
                min_day: day,
                max_day: day,
            });
    }

    groups
        .into_iter()
        .map(|(author_id, c)| ConversationRecord {
            author_id: author_id.to_string(),
            text: c.texts.join(" "),
            text_clean: c.clean_texts.join(" "),
            date_only_min: c.min_day,
            date_only_max: c.max_day,
        })
        .collect()
}
