use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Schema-less document as returned by the document store
pub type RawDocument = serde_json::Value;

/// One support-thread message. Source fields are fixed at load time; the
/// optional trailing fields are derived by later stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub tweet_id: String,
    pub author_id: String,
    pub inbound: bool,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub response_tweet_id: Option<String>,
    pub in_response_to_tweet_id: Option<String>,
    /// Working copy of `text` after normalization
    pub text_clean: Option<String>,
    /// Language tag assigned by the language filter
    pub text_lang: Option<String>,
    /// `created_at` truncated to the day
    pub date_only: Option<NaiveDate>,
}

impl MessageRecord {
    pub fn new(
        tweet_id: impl Into<String>,
        author_id: impl Into<String>,
        inbound: bool,
        text: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            tweet_id: tweet_id.into(),
            author_id: author_id.into(),
            inbound,
            text: text.into(),
            created_at,
            response_tweet_id: None,
            in_response_to_tweet_id: None,
            text_clean: None,
            text_lang: None,
            date_only: None,
        }
    }

    /// Day the message was created on, whether or not `date_only` is populated yet
    pub fn day(&self) -> NaiveDate {
        self.date_only.unwrap_or_else(|| self.created_at.date_naive())
    }
}

/// All inbound messages of one author folded into a single document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub author_id: String,
    pub text: String,
    pub text_clean: String,
    pub date_only_min: NaiveDate,
    pub date_only_max: NaiveDate,
}

/// A loaded snapshot, either shape
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Messages(Vec<MessageRecord>),
    Conversations(Vec<ConversationRecord>),
}

impl Snapshot {
    pub fn len(&self) -> usize {
        match self {
            Snapshot::Messages(rows) => rows.len(),
            Snapshot::Conversations(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
