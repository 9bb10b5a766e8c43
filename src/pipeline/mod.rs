//! Corpus preparation: load, filter, normalize, language-filter, aggregate.
//!
//! Each stage produces a complete new row set before the next one starts.
//! Checkpoints are written at the stage boundaries the modeling step reloads
//! from.

pub mod aggregate;
pub mod filter;
pub mod language;
pub mod loader;
pub mod normalize;

use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::checkpoint::{CheckpointEntry, CheckpointStore, Manifest};
use crate::config::PrepConfig;
use crate::constants::{
    CHECKPOINT_CLEAN, CHECKPOINT_CONVO_USER, CHECKPOINT_FIRST_TWEET_USER, CHECKPOINT_RAW,
    CHECKPOINT_TWEET_USER,
};
use crate::error::Result;
use crate::metrics::{self, MetricName, StageTimer};
use crate::store::DocumentStore;
use crate::types::MessageRecord;

pub use filter::{FilterReport, ThreadFilter};
pub use language::{LanguageDetector, LanguageReport, WhatlangDetector};
pub use loader::LoadReport;
pub use normalize::{Lexicon, NormalizeReport, Normalizer};

/// Summary of a complete run
#[derive(Debug, Serialize)]
pub struct PipelineResult {
    pub run_id: Uuid,
    pub collection: String,
    pub load: LoadReport,
    pub filter: FilterReport,
    pub normalize: NormalizeReport,
    pub language: LanguageReport,
    pub tweet_user_rows: usize,
    pub first_tweet_user_rows: usize,
    pub convo_user_rows: usize,
    pub checkpoints: Vec<CheckpointEntry>,
    pub manifest_path: PathBuf,
}

/// Copy each row's creation day into `date_only`
pub fn stamp_dates(rows: &mut [MessageRecord]) {
    for row in rows.iter_mut() {
        row.date_only = Some(row.created_at.date_naive());
    }
}

pub struct Pipeline<'a> {
    config: &'a PrepConfig,
    lexicon: Lexicon,
    detector: Box<dyn LanguageDetector>,
}

impl<'a> Pipeline<'a> {
    /// Load every lexical resource up front. Fails before any store access or
    /// checkpoint write when a resource is missing or malformed.
    pub fn new(config: &'a PrepConfig, detector: Box<dyn LanguageDetector>) -> Result<Self> {
        let lexicon = Lexicon::load(&config.resources)?;
        Ok(Self::with_lexicon(config, lexicon, detector))
    }

    pub fn with_lexicon(
        config: &'a PrepConfig,
        lexicon: Lexicon,
        detector: Box<dyn LanguageDetector>,
    ) -> Self {
        Self {
            config,
            lexicon,
            detector,
        }
    }

    #[instrument(skip_all, fields(account = %self.config.target.account, collection = %self.config.store.collection))]
    pub async fn run(&self, store: &dyn DocumentStore) -> Result<PipelineResult> {
        let target = &self.config.target;
        let collection = self.config.store.collection.as_str();
        let manifest = Manifest::new(&target.account, &target.language);
        let run_id = manifest.run_id;
        info!(%run_id, "Starting preparation run");

        // Load
        let documents = {
            let _timer = StageTimer::start("fetch");
            store.fetch_all(collection).await?
        };
        metrics::increment(MetricName::DocumentsFetched, documents.len());
        info!("Fetched {} documents from '{}'", documents.len(), collection);

        let (rows, load) = {
            let _timer = StageTimer::start("load");
            loader::load_messages(&documents)
        };
        drop(documents);
        metrics::increment(MetricName::RowsLoaded, load.loaded);
        metrics::increment(MetricName::DocumentsSkipped, load.skipped.len());
        metrics::increment(MetricName::RowsTextCoerced, load.text_coerced);
        if !load.skipped.is_empty() {
            warn!("Skipped {} documents that could not become messages", load.skipped.len());
        }
        info!(loaded = load.loaded, coerced = load.text_coerced, "Loaded message rows");

        let mut checkpoints = CheckpointStore::create(&self.config.output.dir, manifest)?;
        checkpoints.write_messages(CHECKPOINT_RAW, &rows)?;

        // Filter
        let (mut rows, filter) = {
            let _timer = StageTimer::start("filter");
            ThreadFilter::new(&target.account).apply(rows)
        };
        metrics::increment(MetricName::RowsKeptByThreadFilter, filter.kept);
        metrics::increment(MetricName::RowsDroppedUnrelated, filter.dropped_unrelated);
        metrics::increment(MetricName::RowsDroppedMisdirected, filter.dropped_misdirected);
        info!(
            kept = filter.kept,
            unrelated = filter.dropped_unrelated,
            misdirected = filter.dropped_misdirected,
            "Filtered to the support thread"
        );

        // Normalize
        stamp_dates(&mut rows);
        let (rows, normalize) = {
            let _timer = StageTimer::start("normalize");
            Normalizer::new(&self.lexicon).normalize_rows(rows)
        };
        metrics::increment(MetricName::RowsNormalized, normalize.rows);
        metrics::increment(MetricName::RowsDefaulted, normalize.defaulted_rows());
        info!(
            rows = normalize.rows,
            defaulted = normalize.defaulted_rows(),
            "Normalized text"
        );

        // Language
        let (rows, language) = {
            let _timer = StageTimer::start("language");
            language::filter_language(rows, self.detector.as_ref(), &target.language)
        };
        metrics::increment(
            MetricName::RowsDroppedLanguage,
            language.dropped_other + language.dropped_undetected,
        );
        info!(
            kept = language.kept,
            other = language.dropped_other,
            undetected = language.dropped_undetected,
            "Kept '{}' rows",
            target.language
        );
        checkpoints.write_messages(CHECKPOINT_CLEAN, &rows)?;

        // Aggregate
        let (tweet_user, first_tweet_user, convo_user) = {
            let _timer = StageTimer::start("aggregate");
            (
                aggregate::tweet_user_view(&rows),
                aggregate::first_tweet_user_view(&rows),
                aggregate::convo_user_view(&rows),
            )
        };
        metrics::view_rows(CHECKPOINT_TWEET_USER, tweet_user.len());
        metrics::view_rows(CHECKPOINT_FIRST_TWEET_USER, first_tweet_user.len());
        metrics::view_rows(CHECKPOINT_CONVO_USER, convo_user.len());
        info!(
            tweet_user = tweet_user.len(),
            first_tweet_user = first_tweet_user.len(),
            convo_user = convo_user.len(),
            "Built modeling views"
        );

        checkpoints.write_messages(CHECKPOINT_TWEET_USER, &tweet_user)?;
        checkpoints.write_messages(CHECKPOINT_FIRST_TWEET_USER, &first_tweet_user)?;
        checkpoints.write_conversations(CHECKPOINT_CONVO_USER, &convo_user)?;
        let manifest_path = checkpoints.finish()?;

        let written = checkpoints
            .manifest()
            .map(|m| m.checkpoints.clone())
            .unwrap_or_default();
        info!(%run_id, checkpoints = written.len(), "Preparation run finished");

        Ok(PipelineResult {
            run_id,
            collection: collection.to_string(),
            load,
            filter,
            normalize,
            language,
            tweet_user_rows: tweet_user.len(),
            first_tweet_user_rows: first_tweet_user.len(),
            convo_user_rows: convo_user.len(),
            checkpoints: written,
            manifest_path,
        })
    }
}
