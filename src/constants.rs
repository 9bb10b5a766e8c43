/// Checkpoint names. These are the stable keys the modeling stage reloads by.
pub const CHECKPOINT_RAW: &str = "customer_tweets";
pub const CHECKPOINT_CLEAN: &str = "tweet_clean";
pub const CHECKPOINT_TWEET_USER: &str = "df_tweet_user";
pub const CHECKPOINT_FIRST_TWEET_USER: &str = "df_first_tweet_user";
pub const CHECKPOINT_CONVO_USER: &str = "df_convo_user";

/// Checkpoints in the order a run writes them
pub const CHECKPOINTS: [&str; 5] = [
    CHECKPOINT_RAW,
    CHECKPOINT_CLEAN,
    CHECKPOINT_TWEET_USER,
    CHECKPOINT_FIRST_TWEET_USER,
    CHECKPOINT_CONVO_USER,
];

pub const CHECKPOINT_EXTENSION: &str = "parquet";
pub const MANIFEST_FILE: &str = "manifest.json";

// Defaults used when the config file leaves a field out
pub const DEFAULT_TARGET_ACCOUNT: &str = "AppleSupport";
pub const DEFAULT_TARGET_LANGUAGE: &str = "eng";
pub const DEFAULT_COLLECTION: &str = "tweets";
pub const DEFAULT_OUTPUT_DIR: &str = "data";
pub const DEFAULT_CONFIG_PATH: &str = "prep.toml";

/// Timestamp layout of `created_at` in the source dataset, e.g. `Tue Oct 31 22:10:47 +0000 2017`
pub const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Returns true when `name` is one of the checkpoints a run produces
pub fn is_known_checkpoint(name: &str) -> bool {
    CHECKPOINTS.contains(&name)
}
