use anyhow::Result;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use support_prep::checkpoint::CheckpointStore;
use support_prep::config::{PrepConfig, ResourceConfig};
use support_prep::constants::{
    CHECKPOINTS, CHECKPOINT_CLEAN, CHECKPOINT_CONVO_USER, CHECKPOINT_FIRST_TWEET_USER,
    CHECKPOINT_RAW, CHECKPOINT_TWEET_USER,
};
use support_prep::pipeline::{LanguageDetector, Lexicon, Normalizer, Pipeline};
use support_prep::store::{DocumentStore, InMemoryDocumentStore, NdjsonDocumentStore};
use support_prep::types::Snapshot;
use support_prep::PrepError;
use tempfile::tempdir;

/// Tags anything mentioning "hola" as Spanish and everything else non-empty as English
struct KeywordDetector;

impl LanguageDetector for KeywordDetector {
    fn detect(&self, text: &str) -> Option<String> {
        if text.trim().is_empty() {
            None
        } else if text.contains("hola") {
            Some("spa".to_string())
        } else {
            Some("eng".to_string())
        }
    }
}

fn documents() -> Vec<Value> {
    vec![
        json!({
            "tweet_id": "1", "author_id": "115712", "inbound": true,
            "created_at": "Tue Oct 31 22:10:47 +0000 2017",
            "text": "@AppleSupport my phone battery dies fast!!!",
            "response_tweet_id": "2", "in_response_to_tweet_id": null
        }),
        json!({
            "tweet_id": 2, "author_id": "AppleSupport", "inbound": false,
            "created_at": "Tue Oct 31 22:15:00 +0000 2017",
            "text": "@115712 We can help. Which version are you on?",
            "in_response_to_tweet_id": "1"
        }),
        json!({
            "tweet_id": 3, "author_id": "115712", "inbound": "True",
            "created_at": "Wed Nov 01 08:00:00 +0000 2017",
            "text": "@applesupport still broken after update 11.1 https://t.co/abc"
        }),
        json!({
            "tweet_id": "4", "author_id": "sprintcare", "inbound": false,
            "created_at": "Tue Oct 31 21:00:00 +0000 2017",
            "text": "@115713 happy to help"
        }),
        json!({
            "tweet_id": "5", "author_id": "impostor", "inbound": false,
            "created_at": "Tue Oct 31 21:30:00 +0000 2017",
            "text": "@AppleSupport totally the real support team"
        }),
        json!({
            "tweet_id": "6", "author_id": "220000", "inbound": true,
            "created_at": "Mon Oct 30 10:00:00 +0000 2017",
            "text": "@AppleSupport hola"
        }),
        json!({
            "tweet_id": "7", "author_id": "330000", "inbound": true,
            "created_at": "Sun Oct 29 12:00:00 +0000 2017",
            "text": "@AppleSupport screen cracked ASAP help"
        }),
        json!({ "author_id": "999", "text": "@AppleSupport no id here" }),
    ]
}

fn write_resources(dir: &Path) -> Result<()> {
    fs::write(
        dir.join("chat_words.txt"),
        "ASAP=as soon as possible\nBRB=be right back\n",
    )?;
    fs::write(
        dir.join("dictionary.txt"),
        "phone=50\nbattery=40\ndie=30\nfast=20\nhelp=20\nversion=10\nstill=10\nbroken=10\n\
         update=10\nscreen=10\ncracked=10\nsoon=10\npossible=10\nhola=5\napplesupport=5\n",
    )?;
    Ok(())
}

fn config(root: &Path, output: &Path) -> Result<PrepConfig> {
    let toml = format!(
        r#"
        [store]
        kind = "ndjson"
        path = '{root}'
        collection = "tweets"

        [target]
        account = "AppleSupport"
        language = "eng"

        [resources]
        chat_words = '{root}/chat_words.txt'
        dictionary = '{root}/dictionary.txt'

        [output]
        dir = '{output}'
        "#,
        root = root.display(),
        output = output.display(),
    );
    Ok(PrepConfig::from_toml_str(&toml)?)
}

#[tokio::test]
async fn test_full_run_writes_all_checkpoints() -> Result<()> {
    let temp_dir = tempdir()?;
    let output = temp_dir.path().join("data");
    write_resources(temp_dir.path())?;
    let config = config(temp_dir.path(), &output)?;

    let store = InMemoryDocumentStore::new().with_collection("tweets", documents());
    let pipeline = Pipeline::new(&config, Box::new(KeywordDetector))?;
    let result = pipeline.run(&store).await?;

    assert_eq!(result.load.documents, 8);
    assert_eq!(result.load.loaded, 7);
    assert_eq!(result.load.skipped.len(), 1);
    assert_eq!(result.filter.kept, 5);
    assert_eq!(result.filter.dropped_unrelated, 1);
    assert_eq!(result.filter.dropped_misdirected, 1);
    assert_eq!(result.language.kept, 4);
    assert_eq!(result.language.dropped_other, 1);
    assert_eq!(result.tweet_user_rows, 3);
    assert_eq!(result.first_tweet_user_rows, 2);
    assert_eq!(result.convo_user_rows, 2);
    assert_eq!(result.checkpoints.len(), CHECKPOINTS.len());

    let reader = CheckpointStore::open(&output)?;
    for name in CHECKPOINTS {
        assert!(reader.path_for(name).exists(), "{} missing", name);
    }

    match reader.read(CHECKPOINT_RAW)? {
        Snapshot::Messages(rows) => {
            assert_eq!(rows.len(), 7);
            assert!(rows.iter().all(|r| r.text_clean.is_none() && r.date_only.is_none()));
        }
        other => panic!("unexpected snapshot {:?}", other),
    }

    match reader.read(CHECKPOINT_CLEAN)? {
        Snapshot::Messages(rows) => {
            assert_eq!(rows.len(), 4);
            // only the account itself speaks outbound
            assert!(rows.iter().all(|r| r.inbound || r.author_id == "AppleSupport"));
            assert!(rows.iter().all(|r| r.text_lang.as_deref() == Some("eng")));
            assert!(rows.iter().all(|r| r.date_only.is_some()));

            let first = rows.iter().find(|r| r.tweet_id == "1").unwrap();
            assert_eq!(first.text_clean.as_deref(), Some("applesupport phone battery die fast"));
            assert_eq!(first.response_tweet_id.as_deref(), Some("2"));
        }
        other => panic!("unexpected snapshot {:?}", other),
    }

    match reader.read(CHECKPOINT_FIRST_TWEET_USER)? {
        Snapshot::Messages(rows) => {
            let ids: Vec<(&str, &str)> = rows
                .iter()
                .map(|r| (r.author_id.as_str(), r.tweet_id.as_str()))
                .collect();
            assert_eq!(ids, vec![("115712", "1"), ("330000", "7")]);
        }
        other => panic!("unexpected snapshot {:?}", other),
    }

    match reader.read(CHECKPOINT_CONVO_USER)? {
        Snapshot::Conversations(rows) => {
            assert_eq!(rows.len(), 2);
            let convo = &rows[0];
            assert_eq!(convo.author_id, "115712");
            assert!(convo.text.starts_with("@AppleSupport my phone"));
            assert!(convo.text.contains("still broken"));
            assert_eq!(convo.date_only_min.to_string(), "2017-10-31");
            assert_eq!(convo.date_only_max.to_string(), "2017-11-01");
            for row in &rows {
                assert!(row.date_only_min <= row.date_only_max);
            }
        }
        other => panic!("unexpected snapshot {:?}", other),
    }

    assert_eq!(reader.read(CHECKPOINT_TWEET_USER)?.len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_missing_resource_fails_before_any_output() -> Result<()> {
    let temp_dir = tempdir()?;
    let output = temp_dir.path().join("data");
    // no resource files written
    let config = config(temp_dir.path(), &output)?;

    let result = Pipeline::new(&config, Box::new(KeywordDetector));
    assert!(matches!(result, Err(PrepError::Resource { .. })));
    assert!(!output.exists());
    Ok(())
}

#[tokio::test]
async fn test_run_from_ndjson_export() -> Result<()> {
    let temp_dir = tempdir()?;
    let output = temp_dir.path().join("data");
    write_resources(temp_dir.path())?;
    let lines: Vec<String> = documents().iter().map(|d| d.to_string()).collect();
    fs::write(temp_dir.path().join("tweets.ndjson"), lines.join("\n"))?;
    let config = config(temp_dir.path(), &output)?;

    let store = NdjsonDocumentStore::open(temp_dir.path())?;
    assert_eq!(store.list_collections().await?, vec!["tweets".to_string()]);

    let pipeline = Pipeline::new(&config, Box::new(KeywordDetector))?;
    let result = pipeline.run(&store).await?;
    assert_eq!(result.language.kept, 4);
    assert!(result.manifest_path.exists());
    Ok(())
}

#[test]
fn test_shipped_dictionary_leaves_everyday_words_alone() -> Result<()> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("resources");
    let resources = ResourceConfig {
        chat_words: root.join("chat_words_str.txt"),
        dictionary: root.join("dictionary.txt"),
        lemma_exceptions: Some(root.join("lemma_exceptions.txt")),
    };
    let lexicon = Lexicon::load(&resources)?;

    for word in [
        "frozen",
        "camera",
        "crashing",
        "restarting",
        "charger",
        "refund",
        "headphones",
        "keeps",
        "because",
        "answer",
    ] {
        assert_eq!(
            lexicon.dictionary.correction(word).as_deref(),
            Some(word),
            "'{}' was rewritten",
            word
        );
    }

    let normalizer = Normalizer::new(&lexicon);
    let out = normalizer
        .normalize_text("@AppleSupport my screen is frozen and the camera app keeps crashing");
    assert_eq!(out.text, "applesupport screen frozen camera app keep crashing");
    Ok(())
}
