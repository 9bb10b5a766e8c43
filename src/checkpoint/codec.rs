use chrono::{DateTime, Datelike, NaiveDate, Utc};
use parquet::basic::{Compression, ZstdLevel};
use parquet::data_type::{BoolType, ByteArray, ByteArrayType, Int32Type, Int64Type};
use parquet::file::properties::WriterProperties;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::file::writer::{SerializedColumnWriter, SerializedFileWriter};
use parquet::record::{Field, Row};
use parquet::schema::parser::parse_message_type;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use crate::error::{PrepError, Result};
use crate::types::{ConversationRecord, MessageRecord, Snapshot};

const MESSAGE_SCHEMA: &str = "
message message_record {
    REQUIRED BYTE_ARRAY tweet_id (UTF8);
    REQUIRED BYTE_ARRAY author_id (UTF8);
    REQUIRED BOOLEAN inbound;
    REQUIRED BYTE_ARRAY text (UTF8);
    REQUIRED INT64 created_at (TIMESTAMP_MILLIS);
    OPTIONAL BYTE_ARRAY response_tweet_id (UTF8);
    OPTIONAL BYTE_ARRAY in_response_to_tweet_id (UTF8);
    OPTIONAL BYTE_ARRAY text_clean (UTF8);
    OPTIONAL BYTE_ARRAY text_lang (UTF8);
    OPTIONAL INT32 date_only (DATE);
}
";

const CONVERSATION_SCHEMA: &str = "
message conversation_record {
    REQUIRED BYTE_ARRAY author_id (UTF8);
    REQUIRED BYTE_ARRAY text (UTF8);
    REQUIRED BYTE_ARRAY text_clean (UTF8);
    REQUIRED INT32 date_only_min (DATE);
    REQUIRED INT32 date_only_max (DATE);
}
";

pub const MESSAGE_COLUMNS: [&str; 10] = [
    "tweet_id",
    "author_id",
    "inbound",
    "text",
    "created_at",
    "response_tweet_id",
    "in_response_to_tweet_id",
    "text_clean",
    "text_lang",
    "date_only",
];

pub const CONVERSATION_COLUMNS: [&str; 5] = [
    "author_id",
    "text",
    "text_clean",
    "date_only_min",
    "date_only_max",
];

/// Days between 0001-01-01 and 1970-01-01; parquet DATE counts from the epoch
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// One column's values, in row order
enum Column {
    Text(Vec<String>),
    OptionalText(Vec<Option<String>>),
    Bool(Vec<bool>),
    TimestampMillis(Vec<i64>),
    Date(Vec<i32>),
    OptionalDate(Vec<Option<i32>>),
}

fn date_to_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

fn days_to_date(days: i32) -> Result<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
        .ok_or_else(|| PrepError::checkpoint(format!("date {} days from epoch is out of range", days)))
}

fn def_levels<T>(values: &[Option<T>]) -> Vec<i16> {
    values.iter().map(|v| i16::from(v.is_some())).collect()
}

fn byte_arrays(values: impl IntoIterator<Item = String>) -> Vec<ByteArray> {
    values
        .into_iter()
        .map(|s| ByteArray::from(s.into_bytes()))
        .collect()
}

fn write_column(column: Column, writer: &mut SerializedColumnWriter<'_>) -> Result<()> {
    match column {
        Column::Text(values) => {
            writer
                .typed::<ByteArrayType>()
                .write_batch(&byte_arrays(values), None, None)?;
        }
        Column::OptionalText(values) => {
            let defs = def_levels(&values);
            let present = byte_arrays(values.into_iter().flatten());
            writer
                .typed::<ByteArrayType>()
                .write_batch(&present, Some(&defs), None)?;
        }
        Column::Bool(values) => {
            writer.typed::<BoolType>().write_batch(&values, None, None)?;
        }
        Column::TimestampMillis(values) => {
            writer.typed::<Int64Type>().write_batch(&values, None, None)?;
        }
        Column::Date(values) => {
            writer.typed::<Int32Type>().write_batch(&values, None, None)?;
        }
        Column::OptionalDate(values) => {
            let defs = def_levels(&values);
            let present: Vec<i32> = values.into_iter().flatten().collect();
            writer
                .typed::<Int32Type>()
                .write_batch(&present, Some(&defs), None)?;
        }
    }
    Ok(())
}

fn message_columns(rows: &[MessageRecord]) -> Vec<Column> {
    vec![
        Column::Text(rows.iter().map(|r| r.tweet_id.clone()).collect()),
        Column::Text(rows.iter().map(|r| r.author_id.clone()).collect()),
        Column::Bool(rows.iter().map(|r| r.inbound).collect()),
        Column::Text(rows.iter().map(|r| r.text.clone()).collect()),
        Column::TimestampMillis(rows.iter().map(|r| r.created_at.timestamp_millis()).collect()),
        Column::OptionalText(rows.iter().map(|r| r.response_tweet_id.clone()).collect()),
        Column::OptionalText(rows.iter().map(|r| r.in_response_to_tweet_id.clone()).collect()),
        Column::OptionalText(rows.iter().map(|r| r.text_clean.clone()).collect()),
        Column::OptionalText(rows.iter().map(|r| r.text_lang.clone()).collect()),
        Column::OptionalDate(rows.iter().map(|r| r.date_only.map(date_to_days)).collect()),
    ]
}

fn conversation_columns(rows: &[ConversationRecord]) -> Vec<Column> {
    vec![
        Column::Text(rows.iter().map(|r| r.author_id.clone()).collect()),
        Column::Text(rows.iter().map(|r| r.text.clone()).collect()),
        Column::Text(rows.iter().map(|r| r.text_clean.clone()).collect()),
        Column::Date(rows.iter().map(|r| date_to_days(r.date_only_min)).collect()),
        Column::Date(rows.iter().map(|r| date_to_days(r.date_only_max)).collect()),
    ]
}

/// Write `columns` as a single ZSTD-compressed row group
fn write_file(path: &Path, schema: &str, columns: Vec<Column>) -> Result<()> {
    let schema = Arc::new(parse_message_type(schema)?);
    let props = Arc::new(
        WriterProperties::builder()
            .set_compression(Compression::ZSTD(ZstdLevel::try_new(3)?))
            .build(),
    );

    let file = File::create(path)?;
    let mut writer = SerializedFileWriter::new(file, schema, props)?;
    let mut row_group = writer.next_row_group()?;
    let mut columns = columns.into_iter();
    while let Some(mut col_writer) = row_group.next_column()? {
        let column = columns
            .next()
            .ok_or_else(|| PrepError::checkpoint("schema has more columns than the snapshot"))?;
        write_column(column, &mut col_writer)?;
        col_writer.close()?;
    }
    row_group.close()?;
    writer.close()?;
    Ok(())
}

pub fn write_messages(path: &Path, rows: &[MessageRecord]) -> Result<()> {
    write_file(path, MESSAGE_SCHEMA, message_columns(rows))
}

pub fn write_conversations(path: &Path, rows: &[ConversationRecord]) -> Result<()> {
    write_file(path, CONVERSATION_SCHEMA, conversation_columns(rows))
}

fn unexpected(column: &str, field: &Field) -> PrepError {
    PrepError::checkpoint(format!("unexpected value for column '{}': {:?}", column, field))
}

fn missing(column: &str) -> PrepError {
    PrepError::checkpoint(format!("required column '{}' is missing", column))
}

fn message_from_row(row: &Row) -> Result<MessageRecord> {
    let mut tweet_id = None;
    let mut author_id = None;
    let mut inbound = None;
    let mut text = None;
    let mut created_at = None;
    let mut response_tweet_id = None;
    let mut in_response_to_tweet_id = None;
    let mut text_clean = None;
    let mut text_lang = None;
    let mut date_only = None;

    for (name, field) in row.get_column_iter() {
        match (name.as_str(), field) {
            (_, Field::Null) => {}
            ("tweet_id", Field::Str(s)) => tweet_id = Some(s.clone()),
            ("author_id", Field::Str(s)) => author_id = Some(s.clone()),
            ("inbound", Field::Bool(b)) => inbound = Some(*b),
            ("text", Field::Str(s)) => text = Some(s.clone()),
            ("created_at", Field::TimestampMillis(ms)) => {
                created_at = Some(
                    DateTime::<Utc>::from_timestamp_millis(*ms)
                        .ok_or_else(|| unexpected(name, field))?,
                )
            }
            ("response_tweet_id", Field::Str(s)) => response_tweet_id = Some(s.clone()),
            ("in_response_to_tweet_id", Field::Str(s)) => in_response_to_tweet_id = Some(s.clone()),
            ("text_clean", Field::Str(s)) => text_clean = Some(s.clone()),
            ("text_lang", Field::Str(s)) => text_lang = Some(s.clone()),
            ("date_only", Field::Date(d)) => date_only = Some(days_to_date(*d)?),
            (other, field) => return Err(unexpected(other, field)),
        }
    }

    Ok(MessageRecord {
        tweet_id: tweet_id.ok_or_else(|| missing("tweet_id"))?,
        author_id: author_id.ok_or_else(|| missing("author_id"))?,
        inbound: inbound.ok_or_else(|| missing("inbound"))?,
        text: text.ok_or_else(|| missing("text"))?,
        created_at: created_at.ok_or_else(|| missing("created_at"))?,
        response_tweet_id,
        in_response_to_tweet_id,
        text_clean,
        text_lang,
        date_only,
    })
}

fn conversation_from_row(row: &Row) -> Result<ConversationRecord> {
    let mut author_id = None;
    let mut text = None;
    let mut text_clean = None;
    let mut date_only_min = None;
    let mut date_only_max = None;

    for (name, field) in row.get_column_iter() {
        match (name.as_str(), field) {
            ("author_id", Field::Str(s)) => author_id = Some(s.clone()),
            ("text", Field::Str(s)) => text = Some(s.clone()),
            ("text_clean", Field::Str(s)) => text_clean = Some(s.clone()),
            ("date_only_min", Field::Date(d)) => date_only_min = Some(days_to_date(*d)?),
            ("date_only_max", Field::Date(d)) => date_only_max = Some(days_to_date(*d)?),
            (other, field) => return Err(unexpected(other, field)),
        }
    }

    Ok(ConversationRecord {
        author_id: author_id.ok_or_else(|| missing("author_id"))?,
        text: text.ok_or_else(|| missing("text"))?,
        text_clean: text_clean.ok_or_else(|| missing("text_clean"))?,
        date_only_min: date_only_min.ok_or_else(|| missing("date_only_min"))?,
        date_only_max: date_only_max.ok_or_else(|| missing("date_only_max"))?,
    })
}

/// Column names of a checkpoint file, in schema order
pub fn read_columns(path: &Path) -> Result<Vec<String>> {
    let reader = SerializedFileReader::new(File::open(path)?)?;
    let columns = reader
        .metadata()
        .file_metadata()
        .schema()
        .get_fields()
        .iter()
        .map(|f| f.name().to_string())
        .collect();
    Ok(columns)
}

/// Load a checkpoint file. The snapshot shape is taken from the file's schema.
pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let reader = SerializedFileReader::new(File::open(path)?)?;
    let is_conversation = reader
        .metadata()
        .file_metadata()
        .schema()
        .get_fields()
        .iter()
        .any(|f| f.name() == "date_only_min");

    let rows = reader.get_row_iter(None)?;
    if is_conversation {
        let mut out = Vec::new();
        for row in rows {
            out.push(conversation_from_row(&row?)?);
        }
        Ok(Snapshot::Conversations(out))
    } else {
        let mut out = Vec::new();
        for row in rows {
            out.push(message_from_row(&row?)?);
        }
        Ok(Snapshot::Messages(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn messages() -> Vec<MessageRecord> {
        let ts = Utc.with_ymd_and_hms(2017, 10, 31, 22, 10, 47).unwrap()
            + chrono::Duration::milliseconds(250);
        let mut full = MessageRecord::new("119237", "115712", true, "@AppleSupport help 😡", ts);
        full.response_tweet_id = Some("119236,119238".to_string());
        full.in_response_to_tweet_id = Some("119235".to_string());
        full.text_clean = Some("applesupport help".to_string());
        full.text_lang = Some("eng".to_string());
        full.date_only = Some(ts.date_naive());

        let bare = MessageRecord::new("119238", "AppleSupport", false, "", ts);
        vec![full, bare]
    }

    #[test]
    fn test_message_snapshot_round_trips_values_and_nulls() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tweet_clean.parquet");
        let rows = messages();

        write_messages(&path, &rows).unwrap();
        match read_snapshot(&path).unwrap() {
            Snapshot::Messages(loaded) => assert_eq!(loaded, rows),
            other => panic!("expected messages, got {:?}", other),
        }
        assert_eq!(read_columns(&path).unwrap(), MESSAGE_COLUMNS);
    }

    #[test]
    fn test_conversation_snapshot_round_trips_dates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("df_convo_user.parquet");
        let rows = vec![ConversationRecord {
            author_id: "115712".to_string(),
            text: "first second".to_string(),
            text_clean: "first second".to_string(),
            date_only_min: NaiveDate::from_ymd_opt(1969, 12, 31).unwrap(),
            date_only_max: NaiveDate::from_ymd_opt(2017, 11, 2).unwrap(),
        }];

        write_conversations(&path, &rows).unwrap();
        assert_eq!(read_snapshot(&path).unwrap(), Snapshot::Conversations(rows));
        assert_eq!(read_columns(&path).unwrap(), CONVERSATION_COLUMNS);
    }

    #[test]
    fn test_empty_snapshot_keeps_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.parquet");
        write_messages(&path, &[]).unwrap();
        assert!(read_snapshot(&path).unwrap().is_empty());
        assert_eq!(read_columns(&path).unwrap().len(), MESSAGE_COLUMNS.len());
    }

    #[test]
    fn test_epoch_day_conversion() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(date_to_days(epoch), 0);
        assert_eq!(days_to_date(17_470).unwrap(), NaiveDate::from_ymd_opt(2017, 10, 31).unwrap());
    }
}
