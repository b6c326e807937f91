use super::jsonl::{nullable, read_json_lines, RecordError};
use crate::warehouse::{TimeRow, UserRow};
use chrono::{DateTime, Datelike, NaiveDateTime, Timelike};
use serde::Deserialize;
use std::path::Path;

/// `page` value of the events that represent a song being played.
pub const SONG_PLAY_PAGE: &str = "NextSong";

/// The logs carry user ids as strings, some producers write plain numbers.
#[derive(Clone, Deserialize, Debug, PartialEq)]
#[serde(untagged)]
pub enum RawUserId {
    Number(i64),
    Text(String),
}

impl RawUserId {
    pub fn parse(&self) -> Result<i64, RecordError> {
        match self {
            RawUserId::Number(id) => Ok(*id),
            RawUserId::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| RecordError::InvalidUserId(text.clone())),
        }
    }
}

/// One line of an application event log.
#[derive(Clone, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    #[serde(deserialize_with = "nullable")]
    pub page: Option<String>,
    pub ts: i64,
    #[serde(deserialize_with = "nullable")]
    pub user_id: Option<RawUserId>,
    #[serde(deserialize_with = "nullable")]
    pub first_name: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub last_name: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub gender: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub level: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub song: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub artist: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub length: Option<f64>,
    pub session_id: i64,
    #[serde(deserialize_with = "nullable")]
    pub location: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub user_agent: Option<String>,
}

impl LogEvent {
    pub fn is_song_play(&self) -> bool {
        self.page.as_deref() == Some(SONG_PLAY_PAGE)
    }
}

/// A song-play event with its timestamp and user id resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayEvent {
    pub start_time: NaiveDateTime,
    pub user_id: i64,
    pub level: Option<String>,
    pub song: Option<String>,
    pub artist: Option<String>,
    pub length: Option<f64>,
    pub session_id: i64,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

/// Everything one log file contributes to the warehouse.
///
/// The three vectors are index-aligned and have the same length.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LogBatch {
    pub events: Vec<PlayEvent>,
    pub time_rows: Vec<TimeRow>,
    pub user_rows: Vec<UserRow>,
}

impl LogBatch {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Convert epoch milliseconds into a UTC calendar timestamp.
pub fn timestamp_from_millis(ts: i64) -> Result<NaiveDateTime, RecordError> {
    DateTime::from_timestamp_millis(ts)
        .map(|dt| dt.naive_utc())
        .ok_or(RecordError::InvalidTimestamp(ts))
}

pub fn time_row(start_time: NaiveDateTime) -> TimeRow {
    TimeRow {
        start_time,
        hour: start_time.hour(),
        day: start_time.day(),
        week: start_time.iso_week().week(),
        month: start_time.month(),
        year: start_time.year(),
        weekday: start_time.weekday().num_days_from_monday(),
    }
}

/// Read a log file, keep the song-play events and derive time and user rows.
///
/// User rows are not deduplicated here.
pub fn parse_log_file(path: &Path) -> Result<LogBatch, RecordError> {
    let records: Vec<LogEvent> = read_json_lines(path)?;
    let mut batch = LogBatch::default();

    for record in records.into_iter().filter(LogEvent::is_song_play) {
        let start_time = timestamp_from_millis(record.ts)?;
        let user_id = match &record.user_id {
            Some(raw) => raw.parse()?,
            None => return Err(RecordError::InvalidUserId("null".to_string())),
        };

        batch.time_rows.push(time_row(start_time));
        batch.user_rows.push(UserRow {
            user_id,
            first_name: record.first_name,
            last_name: record.last_name,
            gender: record.gender,
            level: record.level.clone(),
        });
        batch.events.push(PlayEvent {
            start_time,
            user_id,
            level: record.level,
            song: record.song,
            artist: record.artist,
            length: record.length,
            session_id: record.session_id,
            location: record.location,
            user_agent: record.user_agent,
        });
    }

    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;

    const NEXT_SONG: &str = r#"{"artist":"Sydney Youngblood","auth":"Logged In","firstName":"Jacob","gender":"M","itemInSession":53,"lastName":"Klein","length":238.07955,"level":"paid","location":"Tampa-St. Petersburg-Clearwater, FL","method":"PUT","page":"NextSong","registration":1540558108796.0,"sessionId":954,"song":"Ain't No Sunshine","status":200,"ts":1543449657796,"userAgent":"\"Mozilla\/5.0 (Macintosh; Intel Mac OS X 10_9_4)\"","userId":"73"}"#;
    const HOME: &str = r#"{"artist":null,"auth":"Logged In","firstName":"Walter","gender":"M","itemInSession":0,"lastName":"Frye","length":null,"level":"free","location":"San Francisco-Oakland-Hayward, CA","method":"GET","page":"Home","registration":1540919166796.0,"sessionId":38,"song":null,"status":200,"ts":1541105830796,"userAgent":"Mozilla\/5.0","userId":"39"}"#;
    const LOGGED_OUT: &str = r#"{"artist":null,"auth":"Logged Out","firstName":null,"gender":null,"itemInSession":0,"lastName":null,"length":null,"level":"free","location":null,"method":"PUT","page":"Login","registration":null,"sessionId":52,"song":null,"status":307,"ts":1541207073796,"userAgent":null,"userId":""}"#;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn keeps_only_song_plays() {
        let content = [NEXT_SONG, HOME, LOGGED_OUT, NEXT_SONG, HOME].join("\n");
        let file = write_temp(&content);
        let batch = parse_log_file(file.path()).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.time_rows.len(), 2);
        assert_eq!(batch.user_rows.len(), 2);
        // Duplicated users are kept at this stage
        assert_eq!(batch.user_rows[0], batch.user_rows[1]);
    }

    #[test]
    fn projects_event_fields() {
        let file = write_temp(NEXT_SONG);
        let batch = parse_log_file(file.path()).unwrap();
        let event = &batch.events[0];

        assert_eq!(event.user_id, 73);
        assert_eq!(event.level.as_deref(), Some("paid"));
        assert_eq!(event.song.as_deref(), Some("Ain't No Sunshine"));
        assert_eq!(event.artist.as_deref(), Some("Sydney Youngblood"));
        assert_eq!(event.length, Some(238.07955));
        assert_eq!(event.session_id, 954);
        assert_eq!(
            batch.user_rows[0],
            UserRow {
                user_id: 73,
                first_name: Some("Jacob".to_string()),
                last_name: Some("Klein".to_string()),
                gender: Some("M".to_string()),
                level: Some("paid".to_string()),
            }
        );
    }

    #[test]
    fn derives_calendar_fields() {
        // 2018-11-29 00:00:57.796 UTC, a Thursday in ISO week 48
        let file = write_temp(NEXT_SONG);
        let batch = parse_log_file(file.path()).unwrap();

        assert_eq!(
            batch.time_rows[0],
            TimeRow {
                start_time: NaiveDate::from_ymd_opt(2018, 11, 29)
                    .unwrap()
                    .and_hms_milli_opt(0, 0, 57, 796)
                    .unwrap(),
                hour: 0,
                day: 29,
                week: 48,
                month: 11,
                year: 2018,
                weekday: 3,
            }
        );
        assert_eq!(batch.events[0].start_time, batch.time_rows[0].start_time);
    }

    #[test]
    fn iso_week_crosses_year_boundary() {
        // 2018-12-31 belongs to ISO week 1 of 2019
        let row = time_row(timestamp_from_millis(1546214400000).unwrap());
        assert_eq!((row.year, row.month, row.day), (2018, 12, 31));
        assert_eq!(row.week, 1);
        assert_eq!(row.weekday, 0);

        // 2021-01-01 belongs to ISO week 53 of 2020
        let row = time_row(timestamp_from_millis(1609459200000).unwrap());
        assert_eq!(row.week, 53);
        assert_eq!(row.weekday, 4);
    }

    #[test]
    fn numeric_user_id_is_accepted() {
        let file = write_temp(&NEXT_SONG.replace(r#""userId":"73""#, r#""userId":73"#));
        let batch = parse_log_file(file.path()).unwrap();
        assert_eq!(batch.events[0].user_id, 73);
    }

    #[test]
    fn empty_user_id_on_song_play_is_an_error() {
        let file = write_temp(&NEXT_SONG.replace(r#""userId":"73""#, r#""userId":"""#));
        assert!(matches!(
            parse_log_file(file.path()),
            Err(RecordError::InvalidUserId(_))
        ));
    }

    #[test]
    fn file_without_song_plays_is_empty() {
        let file = write_temp(&[HOME, LOGGED_OUT].join("\n"));
        let batch = parse_log_file(file.path()).unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn missing_key_aborts() {
        let file = write_temp(&NEXT_SONG.replace(r#""sessionId":954,"#, ""));
        assert!(matches!(
            parse_log_file(file.path()),
            Err(RecordError::Malformed { .. })
        ));
    }
}
