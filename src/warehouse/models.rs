//! Row models for the star schema.
//!
//! Rows are what the record parsers produce and what the store binds into
//! INSERT statements. Dimension rows coming from song files carry `Filled`
//! cells, which remember how a null source value was replaced.

use chrono::NaiveDateTime;
use rusqlite::types::{ToSql, ToSqlOutput};

/// Text layout used for every timestamp column.
pub const DB_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

pub fn to_db_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(DB_TIMESTAMP_FORMAT).to_string()
}

// =============================================================================
// Filled cells
// =============================================================================

/// A column value whose null source was replaced by a fill value.
///
/// Song projections fill with the empty string, artist projections fill with
/// zero. An empty string bound to a numeric column is stored as text.
#[derive(Clone, Debug, PartialEq)]
pub enum Filled<T> {
    Value(T),
    EmptyString,
    Zero,
}

impl<T> Filled<T> {
    pub fn or_empty_string(value: Option<T>) -> Self {
        match value {
            Some(v) => Filled::Value(v),
            None => Filled::EmptyString,
        }
    }

    pub fn or_zero(value: Option<T>) -> Self {
        match value {
            Some(v) => Filled::Value(v),
            None => Filled::Zero,
        }
    }
}

impl<T: ToSql> ToSql for Filled<T> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Filled::Value(v) => v.to_sql(),
            Filled::EmptyString => Ok(ToSqlOutput::from("")),
            Filled::Zero => Ok(ToSqlOutput::from(0i64)),
        }
    }
}

// =============================================================================
// Dimension rows
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct SongRow {
    pub song_id: Filled<String>,
    pub title: Filled<String>,
    pub artist_id: Filled<String>,
    pub year: Filled<i64>,
    pub duration: Filled<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArtistRow {
    pub artist_id: Filled<String>,
    pub name: Filled<String>,
    pub location: Filled<String>,
    pub latitude: Filled<f64>,
    pub longitude: Filled<f64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserRow {
    pub user_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: Option<String>,
}

/// Calendar attributes of one play event. Weekday counts from Monday = 0.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeRow {
    pub start_time: NaiveDateTime,
    pub hour: u32,
    pub day: u32,
    pub week: u32,
    pub month: u32,
    pub year: i32,
    pub weekday: u32,
}

// =============================================================================
// Fact rows
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct SongplayRow {
    pub start_time: NaiveDateTime,
    pub user_id: i64,
    pub level: Option<String>,
    pub song_id: Option<String>,
    pub artist_id: Option<String>,
    pub session_id: i64,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

/// Song and artist ids resolved for a play event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SongMatch {
    pub song_id: String,
    pub artist_id: String,
}

/// Row counts of every warehouse table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub songplays: usize,
    pub users: usize,
    pub songs: usize,
    pub artists: usize,
    pub time: usize,
}
