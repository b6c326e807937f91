use super::jsonl::{nullable, read_json_lines, RecordError};
use crate::warehouse::{ArtistRow, Filled, SongRow};
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

/// One song metadata document.
///
/// Every key is required; values may be `null`.
#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct SongRecord {
    #[serde(deserialize_with = "nullable")]
    pub song_id: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub title: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub artist_id: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub year: Option<i64>,
    #[serde(deserialize_with = "nullable")]
    pub duration: Option<f64>,
    #[serde(deserialize_with = "nullable")]
    pub artist_name: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub artist_location: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub artist_latitude: Option<f64>,
    #[serde(deserialize_with = "nullable")]
    pub artist_longitude: Option<f64>,
}

impl SongRecord {
    /// Song projection, nulls replaced by the empty string.
    pub fn song_row(&self) -> SongRow {
        SongRow {
            song_id: Filled::or_empty_string(self.song_id.clone()),
            title: Filled::or_empty_string(self.title.clone()),
            artist_id: Filled::or_empty_string(self.artist_id.clone()),
            year: Filled::or_empty_string(self.year),
            duration: Filled::or_empty_string(self.duration),
        }
    }

    /// Artist projection, nulls replaced by zero.
    pub fn artist_row(&self) -> ArtistRow {
        ArtistRow {
            artist_id: Filled::or_zero(self.artist_id.clone()),
            name: Filled::or_zero(self.artist_name.clone()),
            location: Filled::or_zero(self.artist_location.clone()),
            latitude: Filled::or_zero(self.artist_latitude),
            longitude: Filled::or_zero(self.artist_longitude),
        }
    }
}

/// Read a song file and project its record into a song row and an artist row.
///
/// Only the first record of the file is used.
pub fn parse_song_file(path: &Path) -> Result<(SongRow, ArtistRow), RecordError> {
    let records: Vec<SongRecord> = read_json_lines(path)?;
    let record = match records.first() {
        Some(record) => record,
        None => return Err(RecordError::Empty(path.to_path_buf())),
    };
    if records.len() > 1 {
        warn!(
            "{} holds {} song records, only the first one is loaded",
            path.display(),
            records.len()
        );
    }
    Ok((record.song_row(), record.artist_row()))
}
