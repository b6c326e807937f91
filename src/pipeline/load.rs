//! Per-file loaders: parse one input file and write its rows.

use super::LoadStats;
use crate::records::{parse_log_file, parse_song_file, PlayEvent};
use crate::warehouse::{SongMatch, SongplayRow, Warehouse};
use anyhow::Result;
use std::path::Path;
use tracing::debug;

/// Load one song file: insert the song and its artist, each only if new.
pub fn load_song_file(
    warehouse: &dyn Warehouse,
    path: &Path,
    stats: &mut LoadStats,
) -> Result<()> {
    let (song, artist) = parse_song_file(path)?;

    if warehouse.insert_song_if_absent(&song)? {
        stats.songs_inserted += 1;
    } else {
        stats.songs_skipped += 1;
    }

    if warehouse.insert_artist_if_absent(&artist)? {
        stats.artists_inserted += 1;
    } else {
        stats.artists_skipped += 1;
    }
    Ok(())
}

/// Load one log file: time rows, new users, then one songplay per event.
pub fn load_log_file(warehouse: &dyn Warehouse, path: &Path, stats: &mut LoadStats) -> Result<()> {
    let batch = parse_log_file(path)?;
    debug!("{}: {} song plays", path.display(), batch.len());

    for time in &batch.time_rows {
        warehouse.insert_time(time)?;
        stats.time_rows += 1;
    }

    for user in &batch.user_rows {
        if warehouse.insert_user_if_absent(user)? {
            stats.users_inserted += 1;
        } else {
            stats.users_skipped += 1;
        }
    }

    for event in &batch.events {
        let song_match = resolve_song(warehouse, event)?;
        if song_match.is_some() {
            stats.songplays_resolved += 1;
        }
        warehouse.insert_songplay(&songplay_row(event, song_match))?;
        stats.songplays += 1;
    }
    Ok(())
}

/// Look up the song and artist ids of a play event.
///
/// Events without song, artist or length cannot match anything.
fn resolve_song(warehouse: &dyn Warehouse, event: &PlayEvent) -> Result<Option<SongMatch>> {
    match (&event.song, &event.artist, event.length) {
        (Some(title), Some(artist_name), Some(length)) => {
            warehouse.find_song(title, artist_name, length)
        }
        _ => Ok(None),
    }
}

fn songplay_row(event: &PlayEvent, song_match: Option<SongMatch>) -> SongplayRow {
    let (song_id, artist_id) = match song_match {
        Some(found) => (Some(found.song_id), Some(found.artist_id)),
        None => (None, None),
    };
    SongplayRow {
        start_time: event.start_time,
        user_id: event.user_id,
        level: event.level.clone(),
        song_id,
        artist_id,
        session_id: event.session_id,
        location: event.location.clone(),
        user_agent: event.user_agent.clone(),
    }
}
