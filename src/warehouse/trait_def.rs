//! Warehouse trait definition.
//!
//! The loaders only talk to this trait, so they do not care whether they
//! write through a per-file transaction or something else.

use super::models::{ArtistRow, SongMatch, SongRow, SongplayRow, TimeRow, UserRow};
use anyhow::Result;

/// Write and lookup operations needed to load one input file.
///
/// The `*_if_absent` methods check for an existing row and insert only when
/// none is found. This is check-then-act, not an atomic upsert: it is correct
/// only with a single writer, which is how the ETL runs. Existing rows are
/// never updated.
pub trait Warehouse {
    /// Insert a song unless one with the same `song_id` exists.
    /// Returns whether a row was inserted.
    fn insert_song_if_absent(&self, song: &SongRow) -> Result<bool>;

    /// Insert an artist unless one with the same `artist_id` exists.
    /// Returns whether a row was inserted.
    fn insert_artist_if_absent(&self, artist: &ArtistRow) -> Result<bool>;

    /// Insert a user unless one with the same `user_id` exists.
    /// Returns whether a row was inserted.
    fn insert_user_if_absent(&self, user: &UserRow) -> Result<bool>;

    /// Insert a calendar row unconditionally.
    fn insert_time(&self, time: &TimeRow) -> Result<()>;

    /// Find the song and artist ids for an exact (title, artist name, duration) match.
    fn find_song(&self, title: &str, artist_name: &str, duration: f64)
        -> Result<Option<SongMatch>>;

    /// Insert a songplay fact row unconditionally.
    fn insert_songplay(&self, songplay: &SongplayRow) -> Result<()>;
}
