//! SQLite-backed warehouse store.
//!
//! `SqliteWarehouse` owns the single connection used for a whole ETL run.
//! All writes happen through a `FileTransaction`, one per input file.

use super::models::*;
use super::schema::latest_schema;
use super::trait_def::Warehouse;
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, Transaction};
use std::path::Path;
use tracing::{debug, info};

const COUNTED_TABLES: [&str; 5] = ["songplays", "users", "songs", "artists", "time"];

/// Session over the warehouse database, scoped to one run.
pub struct SqliteWarehouse {
    conn: Connection,
}

fn prepare_schema(conn: &mut Connection) -> Result<()> {
    let schema = latest_schema();
    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;

    let table_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |r| r.get(0),
    )?;

    if table_count == 0 {
        info!("Creating warehouse db schema at version {}", schema.version);
        let tx = conn.transaction()?;
        schema.create(&tx)?;
        tx.commit()?;
        return Ok(());
    }

    let expected_version = (BASE_DB_VERSION + schema.version) as i64;
    if db_version != expected_version {
        bail!(
            "Unknown warehouse database version {}, expected {}",
            db_version,
            expected_version
        );
    }

    schema
        .validate(conn)
        .context("Warehouse schema validation failed")
}

impl SqliteWarehouse {
    /// Open the warehouse at `db_path`, creating the file and schema if needed.
    ///
    /// An existing database must carry the current schema version and tables.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        let conn = Connection::open_with_flags(
            db_path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open warehouse database {}", db_path.display()))?;

        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        prepare_schema(&mut conn)?;
        let warehouse = SqliteWarehouse { conn };

        let counts = warehouse.counts()?;
        info!(
            "Opened warehouse: {} songplays, {} users, {} songs, {} artists, {} time rows",
            counts.songplays, counts.users, counts.songs, counts.artists, counts.time
        );
        Ok(warehouse)
    }

    /// Drop every warehouse table and create them again, empty.
    pub fn reset(&mut self) -> Result<()> {
        let schema = latest_schema();
        info!("Dropping and recreating {} warehouse tables", schema.tables.len());
        let tx = self.conn.transaction()?;
        schema.drop(&tx)?;
        schema.create(&tx)?;
        tx.commit()?;
        Ok(())
    }

    /// Start the unit of work for one input file.
    ///
    /// Nothing is persisted until `FileTransaction::commit`; dropping the
    /// transaction rolls it back.
    pub fn begin_file(&mut self) -> Result<FileTransaction<'_>> {
        let tx = self
            .conn
            .transaction()
            .context("Failed to begin file transaction")?;
        Ok(FileTransaction { tx })
    }

    pub fn counts(&self) -> Result<TableCounts> {
        let mut counts = [0usize; COUNTED_TABLES.len()];
        for (count, table) in counts.iter_mut().zip(COUNTED_TABLES) {
            let rows: i64 = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
                .with_context(|| format!("Failed to count rows of {}", table))?;
            *count = rows as usize;
        }
        let [songplays, users, songs, artists, time] = counts;
        Ok(TableCounts {
            songplays,
            users,
            songs,
            artists,
            time,
        })
    }
}

/// Writes for a single input file, committed or rolled back as a whole.
pub struct FileTransaction<'conn> {
    tx: Transaction<'conn>,
}

impl FileTransaction<'_> {
    pub fn commit(self) -> Result<()> {
        self.tx.commit().context("Failed to commit file transaction")
    }

    fn exists(&self, sql: &str, id: &dyn rusqlite::ToSql) -> Result<bool> {
        let exists: bool = self.tx.prepare_cached(sql)?.query_row(params![id], |r| r.get(0))?;
        Ok(exists)
    }
}

impl Warehouse for FileTransaction<'_> {
    fn insert_song_if_absent(&self, song: &SongRow) -> Result<bool> {
        if self.exists(
            "SELECT EXISTS(SELECT 1 FROM songs WHERE song_id = ?1)",
            &song.song_id,
        )? {
            debug!("Song {:?} already exists, skipping", song.song_id);
            return Ok(false);
        }

        self.tx
            .prepare_cached(
                "INSERT INTO songs (song_id, title, artist_id, year, duration) VALUES (?1, ?2, ?3, ?4, ?5)",
            )?
            .execute(params![
                &song.song_id,
                &song.title,
                &song.artist_id,
                &song.year,
                &song.duration
            ])
            .with_context(|| format!("Failed to insert song {:?}", song.song_id))?;
        Ok(true)
    }

    fn insert_artist_if_absent(&self, artist: &ArtistRow) -> Result<bool> {
        if self.exists(
            "SELECT EXISTS(SELECT 1 FROM artists WHERE artist_id = ?1)",
            &artist.artist_id,
        )? {
            debug!("Artist {:?} already exists, skipping", artist.artist_id);
            return Ok(false);
        }

        self.tx
            .prepare_cached(
                "INSERT INTO artists (artist_id, name, location, latitude, longitude) VALUES (?1, ?2, ?3, ?4, ?5)",
            )?
            .execute(params![
                &artist.artist_id,
                &artist.name,
                &artist.location,
                &artist.latitude,
                &artist.longitude
            ])
            .with_context(|| format!("Failed to insert artist {:?}", artist.artist_id))?;
        Ok(true)
    }

    fn insert_user_if_absent(&self, user: &UserRow) -> Result<bool> {
        if self.exists(
            "SELECT EXISTS(SELECT 1 FROM users WHERE user_id = ?1)",
            &user.user_id,
        )? {
            return Ok(false);
        }

        self.tx
            .prepare_cached(
                "INSERT INTO users (user_id, first_name, last_name, gender, level) VALUES (?1, ?2, ?3, ?4, ?5)",
            )?
            .execute(params![
                user.user_id,
                &user.first_name,
                &user.last_name,
                &user.gender,
                &user.level
            ])
            .with_context(|| format!("Failed to insert user {}", user.user_id))?;
        Ok(true)
    }

    fn insert_time(&self, time: &TimeRow) -> Result<()> {
        self.tx
            .prepare_cached(
                "INSERT INTO time (start_time, hour, day, week, month, year, weekday) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?
            .execute(params![
                to_db_timestamp(&time.start_time),
                time.hour,
                time.day,
                time.week,
                time.month,
                time.year,
                time.weekday
            ])?;
        Ok(())
    }

    fn find_song(
        &self,
        title: &str,
        artist_name: &str,
        duration: f64,
    ) -> Result<Option<SongMatch>> {
        let mut stmt = self.tx.prepare_cached(
            "SELECT s.song_id, s.artist_id FROM songs s
             JOIN artists a ON s.artist_id = a.artist_id
             WHERE s.title = ?1 AND a.name = ?2 AND s.duration = ?3
             LIMIT 1",
        )?;

        match stmt.query_row(params![title, artist_name, duration], |row| {
            Ok(SongMatch {
                song_id: row.get(0)?,
                artist_id: row.get(1)?,
            })
        }) {
            Ok(found) => Ok(Some(found)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn insert_songplay(&self, songplay: &SongplayRow) -> Result<()> {
        self.tx
            .prepare_cached(
                "INSERT INTO songplays (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?
            .execute(params![
                to_db_timestamp(&songplay.start_time),
                songplay.user_id,
                &songplay.level,
                &songplay.song_id,
                &songplay.artist_id,
                songplay.session_id,
                &songplay.location,
                &songplay.user_agent
            ])
            .with_context(|| {
                format!(
                    "Failed to insert songplay for user {} session {}",
                    songplay.user_id, songplay.session_id
                )
            })?;
        Ok(())
    }
}
