//! Dataset fixtures written into a temporary directory.

#![allow(dead_code)]

use rusqlite::Connection;
use sparkify_etl::{EtlConfig, SqliteWarehouse};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory holding `song_data/`, `log_data/` and the database.
pub struct TestDataset {
    pub dir: TempDir,
}

impl TestDataset {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("song_data")).unwrap();
        fs::create_dir_all(dir.path().join("log_data")).unwrap();
        TestDataset { dir }
    }

    pub fn song_data(&self) -> PathBuf {
        self.dir.path().join("song_data")
    }

    pub fn log_data(&self) -> PathBuf {
        self.dir.path().join("log_data")
    }

    pub fn db_path(&self) -> PathBuf {
        self.dir.path().join("sparkify.db")
    }

    pub fn config(&self) -> EtlConfig {
        EtlConfig {
            database: self.db_path(),
            song_data: self.song_data(),
            log_data: self.log_data(),
            reset: false,
        }
    }

    pub fn write_song(&self, relative: &str, content: &str) {
        write_file(&self.song_data().join(relative), content);
    }

    pub fn write_log(&self, relative: &str, lines: &[String]) {
        write_file(&self.log_data().join(relative), &lines.join("\n"));
    }

    pub fn open_warehouse(&self) -> SqliteWarehouse {
        SqliteWarehouse::open(self.db_path()).unwrap()
    }

    /// Plain connection for asserting on stored rows.
    pub fn connect(&self) -> Connection {
        Connection::open(self.db_path()).unwrap()
    }
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

pub fn song_json(song_id: &str, title: &str, artist_id: &str, artist_name: &str, duration: f64) -> String {
    format!(
        r#"{{"num_songs": 1, "song_id": "{song_id}", "title": "{title}", "artist_id": "{artist_id}", "artist_name": "{artist_name}", "year": 2000, "duration": {duration}, "artist_location": "", "artist_latitude": 0, "artist_longitude": 0}}"#
    )
}

/// A `NextSong` event line.
pub fn play_json(
    user_id: &str,
    level: &str,
    song: &str,
    artist: &str,
    length: f64,
    ts: i64,
) -> String {
    format!(
        r#"{{"artist": "{artist}", "auth": "Logged In", "firstName": "Kate", "gender": "F", "itemInSession": 4, "lastName": "Harrell", "length": {length}, "level": "{level}", "location": "Lansing-East Lansing, MI", "method": "PUT", "page": "NextSong", "registration": 1540472624796.0, "sessionId": 293, "song": "{song}", "status": 200, "ts": {ts}, "userAgent": "Mozilla/5.0 (X11; Linux x86_64)", "userId": "{user_id}"}}"#
    )
}

/// A non song-play event line.
pub fn page_json(page: &str, user_id: &str, ts: i64) -> String {
    format!(
        r#"{{"artist": null, "auth": "Logged In", "firstName": "Kate", "gender": "F", "itemInSession": 0, "lastName": "Harrell", "length": null, "level": "paid", "location": "Lansing-East Lansing, MI", "method": "GET", "page": "{page}", "registration": 1540472624796.0, "sessionId": 293, "song": null, "status": 200, "ts": {ts}, "userAgent": "Mozilla/5.0 (X11; Linux x86_64)", "userId": "{user_id}"}}"#
    )
}

pub fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
        .unwrap()
}
