//! Input record parsing.
//!
//! Song files hold one song document each, log files hold one event per line.
//! Both are projected into warehouse rows here; nothing in this module touches
//! the database.

mod jsonl;
mod log;
mod song;

pub use jsonl::{read_json_lines, RecordError};
pub use log::{
    parse_log_file, time_row, timestamp_from_millis, LogBatch, LogEvent, PlayEvent, RawUserId,
    SONG_PLAY_PAGE,
};
pub use song::{parse_song_file, SongRecord};
