//! Typed input records and the projections loaded into each table.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::error::EtlError;

/// `page` value of a playback event. Every other page is navigation or auth noise.
pub const PLAY_PAGE: &str = "NextSong";

/// One record of the song dataset.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SongRecord {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub year: i32,
    pub duration: f64,
    pub artist_name: String,
    #[serde(default)]
    pub artist_location: Option<String>,
    #[serde(default)]
    pub artist_latitude: Option<f64>,
    #[serde(default)]
    pub artist_longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub year: i32,
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Artist {
    pub artist_id: String,
    pub name: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl SongRecord {
    pub fn song(&self) -> Song {
        Song {
            song_id: self.song_id.clone(),
            title: self.title.clone(),
            artist_id: self.artist_id.clone(),
            year: self.year,
            duration: self.duration,
        }
    }

    pub fn artist(&self) -> Artist {
        Artist {
            artist_id: self.artist_id.clone(),
            name: self.artist_name.clone(),
            location: self.artist_location.clone(),
            latitude: self.artist_latitude,
            longitude: self.artist_longitude,
        }
    }
}

/// Read the first song record of a file.
///
/// A song file holds one object, or occasionally an array of them. Anything
/// after the first value must still be valid JSON.
pub fn read_song_file(path: &Path) -> Result<SongRecord, EtlError> {
    let text = std::fs::read_to_string(path).map_err(|source| EtlError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let body = text.trim_start();
    if body.is_empty() {
        return Err(EtlError::EmptyFile { path: path.to_path_buf() });
    }

    // Dispatch on the first byte so field errors keep their own message and position.
    let mut de = serde_json::Deserializer::from_str(&text);
    let record = if body.starts_with('[') {
        Vec::<SongRecord>::deserialize(&mut de)
            .map_err(|source| parse_error(path, source))?
            .into_iter()
            .next()
            .ok_or_else(|| EtlError::EmptyFile { path: path.to_path_buf() })?
    } else {
        SongRecord::deserialize(&mut de).map_err(|source| parse_error(path, source))?
    };

    for rest in de.into_iter::<serde_json::Value>() {
        rest.map_err(|source| parse_error(path, source))?;
    }

    Ok(record)
}

/// One line of the activity log.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    pub page: String,
    pub ts: i64,
    #[serde(default, deserialize_with = "deserialize_user_id")]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub song: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub session_id: Option<i64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl LogEvent {
    pub fn is_play(&self) -> bool {
        self.page == PLAY_PAGE
    }

    pub fn user(&self) -> User {
        User {
            user_id: self.user_id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            gender: self.gender.clone(),
            level: self.level.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub user_id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: Option<String>,
}

/// One row of the `songplays` fact table.
#[derive(Debug, Clone, PartialEq)]
pub struct Songplay {
    pub start_time: NaiveDateTime,
    pub user_id: Option<i64>,
    pub level: Option<String>,
    pub song_id: Option<String>,
    pub artist_id: Option<String>,
    pub session_id: Option<i64>,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

impl Songplay {
    /// Build the fact row for a playback event and its resolved (song_id, artist_id).
    pub fn new(event: &LogEvent, start_time: NaiveDateTime, ids: Option<(String, String)>) -> Self {
        let (song_id, artist_id) = match ids {
            Some((song_id, artist_id)) => (Some(song_id), Some(artist_id)),
            None => (None, None),
        };
        Self {
            start_time,
            user_id: event.user_id,
            level: event.level.clone(),
            song_id,
            artist_id,
            session_id: event.session_id,
            location: event.location.clone(),
            user_agent: event.user_agent.clone(),
        }
    }
}

/// Logged-out events carry `"userId": ""`; logged-in ones a number or numeric string.
fn deserialize_user_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Int(id)) => Ok(Some(id)),
        Some(Raw::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                Ok(None)
            } else {
                text.parse().map(Some).map_err(serde::de::Error::custom)
            }
        }
    }
}

/// Lazily yields the events of one log file, in file order.
pub struct EventReader<R: Read> {
    path: PathBuf,
    stream: serde_json::StreamDeserializer<'static, serde_json::de::IoRead<R>, LogEvent>,
}

impl EventReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, EtlError> {
        let file = open(path)?;
        Ok(Self::new(path, BufReader::new(file)))
    }
}

impl<R: Read> EventReader<R> {
    pub fn new(path: &Path, reader: R) -> Self {
        Self {
            path: path.to_path_buf(),
            stream: serde_json::Deserializer::from_reader(reader).into_iter(),
        }
    }
}

impl<R: Read> Iterator for EventReader<R> {
    type Item = Result<LogEvent, EtlError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.stream
            .next()
            .map(|event| event.map_err(|source| parse_error(&self.path, source)))
    }
}

fn open(path: &Path) -> Result<File, EtlError> {
    File::open(path).map_err(|source| EtlError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_error(path: &Path, source: serde_json::Error) -> EtlError {
    if source.is_io() {
        EtlError::Io {
            path: path.to_path_buf(),
            source: source.into(),
        }
    } else {
        EtlError::Parse {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SONG_JSON: &str = r#"{"num_songs": 1, "artist_id": "ARD7TVE1187B99BFB1", "artist_latitude": null, "artist_longitude": null, "artist_location": "California - LA", "artist_name": "Casual", "song_id": "SOMZWCG12A8C13C480", "title": "I Didn't Mean To", "duration": 218.93179, "year": 0}"#;

    #[test]
    fn test_read_song_object() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("song.json");
        std::fs::write(&path, SONG_JSON).unwrap();

        let record = read_song_file(&path).unwrap();
        assert_eq!(record.song_id, "SOMZWCG12A8C13C480");
        assert_eq!(record.artist_location.as_deref(), Some("California - LA"));
        assert_eq!(record.artist_latitude, None);

        let song = record.song();
        assert_eq!(song.title, "I Didn't Mean To");
        assert_eq!(song.year, 0);
        assert_eq!(song.duration, 218.93179);

        let artist = record.artist();
        assert_eq!(artist.artist_id, "ARD7TVE1187B99BFB1");
        assert_eq!(artist.name, "Casual");
    }

    #[test]
    fn test_read_song_array_takes_first() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("song.json");
        std::fs::write(&path, format!("[{}]", SONG_JSON)).unwrap();

        let record = read_song_file(&path).unwrap();
        assert_eq!(record.artist_name, "Casual");
    }

    #[test]
    fn test_read_song_empty_and_malformed() {
        let dir = tempdir().unwrap();

        let empty = dir.path().join("empty.json");
        std::fs::write(&empty, "  \n").unwrap();
        assert!(matches!(read_song_file(&empty), Err(EtlError::EmptyFile { .. })));

        let empty_array = dir.path().join("empty_array.json");
        std::fs::write(&empty_array, "[]").unwrap();
        assert!(matches!(
            read_song_file(&empty_array),
            Err(EtlError::EmptyFile { .. })
        ));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, r#"{"song_id": "S1", "#).unwrap();
        assert!(matches!(read_song_file(&broken), Err(EtlError::Parse { .. })));

        let trailing = dir.path().join("trailing.json");
        std::fs::write(&trailing, format!("{} garbage", SONG_JSON)).unwrap();
        assert!(matches!(read_song_file(&trailing), Err(EtlError::Parse { .. })));

        let missing = dir.path().join("missing.json");
        assert!(matches!(read_song_file(&missing), Err(EtlError::Io { .. })));
    }

    #[test]
    fn test_song_field_error_names_the_problem() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("null_name.json");
        std::fs::write(&path, SONG_JSON.replace(r#""Casual""#, "null")).unwrap();

        match read_song_file(&path) {
            Err(EtlError::Parse { source, .. }) => {
                let message = source.to_string();
                assert!(message.contains("invalid type: null"), "{}", message);
                assert!(!message.contains("untagged"), "{}", message);
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_event_reader_streams_lines() {
        let log = concat!(
            r#"{"artist":null,"auth":"Logged In","firstName":"Walter","gender":"M","itemInSession":0,"lastName":"Frye","length":null,"level":"free","location":"San Francisco-Oakland-Hayward, CA","method":"GET","page":"Home","registration":1540919166796.0,"sessionId":38,"song":null,"status":200,"ts":1541105830796,"userAgent":"Mozilla/5.0","userId":"39"}"#,
            "\n",
            r#"{"artist":"Des'ree","auth":"Logged In","firstName":"Kaylee","gender":"F","itemInSession":1,"lastName":"Summers","length":246.30812,"level":"free","location":"Phoenix-Mesa-Scottsdale, AZ","method":"PUT","page":"NextSong","registration":1540344794796.0,"sessionId":139,"song":"You Gotta Be","status":200,"ts":1541106106796,"userAgent":"Mozilla/5.0","userId":8}"#,
            "\n",
            r#"{"artist":null,"auth":"Logged Out","firstName":null,"gender":null,"itemInSession":0,"lastName":null,"length":null,"level":"paid","location":null,"method":"PUT","page":"Login","registration":null,"sessionId":52,"song":null,"status":307,"ts":1541207073796,"userAgent":null,"userId":""}"#,
            "\n"
        );

        let events: Vec<LogEvent> = EventReader::new(Path::new("log.json"), log.as_bytes())
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].user_id, Some(39));
        assert!(!events[0].is_play());

        assert!(events[1].is_play());
        assert_eq!(events[1].user_id, Some(8));
        assert_eq!(events[1].length, Some(246.30812));
        assert_eq!(events[1].song.as_deref(), Some("You Gotta Be"));
        assert_eq!(events[1].session_id, Some(139));

        assert_eq!(events[2].user_id, None);
        assert_eq!(events[2].user().level.as_deref(), Some("paid"));
    }

    #[test]
    fn test_event_reader_reports_bad_line() {
        let log = "{\"page\":\"NextSong\",\"ts\":1}\nnot json\n";
        let mut reader = EventReader::new(Path::new("bad.json"), log.as_bytes());

        assert!(reader.next().unwrap().is_ok());
        match reader.next() {
            Some(Err(EtlError::Parse { path, .. })) => assert_eq!(path, PathBuf::from("bad.json")),
            other => panic!("expected parse error, got {:?}", other.map(|r| r.is_ok())),
        }
    }
}
