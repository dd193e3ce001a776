//! # Persisted Records
//!
//! Explicit on-disk shapes for the queue and the playback position. Both are
//! JSON documents wrapped in a versioned envelope; anything that fails to
//! decode, or carries another version, is reported as unreadable so callers
//! can treat it as absent.

use crate::error::{PlaybackError, Result};
use crate::track::TrackDescriptor;
use bridge_traits::PlaybackEngine;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Schema version written into every record.
pub const RECORD_VERSION: u32 = 1;

/// Primitive-only projection of a [`TrackDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedTrack {
    pub id: String,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub artwork_ref: Option<String>,
}

impl From<&TrackDescriptor> for SerializedTrack {
    fn from(track: &TrackDescriptor) -> Self {
        Self {
            id: track.id().as_str().to_string(),
            title: track.title().to_string(),
            artist: track.artist().to_string(),
            media_url: track.media_url().map(|url| url.to_string()),
            artwork_ref: track.artwork().map(|art| art.as_str().to_string()),
        }
    }
}

trait Versioned {
    fn version(&self) -> u32;
}

fn encode_record<T: Serialize>(record: &T) -> Result<Bytes> {
    Ok(Bytes::from(serde_json::to_vec(record)?))
}

fn decode_record<T: DeserializeOwned + Versioned>(bytes: &[u8]) -> Result<T> {
    let record: T = serde_json::from_slice(bytes)?;
    if record.version() != RECORD_VERSION {
        return Err(PlaybackError::UnsupportedVersion {
            found: record.version(),
            expected: RECORD_VERSION,
        });
    }
    Ok(record)
}

/// The whole queue, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueRecord {
    pub version: u32,
    pub tracks: Vec<SerializedTrack>,
}

impl QueueRecord {
    pub fn from_tracks(tracks: &[TrackDescriptor]) -> Self {
        Self {
            version: RECORD_VERSION,
            tracks: tracks.iter().map(SerializedTrack::from).collect(),
        }
    }

    pub fn encode(&self) -> Result<Bytes> {
        encode_record(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        decode_record(bytes)
    }
}

impl Versioned for QueueRecord {
    fn version(&self) -> u32 {
        self.version
    }
}

/// Live transport state of the engine at one instant.
///
/// `index` and `offset_ms` are `None` when the engine has nothing selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackPosition {
    pub index: Option<usize>,
    pub offset_ms: Option<u64>,
    pub is_playing: bool,
}

impl PlaybackPosition {
    /// Read the current transport state from the engine.
    pub async fn capture(engine: &dyn PlaybackEngine) -> Self {
        let index = engine.current_index().await;
        let offset_ms = match index {
            Some(_) => Some(engine.current_position_ms().await),
            None => None,
        };

        Self {
            index,
            offset_ms,
            is_playing: engine.is_playing().await,
        }
    }

    /// Where the engine should seek to on restore.
    pub fn seek_target(&self) -> (usize, u64) {
        (self.index.unwrap_or(0), self.offset_ms.unwrap_or(0))
    }
}

/// The stored form of a [`PlaybackPosition`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub version: u32,
    #[serde(default)]
    pub index: Option<usize>,
    #[serde(default)]
    pub offset_ms: Option<u64>,
    #[serde(default)]
    pub is_playing: bool,
}

impl PositionRecord {
    pub fn encode(&self) -> Result<Bytes> {
        encode_record(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        decode_record(bytes)
    }
}

impl Versioned for PositionRecord {
    fn version(&self) -> u32 {
        self.version
    }
}

impl From<PlaybackPosition> for PositionRecord {
    fn from(position: PlaybackPosition) -> Self {
        Self {
            version: RECORD_VERSION,
            index: position.index,
            offset_ms: position.offset_ms,
            is_playing: position.is_playing,
        }
    }
}

impl From<PositionRecord> for PlaybackPosition {
    fn from(record: PositionRecord) -> Self {
        Self {
            index: record.index,
            offset_ms: record.offset_ms,
            is_playing: record.is_playing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::{ArtworkRef, TrackId};
    use url::Url;

    fn track(id: &str) -> TrackDescriptor {
        TrackDescriptor::new(TrackId::new(id), format!("Title {id}"), "Artist")
            .with_media_url(Url::parse(&format!("https://cdn.example.com/{id}.mp3")).unwrap())
    }

    #[test]
    fn test_serialized_track_keeps_every_field() {
        let descriptor = track("7").with_artwork(ArtworkRef::new("cover-7"));
        let serialized = SerializedTrack::from(&descriptor);

        assert_eq!(serialized.id, "7");
        assert_eq!(serialized.title, "Title 7");
        assert_eq!(serialized.artist, "Artist");
        assert_eq!(
            serialized.media_url.as_deref(),
            Some("https://cdn.example.com/7.mp3")
        );
        assert_eq!(serialized.artwork_ref.as_deref(), Some("cover-7"));
    }

    #[test]
    fn test_queue_record_preserves_order() {
        let record = QueueRecord::from_tracks(&[track("a"), track("b"), track("c")]);
        let decoded = QueueRecord::decode(&record.encode().unwrap()).unwrap();

        let ids: Vec<_> = decoded.tracks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn test_position_record_with_missing_fields() {
        let decoded = PositionRecord::decode(br#"{"version":1}"#).unwrap();
        let position = PlaybackPosition::from(decoded);

        assert_eq!(position, PlaybackPosition::default());
        assert_eq!(position.seek_target(), (0, 0));
    }

    #[test]
    fn test_wrong_version_is_unreadable() {
        let err = QueueRecord::decode(br#"{"version":2,"tracks":[]}"#).unwrap_err();
        assert!(matches!(
            err,
            PlaybackError::UnsupportedVersion {
                found: 2,
                expected: 1
            }
        ));
        assert!(err.is_unreadable_record());
    }

    #[test]
    fn test_wrong_shape_is_unreadable() {
        let err = PositionRecord::decode(br#"[1, 4200, true]"#).unwrap_err();
        assert!(err.is_unreadable_record());

        let err = QueueRecord::decode(b"\x00\x01garbage").unwrap_err();
        assert!(err.is_unreadable_record());
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let record = QueueRecord::from_tracks(&[track("a"), track("b")]);
        assert_eq!(record.encode().unwrap(), record.encode().unwrap());
    }
}
