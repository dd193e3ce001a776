//! # Track Descriptors
//!
//! Immutable values describing one queueable item.

use bridge_traits::MediaSource;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Stable identifier of a track within its catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TrackId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Opaque reference to a track's artwork (cover URL or cache key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtworkRef(String);

impl ArtworkRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One playable (or not) item as seen by the queue.
///
/// A descriptor without a media URL cannot be sourced by the engine and is
/// never admitted into the queue.
///
/// ```
/// use core_playback::{TrackDescriptor, TrackId};
/// use url::Url;
///
/// let track = TrackDescriptor::new(TrackId::new("42"), "Song", "Artist")
///     .with_media_url(Url::parse("https://cdn.example.com/42.mp3").unwrap());
/// assert!(track.is_playable());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackDescriptor {
    id: TrackId,
    title: String,
    artist: String,
    media_url: Option<Url>,
    artwork: Option<ArtworkRef>,
}

impl TrackDescriptor {
    pub fn new(id: TrackId, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            artist: artist.into(),
            media_url: None,
            artwork: None,
        }
    }

    pub fn with_media_url(mut self, url: Url) -> Self {
        self.media_url = Some(url);
        self
    }

    pub fn with_artwork(mut self, artwork: ArtworkRef) -> Self {
        self.artwork = Some(artwork);
        self
    }

    pub fn id(&self) -> &TrackId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn media_url(&self) -> Option<&Url> {
        self.media_url.as_ref()
    }

    pub fn artwork(&self) -> Option<&ArtworkRef> {
        self.artwork.as_ref()
    }

    /// Whether the engine can be given a source for this track.
    pub fn is_playable(&self) -> bool {
        self.media_url.is_some()
    }

    /// Engine-side source for this track, if it has a media URL.
    pub fn media_source(&self) -> Option<MediaSource> {
        self.media_url.as_ref().map(MediaSource::from_url)
    }
}
