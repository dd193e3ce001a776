//! # Core Playback Traits
//!
//! Seams the core owns, as opposed to the host-facing contracts in
//! `bridge-traits`.
//!
//! ## Track Resolution
//!
//! A stored track is only a primitive projection of what was queued. Turning
//! it back into a [`TrackDescriptor`] may need context the record does not
//! carry: a fresh signed stream URL, a lookup in the local library, a
//! network call. [`TrackResolver`] is that step. A resolver that fails for one
//! track only causes that track to be skipped during restore.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use core_playback::{Result, SerializedTrack, TrackDescriptor, TrackResolver};
//!
//! struct SignedUrlResolver;
//!
//! #[async_trait]
//! impl TrackResolver for SignedUrlResolver {
//!     async fn resolve(&self, track: &SerializedTrack) -> Result<TrackDescriptor> {
//!         // Ask the backend for a fresh stream URL for `track.id`
//!         todo!()
//!     }
//! }
//! ```

use crate::error::{PlaybackError, Result};
use crate::record::SerializedTrack;
use crate::track::{ArtworkRef, TrackDescriptor, TrackId};
use async_trait::async_trait;
use url::Url;

/// Rebuilds a descriptor from its stored form.
#[async_trait]
pub trait TrackResolver: Send + Sync {
    async fn resolve(&self, track: &SerializedTrack) -> Result<TrackDescriptor>;
}

/// Resolver that trusts the stored media URL as-is.
///
/// A track stored without a URL resolves to a non-playable descriptor, which
/// the queue then skips.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectResolver;

#[async_trait]
impl TrackResolver for DirectResolver {
    async fn resolve(&self, track: &SerializedTrack) -> Result<TrackDescriptor> {
        let mut descriptor = TrackDescriptor::new(
            TrackId::new(track.id.clone()),
            track.title.clone(),
            track.artist.clone(),
        );

        if let Some(raw) = track.media_url.as_deref() {
            let url = Url::parse(raw).map_err(|e| PlaybackError::ResolutionFailed {
                track_id: track.id.clone(),
                reason: e.to_string(),
            })?;
            descriptor = descriptor.with_media_url(url);
        }

        if let Some(artwork) = track.artwork_ref.as_deref() {
            descriptor = descriptor.with_artwork(ArtworkRef::new(artwork));
        }

        Ok(descriptor)
    }
}
