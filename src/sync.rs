//! Playlist sync orchestration
//!
//! Drives one run: resolve (or load from cache) each selected playlist,
//! then replace the server-side playlist with the matched tracks.

use crate::cache::ResolutionCache;
use crate::catalog::PlaylistSink;
use crate::error::SyncResult;
use crate::itunes::ItunesLibrary;
use crate::resolver::{ExternalTrack, ResolvedPlaylist, TrackResolver};
use std::sync::Arc;
use tracing::{info, warn};

pub struct PlaylistSyncer {
    resolver: TrackResolver,
    cache: ResolutionCache,
    sink: Arc<dyn PlaylistSink>,
}

impl PlaylistSyncer {
    pub fn new(resolver: TrackResolver, cache: ResolutionCache, sink: Arc<dyn PlaylistSink>) -> Self {
        Self {
            resolver,
            cache,
            sink,
        }
    }

    /// Resolve one playlist and push it to the sink.
    ///
    /// A cached resolution short-circuits the cascade entirely; a fresh
    /// one is persisted before the push. The returned playlist is what
    /// was pushed: cached entries arrive already stripped of unresolved
    /// tracks, fresh ones keep their `Failed` entries for reporting.
    pub async fn sync_playlist(
        &self,
        name: &str,
        tracks: &[ExternalTrack],
    ) -> SyncResult<ResolvedPlaylist> {
        let resolved = match self.cache.load(name)? {
            Some(cached) => {
                info!(
                    "📂 Loaded '{}' from cache ({} resolved tracks)",
                    name,
                    cached.results.len()
                );
                cached
            }
            None => {
                info!("🛠️ Resolving '{}' ({} tracks)...", name, tracks.len());
                let resolved = self.resolver.resolve_playlist(name, tracks).await;
                self.cache.save(&resolved)?;
                resolved
            }
        };

        let matched = resolved.matched_tracks();
        self.sink.replace_playlist(name, &matched).await?;
        Ok(resolved)
    }

    /// Sync every selected playlist found in the export.
    pub async fn run(&self, library: &ItunesLibrary, selected: &[String]) -> SyncResult<()> {
        for name in selected {
            match library.playlist(name) {
                Some(tracks) => {
                    self.sync_playlist(name, &tracks).await?;
                }
                None => {
                    warn!("...playlist '{}' not found in the export. Skipping.", name);
                }
            }
        }
        Ok(())
    }
}
