//! Tiered track resolution
//!
//! Maps one external track descriptor to the most likely catalog entry
//! through a cascade of progressively broader searches: exact name
//! lookup, artist-anchored narrowing, then a brute-force scan of the
//! whole catalog. The cheap tiers handle the common case; brute force
//! guarantees a result whenever the catalog is non-empty.

use crate::catalog::{Catalog, CatalogArtist, CatalogTrack, Entity};
use crate::error::{SyncError, SyncResult};
use crate::matching::select_best;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Minimum score for anchoring on a catalog artist
const ARTIST_ANCHOR_CUTOFF: f64 = 0.95;

/// Minimum score for accepting a track from the anchored artist's albums
const TRACK_ACCEPT_CUTOFF: f64 = 0.95;

/// A track description from the imported playlist, no catalog identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalTrack {
    pub artist: String,
    pub name: String,
    pub album: Option<String>,
}

impl ExternalTrack {
    /// Flattened `"artist name [album]"` form used as scorer input
    pub fn comparable(&self) -> String {
        let mut s = format!("{} {}", self.artist, self.name);
        if let Some(album) = &self.album {
            s.push(' ');
            s.push_str(album);
        }
        s
    }
}

/// Which cascade stage produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchTier {
    Exact,
    ArtistAnchored,
    BruteForce,
    Failed,
}

/// Outcome of resolving one external track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub track: ExternalTrack,
    pub matched: Option<CatalogTrack>,
    pub tier: MatchTier,
    pub score: Option<f64>,
}

/// Ordered resolution results for one playlist
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedPlaylist {
    pub name: String,
    pub results: Vec<ResolutionResult>,
}

impl ResolvedPlaylist {
    /// The matched catalog tracks, playlist order preserved
    pub fn matched_tracks(&self) -> Vec<CatalogTrack> {
        self.results
            .iter()
            .filter_map(|r| r.matched.clone())
            .collect()
    }
}

/// Comparable strings for a candidate set, one per track, order-preserving.
///
/// The spacing must match [`ExternalTrack::comparable`] exactly; the
/// scorer is spacing-sensitive.
pub fn build_track_strings(tracks: &[CatalogTrack], include_album: bool) -> Vec<String> {
    tracks
        .iter()
        .map(|t| {
            if include_album {
                format!("{} {} {}", t.artist, t.title, t.album)
            } else {
                format!("{} {}", t.artist, t.title)
            }
        })
        .collect()
}

/// Resolves external tracks against the catalog, one cascade per track
pub struct TrackResolver {
    catalog: Arc<dyn Catalog>,
    /// Full artist list, fetched once at connect
    artists: Vec<CatalogArtist>,
    /// Full track list, fetched once at connect (brute-force corpus)
    tracks: Vec<CatalogTrack>,
}

impl TrackResolver {
    /// Connect to the catalog and enumerate its artists and tracks once.
    ///
    /// Both lists are read-only for the resolver's lifetime; a rescan
    /// means building a new resolver.
    pub async fn connect(catalog: Arc<dyn Catalog>) -> SyncResult<Self> {
        let artists = catalog.list_all_artists().await?;
        let tracks = catalog.list_all_tracks().await?;
        info!(
            "🎼 Catalog loaded: {} artists, {} tracks",
            artists.len(),
            tracks.len()
        );
        Ok(Self {
            catalog,
            artists,
            tracks,
        })
    }

    pub fn catalog_size(&self) -> usize {
        self.tracks.len()
    }

    /// Resolve a whole playlist sequentially, preserving input order.
    ///
    /// Every input track yields exactly one result; failures become
    /// `Failed` entries, never gaps.
    pub async fn resolve_playlist(&self, name: &str, tracks: &[ExternalTrack]) -> ResolvedPlaylist {
        let mut results = Vec::with_capacity(tracks.len());
        for track in tracks {
            results.push(self.resolve(track).await);
        }
        ResolvedPlaylist {
            name: name.to_string(),
            results,
        }
    }

    /// Resolve a single external track through the cascade.
    ///
    /// Any error inside the cascade is contained here: the track gets a
    /// `Failed` result and resolution of later tracks is unaffected.
    pub async fn resolve(&self, track: &ExternalTrack) -> ResolutionResult {
        match self.try_resolve(track).await {
            Ok((matched, tier, score)) => {
                info!(
                    "Matched: {} - {} <==> {} - {} [{}]",
                    track.artist, track.name, matched.artist, matched.title, matched.album
                );
                ResolutionResult {
                    track: track.clone(),
                    matched: Some(matched),
                    tier,
                    score,
                }
            }
            Err(e) => {
                warn!("!!! Match failure @ {} - {}: {}", track.artist, track.name, e);
                ResolutionResult {
                    track: track.clone(),
                    matched: None,
                    tier: MatchTier::Failed,
                    score: None,
                }
            }
        }
    }

    async fn try_resolve(
        &self,
        track: &ExternalTrack,
    ) -> SyncResult<(CatalogTrack, MatchTier, Option<f64>)> {
        // Tier 1: a single track-typed search hit is accepted on the
        // catalog's own ranking, no scoring.
        if let Some(hit) = self.exact_lookup(track).await? {
            return Ok((hit, MatchTier::Exact, None));
        }

        let target = track.comparable();

        // Tier 2: anchor on an artist, then match within their albums
        if let Some(anchor) = self.anchor_artist(track).await? {
            if let Some((hit, score)) = self.match_within_artist(&anchor, track, &target).await? {
                return Ok((hit, MatchTier::ArtistAnchored, Some(score)));
            }
        }

        // Tier 3: brute-force scan of the whole catalog (slow but
        // relatively sure); accepted regardless of score.
        if self.tracks.is_empty() {
            return Err(SyncError::EmptyCatalog);
        }
        let candidates = build_track_strings(&self.tracks, track.album.is_some());
        let (score, idx) = select_best(&target, &candidates)?;
        debug!("Brute-force match for '{}' scored {:.3}", target, score);
        Ok((self.tracks[idx].clone(), MatchTier::BruteForce, Some(score)))
    }

    async fn exact_lookup(&self, track: &ExternalTrack) -> SyncResult<Option<CatalogTrack>> {
        let mut hits = self.catalog.search_by_name(&track.name).await?;
        if hits.len() == 1 {
            if let Entity::Track(hit) = hits.remove(0) {
                return Ok(Some(hit));
            }
        }
        Ok(None)
    }

    async fn anchor_artist(&self, track: &ExternalTrack) -> SyncResult<Option<CatalogArtist>> {
        let hits = self.catalog.search_artists(&track.artist).await?;
        if hits.len() == 1 {
            return Ok(hits.into_iter().next());
        }

        // No unique hit; fuzzy-scan the full artist list instead
        if self.artists.is_empty() {
            return Ok(None);
        }
        let names: Vec<String> = self.artists.iter().map(|a| a.name.clone()).collect();
        let (score, idx) = select_best(&track.artist, &names)?;
        if score > ARTIST_ANCHOR_CUTOFF {
            debug!(
                "🎯 Anchored artist '{}' for '{}' (score {:.3})",
                self.artists[idx].name, track.artist, score
            );
            Ok(Some(self.artists[idx].clone()))
        } else {
            Ok(None)
        }
    }

    /// Collect every track under the anchor's albums and pick the best.
    async fn match_within_artist(
        &self,
        anchor: &CatalogArtist,
        track: &ExternalTrack,
        target: &str,
    ) -> SyncResult<Option<(CatalogTrack, f64)>> {
        let mut narrowed: Vec<CatalogTrack> = Vec::new();
        for child in self.catalog.fetch_children(&anchor.key).await? {
            if let Entity::Album(album) = child {
                for entry in self.catalog.fetch_children(&album.key).await? {
                    if let Entity::Track(t) = entry {
                        narrowed.push(t);
                    }
                }
            }
        }

        if narrowed.is_empty() {
            return Ok(None);
        }

        let candidates = build_track_strings(&narrowed, track.album.is_some());
        let (score, idx) = select_best(target, &candidates)?;
        if score > TRACK_ACCEPT_CUTOFF {
            Ok(Some((narrowed[idx].clone(), score)))
        } else {
            debug!(
                "Anchored candidates for '{}' topped out at {:.3}, falling through",
                target, score
            );
            Ok(None)
        }
    }
}
