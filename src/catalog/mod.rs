use crate::error::SyncResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A track entry in the remote catalog
///
/// `key` is the server's opaque identifier; the resolver only compares
/// the three string fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogTrack {
    pub artist: String,
    pub title: String,
    pub album: String,
    pub key: String,
}

/// An artist entry, used as a narrowing anchor during resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogArtist {
    pub name: String,
    pub key: String,
}

/// An album entry, intermediate in artist → albums → tracks expansion
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogAlbum {
    pub title: String,
    pub key: String,
}

/// A type-tagged catalog search result
///
/// `Other` carries the server's type tag for entities the resolver does
/// not act on (genres, playlists); they still count toward result
/// cardinality in the exact tier.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Artist(CatalogArtist),
    Album(CatalogAlbum),
    Track(CatalogTrack),
    Other(String),
}

/// Query interface onto the remote music catalog
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Free-text search across the whole library, type-tagged results
    async fn search_by_name(&self, text: &str) -> SyncResult<Vec<Entity>>;

    /// Search artists by name
    async fn search_artists(&self, text: &str) -> SyncResult<Vec<CatalogArtist>>;

    /// Enumerate every artist in the catalog
    async fn list_all_artists(&self) -> SyncResult<Vec<CatalogArtist>>;

    /// Children of an entity: an artist's albums, or an album's tracks
    async fn fetch_children(&self, parent_key: &str) -> SyncResult<Vec<Entity>>;

    /// Enumerate every track in the catalog (brute-force corpus)
    async fn list_all_tracks(&self) -> SyncResult<Vec<CatalogTrack>>;
}

/// Destination for a completed resolution
#[async_trait]
pub trait PlaylistSink: Send + Sync {
    /// Replace the named server playlist with the given ordered tracks.
    ///
    /// Delete-then-recreate semantics; a missing playlist is not an
    /// error.
    async fn replace_playlist(&self, name: &str, tracks: &[CatalogTrack]) -> SyncResult<()>;
}

pub mod mediaserver;
