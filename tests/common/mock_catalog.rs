use async_trait::async_trait;
use playsync::catalog::{
    Catalog, CatalogAlbum, CatalogArtist, CatalogTrack, Entity, PlaylistSink,
};
use playsync::error::{SyncError, SyncResult};
use std::sync::Mutex;

/// In-memory catalog for resolver tests: artists own albums, albums own
/// tracks. Searches match on exact field equality so tests control
/// result cardinality precisely.
pub struct MockCatalog {
    artists: Vec<CatalogArtist>,
    albums: Vec<(String, CatalogAlbum)>,
    tracks: Vec<(String, CatalogTrack)>,
    next_key: u32,
    /// Any search for exactly this text fails, to test fault isolation
    pub fail_on: Option<String>,
    /// When set, every catalog call fails
    pub offline: bool,
    /// Playlists pushed through the sink, in call order
    pub replaced: Mutex<Vec<(String, Vec<CatalogTrack>)>>,
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCatalog {
    pub fn new() -> Self {
        Self {
            artists: Vec::new(),
            albums: Vec::new(),
            tracks: Vec::new(),
            next_key: 0,
            fail_on: None,
            offline: false,
            replaced: Mutex::new(Vec::new()),
        }
    }

    fn alloc_key(&mut self, prefix: &str) -> String {
        self.next_key += 1;
        format!("{}{}", prefix, self.next_key)
    }

    pub fn add_artist(&mut self, name: &str) -> String {
        let key = self.alloc_key("artist-");
        self.artists.push(CatalogArtist {
            name: name.to_string(),
            key: key.clone(),
        });
        key
    }

    pub fn add_album(&mut self, artist_key: &str, title: &str) -> String {
        let key = self.alloc_key("album-");
        self.albums.push((
            artist_key.to_string(),
            CatalogAlbum {
                title: title.to_string(),
                key: key.clone(),
            },
        ));
        key
    }

    pub fn add_track(&mut self, album_key: &str, artist: &str, title: &str, album: &str) -> String {
        let key = self.alloc_key("track-");
        self.tracks.push((
            album_key.to_string(),
            CatalogTrack {
                artist: artist.to_string(),
                title: title.to_string(),
                album: album.to_string(),
                key: key.clone(),
            },
        ));
        key
    }

    fn check_failure(&self, text: &str) -> SyncResult<()> {
        if self.offline {
            return Err(SyncError::Catalog("mock catalog offline".to_string()));
        }
        if self.fail_on.as_deref() == Some(text) {
            return Err(SyncError::Catalog(format!("injected failure for '{}'", text)));
        }
        Ok(())
    }
}

#[async_trait]
impl Catalog for MockCatalog {
    async fn search_by_name(&self, text: &str) -> SyncResult<Vec<Entity>> {
        self.check_failure(text)?;
        let mut hits = Vec::new();
        for artist in &self.artists {
            if artist.name == text {
                hits.push(Entity::Artist(artist.clone()));
            }
        }
        for (_, album) in &self.albums {
            if album.title == text {
                hits.push(Entity::Album(album.clone()));
            }
        }
        for (_, track) in &self.tracks {
            if track.title == text {
                hits.push(Entity::Track(track.clone()));
            }
        }
        Ok(hits)
    }

    async fn search_artists(&self, text: &str) -> SyncResult<Vec<CatalogArtist>> {
        self.check_failure(text)?;
        Ok(self
            .artists
            .iter()
            .filter(|a| a.name == text)
            .cloned()
            .collect())
    }

    async fn list_all_artists(&self) -> SyncResult<Vec<CatalogArtist>> {
        if self.offline {
            return Err(SyncError::Catalog("mock catalog offline".to_string()));
        }
        Ok(self.artists.clone())
    }

    async fn fetch_children(&self, parent_key: &str) -> SyncResult<Vec<Entity>> {
        self.check_failure(parent_key)?;
        let albums: Vec<Entity> = self
            .albums
            .iter()
            .filter(|(owner, _)| owner == parent_key)
            .map(|(_, album)| Entity::Album(album.clone()))
            .collect();
        if !albums.is_empty() {
            return Ok(albums);
        }
        Ok(self
            .tracks
            .iter()
            .filter(|(owner, _)| owner == parent_key)
            .map(|(_, track)| Entity::Track(track.clone()))
            .collect())
    }

    async fn list_all_tracks(&self) -> SyncResult<Vec<CatalogTrack>> {
        if self.offline {
            return Err(SyncError::Catalog("mock catalog offline".to_string()));
        }
        Ok(self.tracks.iter().map(|(_, t)| t.clone()).collect())
    }
}

#[async_trait]
impl PlaylistSink for MockCatalog {
    async fn replace_playlist(&self, name: &str, tracks: &[CatalogTrack]) -> SyncResult<()> {
        if self.offline {
            return Err(SyncError::Catalog("mock catalog offline".to_string()));
        }
        self.replaced
            .lock()
            .unwrap()
            .push((name.to_string(), tracks.to_vec()));
        Ok(())
    }
}
