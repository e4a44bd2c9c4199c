use crate::catalog::{Catalog, CatalogAlbum, CatalogArtist, CatalogTrack, Entity, PlaylistSink};
use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use reqwest::Client;
use tracing::{debug, info, warn};

/// Media server catalog client via the XML HTTP API
pub struct MediaServerCatalog {
    client: Client,
    base_url: String,
    access_token: String,
    music_section: String,
}

impl MediaServerCatalog {
    pub fn new(config: &crate::config::Config) -> Self {
        let base_url = format!("http://{}:{}", config.server_ip, config.server_port);
        Self {
            client: Client::new(),
            base_url,
            access_token: config.access_token.clone(),
            music_section: config.music_section.clone(),
        }
    }

    async fn send_command(&self, method: &str, path: &str, params: &str) -> SyncResult<String> {
        let mut url = format!(
            "{}{}?X-Plex-Token={}",
            self.base_url, path, self.access_token
        );
        if !params.is_empty() {
            url.push('&');
            url.push_str(params);
        }

        debug!("API {} {}", method, path);

        // Retry with backoff; the server may be mid-scan or restarting
        let max_retries = 3;
        for attempt in 0..max_retries {
            let request = match method {
                "POST" => self.client.post(&url),
                "DELETE" => self.client.delete(&url),
                _ => self.client.get(&url),
            };

            match request.send().await {
                Ok(resp) => {
                    return Ok(resp.text().await?);
                }
                Err(e) if attempt < max_retries - 1 => {
                    warn!(
                        "⚠️ API retry {}/{} for '{}': {}",
                        attempt + 1,
                        max_retries,
                        path,
                        e
                    );

                    if e.is_connect() {
                        debug!("📡 Connection refused. Is the media server running?");
                    }

                    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                }
                Err(e) => {
                    if e.is_connect() {
                        return Err(SyncError::Catalog(format!(
                            "could not reach media server at {}",
                            self.base_url
                        )));
                    }
                    return Err(e.into());
                }
            }
        }

        Err(SyncError::Catalog(format!(
            "request failed after {} retries",
            max_retries
        )))
    }

    async fn get(&self, path: &str, params: &str) -> SyncResult<String> {
        self.send_command("GET", path, params).await
    }

    /// Check if the server answers at all
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/identity?X-Plex-Token={}", self.base_url, self.access_token);
        self.client.get(&url).send().await.is_ok()
    }

    /// Fetch the server's playlists as (name, id) pairs
    async fn get_playlists(&self) -> SyncResult<Vec<(String, String)>> {
        let xml = self.get("/playlists", "").await?;
        Ok(parse_playlists(&xml))
    }
}

fn attr_value(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name)
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.to_string())
}

fn entity_from_element(e: &BytesStart) -> Option<Entity> {
    let key = attr_value(e, b"ratingKey").unwrap_or_default();
    let title = attr_value(e, b"title").unwrap_or_default();

    match e.name().as_ref() {
        b"Track" => Some(Entity::Track(CatalogTrack {
            artist: attr_value(e, b"grandparentTitle").unwrap_or_default(),
            title,
            album: attr_value(e, b"parentTitle").unwrap_or_default(),
            key,
        })),
        b"Directory" => {
            let kind = attr_value(e, b"type").unwrap_or_default();
            match kind.as_str() {
                "artist" => Some(Entity::Artist(CatalogArtist { name: title, key })),
                "album" => Some(Entity::Album(CatalogAlbum { title, key })),
                _ => Some(Entity::Other(kind)),
            }
        }
        _ => None,
    }
}

/// Parse a media container response into type-tagged entities
fn parse_entities(xml: &str) -> Vec<Entity> {
    let mut entities = Vec::new();
    let mut reader = Reader::from_str(xml);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                if let Some(entity) = entity_from_element(e) {
                    entities.push(entity);
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => (),
        }
    }

    entities
}

fn parse_playlists(xml: &str) -> Vec<(String, String)> {
    let mut playlists = Vec::new();
    let mut reader = Reader::from_str(xml);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.name().as_ref() == b"Playlist" =>
            {
                let name = attr_value(e, b"title").unwrap_or_default();
                let id = attr_value(e, b"ratingKey").unwrap_or_default();
                if !name.is_empty() && !id.is_empty() {
                    playlists.push((name, id));
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => (),
        }
    }

    playlists
}

#[async_trait]
impl Catalog for MediaServerCatalog {
    async fn search_by_name(&self, text: &str) -> SyncResult<Vec<Entity>> {
        let params = format!("query={}", urlencoding::encode(text));
        let xml = self.get("/search", &params).await?;
        Ok(parse_entities(&xml))
    }

    async fn search_artists(&self, text: &str) -> SyncResult<Vec<CatalogArtist>> {
        let path = format!("/library/sections/{}/all", self.music_section);
        let params = format!("type=8&title={}", urlencoding::encode(text));
        let xml = self.get(&path, &params).await?;
        Ok(parse_entities(&xml)
            .into_iter()
            .filter_map(|e| match e {
                Entity::Artist(a) => Some(a),
                _ => None,
            })
            .collect())
    }

    async fn list_all_artists(&self) -> SyncResult<Vec<CatalogArtist>> {
        info!("📥 Fetching all artists from the catalog...");
        let path = format!("/library/sections/{}/all", self.music_section);
        let xml = self.get(&path, "type=8").await?;
        let artists: Vec<CatalogArtist> = parse_entities(&xml)
            .into_iter()
            .filter_map(|e| match e {
                Entity::Artist(a) => Some(a),
                _ => None,
            })
            .collect();
        info!("   -> {} artists", artists.len());
        Ok(artists)
    }

    async fn fetch_children(&self, parent_key: &str) -> SyncResult<Vec<Entity>> {
        let path = format!("/library/metadata/{}/children", parent_key);
        let xml = self.get(&path, "").await?;
        Ok(parse_entities(&xml))
    }

    async fn list_all_tracks(&self) -> SyncResult<Vec<CatalogTrack>> {
        info!("📥 Fetching all tracks from the catalog...");
        let path = format!("/library/sections/{}/all", self.music_section);
        let xml = self.get(&path, "type=10").await?;
        let tracks: Vec<CatalogTrack> = parse_entities(&xml)
            .into_iter()
            .filter_map(|e| match e {
                Entity::Track(t) => Some(t),
                _ => None,
            })
            .collect();
        info!("   -> {} tracks", tracks.len());
        Ok(tracks)
    }
}

#[async_trait]
impl PlaylistSink for MediaServerCatalog {
    async fn replace_playlist(&self, name: &str, tracks: &[CatalogTrack]) -> SyncResult<()> {
        // Delete the old playlist if the server has one by this name
        let playlists = self.get_playlists().await?;
        if let Some((_, id)) = playlists.iter().find(|(n, _)| n == name) {
            debug!("Deleting existing playlist '{}' (id {})", name, id);
            self.send_command("DELETE", &format!("/playlists/{}", id), "")
                .await?;
        }

        if tracks.is_empty() {
            warn!("Playlist '{}' has no matched tracks; nothing to create", name);
            return Ok(());
        }

        let keys: Vec<&str> = tracks.iter().map(|t| t.key.as_str()).collect();
        let uri = format!(
            "library://sections/{}/items/{}",
            self.music_section,
            keys.join(",")
        );
        let params = format!(
            "type=audio&title={}&uri={}",
            urlencoding::encode(name),
            urlencoding::encode(&uri)
        );
        self.send_command("POST", "/playlists", &params).await?;

        info!("✅ Created playlist '{}' with {} tracks", name, tracks.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<MediaContainer size="3">
  <Directory ratingKey="100" type="artist" title="The Beatles"/>
  <Directory ratingKey="200" type="album" title="Help!"/>
  <Track ratingKey="300" title="Help!" grandparentTitle="The Beatles" parentTitle="Help!"/>
</MediaContainer>"#;

    #[test]
    fn test_parse_entities_type_tags() {
        let entities = parse_entities(SEARCH_XML);
        assert_eq!(entities.len(), 3);
        assert!(matches!(&entities[0], Entity::Artist(a) if a.name == "The Beatles"));
        assert!(matches!(&entities[1], Entity::Album(a) if a.key == "200"));
        match &entities[2] {
            Entity::Track(t) => {
                assert_eq!(t.artist, "The Beatles");
                assert_eq!(t.title, "Help!");
                assert_eq!(t.album, "Help!");
                assert_eq!(t.key, "300");
            }
            other => panic!("expected track, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_entities_unknown_directory_kind() {
        let xml = r#"<MediaContainer><Directory ratingKey="9" type="genre" title="Rock"/></MediaContainer>"#;
        let entities = parse_entities(xml);
        assert_eq!(entities, vec![Entity::Other("genre".to_string())]);
    }

    #[test]
    fn test_parse_entities_unescapes_attributes() {
        let xml = r#"<MediaContainer><Directory ratingKey="7" type="artist" title="Simon &amp; Garfunkel"/></MediaContainer>"#;
        let entities = parse_entities(xml);
        assert!(matches!(&entities[0], Entity::Artist(a) if a.name == "Simon & Garfunkel"));
    }

    #[test]
    fn test_parse_playlists() {
        let xml = r#"<MediaContainer>
  <Playlist ratingKey="41" title="Road Trip"/>
  <Playlist ratingKey="42" title="Focus"/>
</MediaContainer>"#;
        let playlists = parse_playlists(xml);
        assert_eq!(
            playlists,
            vec![
                ("Road Trip".to_string(), "41".to_string()),
                ("Focus".to_string(), "42".to_string()),
            ]
        );
    }
}
