//! iTunes library export reader
//!
//! Parses the `Library.xml` plist an iTunes/Music export produces: the
//! `Tracks` dict (track id → metadata) and the `Playlists` array of
//! ordered track-id lists. Only the fields resolution needs are kept.

use crate::error::{SyncError, SyncResult};
use crate::resolver::ExternalTrack;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// A parsed plist value, reduced to the shapes the export uses
#[derive(Debug, Clone, PartialEq)]
enum PlistValue {
    Dict(Vec<(String, PlistValue)>),
    Array(Vec<PlistValue>),
    String(String),
    Integer(i64),
    Other,
}

impl PlistValue {
    fn get(&self, key: &str) -> Option<&PlistValue> {
        match self {
            PlistValue::Dict(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            PlistValue::String(s) => Some(s),
            _ => None,
        }
    }

    fn as_int(&self) -> Option<i64> {
        match self {
            PlistValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

fn read_text(reader: &mut Reader<&[u8]>, tag: &[u8]) -> SyncResult<String> {
    let mut out = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(ref e) => out.push_str(&e.unescape()?),
            Event::End(ref e) if e.name().as_ref() == tag => return Ok(out),
            Event::Eof => return Err(SyncError::Source("unexpected end of plist".to_string())),
            _ => (),
        }
    }
}

/// Read one plist value; the reader is positioned just past the value's
/// start tag.
fn read_value(reader: &mut Reader<&[u8]>, tag: &[u8]) -> SyncResult<PlistValue> {
    match tag {
        b"dict" => {
            let mut entries = Vec::new();
            let mut pending_key: Option<String> = None;
            loop {
                match reader.read_event()? {
                    Event::Start(ref e) => {
                        let name = e.name().as_ref().to_vec();
                        if name == b"key" {
                            pending_key = Some(read_text(reader, b"key")?);
                        } else {
                            let value = read_value(reader, &name)?;
                            if let Some(key) = pending_key.take() {
                                entries.push((key, value));
                            }
                        }
                    }
                    Event::Empty(ref e) => {
                        let value = empty_value(e.name().as_ref());
                        if let Some(key) = pending_key.take() {
                            entries.push((key, value));
                        }
                    }
                    Event::End(ref e) if e.name().as_ref() == b"dict" => {
                        return Ok(PlistValue::Dict(entries))
                    }
                    Event::Eof => {
                        return Err(SyncError::Source("unexpected end of plist".to_string()))
                    }
                    _ => (),
                }
            }
        }
        b"array" => {
            let mut items = Vec::new();
            loop {
                match reader.read_event()? {
                    Event::Start(ref e) => {
                        let name = e.name().as_ref().to_vec();
                        items.push(read_value(reader, &name)?);
                    }
                    Event::Empty(ref e) => items.push(empty_value(e.name().as_ref())),
                    Event::End(ref e) if e.name().as_ref() == b"array" => {
                        return Ok(PlistValue::Array(items))
                    }
                    Event::Eof => {
                        return Err(SyncError::Source("unexpected end of plist".to_string()))
                    }
                    _ => (),
                }
            }
        }
        b"string" => Ok(PlistValue::String(read_text(reader, b"string")?)),
        b"integer" => {
            let text = read_text(reader, b"integer")?;
            Ok(PlistValue::Integer(text.trim().parse().unwrap_or(0)))
        }
        // date, data, real: consumed but unused
        other => {
            read_text(reader, other)?;
            Ok(PlistValue::Other)
        }
    }
}

fn empty_value(tag: &[u8]) -> PlistValue {
    match tag {
        b"dict" => PlistValue::Dict(Vec::new()),
        b"array" => PlistValue::Array(Vec::new()),
        b"string" => PlistValue::String(String::new()),
        _ => PlistValue::Other,
    }
}

/// Parse the export down to its top-level dict
fn parse_plist(xml: &str) -> SyncResult<PlistValue> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Start(ref e) if e.name().as_ref() == b"dict" => {
                return read_value(&mut reader, b"dict")
            }
            Event::Eof => {
                return Err(SyncError::Source(
                    "no top-level dict found in library export".to_string(),
                ))
            }
            _ => (),
        }
    }
}

/// An imported iTunes library: track metadata plus ordered playlists
pub struct ItunesLibrary {
    tracks: HashMap<i64, ExternalTrack>,
    playlists: Vec<(String, Vec<i64>)>,
}

impl ItunesLibrary {
    pub fn load(path: &Path) -> SyncResult<Self> {
        info!("📚 Loading library export from {}", path.display());
        let xml = std::fs::read_to_string(path)?;
        let library = Self::from_xml(&xml)?;
        info!(
            "   -> {} tracks, {} playlists",
            library.tracks.len(),
            library.playlists.len()
        );
        Ok(library)
    }

    pub fn from_xml(xml: &str) -> SyncResult<Self> {
        let root = parse_plist(xml)?;

        let mut tracks = HashMap::new();
        if let Some(PlistValue::Dict(entries)) = root.get("Tracks") {
            for (id, value) in entries {
                let Ok(id) = id.parse::<i64>() else { continue };
                let Some(name) = value.get("Name").and_then(|v| v.as_str()) else {
                    debug!("Skipping track {} with no name", id);
                    continue;
                };
                let artist = value
                    .get("Artist")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default();
                let album = value
                    .get("Album")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string());
                tracks.insert(
                    id,
                    ExternalTrack {
                        artist: artist.to_string(),
                        name: name.to_string(),
                        album,
                    },
                );
            }
        }

        let mut playlists = Vec::new();
        if let Some(PlistValue::Array(items)) = root.get("Playlists") {
            for item in items {
                let Some(name) = item.get("Name").and_then(|v| v.as_str()) else {
                    continue;
                };
                let mut ids = Vec::new();
                if let Some(PlistValue::Array(entries)) = item.get("Playlist Items") {
                    for entry in entries {
                        if let Some(id) = entry.get("Track ID").and_then(|v| v.as_int()) {
                            ids.push(id);
                        }
                    }
                }
                playlists.push((name.to_string(), ids));
            }
        }

        Ok(Self { tracks, playlists })
    }

    /// Names of all playlists in the export, in export order
    pub fn playlist_names(&self) -> Vec<String> {
        self.playlists.iter().map(|(n, _)| n.clone()).collect()
    }

    /// The ordered tracks of a playlist; None if the export has no
    /// playlist by this name. Items pointing at unknown track ids are
    /// skipped.
    pub fn playlist(&self, name: &str) -> Option<Vec<ExternalTrack>> {
        let (_, ids) = self.playlists.iter().find(|(n, _)| n == name)?;
        let tracks = ids
            .iter()
            .filter_map(|id| match self.tracks.get(id) {
                Some(track) => Some(track.clone()),
                None => {
                    warn!("Playlist '{}' references unknown track id {}", name, id);
                    None
                }
            })
            .collect();
        Some(tracks)
    }
}
