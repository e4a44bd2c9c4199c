pub mod mock_catalog;

pub use mock_catalog::MockCatalog;

use playsync::resolver::ExternalTrack;

pub fn external(artist: &str, name: &str, album: Option<&str>) -> ExternalTrack {
    ExternalTrack {
        artist: artist.to_string(),
        name: name.to_string(),
        album: album.map(|a| a.to_string()),
    }
}

/// A small catalog with two artists and a handful of tracks, enough to
/// exercise every cascade tier.
pub fn sample_catalog() -> MockCatalog {
    let mut catalog = MockCatalog::new();

    let beatles = catalog.add_artist("The Beatles");
    let help = catalog.add_album(&beatles, "Help!");
    catalog.add_track(&help, "The Beatles", "Help!", "Help!");
    catalog.add_track(&help, "The Beatles", "Ticket to Ride", "Help!");
    let pepper = catalog.add_album(&beatles, "Sgt. Pepper");
    catalog.add_track(&pepper, "The Beatles", "A Day in the Life", "Sgt. Pepper");

    let nirvanna = catalog.add_artist("Nirvanna");
    let nevermind = catalog.add_album(&nirvanna, "Nevermind");
    catalog.add_track(&nevermind, "Nirvanna", "Lithium", "Nevermind");
    catalog.add_track(&nevermind, "Nirvanna", "Breed", "Nevermind");

    catalog
}
