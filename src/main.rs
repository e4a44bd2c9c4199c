//! PlaySync - iTunes playlist sync for media servers
//!
//! Resolves tracks from an exported iTunes library against a media
//! server music catalog and recreates the playlists server-side.

use anyhow::Result;
use clap::{Parser, Subcommand};
use playsync::cache::ResolutionCache;
use playsync::catalog::mediaserver::MediaServerCatalog;
use playsync::catalog::{Catalog, PlaylistSink};
use playsync::config::Config;
use playsync::dedup;
use playsync::itunes::ItunesLibrary;
use playsync::resolver::TrackResolver;
use playsync::sync::PlaylistSyncer;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve and push playlists from the library export to the server
    Sync {
        /// Playlist names to sync (defaults to the configured selection)
        #[arg(long = "playlist")]
        playlists: Vec<String>,

        /// Drop cached resolutions for the selection and recompute
        #[arg(long)]
        force: bool,
    },
    /// Report near-duplicate entries in a flat text file (one per line)
    Analyze {
        file: PathBuf,

        /// Similarity cutoff; pairs scoring strictly above it are reported
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Drop the cached resolution for one playlist
    Invalidate { playlist: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("🎵 PlaySync v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;

    match args.command {
        Command::Sync { playlists, force } => {
            let selection = if playlists.is_empty() {
                config.playlists.clone()
            } else {
                playlists
            };
            if selection.is_empty() {
                anyhow::bail!("no playlists selected; set `playlists` in the config or pass --playlist");
            }

            let catalog = Arc::new(MediaServerCatalog::new(&config));
            if !catalog.health_check().await {
                anyhow::bail!(
                    "media server not responding at {}:{}",
                    config.server_ip,
                    config.server_port
                );
            }

            let library = ItunesLibrary::load(Path::new(&config.library_xml_path))?;

            let cache = ResolutionCache::new(PathBuf::from(&config.cache_db_path))?;
            if force {
                for name in &selection {
                    cache.invalidate(name)?;
                }
            }

            let resolver =
                TrackResolver::connect(Arc::clone(&catalog) as Arc<dyn Catalog>).await?;
            if resolver.catalog_size() == 0 {
                warn!("⚠️ The catalog has no tracks; the brute-force fallback has nothing to offer");
            }

            let syncer = PlaylistSyncer::new(resolver, cache, catalog as Arc<dyn PlaylistSink>);
            syncer.run(&library, &selection).await?;
            info!("✅ Done.");
        }
        Command::Analyze { file, threshold } => {
            let threshold = threshold.unwrap_or(config.duplicate_threshold);
            let (_, pairs) = dedup::analyze_file(&file, threshold)?;
            info!("✅ {} near-duplicate pairs above {:.2}", pairs.len(), threshold);
        }
        Command::Invalidate { playlist } => {
            let cache = ResolutionCache::new(PathBuf::from(&config.cache_db_path))?;
            cache.invalidate(&playlist)?;
            info!("✅ Dropped cached resolution for '{}'", playlist);
        }
    }

    Ok(())
}
