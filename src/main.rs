use anyhow::{Result, anyhow};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use playgen::playlist::PlaylistSettings;
use playgen::{ExtractorRegistry, LibraryLoader, PlaylistService, load_config};

#[derive(Parser)]
#[command(name = "playgen")]
#[command(about = "Shuffle song libraries and show what each playlist plays next")]
#[command(version)]
struct Args {
    /// Path to the playlist definitions JSON file
    #[arg(short = 'c', long = "config", default_value = "playlists.json")]
    config_file: String,

    /// Number of songs to draw from each playlist
    #[arg(short = 'n', long = "count", default_value_t = 10)]
    count: usize,

    /// Song index to request before drawing (may be repeated)
    #[arg(short = 'r', long = "request")]
    requests: Vec<usize>,

    /// Song details extractor to use instead of the configured one
    #[arg(short = 'e', long = "extractor")]
    extractor: Option<String>,

    /// Quiet mode - only warnings and errors are logged
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode - log every candidate and relocation
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn init_logging(args: &Args) {
    let default_level = if args.quiet {
        "warn"
    } else if args.verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    if !std::path::Path::new(&args.config_file).exists() {
        eprintln!(
            "Error: Playlist definitions file '{}' not found.",
            args.config_file
        );
        eprintln!("Please ensure the file exists or specify a different file with --config.");
        return Err(anyhow!("Definitions file '{}' not found", args.config_file));
    }

    // Load configuration from .env
    let mut config = load_config()?;
    if let Some(extractor) = &args.extractor {
        config.song_details = extractor.clone();
    }

    let registry = ExtractorRegistry::with_builtins();
    let extractor = registry.get(&config.song_details).ok_or_else(|| {
        anyhow!(
            "Unknown song details extractor '{}' (available: {})",
            config.song_details,
            registry.names().join(", ")
        )
    })?;

    let service = PlaylistService::new(config, LibraryLoader::new(extractor));

    let definitions = PlaylistSettings::load_all_from_file(&args.config_file)?;
    println!("Loaded {} playlist definitions", definitions.len());
    for settings in definitions {
        service.create(settings)?;
    }

    let mut ready = 0;
    for (name, result) in service.load_all() {
        match result {
            Ok(report) => {
                println!("✓ {}: {} songs", name, report.song_count);
                ready += 1;
            }
            Err(e) => eprintln!("✗ {}: {}", name, e),
        }
    }

    if ready == 0 {
        return Err(anyhow!("No playlist could be loaded"));
    }

    for name in service.names() {
        service.with_playlist(&name, |playlist| {
            if playlist.count() == 0 {
                return;
            }

            println!("\n{}", playlist.name());
            println!("{}", "=".repeat(playlist.name().len()));
            if !playlist.settings().description.is_empty() {
                println!("{}", playlist.settings().description);
            }

            for &index in &args.requests {
                match playlist.add_priority_request(index) {
                    Ok(pending) => println!("   Requested song {index} ({pending} pending)"),
                    Err(e) => eprintln!("   Request for song {index} rejected: {e}"),
                }
            }

            for position in 1..=args.count {
                let Some(selection) = playlist.next_song() else {
                    break;
                };
                let song = &selection.song;
                let artist = song
                    .artist
                    .as_deref()
                    .map(|a| format!(" by {a}"))
                    .unwrap_or_default();
                let year = song
                    .year
                    .as_deref()
                    .map(|y| format!(" [{y}]"))
                    .unwrap_or_default();
                println!(
                    "   {}. \"{}\"{}{} (#{})",
                    position,
                    song.display_title(),
                    artist,
                    year,
                    selection.index
                );
            }

            println!("   History: {} songs", playlist.song_history().len());
        })?;
    }

    Ok(())
}
