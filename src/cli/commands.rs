use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "facematch", about = "Match faces against a live gallery of known identities")]
pub struct Cli {
    /// Gallery directory of known-identity images (overrides FACEMATCH_GALLERY_DIR)
    #[arg(long, global = true)]
    pub gallery: Option<PathBuf>,
    /// Feature extractor: thumbnail or http (overrides FACEMATCH_EXTRACTOR)
    #[arg(long, global = true)]
    pub extractor: Option<String>,
    /// Embedding service URL for the http extractor (overrides FACEMATCH_EXTRACTOR_URL)
    #[arg(long, global = true)]
    pub extractor_url: Option<String>,
    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Match a face image against the gallery
    Verify {
        /// Query image (jpg or png)
        image: PathBuf,
        /// Maximum cosine distance accepted as a match
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Add a face to the gallery under the given name
    Enroll {
        name: String,
        image: PathBuf,
    },
    /// List gallery identities
    List,
    /// Delete an identity's gallery images
    Forget {
        name: String,
    },
    /// Load the gallery and keep ingesting new images until Ctrl-C
    Watch {
        /// Settle delay in milliseconds (overrides FACEMATCH_SETTLE_MS)
        #[arg(long)]
        settle_ms: Option<u64>,
    },
}
