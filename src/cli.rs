use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use walkdir::WalkDir;

use crate::batch::BatchFile;
use crate::error::{Result, SubfluxError};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server
    Serve {
        /// Port to listen on (overrides the configuration)
        #[arg(short, long)]
        port: Option<u16>,

        /// Run in development mode (no credit billing)
        #[arg(long)]
        dev: bool,
    },

    /// Translate a single SRT file locally
    Translate {
        /// Input SRT file
        #[arg(short, long)]
        input: PathBuf,

        /// Output SRT file (defaults to <stem>_<target>.srt next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Target language code
        #[arg(short, long)]
        target_lang: String,

        /// Source language code (auto-detected when omitted)
        #[arg(short, long)]
        source_lang: Option<String>,

        /// Quality tier: standard or premium
        #[arg(long, default_value = "standard")]
        tier: String,

        /// Translation service: openai, gemini or ollama
        #[arg(long)]
        service: Option<String>,
    },

    /// Translate every SRT file under a directory into one zip archive
    Batch {
        /// Input directory containing SRT files
        #[arg(short = 'd', long)]
        input_dir: PathBuf,

        /// Target language code
        #[arg(short, long)]
        target_lang: String,

        /// Output zip archive
        #[arg(short, long)]
        output: PathBuf,

        /// Source language code (auto-detected when omitted)
        #[arg(short, long)]
        source_lang: Option<String>,

        /// Translation service: openai, gemini or ollama
        #[arg(long)]
        service: Option<String>,
    },

    /// Show the credit cost of translating a file
    Estimate {
        /// Input SRT file
        #[arg(short, long)]
        input: PathBuf,

        /// Quality tier: standard or premium
        #[arg(long, default_value = "standard")]
        tier: String,
    },

    /// Write the default configuration file
    InitConfig {
        /// Destination path
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Collect `*.srt` files below `dir`, named by their path relative to it
pub fn collect_subtitle_files(dir: &Path) -> Result<Vec<BatchFile>> {
    if !dir.is_dir() {
        return Err(SubfluxError::Validation(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .map_or(false, |ext| ext.eq_ignore_ascii_case("srt"))
        })
        .collect();
    paths.sort();

    paths
        .into_iter()
        .map(|path| {
            let relative = pathdiff::diff_paths(&path, dir).unwrap_or_else(|| path.clone());
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("_");
            Ok(BatchFile::new(name, std::fs::read(&path)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_batch_command() {
        let args = Args::try_parse_from(["subflux", "batch", "-d", "subs", "-t", "cs", "-o", "out.zip"]).unwrap();
        match args.command {
            Commands::Batch { input_dir, target_lang, output, .. } => {
                assert_eq!(input_dir, PathBuf::from("subs"));
                assert_eq!(target_lang, "cs");
                assert_eq!(output, PathBuf::from("out.zip"));
            }
            _ => panic!("expected batch command"),
        }
    }

    #[test]
    fn collects_nested_srt_files_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("s01")).unwrap();
        std::fs::write(dir.path().join("s01/e01.srt"), "1\n00:00:01,000 --> 00:00:02,000\nHi\n").unwrap();
        std::fs::write(dir.path().join("movie.SRT"), "").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "skip").unwrap();

        let files = collect_subtitle_files(dir.path()).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["movie.SRT", "s01_e01.srt"]);
        assert!(!files[1].data.is_empty());
    }

    #[test]
    fn rejects_missing_directory() {
        assert!(collect_subtitle_files(Path::new("/definitely/not/here")).is_err());
    }
}
