use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while packing a directory into a zip archive
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Walkdir error: {0}")]
    Walkdir(#[from] walkdir::Error),

    #[error("Strip prefix error: {0}")]
    StripPrefix(#[from] std::path::StripPrefixError),
}
