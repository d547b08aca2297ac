/// # Directory Archiver
///
/// Packs a directory tree into a single zip file.
///
/// ## Entry names
///
/// Entry names are relative to the directory's parent, so archiving
/// `/out/run1` produces `run1/a.txt`, `run1/empty/`, ... With
/// `include_top_dir = false` the `run1/` component is dropped as well.
/// Empty leaf directories are stored as zero-length `name/` entries so they
/// survive extraction.
///
/// ## Example
///
/// ```rust,no_run
/// use meica_gear::archive::archive_directory;
/// use std::path::Path;
///
/// // Writes /out/run1.zip
/// archive_directory(Path::new("/out/run1"), None, true, true)?;
/// # Ok::<(), meica_gear::errors::ArchiveError>(())
/// ```

use std::fs::{self, File};
use std::io::{self, Seek, Write};
use std::path::{Component, Path, PathBuf};

use log::debug;
use walkdir::WalkDir;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

use crate::errors::ArchiveError;

/// Extension appended to the source path when no destination is given.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Entry compression used uniformly across one archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    Deflate,
    Store,
}

impl Compression {
    fn method(self) -> CompressionMethod {
        match self {
            Compression::Deflate => CompressionMethod::Deflated,
            Compression::Store => CompressionMethod::Stored,
        }
    }
}

impl From<bool> for Compression {
    fn from(use_compression: bool) -> Self {
        if use_compression {
            Compression::Deflate
        } else {
            Compression::Store
        }
    }
}

/// What ended up in a finished archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub path: PathBuf,
    pub files: usize,
    pub directories: usize,
}

impl ArchiveSummary {
    pub fn entries(&self) -> usize {
        self.files + self.directories
    }
}

/// One directory to be compressed.
#[derive(Debug, Clone)]
pub struct ArchiveJob {
    source: PathBuf,
    destination: Option<PathBuf>,
    include_top_dir: bool,
    compression: Compression,
}

impl ArchiveJob {
    pub fn new<P: AsRef<Path>>(source: P) -> Self {
        // Rebuilding from components drops trailing separators.
        let source: PathBuf = source.as_ref().components().collect();
        Self {
            source,
            destination: None,
            include_top_dir: true,
            compression: Compression::Deflate,
        }
    }

    pub fn destination<P: AsRef<Path>>(mut self, dest: P) -> Self {
        self.destination = Some(dest.as_ref().to_path_buf());
        self
    }

    pub fn include_top_dir(mut self, include: bool) -> Self {
        self.include_top_dir = include;
        self
    }

    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Destination archive path, `<source>.zip` unless set explicitly.
    pub fn destination_path(&self) -> PathBuf {
        match &self.destination {
            Some(d) => d.clone(),
            None => {
                let mut s = self.source.as_os_str().to_os_string();
                s.push(".");
                s.push(ARCHIVE_EXTENSION);
                PathBuf::from(s)
            }
        }
    }

    /// Name of the source directory itself, used as the top-level prefix.
    fn top_dir_name(&self) -> Option<String> {
        match self.source.components().next_back() {
            Some(Component::Normal(name)) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        }
    }

    /// Archive key for a path below the source directory.
    ///
    /// Returns `None` for the source directory itself when the top-level
    /// directory is not included (it has no name inside the archive).
    fn entry_key(&self, path: &Path) -> Result<Option<String>, ArchiveError> {
        let relative = path.strip_prefix(&self.source)?;
        let mut parts: Vec<String> = Vec::new();
        if self.include_top_dir {
            if let Some(top) = self.top_dir_name() {
                parts.push(top);
            }
        }
        parts.extend(
            relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned()),
        );
        if parts.is_empty() {
            return Ok(None);
        }
        Ok(Some(normalize_case(parts.join("/"))))
    }

    /// Write the archive. The source is checked before the destination is
    /// opened, so an invalid source never creates or truncates the archive.
    pub fn run(&self) -> Result<ArchiveSummary, ArchiveError> {
        if !self.source.is_dir() {
            return Err(ArchiveError::NotADirectory(self.source.clone()));
        }

        let dest = self.destination_path();
        let file = File::create(&dest)?;
        let written = WrittenArchive::new(&file, &dest)?;
        let mut zip = ZipWriter::new(file);
        let summary = self.write_entries(&mut zip, &dest, &written)?;

        let mut file = zip.finish()?;
        file.flush()?;
        file.sync_all()?;

        debug!(
            "wrote {} ({} files, {} empty directories)",
            dest.display(),
            summary.files,
            summary.directories
        );
        Ok(summary)
    }

    fn write_entries<W: Write + Seek>(
        &self,
        zip: &mut ZipWriter<W>,
        dest: &Path,
        written: &WrittenArchive,
    ) -> Result<ArchiveSummary, ArchiveError> {
        let options: SimpleFileOptions =
            SimpleFileOptions::default().compression_method(self.compression.method());

        let mut summary = ArchiveSummary {
            path: dest.to_path_buf(),
            files: 0,
            directories: 0,
        };

        for entry in WalkDir::new(&self.source).sort_by_file_name() {
            let entry = entry?;
            let path = entry.path();

            if entry.file_type().is_dir() {
                if !is_empty_dir(path, written)? {
                    continue;
                }
                if let Some(key) = self.entry_key(path)? {
                    zip.add_directory(format!("{}/", key).as_str(), options)?;
                    summary.directories += 1;
                }
            } else if path.is_file() {
                // Symlinks resolving to files are stored by content.
                if written.is(path) {
                    continue;
                }
                let Some(key) = self.entry_key(path)? else {
                    continue;
                };
                let mut src = File::open(path)?;
                let metadata = src.metadata()?;
                let file_options = entry_options(options, &metadata);
                zip.start_file(key.as_str(), file_options)?;
                io::copy(&mut src, zip)?;
                summary.files += 1;
            }
        }

        Ok(summary)
    }
}

/// The archive being written, recognised by file identity rather than by how
/// its path is spelled.
struct WrittenArchive {
    #[cfg(unix)]
    id: (u64, u64),
    #[cfg(not(unix))]
    path: PathBuf,
}

impl WrittenArchive {
    #[cfg(unix)]
    fn new(file: &File, _dest: &Path) -> io::Result<Self> {
        use std::os::unix::fs::MetadataExt;
        let metadata = file.metadata()?;
        Ok(Self {
            id: (metadata.dev(), metadata.ino()),
        })
    }

    #[cfg(not(unix))]
    fn new(_file: &File, dest: &Path) -> io::Result<Self> {
        Ok(Self {
            path: fs::canonicalize(dest)?,
        })
    }

    /// Whether `path` (after following symlinks) is the archive itself.
    #[cfg(unix)]
    fn is(&self, path: &Path) -> bool {
        use std::os::unix::fs::MetadataExt;
        fs::metadata(path)
            .map(|m| (m.dev(), m.ino()) == self.id)
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    fn is(&self, path: &Path) -> bool {
        fs::canonicalize(path)
            .map(|p| p == self.path)
            .unwrap_or(false)
    }
}

/// A directory holding nothing but the archive being written is empty.
fn is_empty_dir(path: &Path, written: &WrittenArchive) -> Result<bool, ArchiveError> {
    for entry in fs::read_dir(path)? {
        if !written.is(&entry?.path()) {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(unix)]
fn entry_options(options: SimpleFileOptions, metadata: &fs::Metadata) -> SimpleFileOptions {
    use std::os::unix::fs::PermissionsExt;
    options
        .large_file(metadata.len() >= u32::MAX as u64)
        .unix_permissions(metadata.permissions().mode())
}

#[cfg(not(unix))]
fn entry_options(options: SimpleFileOptions, metadata: &fs::Metadata) -> SimpleFileOptions {
    options.large_file(metadata.len() >= u32::MAX as u64)
}

/// Case-fold entry names on case-insensitive platforms so the same tree gives
/// the same names everywhere. No-op elsewhere.
#[cfg(windows)]
pub fn normalize_case(key: String) -> String {
    key.to_lowercase()
}

#[cfg(not(windows))]
pub fn normalize_case(key: String) -> String {
    key
}

/// Zip `source_dir` into `dest_archive` (default `<source_dir>.zip`).
pub fn archive_directory(
    source_dir: &Path,
    dest_archive: Option<&Path>,
    include_top_dir: bool,
    use_compression: bool,
) -> Result<ArchiveSummary, ArchiveError> {
    let mut job = ArchiveJob::new(source_dir)
        .include_top_dir(include_top_dir)
        .compression(Compression::from(use_compression));
    if let Some(dest) = dest_archive {
        job = job.destination(dest);
    }
    job.run()
}
