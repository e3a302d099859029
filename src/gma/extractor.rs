use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::task::JoinSet;

use crate::error::{GmaError, Result};
use crate::io::ReadAt;

use super::parser::AddonParser;
use super::structures::{Addon, FileEntry};

/// Mode of the destination directory itself.
pub const DEST_DIR_MODE: u32 = 0o755;
/// Mode of directories created for entries.
pub const ENTRY_DIR_MODE: u32 = 0o750;
/// Mode of extracted files.
pub const FILE_MODE: u32 = 0o666;

/// GMA addon extractor
pub struct AddonExtractor<R: ReadAt> {
    parser: AddonParser<R>,
    confine_paths: bool,
}

impl<R: ReadAt + 'static> AddonExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: AddonParser::new(reader),
            confine_paths: false,
        }
    }

    /// Reject entries whose names are absolute or climb out with `..`.
    ///
    /// Off by default: entry names are used as given.
    pub fn confine_paths(mut self, confine: bool) -> Self {
        self.confine_paths = confine;
        self
    }

    /// Decode the addon header and file table
    pub async fn parse(&self) -> Result<Addon> {
        self.parser.parse().await
    }

    /// Read one file's payload into memory
    pub async fn read_file(&self, addon: &Addon, entry: &FileEntry) -> Result<Vec<u8>> {
        let offset = payload_offset(addon, entry)?;
        read_payload(self.parser.reader().as_ref(), offset, entry.size).await
    }

    /// Extract every file of `addon` below `dest`.
    ///
    /// One task is spawned per entry and all of them run to completion,
    /// even after a failure. If any failed, the first failure to complete
    /// is returned and the rest are dropped.
    pub async fn extract(&self, addon: &Addon, dest: &Path) -> Result<()> {
        create_dir(dest, DEST_DIR_MODE).await?;

        let mut tasks = JoinSet::new();
        for entry in &addon.files {
            let reader = Arc::clone(self.parser.reader());
            let offset = payload_offset(addon, entry);
            let entry = entry.clone();
            let dest = dest.to_path_buf();
            let confine = self.confine_paths;
            tasks.spawn(async move {
                extract_entry(reader.as_ref(), &entry, offset, &dest, confine).await
            });
        }

        let mut first_error = None;
        let mut failed = 0usize;
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined.unwrap_or_else(|e| Err(GmaError::Task(e.to_string())));
            if let Err(e) = outcome {
                log::debug!("extraction task failed: {}", e);
                failed += 1;
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }

        match first_error {
            Some(e) => {
                log::warn!("{} of {} files failed to extract", failed, addon.files.len());
                Err(e)
            }
            None => Ok(()),
        }
    }

    /// Write one file's payload to stdout
    pub async fn extract_to_stdout(&self, addon: &Addon, entry: &FileEntry) -> Result<()> {
        let data = self.read_file(addon, entry).await?;

        let mut stdout = tokio::io::stdout();
        stdout.write_all(&data).await?;
        stdout.flush().await?;

        Ok(())
    }
}

async fn extract_entry<R: ReadAt + ?Sized>(
    reader: &R,
    entry: &FileEntry,
    offset: io::Result<u64>,
    dest: &Path,
    confine: bool,
) -> Result<()> {
    let name = entry.path();
    if confine && !is_confined(&name) {
        return Err(GmaError::UnsafePath(entry.name.clone()));
    }
    let offset = offset?;

    let path = entry_path(dest, &name);
    if let Some(parent) = path.parent() {
        create_dir(parent, ENTRY_DIR_MODE).await?;
    }

    let data = read_payload(reader, offset, entry.size).await?;
    write_file(&path, &data).await?;

    log::info!("{}", path.display());
    Ok(())
}

fn payload_offset(addon: &Addon, entry: &FileEntry) -> io::Result<u64> {
    addon.data_offset(entry).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("offset of {:?} does not fit in 64 bits", entry.name),
        )
    })
}

async fn read_payload<R: ReadAt + ?Sized>(reader: &R, offset: u64, size: u64) -> Result<Vec<u8>> {
    // Catch corrupt sizes before allocating for them
    if offset.checked_add(size).is_none_or(|end| end > reader.size()) {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!(
                "{} bytes at offset {} run past the end of a {} byte source",
                size,
                offset,
                reader.size()
            ),
        )
        .into());
    }
    let len = usize::try_from(size)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "file too large for memory"))?;

    let mut buf = vec![0u8; len];
    reader.read_exact_at(offset, &mut buf).await?;
    Ok(buf)
}

/// Join an entry name onto `dest` component by component.
///
/// Root and prefix components are skipped so absolute names land inside
/// `dest`. `..` cancels the segment before it; one that would climb above
/// `dest` is kept and leaves it.
fn entry_path(dest: &Path, name: &Path) -> PathBuf {
    let mut path = dest.to_path_buf();
    let mut depth = 0usize;
    for component in name.components() {
        match component {
            Component::Normal(part) => {
                path.push(part);
                depth += 1;
            }
            Component::ParentDir if depth > 0 => {
                path.pop();
                depth -= 1;
            }
            Component::ParentDir => path.push(".."),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    path
}

/// Whether `name` stays below the directory it is joined onto.
fn is_confined(name: &Path) -> bool {
    let mut depth = 0usize;
    for component in name.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir if depth > 0 => depth -= 1,
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}

async fn create_dir(path: &Path, mode: u32) -> io::Result<()> {
    if path.as_os_str().is_empty() {
        return Ok(());
    }
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(mode);
    #[cfg(not(unix))]
    let _ = mode;
    builder.create(path).await
}

async fn write_file(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(FILE_MODE);

    let mut file = options.open(path).await?;
    file.write_all(data).await?;
    file.flush().await
}
