//! GMA addon decoder.
//!
//! This module walks the container front to back in a single pass,
//! reading from any source that implements the [`ReadAt`] trait.
//!
//! ## Layout
//!
//! 1. Magic `GMAD` and a one-byte format version
//! 2. Author Steam ID and timestamp (u64 LE each)
//! 3. Required-content strings until an empty one (version 2 and later)
//! 4. Name, description and author (null-terminated)
//! 5. Addon version (i32 LE)
//! 6. File entries until an id of 0
//! 7. File payloads, concatenated in entry order
//!
//! Nothing in the header points at the payloads: their position is
//! wherever the entry table ends, and each file's offset is the sum of
//! the sizes declared before it.

use std::io;
use std::sync::Arc;

use crate::error::{GmaError, Result};
use crate::io::{ReadAt, SourceCursor};

use super::description::Description;
use super::structures::*;

/// GMA addon parser.
///
/// Typically used through [`AddonExtractor`](super::AddonExtractor)
/// or [`parse_addon`] rather than directly.
pub struct AddonParser<R: ReadAt> {
    reader: Arc<R>,
}

impl<R: ReadAt> AddonParser<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self { reader }
    }

    /// Decode the whole header and entry table.
    ///
    /// # Errors
    ///
    /// [`GmaError::InvalidMagic`] or [`GmaError::UnsupportedVersion`] for
    /// input that is not a readable addon, [`GmaError::Io`] if the source
    /// fails or ends early. No partial addon is returned.
    pub async fn parse(&self) -> Result<Addon> {
        parse_addon(self.reader.as_ref()).await
    }

    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }
}

/// Decode an addon from the start of `source`.
pub async fn parse_addon<R: ReadAt + ?Sized>(source: &R) -> Result<Addon> {
    let mut cursor = SourceCursor::new(source);
    cursor.seek(0);

    let mut magic = [0u8; 4];
    cursor.read_exact(&mut magic).await?;
    if &magic != GMA_MAGIC {
        return Err(GmaError::InvalidMagic(magic));
    }

    let format_version = cursor.read_u8().await?;
    if format_version > GMA_VERSION {
        return Err(GmaError::UnsupportedVersion(format_version));
    }

    let author_steam_id = cursor.read_u64().await?;
    let timestamp = cursor.read_u64().await?;

    let mut required_content = String::new();
    if format_version >= REQUIRED_CONTENT_SINCE {
        loop {
            let s = cursor.read_cstring().await?;
            if s.is_empty() {
                break;
            }
            required_content.push_str(&s);
        }
    }

    let name = cursor.read_cstring().await?;
    let raw_description = cursor.read_cstring().await?;
    let (description, addon_type, tags) = Description::parse(&raw_description).into_parts();
    let author = cursor.read_cstring().await?;
    let version = cursor.read_i32().await?;

    let mut files = Vec::new();
    let mut offset = 0u64;
    while let Some(entry) = read_file_entry(&mut cursor, offset).await? {
        offset = offset.checked_add(entry.size).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("file sizes overflow at entry {:?}", entry.name),
            )
        })?;
        files.push(entry);
    }

    let file_block_offset = cursor.position();

    log::debug!(
        "parsed addon {:?}: format v{}, {} files, data at {}",
        name,
        format_version,
        files.len(),
        file_block_offset
    );

    Ok(Addon {
        format_version,
        author_steam_id,
        timestamp,
        required_content,
        name,
        description,
        addon_type,
        tags,
        author,
        version,
        files,
        file_block_offset,
    })
}

/// Read one entry of the file table.
///
/// Returns `Ok(None)` once the zero-id terminator has been consumed.
/// `relative_offset` is the running total of the sizes read so far.
pub async fn read_file_entry<R: ReadAt + ?Sized>(
    cursor: &mut SourceCursor<'_, R>,
    relative_offset: u64,
) -> Result<Option<FileEntry>> {
    let id = cursor.read_u32().await?;
    if id == 0 {
        return Ok(None);
    }

    let name = cursor.read_cstring_bytes().await?;
    let size = cursor.read_u64().await?;
    let crc = cursor.read_u32().await?;

    Ok(Some(FileEntry::new(id, name, size, crc, relative_offset)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryReader;

    fn header(version: u8) -> Vec<u8> {
        let mut b = Vec::new();
        b.extend_from_slice(GMA_MAGIC);
        b.push(version);
        b.extend_from_slice(&76561197960287930u64.to_le_bytes());
        b.extend_from_slice(&1_600_000_000u64.to_le_bytes());
        b
    }

    fn cstr(b: &mut Vec<u8>, s: &str) {
        b.extend_from_slice(s.as_bytes());
        b.push(0);
    }

    fn entry(b: &mut Vec<u8>, id: u32, name: &str, size: u64, crc: u32) {
        b.extend_from_slice(&id.to_le_bytes());
        cstr(b, name);
        b.extend_from_slice(&size.to_le_bytes());
        b.extend_from_slice(&crc.to_le_bytes());
    }

    fn sample_v3() -> Vec<u8> {
        let mut b = header(3);
        cstr(&mut b, "base");
        cstr(&mut b, "extra");
        cstr(&mut b, "");
        cstr(&mut b, "My Addon");
        cstr(&mut b, r#"{"description":"Fun map","type":"map","tags":["fun","build"]}"#);
        cstr(&mut b, "someone");
        b.extend_from_slice(&7i32.to_le_bytes());
        entry(&mut b, 1, "maps/a.bsp", 10, 0x1111);
        entry(&mut b, 2, "lua/b.lua", 20, 0x2222);
        entry(&mut b, 3, "empty.txt", 0, 0);
        entry(&mut b, 4, "c.txt", 5, 0x4444);
        b.extend_from_slice(&0u32.to_le_bytes());
        b
    }

    #[tokio::test]
    async fn parses_version_3_header_and_table() {
        let bytes = sample_v3();
        let table_end = bytes.len() as u64;
        let mut bytes = bytes;
        bytes.extend(std::iter::repeat_n(0xAB, 35));
        let src = Arc::new(MemoryReader::new(bytes));

        let addon = AddonParser::new(src).parse().await.unwrap();
        assert_eq!(addon.format_version, 3);
        assert_eq!(addon.author_steam_id, 76561197960287930);
        assert_eq!(addon.timestamp, 1_600_000_000);
        assert_eq!(addon.required_content, "baseextra");
        assert_eq!(addon.name, "My Addon");
        assert_eq!(addon.description, "Fun map");
        assert_eq!(addon.addon_type, Some(AddonType::Map));
        assert_eq!(addon.tags, vec![AddonTag::Fun, AddonTag::Build]);
        assert_eq!(addon.author, "someone");
        assert_eq!(addon.version, 7);
        assert_eq!(addon.file_block_offset, table_end);

        let offsets: Vec<_> = addon.files.iter().map(|f| f.relative_offset).collect();
        assert_eq!(offsets, vec![0, 10, 30, 30]);
        let ids: Vec<_> = addon.files.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(addon.files[1].name, "lua/b.lua");
        assert_eq!(addon.files[1].crc, 0x2222);
    }

    #[tokio::test]
    async fn version_1_has_no_required_content() {
        let mut b = header(1);
        cstr(&mut b, "Old");
        cstr(&mut b, "plain text notes");
        cstr(&mut b, "author");
        b.extend_from_slice(&1i32.to_le_bytes());
        entry(&mut b, 1, "a.txt", 3, 0);
        b.extend_from_slice(&0u32.to_le_bytes());
        let end = b.len() as u64;
        b.extend_from_slice(b"abc");

        let addon = parse_addon(&MemoryReader::new(b)).await.unwrap();
        assert_eq!(addon.required_content, "");
        assert_eq!(addon.name, "Old");
        assert_eq!(addon.description, "plain text notes");
        assert_eq!(addon.addon_type, None);
        assert!(addon.tags.is_empty());
        assert_eq!(addon.files.len(), 1);
        assert_eq!(addon.file_block_offset, end);
    }

    #[tokio::test]
    async fn empty_table_puts_block_right_after_terminator() {
        let mut b = header(2);
        cstr(&mut b, "");
        cstr(&mut b, "n");
        cstr(&mut b, "d");
        cstr(&mut b, "a");
        b.extend_from_slice(&0i32.to_le_bytes());
        b.extend_from_slice(&0u32.to_le_bytes());
        let len = b.len() as u64;

        let addon = parse_addon(&MemoryReader::new(b)).await.unwrap();
        assert!(addon.files.is_empty());
        assert_eq!(addon.file_block_offset, len);
    }

    #[tokio::test]
    async fn bad_magic_is_rejected() {
        let mut b = sample_v3();
        b[..4].copy_from_slice(b"XXXX");
        let err = parse_addon(&MemoryReader::new(b)).await.unwrap_err();
        assert!(matches!(err, GmaError::InvalidMagic(m) if &m == b"XXXX"));
        assert!(err.is_format_error());
    }

    #[tokio::test]
    async fn newer_version_is_rejected_before_metadata() {
        // Nothing follows the version byte, so reaching further would be an I/O error
        let mut b = GMA_MAGIC.to_vec();
        b.push(99);
        let err = parse_addon(&MemoryReader::new(b)).await.unwrap_err();
        assert!(matches!(err, GmaError::UnsupportedVersion(99)));
    }

    #[tokio::test]
    async fn truncation_is_an_io_error() {
        let full = sample_v3();
        // Cut inside the last entry's size field
        let cut = full.len() - 4 - 4 - 6;
        let err = parse_addon(&MemoryReader::new(full[..cut].to_vec()))
            .await
            .unwrap_err();
        assert!(matches!(err, GmaError::Io(ref e) if e.kind() == io::ErrorKind::UnexpectedEof));

        let err = parse_addon(&MemoryReader::new(b"GM".to_vec())).await.unwrap_err();
        assert!(matches!(err, GmaError::Io(_)));
    }

    #[tokio::test]
    async fn overflowing_sizes_are_invalid_data() {
        let mut b = header(1);
        cstr(&mut b, "n");
        cstr(&mut b, "d");
        cstr(&mut b, "a");
        b.extend_from_slice(&1i32.to_le_bytes());
        entry(&mut b, 1, "huge.bin", u64::MAX, 0);
        entry(&mut b, 2, "one.bin", 1, 0);
        entry(&mut b, 3, "two.bin", 1, 0);
        b.extend_from_slice(&0u32.to_le_bytes());

        let err = parse_addon(&MemoryReader::new(b)).await.unwrap_err();
        assert!(matches!(err, GmaError::Io(ref e) if e.kind() == io::ErrorKind::InvalidData));
    }

    #[tokio::test]
    async fn non_utf8_names_keep_their_bytes() {
        let mut b = header(1);
        cstr(&mut b, "n");
        cstr(&mut b, "d");
        cstr(&mut b, "a");
        b.extend_from_slice(&1i32.to_le_bytes());
        b.extend_from_slice(&1u32.to_le_bytes());
        b.extend_from_slice(b"caf\xe9.txt\0");
        b.extend_from_slice(&0u64.to_le_bytes());
        b.extend_from_slice(&0u32.to_le_bytes());
        b.extend_from_slice(&0u32.to_le_bytes());

        let addon = parse_addon(&MemoryReader::new(b)).await.unwrap();
        assert_eq!(addon.files[0].raw_name, b"caf\xe9.txt");
        assert_eq!(addon.files[0].name, "caf\u{fffd}.txt");
    }

    #[tokio::test]
    async fn missing_terminator_is_an_io_error() {
        let mut b = sample_v3();
        b.truncate(b.len() - 4);
        let err = parse_addon(&MemoryReader::new(b)).await.unwrap_err();
        assert!(matches!(err, GmaError::Io(_)));
    }
}
