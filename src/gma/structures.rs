use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// File identifier: ASCII `GMAD`.
pub const GMA_MAGIC: &[u8; 4] = b"GMAD";

/// Highest format version this decoder understands.
pub const GMA_VERSION: u8 = 3;

/// First format version that carries the required-content list.
pub const REQUIRED_CONTENT_SINCE: u8 = 2;

/// Raised when a type or tag name is not part of the fixed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownName(pub String);

impl fmt::Display for UnknownName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown name: {:?}", self.0)
    }
}

impl std::error::Error for UnknownName {}

/// Declares a closed vocabulary enum that parses case-insensitively from
/// its lowercase wire name.
macro_rules! vocabulary {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownName;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s))
                    .ok_or_else(|| UnknownName(s.to_string()))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

vocabulary! {
    /// Addon category shown in the workshop.
    AddonType {
        Gamemode => "gamemode",
        Map => "map",
        Weapon => "weapon",
        Vehicle => "vehicle",
        Npc => "npc",
        Entity => "entity",
        Tool => "tool",
        Effects => "effects",
        Model => "model",
        ServerContent => "servercontent",
    }
}

vocabulary! {
    /// Workshop tag.
    AddonTag {
        Fun => "fun",
        Roleplay => "roleplay",
        Scenic => "scenic",
        Movie => "movie",
        Realism => "realism",
        Cartoon => "cartoon",
        Water => "water",
        Comic => "comic",
        Build => "build",
    }
}

/// One file in the addon's entry table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Nonzero; zero terminates the table.
    pub id: u32,
    /// Name for display; invalid UTF-8 is replaced.
    pub name: String,
    /// Name bytes exactly as stored, used for the output path.
    pub raw_name: Vec<u8>,
    pub size: u64,
    /// Stored, never verified.
    pub crc: u32,
    /// Offset of the payload from [`Addon::file_block_offset`].
    pub relative_offset: u64,
}

impl FileEntry {
    pub fn new(id: u32, raw_name: Vec<u8>, size: u64, crc: u32, relative_offset: u64) -> Self {
        Self {
            id,
            name: String::from_utf8_lossy(&raw_name).into_owned(),
            raw_name,
            size,
            crc,
            relative_offset,
        }
    }

    /// Relative path of the entry, from the stored bytes.
    pub fn path(&self) -> PathBuf {
        #[cfg(unix)]
        {
            use std::os::unix::ffi::OsStrExt;
            PathBuf::from(std::ffi::OsStr::from_bytes(&self.raw_name))
        }

        #[cfg(not(unix))]
        {
            PathBuf::from(&self.name)
        }
    }
}

/// Parsed GMA addon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Addon {
    pub format_version: u8,
    /// 64-bit Steam ID of the author.
    pub author_steam_id: u64,
    /// Last update, seconds since the epoch.
    pub timestamp: u64,
    /// Required-content strings, concatenated.
    pub required_content: String,
    pub name: String,
    pub description: String,
    pub addon_type: Option<AddonType>,
    pub tags: Vec<AddonTag>,
    pub author: String,
    pub version: i32,
    /// Entries in declaration order.
    pub files: Vec<FileEntry>,
    /// Absolute offset where the concatenated payloads begin.
    pub file_block_offset: u64,
}

impl Addon {
    /// Sum of all payload sizes.
    pub fn total_size(&self) -> u64 {
        self.files.iter().fold(0u64, |acc, f| acc.saturating_add(f.size))
    }

    /// Look up an entry by its exact name.
    pub fn find_file(&self, name: &str) -> Option<&FileEntry> {
        self.files.iter().find(|f| f.raw_name == name.as_bytes())
    }

    /// Absolute source offset of an entry's payload, `None` if it does
    /// not fit in a `u64`.
    pub fn data_offset(&self, entry: &FileEntry) -> Option<u64> {
        self.file_block_offset.checked_add(entry.relative_offset)
    }
}
