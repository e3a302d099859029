//! Test-only GMA writer.

#![allow(dead_code)]

use std::io;
use std::sync::Mutex;

use async_trait::async_trait;
use rgma::{MemoryReader, ReadAt};

pub struct TestFile {
    pub name: String,
    pub crc: u32,
    pub content: Vec<u8>,
}

impl TestFile {
    pub fn new(name: &str, content: impl Into<Vec<u8>>) -> Self {
        let content = content.into();
        Self {
            name: name.to_string(),
            crc: content.iter().fold(0x1234_5678u32, |acc, &b| acc.rotate_left(5) ^ b as u32),
            content,
        }
    }
}

fn cstr(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(s.as_bytes());
    out.push(0);
}

/// Build a version 3 addon with the given description and files.
pub fn build_gma(description: &str, files: &[TestFile]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"GMAD");
    out.push(3);
    out.extend_from_slice(&76561198000000000u64.to_le_bytes());
    out.extend_from_slice(&1_700_000_000u64.to_le_bytes());
    cstr(&mut out, "");
    cstr(&mut out, "Test Addon");
    cstr(&mut out, description);
    cstr(&mut out, "tester");
    out.extend_from_slice(&1i32.to_le_bytes());
    for (i, f) in files.iter().enumerate() {
        out.extend_from_slice(&(i as u32 + 1).to_le_bytes());
        cstr(&mut out, &f.name);
        out.extend_from_slice(&(f.content.len() as u64).to_le_bytes());
        out.extend_from_slice(&f.crc.to_le_bytes());
    }
    out.extend_from_slice(&0u32.to_le_bytes());
    for f in files {
        out.extend_from_slice(&f.content);
    }
    // Trailing CRC of the whole addon, ignored by the decoder
    out.extend_from_slice(&0u32.to_le_bytes());
    out
}

/// Records every positional read.
pub struct RecordingReader {
    inner: MemoryReader,
    pub reads: Mutex<Vec<(u64, usize)>>,
}

impl RecordingReader {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            inner: MemoryReader::new(data),
            reads: Mutex::new(Vec::new()),
        }
    }

    pub fn reads(&self) -> Vec<(u64, usize)> {
        let mut reads = self.reads.lock().unwrap().clone();
        reads.sort();
        reads
    }
}

#[async_trait]
impl ReadAt for RecordingReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        self.reads.lock().unwrap().push((offset, buf.len()));
        self.inner.read_at(offset, buf).await
    }

    fn size(&self) -> u64 {
        self.inner.size()
    }
}
