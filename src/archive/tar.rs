//! Streaming USTAR reader
//!
//! Reads 512-byte headers directly so that checksum handling stays under our
//! control: a stored checksum of `0` is accepted as-is, while any other
//! mismatch marks the header invalid and it is skipped.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use tracing::{debug, warn};

use super::{EntryKind, ExtractedEntry};
use crate::core::{NccError, NccResult};
use crate::utils::is_safe_path;

/// Size of a header or data block
pub const BLOCK_SIZE: usize = 512;

/// Largest chunk copied into an output file at once
const CHUNK_SIZE: usize = 8192;

const CHECKSUM_RANGE: std::ops::Range<usize> = 148..156;

/// Compression wrapping a tar stream, detected from leading magic bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Bzip2,
}

impl Compression {
    /// Detect compression from the first bytes of a file
    pub fn detect(head: &[u8]) -> Self {
        if head.starts_with(&[0x1f, 0x8b]) {
            Compression::Gzip
        } else if head.starts_with(b"BZh") {
            Compression::Bzip2
        } else {
            Compression::None
        }
    }
}

/// A parsed tar header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TarHeader {
    pub name: String,
    pub mode: u32,
    pub size: u64,
    pub type_flag: u8,
    pub link_name: String,
}

impl TarHeader {
    /// Parse a header block, returning `None` when it is invalid
    pub fn parse(block: &[u8; BLOCK_SIZE]) -> Option<Self> {
        let stored = parse_octal(&block[CHECKSUM_RANGE])?;
        if stored != 0 && stored != header_checksum(block) {
            return None;
        }

        let mut name = field_str(&block[0..100]);
        let prefix = field_str(&block[345..500]);
        if !prefix.is_empty() {
            name = format!("{}/{}", prefix, name);
        }

        if name.is_empty() {
            return None;
        }

        Some(Self {
            name,
            mode: parse_octal(&block[100..108]).unwrap_or(0) as u32,
            size: parse_octal(&block[124..136])?,
            type_flag: block[156],
            link_name: field_str(&block[157..257]),
        })
    }

    pub fn is_directory(&self) -> bool {
        self.type_flag == b'5'
    }

    pub fn is_regular_file(&self) -> bool {
        self.type_flag == b'0' || self.type_flag == 0
    }

    /// Size of the data area including padding to the next block boundary
    pub fn padded_size(&self) -> u64 {
        self.size + padding(self.size)
    }
}

/// Sum of all header bytes, with the checksum field counted as ASCII spaces
pub fn header_checksum(block: &[u8; BLOCK_SIZE]) -> u64 {
    block
        .iter()
        .enumerate()
        .map(|(i, b)| {
            if CHECKSUM_RANGE.contains(&i) {
                b' ' as u64
            } else {
                *b as u64
            }
        })
        .sum()
}

fn padding(size: u64) -> u64 {
    let block = BLOCK_SIZE as u64;
    (block - size % block) % block
}

fn field_str(field: &[u8]) -> String {
    let end = field.iter().position(|b| *b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

fn parse_octal(field: &[u8]) -> Option<u64> {
    let text = field_str(field);
    let text = text.trim_matches(|c: char| c == ' ' || c == '\0');
    if text.is_empty() {
        return Some(0);
    }
    u64::from_str_radix(text, 8).ok()
}

/// A block consisting only of NUL or whitespace marks the end of the archive
fn is_end_block(block: &[u8; BLOCK_SIZE]) -> bool {
    block
        .iter()
        .all(|b| matches!(b, 0 | b' ' | b'\t' | b'\n' | b'\r' | 0x0b))
}

/// Extract a tar archive, transparently decompressing gzip or bzip2 input
pub fn extract(archive_path: &Path, destination: &Path) -> NccResult<Vec<ExtractedEntry>> {
    let file = File::open(archive_path).map_err(|e| {
        NccError::operation(format!(
            "Failed to open tar archive {}: {}",
            archive_path.display(),
            e
        ))
    })?;

    let mut reader = BufReader::new(file);
    let compression = Compression::detect(reader.fill_buf()?);
    debug!("Extracting {} ({:?})", archive_path.display(), compression);

    match compression {
        Compression::Gzip => extract_stream(GzDecoder::new(reader), destination),
        Compression::Bzip2 => extract_stream(BzDecoder::new(reader), destination),
        Compression::None => extract_stream(reader, destination),
    }
}

/// Extract an uncompressed tar stream into a directory
pub fn extract_stream<R: Read>(mut reader: R, destination: &Path) -> NccResult<Vec<ExtractedEntry>> {
    fs::create_dir_all(destination).map_err(|e| {
        NccError::operation(format!(
            "Failed to create destination {}: {}",
            destination.display(),
            e
        ))
    })?;

    let mut entries = Vec::new();
    let mut block = [0u8; BLOCK_SIZE];

    loop {
        if !read_block(&mut reader, &mut block)? {
            break;
        }

        if is_end_block(&block) {
            break;
        }

        let header = match TarHeader::parse(&block) {
            Some(header) => header,
            None => {
                warn!("Skipping tar header with an invalid checksum");
                continue;
            }
        };

        let relative = PathBuf::from(&header.name);
        if !is_safe_path(&relative) {
            warn!("Skipping tar entry outside of destination: {}", header.name);
            skip(&mut reader, header.padded_size())?;
            continue;
        }
        let target = destination.join(&relative);

        if header.is_directory() {
            create_dir(&target)?;
            entries.push(ExtractedEntry {
                relative_path: relative,
                kind: EntryKind::Directory,
                size: 0,
            });
        } else if header.is_regular_file() {
            if let Some(parent) = target.parent() {
                create_dir(parent)?;
            }
            write_file(&mut reader, &target, header.size)?;
            apply_mode(&target, header.mode);
            skip(&mut reader, padding(header.size))?;
            entries.push(ExtractedEntry {
                relative_path: relative,
                kind: EntryKind::File,
                size: header.size,
            });
        } else {
            debug!(
                "Skipping unsupported tar entry {} (type {:?})",
                header.name, header.type_flag as char
            );
            skip(&mut reader, header.padded_size())?;
        }
    }

    Ok(entries)
}

/// Read one full block; `Ok(false)` on a clean or truncated end of stream
fn read_block<R: Read>(reader: &mut R, block: &mut [u8; BLOCK_SIZE]) -> NccResult<bool> {
    let mut filled = 0;
    while filled < BLOCK_SIZE {
        match reader.read(&mut block[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(NccError::operation(format!("Failed to read tar header: {}", e))),
        }
    }
    Ok(filled == BLOCK_SIZE)
}

fn create_dir(path: &Path) -> NccResult<()> {
    fs::create_dir_all(path).map_err(|e| {
        NccError::operation(format!("Failed to create directory {}: {}", path.display(), e))
    })
}

fn write_file<R: Read>(reader: &mut R, target: &Path, size: u64) -> NccResult<()> {
    let mut file = File::create(target).map_err(|e| {
        NccError::operation(format!("Failed to create file {}: {}", target.display(), e))
    })?;

    let mut buffer = [0u8; CHUNK_SIZE];
    let mut remaining = size;
    while remaining > 0 {
        let want = remaining.min(CHUNK_SIZE as u64) as usize;
        let read = reader.read(&mut buffer[..want]).map_err(|e| {
            NccError::operation(format!("Failed to read file data for {}: {}", target.display(), e))
        })?;
        if read == 0 {
            return Err(NccError::operation(format!(
                "Failed to read file data for {}: unexpected end of archive",
                target.display()
            )));
        }
        file.write_all(&buffer[..read])?;
        remaining -= read as u64;
    }

    Ok(())
}

fn skip<R: Read>(reader: &mut R, count: u64) -> NccResult<()> {
    if count == 0 {
        return Ok(());
    }
    let skipped = io::copy(&mut reader.by_ref().take(count), &mut io::sink())?;
    if skipped != count {
        return Err(NccError::operation("Unexpected end of tar archive"));
    }
    Ok(())
}

#[cfg(unix)]
fn apply_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    if mode != 0 {
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777));
    }
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: u32) {}
