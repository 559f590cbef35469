//! Magic bytes prefix of a package container
//!
//! Layout (ASCII, fixed positions):
//!
//! ```text
//! NCC_PACKAGE | 1.0 | 3 | 0 | 1 | 40
//! prefix        ver   enc encr comp type
//! ```
//!
//! The type suffix is `42` for installable and executable, `41` for
//! executable only and `40` otherwise.

use std::fmt;
use std::str::FromStr;

use crate::core::{NccError, NccResult};

/// Leading marker of every package container
pub const MAGIC_PREFIX: &str = "NCC_PACKAGE";

/// Structure version written by this build
pub const PACKAGE_STRUCTURE_VERSION: &str = "1.0";

/// Structure versions this build can read
pub const SUPPORTED_STRUCTURE_VERSIONS: &[&str] = &["1.0"];

/// Total length of the magic bytes string
pub const MAGIC_LENGTH: usize = MAGIC_PREFIX.len() + 3 + 1 + 1 + 1 + 2;

/// Payload encoder, identified by a single digit in the magic bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoder {
    /// JSON payload, useful for inspecting packages by hand
    Json,
    /// CBOR payload, the compact default
    Cbor,
}

impl Encoder {
    pub fn digit(self) -> char {
        match self {
            Encoder::Json => '1',
            Encoder::Cbor => '3',
        }
    }

    pub fn from_digit(digit: char) -> Option<Self> {
        match digit {
            '1' => Some(Encoder::Json),
            '3' => Some(Encoder::Cbor),
            _ => None,
        }
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Encoder::Cbor
    }
}

/// Self-describing header of a package container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagicBytes {
    pub structure_version: String,
    pub encoder: Encoder,
    pub compressed: bool,
    pub encrypted: bool,
    pub installable: bool,
    pub executable: bool,
}

impl Default for MagicBytes {
    fn default() -> Self {
        Self {
            structure_version: PACKAGE_STRUCTURE_VERSION.to_string(),
            encoder: Encoder::default(),
            compressed: false,
            encrypted: false,
            installable: true,
            executable: false,
        }
    }
}

impl MagicBytes {
    pub fn new() -> Self {
        Self::default()
    }

    fn type_suffix(&self) -> &'static str {
        match (self.installable, self.executable) {
            (true, true) => "42",
            (false, true) => "41",
            _ => "40",
        }
    }

    /// Parse the magic bytes at the start of `input`, returning the header and
    /// the number of bytes it occupies
    pub fn parse(input: &[u8]) -> NccResult<(Self, usize)> {
        if input.len() < MAGIC_LENGTH {
            return Err(NccError::package("Data is too short to contain magic bytes"));
        }

        let header = std::str::from_utf8(&input[..MAGIC_LENGTH])
            .ok()
            .filter(|h| h.is_ascii())
            .ok_or_else(|| NccError::package("Magic bytes are not valid ASCII"))?;

        if !header.starts_with(MAGIC_PREFIX) {
            return Err(NccError::package("Missing NCC_PACKAGE magic bytes"));
        }

        let rest = &header[MAGIC_PREFIX.len()..];
        let structure_version = &rest[0..3];
        if !SUPPORTED_STRUCTURE_VERSIONS.contains(&structure_version) {
            return Err(NccError::package(format!(
                "Unsupported package structure version: {}",
                structure_version
            )));
        }

        let mut flags = rest[3..].chars();
        let encoder_digit = flags.next().unwrap_or('?');
        let encoder = Encoder::from_digit(encoder_digit).ok_or_else(|| {
            NccError::package(format!("Unknown package encoder: {}", encoder_digit))
        })?;
        let encrypted = parse_flag(flags.next(), "encrypted")?;
        let compressed = parse_flag(flags.next(), "compressed")?;

        let (installable, executable) = match &rest[6..8] {
            "42" => (true, true),
            "41" => (false, true),
            "40" => (true, false),
            other => {
                return Err(NccError::package(format!("Unknown package type: {}", other)));
            }
        };

        Ok((
            Self {
                structure_version: structure_version.to_string(),
                encoder,
                compressed,
                encrypted,
                installable,
                executable,
            },
            MAGIC_LENGTH,
        ))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

fn parse_flag(value: Option<char>, name: &str) -> NccResult<bool> {
    match value {
        Some('0') => Ok(false),
        Some('1') => Ok(true),
        _ => Err(NccError::package(format!("Invalid {} flag in magic bytes", name))),
    }
}

impl fmt::Display for MagicBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}{}{}",
            MAGIC_PREFIX,
            self.structure_version,
            self.encoder.digit(),
            if self.encrypted { '1' } else { '0' },
            if self.compressed { '1' } else { '0' },
            self.type_suffix()
        )
    }
}

impl FromStr for MagicBytes {
    type Err = NccError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (magic, consumed) = Self::parse(s.as_bytes())?;
        if consumed != s.len() {
            return Err(NccError::package("Trailing data after magic bytes"));
        }
        Ok(magic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_string_is_stable() {
        let magic = MagicBytes {
            compressed: true,
            executable: true,
            ..MagicBytes::default()
        };
        assert_eq!(magic.to_string(), magic.to_string());
        assert_eq!(magic.to_string(), "NCC_PACKAGE1.030142");
    }

    #[test]
    fn test_type_suffix() {
        let mut magic = MagicBytes::default();
        assert!(magic.to_string().ends_with("40"));
        magic.executable = true;
        assert!(magic.to_string().ends_with("42"));
        magic.installable = false;
        assert!(magic.to_string().ends_with("41"));
        magic.executable = false;
        assert!(magic.to_string().ends_with("40"));
    }

    #[test]
    fn test_parse_installable_literal() {
        let magic: MagicBytes = "NCC_PACKAGE1.030140".parse().unwrap();
        assert!(magic.installable);
        assert!(!magic.executable);
        assert!(magic.compressed);
        assert!(!magic.encrypted);
        assert_eq!(magic.encoder, Encoder::Cbor);
    }

    #[test]
    fn test_parse_reports_consumed_length() {
        let mut data = b"NCC_PACKAGE1.011041".to_vec();
        data.extend_from_slice(b"payload");
        let (magic, consumed) = MagicBytes::parse(&data).unwrap();
        assert_eq!(consumed, MAGIC_LENGTH);
        assert_eq!(&data[consumed..], b"payload");
        assert_eq!(magic.encoder, Encoder::Json);
        assert!(magic.encrypted);
        assert!(!magic.installable);
        assert!(magic.executable);
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        assert!("NCC_PACKAGE9.930040".parse::<MagicBytes>().is_err());
        assert!("NCC_PACKAGE1.090040".parse::<MagicBytes>().is_err());
        assert!("NCC_PACKAGE1.032040".parse::<MagicBytes>().is_err());
        assert!("NCC_PACKAGE1.030043".parse::<MagicBytes>().is_err());
        assert!("XXX_PACKAGE1.030040".parse::<MagicBytes>().is_err());
        assert!(MagicBytes::parse(b"NCC").is_err());
    }
}
