//! Binary container encoding
//!
//! A container is the magic bytes string followed by the payload. The payload
//! is produced by the encoder named in the magic bytes, then optionally
//! gzip-compressed, then optionally encrypted by a caller-supplied cipher.
//! Decoding applies the same steps in reverse.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    Assembly, Component, DependencyReference, Encoder, ExecutionUnit, MagicBytes, Metadata,
    Package, Resource,
};
use crate::core::{NccError, NccResult};

/// Symmetric encryption of package payloads
pub trait PayloadCipher: Send + Sync {
    fn encrypt(&self, plaintext: &[u8]) -> NccResult<Vec<u8>>;
    fn decrypt(&self, ciphertext: &[u8]) -> NccResult<Vec<u8>>;
}

#[derive(Serialize)]
struct PayloadRef<'a> {
    assembly: &'a Assembly,
    metadata: &'a Metadata,
    dependencies: &'a [DependencyReference],
    execution_units: &'a [ExecutionUnit],
    resources: &'a [Resource],
    components: &'a [Component],
}

#[derive(Deserialize)]
struct Payload {
    assembly: Assembly,
    metadata: Metadata,
    #[serde(default)]
    dependencies: Vec<DependencyReference>,
    #[serde(default)]
    execution_units: Vec<ExecutionUnit>,
    #[serde(default)]
    resources: Vec<Resource>,
    #[serde(default)]
    components: Vec<Component>,
}

/// Encodes and decodes package containers
#[derive(Default)]
pub struct PackageCodec<'a> {
    cipher: Option<&'a dyn PayloadCipher>,
}

impl<'a> PackageCodec<'a> {
    pub fn new() -> Self {
        Self { cipher: None }
    }

    /// Codec able to handle encrypted containers
    pub fn with_cipher(cipher: &'a dyn PayloadCipher) -> Self {
        Self {
            cipher: Some(cipher),
        }
    }

    /// Encode a package into container bytes
    pub fn encode(&self, package: &Package) -> NccResult<Vec<u8>> {
        let magic = &package.magic;
        let payload = PayloadRef {
            assembly: &package.assembly,
            metadata: &package.metadata,
            dependencies: &package.dependencies,
            execution_units: &package.execution_units,
            resources: &package.resources,
            components: &package.components,
        };

        let mut data = match magic.encoder {
            Encoder::Cbor => {
                let mut buffer = Vec::new();
                ciborium::into_writer(&payload, &mut buffer).map_err(|e| {
                    NccError::package(format!("Failed to encode package payload: {}", e))
                })?;
                buffer
            }
            Encoder::Json => serde_json::to_vec(&payload)?,
        };

        if magic.compressed {
            let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::best());
            encoder.write_all(&data)?;
            data = encoder.finish()?;
        }

        if magic.encrypted {
            let cipher = self.cipher.ok_or_else(|| {
                NccError::invalid_argument("Package is marked as encrypted but no cipher was provided")
            })?;
            data = cipher.encrypt(&data)?;
        }

        let mut output = magic.to_bytes();
        output.extend_from_slice(&data);
        debug!(
            "Encoded package {}={} ({} bytes, {})",
            package.assembly.package,
            package.assembly.version,
            output.len(),
            magic
        );
        Ok(output)
    }

    /// Decode container bytes into a package
    pub fn decode(&self, bytes: &[u8]) -> NccResult<Package> {
        let (magic, offset) = MagicBytes::parse(bytes)?;
        let mut data = bytes[offset..].to_vec();

        if magic.encrypted {
            let cipher = self.cipher.ok_or_else(|| {
                NccError::package("Package is encrypted and no cipher was provided")
            })?;
            data = cipher.decrypt(&data)?;
        }

        if magic.compressed {
            let mut decompressed = Vec::new();
            GzDecoder::new(&data[..])
                .read_to_end(&mut decompressed)
                .map_err(|e| NccError::package(format!("Failed to decompress payload: {}", e)))?;
            data = decompressed;
        }

        let payload: Payload = match magic.encoder {
            Encoder::Cbor => ciborium::from_reader(&data[..]).map_err(|e| {
                NccError::package(format!("Failed to decode package payload: {}", e))
            })?,
            Encoder::Json => serde_json::from_slice(&data).map_err(|e| {
                NccError::package(format!("Failed to decode package payload: {}", e))
            })?,
        };

        Ok(Package {
            magic,
            assembly: payload.assembly,
            metadata: payload.metadata,
            dependencies: payload.dependencies,
            execution_units: payload.execution_units,
            resources: payload.resources,
            components: payload.components,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{
        CompilerExtension, ComponentDataType, ExecutionPolicy, InstallerHooks,
    };

    struct XorCipher(u8);

    impl PayloadCipher for XorCipher {
        fn encrypt(&self, plaintext: &[u8]) -> NccResult<Vec<u8>> {
            Ok(plaintext.iter().map(|b| b ^ self.0).collect())
        }

        fn decrypt(&self, ciphertext: &[u8]) -> NccResult<Vec<u8>> {
            self.encrypt(ciphertext)
        }
    }

    fn sample_package() -> Package {
        let mut package = Package::new(
            Assembly::new("Example", "com.example.library", "1.2.0"),
            Metadata::new(CompilerExtension::new("php")),
        );
        package.metadata.main_execution_policy = Some("main".to_string());
        package.metadata.installer = Some(InstallerHooks {
            post_install: vec!["setup".to_string()],
            ..InstallerHooks::default()
        });
        package.add_component(Component::new(
            "src/Example.php",
            ComponentDataType::Plain,
            b"<?php class Example {}".to_vec(),
        ));
        package.add_resource(Resource::new("assets/data.bin", vec![0, 1, 2, 254, 255]));
        package.add_execution_unit(ExecutionUnit::new(
            ExecutionPolicy::new("main", "php", "main.php"),
            b"<?php echo 'hi';".to_vec(),
        ));
        package.add_dependency(DependencyReference::new("com.example.util", "^1.0"));
        package
    }

    #[test]
    fn test_encode_starts_with_magic_bytes() {
        let package = sample_package();
        let bytes = PackageCodec::new().encode(&package).unwrap();
        assert!(bytes.starts_with(b"NCC_PACKAGE1.030040"));
    }

    #[test]
    fn test_cbor_compressed_package_decodes() {
        let mut package = sample_package();
        package.magic.compressed = true;
        package.magic.executable = true;

        let codec = PackageCodec::new();
        let decoded = codec.decode(&codec.encode(&package).unwrap()).unwrap();
        assert_eq!(decoded, package);
        assert!(decoded.verify_integrity().is_ok());
    }

    #[test]
    fn test_json_encoder_is_selected_by_magic() {
        let mut package = sample_package();
        package.magic.encoder = Encoder::Json;

        let codec = PackageCodec::new();
        let bytes = codec.encode(&package).unwrap();
        assert_eq!(bytes[14], b'1');
        assert_eq!(bytes[19], b'{');
        assert_eq!(codec.decode(&bytes).unwrap(), package);
    }

    #[test]
    fn test_encrypted_package_requires_cipher() {
        let mut package = sample_package();
        package.magic.encrypted = true;

        assert!(PackageCodec::new().encode(&package).is_err());

        let cipher = XorCipher(0x5a);
        let codec = PackageCodec::with_cipher(&cipher);
        let bytes = codec.encode(&package).unwrap();

        assert!(matches!(
            PackageCodec::new().decode(&bytes),
            Err(NccError::PackageParsing(_))
        ));
        assert_eq!(codec.decode(&bytes).unwrap(), package);
    }

    #[test]
    fn test_corrupt_payload_is_a_parsing_error() {
        let mut bytes = MagicBytes::default().to_bytes();
        bytes.extend_from_slice(&[0xff, 0x00, 0x13]);
        assert!(matches!(
            PackageCodec::new().decode(&bytes),
            Err(NccError::PackageParsing(_))
        ));
    }

    #[test]
    fn test_tampered_component_is_detected_after_decode() {
        let mut package = sample_package();
        package.components[0].data = b"<?php evil();".to_vec();

        let codec = PackageCodec::new();
        let decoded = codec.decode(&codec.encode(&package).unwrap()).unwrap();
        assert!(matches!(
            decoded.verify_integrity(),
            Err(NccError::ComponentChecksum(_))
        ));
    }
}
