//! Cost map files.
//!
//! A file is a 4-byte little-endian header length, a bincode-encoded
//! [`LookaheadHeader`], then the zlib-compressed bincode encoding of the
//! [`CostMap`]. The header's checksum covers the compressed payload, and
//! the fingerprint ties the file to one architecture, grid, graph build
//! setup and sampling setup.

use crate::compute::LookaheadOptions;
use crate::cost::CostMap;
use crate::error::LookaheadError;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;
use tessel_arch::{Architecture, DeviceGrid};
use tessel_common::ContentHash;
use tessel_rr::RrGraphOptions;

/// Magic bytes identifying a lookahead file.
const LOOKAHEAD_MAGIC: [u8; 4] = *b"TLKA";

/// Current file format version. Increment on breaking changes to the
/// header or payload format.
const LOOKAHEAD_FORMAT_VERSION: u32 = 1;

/// Header prepended to every lookahead file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookaheadHeader {
    /// Magic bytes: must be `b"TLKA"`.
    pub magic: [u8; 4],
    /// File format version.
    pub format_version: u32,
    /// Tool version that wrote the file.
    pub tool_version: String,
    /// Fingerprint of the fabric the map was computed for.
    pub fingerprint: ContentHash,
    /// Hash of the compressed payload.
    pub checksum: ContentHash,
}

fn serialization(e: impl std::fmt::Display) -> LookaheadError {
    LookaheadError::Serialization { reason: e.to_string() }
}

/// Fingerprint of everything a cost map depends on.
///
/// Covers the fabric, every graph build option (channel sizing, switch
/// block pattern and connection fractions all change the edges) and the
/// sampling options.
pub fn architecture_fingerprint(
    arch: &Architecture,
    grid: &DeviceGrid,
    rr_options: &RrGraphOptions,
    lookahead: &LookaheadOptions,
) -> Result<ContentHash, LookaheadError> {
    let bytes = bincode::serde::encode_to_vec((arch, grid, rr_options, lookahead), bincode::config::standard())
        .map_err(serialization)?;
    Ok(ContentHash::from_bytes(&bytes))
}

impl CostMap {
    /// Writes the map to `path`, tagged with `fingerprint`.
    pub fn write(&self, path: &Path, fingerprint: ContentHash) -> Result<(), LookaheadError> {
        let raw = bincode::serde::encode_to_vec(self, bincode::config::standard()).map_err(serialization)?;
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&raw).map_err(serialization)?;
        let payload = encoder.finish().map_err(serialization)?;

        let header = LookaheadHeader {
            magic: LOOKAHEAD_MAGIC,
            format_version: LOOKAHEAD_FORMAT_VERSION,
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            fingerprint,
            checksum: ContentHash::from_bytes(&payload),
        };
        let header_bytes =
            bincode::serde::encode_to_vec(&header, bincode::config::standard()).map_err(serialization)?;

        // Write: 4-byte header length (little-endian) + header + payload
        let header_len = header_bytes.len() as u32;
        let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
        output.extend_from_slice(&header_len.to_le_bytes());
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(&payload);

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| LookaheadError::Io {
                path: dir.to_path_buf(),
                source: e,
            })?;
        }
        std::fs::write(path, &output).map_err(|e| LookaheadError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        log::info!("wrote lookahead to {} ({} bytes)", path.display(), output.len());
        Ok(())
    }

    /// Reads a map written for `fingerprint`, reporting why a file was rejected.
    pub fn try_read(path: &Path, fingerprint: ContentHash) -> Result<CostMap, LookaheadError> {
        let raw = std::fs::read(path).map_err(|e| LookaheadError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let invalid = |reason: &str| LookaheadError::InvalidHeader {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };

        if raw.len() < 4 {
            return Err(invalid("file shorter than the header length field"));
        }
        let header_len = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize;
        if raw.len() < 4 + header_len {
            return Err(invalid("truncated header"));
        }
        let (header, _): (LookaheadHeader, usize) =
            bincode::serde::decode_from_slice(&raw[4..4 + header_len], bincode::config::standard())
                .map_err(|e| invalid(&e.to_string()))?;

        if header.magic != LOOKAHEAD_MAGIC {
            return Err(invalid("bad magic bytes"));
        }
        if header.format_version != LOOKAHEAD_FORMAT_VERSION {
            return Err(LookaheadError::VersionMismatch {
                path: path.to_path_buf(),
                expected: LOOKAHEAD_FORMAT_VERSION,
                actual: header.format_version,
            });
        }
        if header.fingerprint != fingerprint {
            return Err(LookaheadError::FingerprintMismatch {
                path: path.to_path_buf(),
                expected: fingerprint,
                actual: header.fingerprint,
            });
        }

        let payload = &raw[4 + header_len..];
        let actual = ContentHash::from_bytes(payload);
        if actual != header.checksum {
            return Err(LookaheadError::ChecksumMismatch {
                path: path.to_path_buf(),
                expected: header.checksum,
                actual,
            });
        }

        let mut decoded = Vec::new();
        ZlibDecoder::new(payload)
            .read_to_end(&mut decoded)
            .map_err(serialization)?;
        let (map, _): (CostMap, usize) =
            bincode::serde::decode_from_slice(&decoded, bincode::config::standard()).map_err(serialization)?;
        if let Some(reason) = map.shape_error() {
            return Err(LookaheadError::Malformed {
                path: path.to_path_buf(),
                reason,
            });
        }
        Ok(map)
    }

    /// Reads a map written for `fingerprint`.
    ///
    /// Returns `None` if the file is missing, damaged or was written for a
    /// different fabric. The file is never partially used.
    pub fn read(path: &Path, fingerprint: ContentHash) -> Option<CostMap> {
        match Self::try_read(path, fingerprint) {
            Ok(map) => {
                log::info!("loaded lookahead from {}", path.display());
                Some(map)
            }
            Err(e) => {
                log::warn!("discarding lookahead file: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::compute_cost_map;
    use tessel_arch::{builtin, create_device_grid};
    use tessel_diagnostics::DiagnosticSink;
    use tessel_rr::{build_rr_graph, ChannelOptions, SwitchBlockPattern};

    struct Fixture {
        map: CostMap,
        fingerprint: ContentHash,
    }

    fn fixture() -> Fixture {
        let arch = builtin::k4_n4();
        let sink = DiagnosticSink::new();
        let grid = create_device_grid(&arch, "fixed_8x8", &sink).unwrap();
        let options = RrGraphOptions {
            channels: ChannelOptions::uniform(6),
            ..RrGraphOptions::default()
        };
        let graph = build_rr_graph(&arch, &grid, &options, &sink).unwrap().graph;
        Fixture {
            map: compute_cost_map(&arch, &graph, &LookaheadOptions::default()),
            fingerprint: architecture_fingerprint(&arch, &grid, &options, &LookaheadOptions::default()).unwrap(),
        }
    }

    #[test]
    fn round_trip_is_bit_identical() {
        let f = fixture();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache").join("lookahead.tlka");
        f.map.write(&path, f.fingerprint).unwrap();
        let back = CostMap::try_read(&path, f.fingerprint).unwrap();
        assert!(back.bits_eq(&f.map));
        assert_eq!(back.num_valid(), f.map.num_valid());
    }

    #[test]
    fn fingerprint_covers_build_and_sampling_options() {
        let arch = builtin::k4_n4();
        let grid = create_device_grid(&arch, "fixed_5x5", &DiagnosticSink::new()).unwrap();
        let sampling = LookaheadOptions::default();
        let base = RrGraphOptions {
            channels: ChannelOptions::uniform(4),
            ..RrGraphOptions::default()
        };
        let fp = |rr: &RrGraphOptions, la: &LookaheadOptions| architecture_fingerprint(&arch, &grid, rr, la).unwrap();

        assert_eq!(fp(&base, &sampling), fp(&base.clone(), &sampling));
        let variants = [
            RrGraphOptions {
                channels: ChannelOptions::uniform(6),
                ..base.clone()
            },
            RrGraphOptions {
                switch_block: SwitchBlockPattern::Subset,
                ..base.clone()
            },
            RrGraphOptions {
                fc_in: Some(0.5),
                ..base.clone()
            },
            RrGraphOptions {
                fc_out: Some(1.0),
                ..base.clone()
            },
        ];
        for variant in &variants {
            assert_ne!(fp(&base, &sampling), fp(variant, &sampling), "{variant:?}");
        }
        let reseeded = LookaheadOptions { seed: 7, ..sampling };
        let more = LookaheadOptions {
            samples_per_segment: 9,
            ..sampling
        };
        assert_ne!(fp(&base, &sampling), fp(&base, &reseeded));
        assert_ne!(fp(&base, &sampling), fp(&base, &more));
    }

    #[test]
    fn inconsistent_shape_is_rejected() {
        let f = fixture();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lookahead.tlka");
        let mut map = f.map.clone();
        map.distance = tessel_common::NdMatrix::new([1, 1, 2, 2], crate::cost::CostEntry::default());
        map.write(&path, f.fingerprint).unwrap();
        let err = CostMap::try_read(&path, f.fingerprint).unwrap_err();
        assert!(matches!(err, LookaheadError::Malformed { .. }), "{err}");
        assert!(CostMap::read(&path, f.fingerprint).is_none());
    }

    #[test]
    fn other_fabric_is_rejected() {
        let f = fixture();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lookahead.tlka");
        f.map.write(&path, f.fingerprint).unwrap();
        let other = ContentHash::from_bytes(b"another fabric");
        let err = CostMap::try_read(&path, other).unwrap_err();
        assert!(matches!(err, LookaheadError::FingerprintMismatch { .. }));
        assert!(CostMap::read(&path, other).is_none());
    }

    #[test]
    fn corrupted_payload_is_rejected() {
        let f = fixture();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lookahead.tlka");
        f.map.write(&path, f.fingerprint).unwrap();
        let mut raw = std::fs::read(&path).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xff;
        std::fs::write(&path, &raw).unwrap();
        let err = CostMap::try_read(&path, f.fingerprint).unwrap_err();
        assert!(matches!(err, LookaheadError::ChecksumMismatch { .. }));
    }

    #[test]
    fn truncated_and_missing_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let fingerprint = ContentHash::from_bytes(b"x");
        let missing = dir.path().join("missing.tlka");
        assert!(matches!(
            CostMap::try_read(&missing, fingerprint),
            Err(LookaheadError::Io { .. })
        ));
        let short = dir.path().join("short.tlka");
        std::fs::write(&short, [1u8, 0]).unwrap();
        assert!(matches!(
            CostMap::try_read(&short, fingerprint),
            Err(LookaheadError::InvalidHeader { .. })
        ));
        let garbage = dir.path().join("garbage.tlka");
        std::fs::write(&garbage, [200u8, 0, 0, 0, 1, 2, 3]).unwrap();
        assert!(CostMap::read(&garbage, fingerprint).is_none());
    }
}
