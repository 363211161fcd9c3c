//! Model serialization
//!
//! Text header + binary payload + checksum trailer.
//!
//! # Format
//!
//! ```text
//! \nDigitModel Version 1\n
//! k = K, nsamples = S, nfeatures = F\n
//! width = W, height = H, cell = C, block = B, orientations = O\n
//! <S label bytes>
//! <S * F f32 values, little-endian>
//! crc32 = XXXXXXXX\n
//! ```
//!
//! The CRC32 covers every byte before the `crc32 = ` trailer. Readers
//! reject anything that does not match exactly; there is no partial
//! recovery.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crc32fast::Hasher;
use tracing::info;

use crate::error::{RecogError, RecogResult};
use crate::hog::HogConfig;

use super::types::DigitModel;

/// Model format version
const MODEL_VERSION: u32 = 1;

/// First word of the version line
const MAGIC: &str = "DigitModel";

/// Maximum input size in bytes.
const MAX_INPUT_SIZE: u64 = 500_000_000;

/// Path reported for models decoded from memory
const MEMORY_PATH: &str = "<memory>";

/// Everything written so far also goes through the checksum
struct CrcWriter<'a, W: Write> {
    inner: &'a mut W,
    hasher: Hasher,
}

impl<W: Write> Write for CrcWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl DigitModel {
    /// Write the model to a writer.
    ///
    /// # Errors
    ///
    /// Returns [`RecogError::InvalidParameter`] for a model without
    /// samples, which could not be read back.
    pub fn write_to_writer(&self, writer: &mut impl Write) -> RecogResult<()> {
        if self.is_empty() {
            return Err(RecogError::InvalidParameter(
                "cannot store a model without samples".to_string(),
            ));
        }
        let cfg = self.config();
        let mut w = CrcWriter {
            inner: &mut *writer,
            hasher: Hasher::new(),
        };
        writeln!(w, "\n{MAGIC} Version {MODEL_VERSION}")?;
        writeln!(
            w,
            "k = {}, nsamples = {}, nfeatures = {}",
            self.k(),
            self.len(),
            self.nfeatures()
        )?;
        writeln!(
            w,
            "width = {}, height = {}, cell = {}, block = {}, orientations = {}",
            cfg.width, cfg.height, cfg.cell, cfg.block, cfg.orientations
        )?;
        w.write_all(self.labels())?;
        for &val in self.features() {
            w.write_all(&val.to_le_bytes())?;
        }

        let crc = w.hasher.finalize();
        writeln!(writer, "crc32 = {crc:08x}")?;
        Ok(())
    }

    /// Write the model to a byte vector.
    pub fn write_to_bytes(&self) -> RecogResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_to_writer(&mut buf)?;
        Ok(buf)
    }

    /// Write the model to a file.
    ///
    /// The data goes to a temporary file beside `path` that is renamed
    /// over `path` once complete, so readers see either the old file or
    /// the new one.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> RecogResult<()> {
        let path = path.as_ref();
        let tmp = temp_path(path)?;
        let result = (|| -> RecogResult<()> {
            let file = File::create(&tmp)?;
            let mut writer = BufWriter::new(file);
            self.write_to_writer(&mut writer)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
            Ok(())
        })();
        if let Err(e) = result {
            std::fs::remove_file(&tmp).ok();
            return Err(e);
        }
        std::fs::rename(&tmp, path).inspect_err(|_| {
            std::fs::remove_file(&tmp).ok();
        })?;
        info!(
            path = %path.display(),
            samples = self.len(),
            k = self.k(),
            "saved digit model"
        );
        Ok(())
    }

    /// Read a model from a byte slice.
    pub fn read_from_bytes(data: &[u8]) -> RecogResult<Self> {
        decode(data).map_err(|reason| corrupt(MEMORY_PATH, reason))
    }

    /// Read a model from a reader.
    pub fn read_from_reader(reader: &mut impl Read) -> RecogResult<Self> {
        let buf = read_limited(reader).map_err(|reason| corrupt(MEMORY_PATH, reason))?;
        Self::read_from_bytes(&buf)
    }

    /// Read a model from a file.
    ///
    /// A file that cannot be opened or read is reported as corrupt too.
    pub fn read_from_file(path: impl AsRef<Path>) -> RecogResult<Self> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        let mut file = File::open(path).map_err(|e| corrupt(&shown, e.to_string()))?;
        let buf = read_limited(&mut file).map_err(|reason| corrupt(&shown, reason))?;
        let model = decode(&buf).map_err(|reason| corrupt(&shown, reason))?;
        info!(
            path = %shown,
            samples = model.len(),
            k = model.k(),
            "loaded digit model"
        );
        Ok(model)
    }
}

fn corrupt(path: &str, reason: String) -> RecogError {
    RecogError::CorruptModel {
        path: path.to_string(),
        reason,
    }
}

/// Hidden sibling of `path` used while writing
fn temp_path(path: &Path) -> RecogResult<PathBuf> {
    let name = path.file_name().ok_or_else(|| {
        RecogError::InvalidParameter(format!("model path has no file name: {}", path.display()))
    })?;
    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(name);
    tmp_name.push(format!(".{}.tmp", std::process::id()));
    Ok(path.with_file_name(tmp_name))
}

fn read_limited(reader: &mut impl Read) -> Result<Vec<u8>, String> {
    let mut buf = Vec::new();
    reader
        .take(MAX_INPUT_SIZE + 1)
        .read_to_end(&mut buf)
        .map_err(|e| e.to_string())?;
    if buf.len() as u64 > MAX_INPUT_SIZE {
        return Err(format!(
            "input too large: exceeds maximum allowed size of {MAX_INPUT_SIZE} bytes"
        ));
    }
    Ok(buf)
}

/// Header values of a model file
struct ModelHeader {
    k: usize,
    nsamples: usize,
    nfeatures: usize,
    config: HogConfig,
}

fn decode(data: &[u8]) -> Result<DigitModel, String> {
    let header_end = find_header_end(data)?;
    let header = parse_header(&data[..header_end])?;

    if header.k == 0 {
        return Err("k must be positive".to_string());
    }
    if header.nsamples == 0 {
        return Err("model holds no samples".to_string());
    }
    if header.config.validate().is_err() || header.config.feature_len() != header.nfeatures {
        return Err(format!(
            "nfeatures = {} does not match configuration [{}]",
            header.nfeatures, header.config
        ));
    }

    let payload_len = header
        .nfeatures
        .checked_mul(4)
        .and_then(|n| n.checked_add(1))
        .and_then(|n| n.checked_mul(header.nsamples))
        .filter(|&n| n as u64 <= MAX_INPUT_SIZE)
        .ok_or_else(|| "payload size out of range".to_string())?;
    let payload_end = header_end + payload_len;
    if data.len() < payload_end {
        return Err(format!(
            "data truncated: need {payload_end} bytes but only have {}",
            data.len()
        ));
    }

    let expected = parse_trailer(&data[payload_end..])?;
    let actual = crc32fast::hash(&data[..payload_end]);
    if expected != actual {
        return Err(format!(
            "checksum mismatch: stored {expected:08x}, computed {actual:08x}"
        ));
    }

    let labels_end = header_end + header.nsamples;
    let labels = data[header_end..labels_end].to_vec();
    if let Some(&bad) = labels.iter().find(|&&l| l > 9) {
        return Err(format!("label {bad} is not a digit"));
    }
    let features: Vec<f32> = data[labels_end..payload_end]
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    DigitModel::new(header.k, header.config, labels, features).map_err(|e| e.to_string())
}

/// Offset just past the third non-empty header line.
fn find_header_end(data: &[u8]) -> Result<usize, String> {
    let scan_limit = data.len().min(512);
    let mut content_lines_found = 0;
    let mut pos = 0;
    while pos < scan_limit {
        let Some(offset) = data[pos..scan_limit].iter().position(|&b| b == b'\n') else {
            break;
        };
        let line_end = pos + offset;
        if data[pos..line_end].iter().any(|&b| b != b' ' && b != b'\r') {
            content_lines_found += 1;
            if content_lines_found == 3 {
                return Ok(line_end + 1);
            }
        }
        pos = line_end + 1;
    }
    Err("could not find end of text header (expected 3 header lines)".to_string())
}

fn parse_header(bytes: &[u8]) -> Result<ModelHeader, String> {
    let text =
        std::str::from_utf8(bytes).map_err(|e| format!("header is not valid UTF-8: {e}"))?;
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

    let version_line = lines.next().unwrap_or_default();
    let version_prefix = format!("{MAGIC} Version ");
    let version: u32 = version_line
        .strip_prefix(&version_prefix)
        .ok_or_else(|| "not a digit model (bad magic)".to_string())?
        .trim()
        .parse()
        .map_err(|e| format!("failed to parse version: {e}"))?;
    if version != MODEL_VERSION {
        return Err(format!("unsupported version: {version}"));
    }

    let counts = split_fields(lines.next().unwrap_or_default(), &["k", "nsamples", "nfeatures"])?;
    let dims = split_fields(
        lines.next().unwrap_or_default(),
        &["width", "height", "cell", "block", "orientations"],
    )?;

    let to_u32 = |v: u64, key: &str| u32::try_from(v).map_err(|_| format!("{key} out of range"));
    Ok(ModelHeader {
        k: counts[0] as usize,
        nsamples: counts[1] as usize,
        nfeatures: counts[2] as usize,
        config: HogConfig {
            width: to_u32(dims[0], "width")?,
            height: to_u32(dims[1], "height")?,
            cell: to_u32(dims[2], "cell")?,
            block: to_u32(dims[3], "block")?,
            orientations: to_u32(dims[4], "orientations")?,
        },
    })
}

/// Parse "key1 = v1, key2 = v2, ..." with the keys in the given order
fn split_fields(line: &str, keys: &[&str]) -> Result<Vec<u64>, String> {
    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() != keys.len() {
        return Err(format!(
            "malformed header line '{line}': expected {} fields",
            keys.len()
        ));
    }
    parts
        .iter()
        .zip(keys)
        .map(|(part, key)| parse_key_value_u64(part, key))
        .collect()
}

/// Parse "key = value" where value is u64
fn parse_key_value_u64(s: &str, key: &str) -> Result<u64, String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("missing '=' in {key} field"))?;
    if name.trim() != key {
        return Err(format!("expected field {key}, found '{}'", name.trim()));
    }
    value
        .trim()
        .parse()
        .map_err(|e| format!("failed to parse {key}: {e}"))
}

/// Parse "crc32 = XXXXXXXX\n", which must end the data
fn parse_trailer(bytes: &[u8]) -> Result<u32, String> {
    const PREFIX: &[u8] = b"crc32 = ";
    const LEN: usize = PREFIX.len() + 8 + 1;
    if bytes.len() < LEN || !bytes.starts_with(PREFIX) {
        return Err("missing checksum trailer".to_string());
    }
    if bytes.len() > LEN {
        return Err(format!("{} bytes of trailing data", bytes.len() - LEN));
    }
    if bytes[LEN - 1] != b'\n' {
        return Err("malformed checksum trailer".to_string());
    }
    let hex = std::str::from_utf8(&bytes[PREFIX.len()..LEN - 1])
        .map_err(|_| "malformed checksum trailer".to_string())?;
    u32::from_str_radix(hex, 16).map_err(|e| format!("failed to parse checksum: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_model() -> DigitModel {
        let config = HogConfig {
            width: 8,
            height: 8,
            cell: 4,
            block: 2,
            orientations: 2,
        };
        let features = (0..24).map(|i| i as f32 * 0.125 - 1.0).collect();
        DigitModel::new(3, config, vec![0, 5, 9], features).unwrap()
    }

    fn reason(err: RecogError) -> String {
        match err {
            RecogError::CorruptModel { reason, .. } => reason,
            other => panic!("expected CorruptModel, got {other:?}"),
        }
    }

    #[test]
    fn test_roundtrip_is_exact() {
        let model = sample_model();
        let bytes = model.write_to_bytes().unwrap();
        assert!(bytes.starts_with(b"\nDigitModel Version 1\nk = 3, nsamples = 3, nfeatures = 8\n"));
        let restored = DigitModel::read_from_bytes(&bytes).unwrap();
        assert_eq!(restored, model);

        let mut reader = bytes.as_slice();
        assert_eq!(DigitModel::read_from_reader(&mut reader).unwrap(), model);
    }

    #[test]
    fn test_trailer_format() {
        let bytes = sample_model().write_to_bytes().unwrap();
        let tail = std::str::from_utf8(&bytes[bytes.len() - 17..]).unwrap();
        assert!(tail.starts_with("crc32 = "));
        assert!(tail.ends_with('\n'));
        let crc = u32::from_str_radix(&tail[8..16], 16).unwrap();
        assert_eq!(crc, crc32fast::hash(&bytes[..bytes.len() - 17]));
    }

    #[test]
    fn test_rejects_bad_magic_and_version() {
        let text = sample_model().write_to_bytes().unwrap();

        let mut bad = text.clone();
        bad[1] = b'X';
        assert!(reason(DigitModel::read_from_bytes(&bad).unwrap_err()).contains("magic"));

        let mut v2 = text;
        let pos = v2.iter().position(|&b| b == b'1').unwrap();
        v2[pos] = b'2';
        assert!(reason(DigitModel::read_from_bytes(&v2).unwrap_err()).contains("version"));
    }

    #[test]
    fn test_rejects_truncation_and_trailing_data() {
        let bytes = sample_model().write_to_bytes().unwrap();
        for cut in [bytes.len() - 1, bytes.len() - 17, 60] {
            assert!(DigitModel::read_from_bytes(&bytes[..cut]).is_err());
        }
        let mut extra = bytes.clone();
        extra.extend_from_slice(b"junk");
        assert!(reason(DigitModel::read_from_bytes(&extra).unwrap_err()).contains("trailing"));
    }

    #[test]
    fn test_rejects_checksum_mismatch() {
        let mut bytes = sample_model().write_to_bytes().unwrap();
        let last_float = bytes.len() - 18;
        bytes[last_float] ^= 0x01;
        assert!(reason(DigitModel::read_from_bytes(&bytes).unwrap_err()).contains("checksum"));
    }

    #[test]
    fn test_rejects_feature_length_disagreement() {
        let mut bytes = sample_model().write_to_bytes().unwrap();
        let pos = bytes
            .windows(13)
            .position(|w| w == b"nfeatures = 8")
            .unwrap();
        bytes[pos + 12] = b'9';
        assert!(reason(DigitModel::read_from_bytes(&bytes).unwrap_err()).contains("nfeatures"));
    }

    #[test]
    fn test_empty_model_is_not_stored() {
        let empty = DigitModel::new(1, *sample_model().config(), Vec::new(), Vec::new()).unwrap();
        assert!(matches!(
            empty.write_to_bytes(),
            Err(RecogError::InvalidParameter(_))
        ));

        let dir = digitread_test::scratch_dir("serial_empty").unwrap();
        let path = dir.join("empty.dmodel");
        std::fs::remove_file(&path).ok();
        assert!(empty.write_to_file(&path).is_err());
        assert!(!path.exists());
        assert!(!temp_path(&path).unwrap().exists());
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            DigitModel::read_from_bytes(b""),
            Err(RecogError::CorruptModel { .. })
        ));
    }
}
