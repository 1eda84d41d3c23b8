//! Document loading.
//!
//! This module decodes JSON, JSON Lines and YAML documents into `Value`s,
//! from files or stdin. Any of them may be gzip-compressed.

use crate::document::value::Value;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// The encoding of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    /// One JSON value per line, loaded as a sequence
    JsonLines,
    Yaml,
    /// Try JSON, then JSON Lines, then YAML
    Auto,
}

/// Loads and decodes a document file.
///
/// The format is chosen from the file name (ignoring a trailing `.gz`):
/// `.json`, `.jsonl`/`.ndjson`, `.yaml`/`.yml`; anything else is detected
/// from the content.
///
/// # Examples
///
/// ```no_run
/// use jsonnav::file::loader::load_file;
///
/// let doc = load_file("config.yaml").unwrap();
/// ```
///
/// # Errors
///
/// This function will return an error if:
/// - The file path does not exist or cannot be read
/// - A `.gz` file is not valid gzip
/// - The contents are not valid in the detected format
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Value> {
    let path_ref = path.as_ref();

    let is_gzipped = path_ref
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    let content = if is_gzipped {
        read_gzipped_file(path_ref)?
    } else {
        fs::read_to_string(path_ref).context("Failed to read file")?
    };

    let format = detect_format(path_ref);
    log::debug!("loading {} as {:?}", path_ref.display(), format);
    parse_str(&content, format)
        .with_context(|| format!("Failed to parse {}", path_ref.display()))
}

/// Reads and decodes a document from standard input.
///
/// Gzip input is recognised by its magic bytes; the format is detected from
/// the content.
pub fn load_stdin() -> Result<Value> {
    use std::io::{self, Read};

    let mut buffer = Vec::new();
    io::stdin()
        .read_to_end(&mut buffer)
        .context("Failed to read from stdin")?;

    parse_bytes(buffer).context("Failed to parse stdin")
}

/// Decodes raw bytes, decompressing gzip if present, with format detection.
pub fn parse_bytes(buffer: Vec<u8>) -> Result<Value> {
    // Check for gzip magic bytes (0x1f 0x8b)
    let content = if buffer.starts_with(&[0x1f, 0x8b]) {
        decompress_gzip_bytes(&buffer)?
    } else {
        String::from_utf8(buffer).context("Invalid UTF-8 in input")?
    };

    parse_str(&content, Format::Auto)
}

/// Decodes a document in the given format.
pub fn parse_str(content: &str, format: Format) -> Result<Value> {
    match format {
        Format::Json => serde_json::from_str(content).context("Invalid JSON"),
        Format::JsonLines => parse_jsonl_content(content),
        Format::Yaml => serde_yaml::from_str(content).context("Invalid YAML"),
        Format::Auto => {
            if let Ok(value) = serde_json::from_str(content) {
                return Ok(value);
            }
            if let Ok(value) = parse_jsonl_content(content) {
                return Ok(value);
            }
            serde_yaml::from_str(content)
                .context("input is neither valid JSON, JSON Lines nor YAML")
        }
    }
}

/// Parses JSON Lines content into a sequence of values.
///
/// Each line must be a valid JSON value. Blank lines are skipped.
pub fn parse_jsonl_content(content: &str) -> Result<Value> {
    let mut lines = Vec::new();

    for (line_num, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let value: Value = serde_json::from_str(line)
            .with_context(|| format!("Invalid JSON on line {}", line_num + 1))?;
        lines.push(value);
    }

    if lines.is_empty() {
        anyhow::bail!("No valid JSON found in JSONL content");
    }

    Ok(Value::Array(lines))
}

/// Determines the format from a file name.
///
/// Handles a `.gz` suffix:
/// - `data.jsonl` → JsonLines
/// - `data.yaml.gz` → Yaml
/// - `data.txt` → Auto
pub fn detect_format<P: AsRef<Path>>(path: P) -> Format {
    let path_str = path.as_ref().to_string_lossy();
    let base = path_str.strip_suffix(".gz").unwrap_or(&path_str);

    if base.ends_with(".jsonl") || base.ends_with(".ndjson") {
        Format::JsonLines
    } else if base.ends_with(".json") {
        Format::Json
    } else if base.ends_with(".yaml") || base.ends_with(".yml") {
        Format::Yaml
    } else {
        Format::Auto
    }
}

/// Reads and decompresses a gzipped file.
fn read_gzipped_file<P: AsRef<Path>>(path: P) -> Result<String> {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let file = fs::File::open(path).context("Failed to open gzipped file")?;
    let mut decoder = GzDecoder::new(file);
    let mut content = String::new();
    decoder
        .read_to_string(&mut content)
        .context("Failed to decompress gzipped file")?;
    Ok(content)
}

/// Decompresses gzip bytes into a UTF-8 string.
fn decompress_gzip_bytes(bytes: &[u8]) -> Result<String> {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let mut decoder = GzDecoder::new(bytes);
    let mut content = String::new();
    decoder
        .read_to_string(&mut content)
        .context("Failed to decompress gzip input")?;
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format("a.json"), Format::Json);
        assert_eq!(detect_format("a.json.gz"), Format::Json);
        assert_eq!(detect_format("a.ndjson"), Format::JsonLines);
        assert_eq!(detect_format("a.jsonl.gz"), Format::JsonLines);
        assert_eq!(detect_format("a.yml"), Format::Yaml);
        assert_eq!(detect_format("a.yaml.gz"), Format::Yaml);
        assert_eq!(detect_format("a.txt"), Format::Auto);
    }

    #[test]
    fn test_auto_falls_back_to_jsonl_then_yaml() {
        let jsonl = parse_str("{\"id\": 1}\n{\"id\": 2}\n", Format::Auto).unwrap();
        assert_eq!(jsonl.as_array().map(Vec::len), Some(2));

        let yaml = parse_str("name: Jane\nage: 12\n", Format::Auto).unwrap();
        assert_eq!(yaml.as_object().unwrap()["name"], Value::from("Jane"));
    }

    #[test]
    fn test_jsonl_reports_line_number() {
        let err = parse_jsonl_content("{\"ok\": 1}\n\n{bad\n").unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_empty_jsonl_is_error() {
        assert!(parse_jsonl_content("\n  \n").is_err());
    }
}
