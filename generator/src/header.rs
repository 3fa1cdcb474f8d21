//! The comment block at the top of every generated file.
//!
//! It records which generator version produced the file from which schema, so that a build can
//! tell whether the file needs to be regenerated.

use std::fmt;

const GENERATED_BY: &str = "// This file is generated by uxsd-generator ";
const DO_NOT_MODIFY: &str =
    "// Modify only if your build process doesn't involve regenerating this file.";
const CMDLINE: &str = "// Cmdline: ";
const INPUT_FILE: &str = "// Input file: ";
const CONTENT_HASH: &str = "// blake3 of input file: ";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub version: String,
    pub cmdline: String,
    pub input_file: String,
    pub content_hash: String,
}

impl Header {
    pub fn new(cmdline: String, input_file: String, input: &[u8]) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            cmdline,
            input_file,
            content_hash: content_hash(input),
        }
    }

    /// Reads the header from the leading comment lines of a generated file.
    pub fn parse(text: &str) -> Option<Self> {
        let mut version = None;
        let mut cmdline = None;
        let mut input_file = None;
        let mut content_hash = None;
        for line in text.lines().take_while(|line| line.starts_with("//")) {
            if let Some(rest) = line.strip_prefix(GENERATED_BY) {
                version = Some(rest.strip_suffix('.').unwrap_or(rest));
            } else if let Some(rest) = line.strip_prefix(CMDLINE) {
                cmdline = Some(rest);
            } else if let Some(rest) = line.strip_prefix(INPUT_FILE) {
                input_file = Some(rest);
            } else if let Some(rest) = line.strip_prefix(CONTENT_HASH) {
                content_hash = Some(rest);
            }
        }
        Some(Self {
            version: version?.to_string(),
            cmdline: cmdline?.to_string(),
            input_file: input_file?.to_string(),
            content_hash: content_hash?.to_string(),
        })
    }

    /// Whether a file carrying this header must be regenerated from `current`.
    ///
    /// The command line and input path are informational and do not count.
    pub fn is_stale(&self, current: &Header) -> bool {
        self.version != current.version || self.content_hash != current.content_hash
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{GENERATED_BY}{}.", self.version)?;
        writeln!(f, "{DO_NOT_MODIFY}")?;
        writeln!(f, "//")?;
        writeln!(f, "{CMDLINE}{}", self.cmdline)?;
        writeln!(f, "{INPUT_FILE}{}", self.input_file)?;
        writeln!(f, "{CONTENT_HASH}{}", self.content_hash)
    }
}

pub fn content_hash(input: &[u8]) -> String {
    blake3::hash(input).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(input: &[u8]) -> Header {
        Header::new(
            "uxsd-generator config.xsd -o config.rs".into(),
            "config.xsd".into(),
            input,
        )
    }

    #[test]
    fn rendered_header_parses_back() {
        let header = header(b"<xs:schema/>");
        let text = format!("{header}\n#![allow(dead_code)]\n");
        assert!(text.starts_with("// This file is generated by uxsd-generator "));
        assert_eq!(Header::parse(&text), Some(header));
    }

    #[test]
    fn hash_is_hex_blake3() {
        let hash = content_hash(b"abc");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "6437b3ac38465133ffb63b75273a8db548c558465d79db03fd359c6cd5bd9d85"
        );
    }

    #[test]
    fn staleness_follows_input_and_version() {
        let old = header(b"one");
        assert!(!old.is_stale(&header(b"one")));
        assert!(old.is_stale(&header(b"two")));

        let moved = Header {
            cmdline: "elsewhere".into(),
            input_file: "other/config.xsd".into(),
            ..header(b"one")
        };
        assert!(!old.is_stale(&moved));

        let newer = Header {
            version: "99.0.0".into(),
            ..header(b"one")
        };
        assert!(old.is_stale(&newer));
    }

    #[test]
    fn files_without_a_header_do_not_parse() {
        assert_eq!(Header::parse("fn main() {}\n"), None);
        assert_eq!(Header::parse("// This file is generated by uxsd-generator 0.1.0.\n"), None);
    }
}
