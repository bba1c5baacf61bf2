//! `%PDF-x.y` header sniffing.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};

const MAGIC: &[u8] = b"%PDF-";

/// Header bytes inspected. Producers may put junk before the magic.
const SNIFF_LEN: usize = 1024;

/// Read the start of `path` and return the declared PDF version.
pub fn sniff_path<P: AsRef<Path>>(path: P) -> Result<String> {
    let mut head = Vec::with_capacity(SNIFF_LEN);
    File::open(path)?
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut head)?;
    sniff_bytes(&head)
}

/// Return the declared PDF version of an in-memory document.
///
/// Fails with [`Error::UnknownFormat`] when there is no `%PDF-` marker and
/// with [`Error::UnsupportedVersion`] when the version is not `d.d`.
pub fn sniff_bytes(data: &[u8]) -> Result<String> {
    let window = &data[..data.len().min(SNIFF_LEN)];
    let start = window
        .windows(MAGIC.len())
        .position(|w| w == MAGIC)
        .ok_or(Error::UnknownFormat)?;

    let version = window
        .get(start + MAGIC.len()..start + MAGIC.len() + 3)
        .ok_or(Error::UnknownFormat)?;
    let version = String::from_utf8_lossy(version).to_string();

    match version.as_bytes() {
        [major, b'.', minor] if major.is_ascii_digit() && minor.is_ascii_digit() => {
            if *major == b'1' || *major == b'2' {
                Ok(version)
            } else {
                Err(Error::UnsupportedVersion(version))
            }
        }
        _ => Err(Error::UnsupportedVersion(version)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_versions() {
        assert_eq!(sniff_bytes(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3").unwrap(), "1.7");
        assert_eq!(sniff_bytes(b"%PDF-2.0\n").unwrap(), "2.0");
    }

    #[test]
    fn test_sniff_tolerates_leading_junk() {
        assert_eq!(sniff_bytes(b"\r\n\r\n%PDF-1.4\n").unwrap(), "1.4");
    }

    #[test]
    fn test_sniff_rejects_non_pdf() {
        assert!(matches!(
            sniff_bytes(b"<!DOCTYPE html>"),
            Err(Error::UnknownFormat)
        ));
        assert!(matches!(sniff_bytes(b"%PDF"), Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_sniff_rejects_bad_version() {
        assert!(matches!(
            sniff_bytes(b"%PDF-x.y\n"),
            Err(Error::UnsupportedVersion(v)) if v == "x.y"
        ));
        assert!(matches!(
            sniff_bytes(b"%PDF-9.0\n"),
            Err(Error::UnsupportedVersion(_))
        ));
    }
}
