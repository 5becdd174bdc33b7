//! Whole-file reads.
//!
//! The file handle lives only inside each function, so every exit path
//! closes it.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Read a UTF-8 text file into a `String`.
///
/// # Errors
///
/// Returns the I/O error if the file cannot be opened or read, or
/// [`io::ErrorKind::InvalidData`] if it is not valid UTF-8.
pub fn read_entire_file(path: impl AsRef<Path>) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut text = String::with_capacity(size_hint(&file));
    file.read_to_string(&mut text)?;
    Ok(text)
}

/// Read a file into a byte vector.
///
/// # Errors
///
/// Returns the I/O error if the file cannot be opened or read.
pub fn read_entire_bytes(path: impl AsRef<Path>) -> io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let mut bytes = Vec::with_capacity(size_hint(&file));
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}

fn size_hint(file: &File) -> usize {
    file.metadata()
        .ok()
        .and_then(|m| usize::try_from(m.len()).ok())
        .unwrap_or(0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_with(contents: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn reads_text_and_bytes() {
        let file = file_with(b"#ifdef VERTEX_SHADER\n#endif\n");
        assert_eq!(
            read_entire_file(file.path()).unwrap(),
            "#ifdef VERTEX_SHADER\n#endif\n"
        );
        assert_eq!(read_entire_bytes(file.path()).unwrap().len(), 28);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_entire_file(dir.path().join("does-not-exist")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        let file = file_with(&[0xff, 0xfe, 0x00]);
        assert_eq!(
            read_entire_file(file.path()).unwrap_err().kind(),
            io::ErrorKind::InvalidData
        );
        assert_eq!(read_entire_bytes(file.path()).unwrap(), vec![0xff, 0xfe, 0x00]);
    }
}
