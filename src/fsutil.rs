use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

/// Error that occurs when reading a whole file fails.
#[derive(Debug, thiserror::Error)]
pub enum FileReadError {
    #[error("failed to open file `{path}`: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read file `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Reads the file at `path` into a string, keeping the path in any error.
///
/// # Example
/// ```no_run
/// # use pv_mount_point_exporter::fsutil;
/// let mounts = fsutil::read_to_string("/proc/self/mounts")?;
/// # Ok::<(), fsutil::FileReadError>(())
/// ```
pub fn read_to_string(path: impl AsRef<Path>) -> Result<String, FileReadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| FileReadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut text = String::with_capacity(4096);
    BufReader::new(file)
        .read_to_string(&mut text)
        .map_err(|source| FileReadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_to_string_success() {
        let mut tmp = tempfile::NamedTempFile::new().expect("failed to create temp file");
        write!(tmp, "line one\nline two\n").unwrap();
        let text = read_to_string(tmp.path()).expect("should read test file");
        assert_eq!(text, "line one\nline two\n");
    }

    #[test]
    fn test_read_to_string_missing_file() {
        match read_to_string("/definitely/does/not/exist").unwrap_err() {
            FileReadError::Open { path, source } => {
                assert_eq!(path, Path::new("/definitely/does/not/exist"));
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    #[cfg(target_family = "unix")]
    fn test_read_to_string_directory() {
        let dir = tempfile::tempdir().unwrap();
        match read_to_string(dir.path()).unwrap_err() {
            FileReadError::Read { path, .. } => assert_eq!(path, dir.path()),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
