/*
 * SHA-256 digests of file contents, rendered as lowercase hex. Used by the
 * checksum processor to fingerprint each selected file.
 */
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

const CHUNK_SIZE: usize = 8 * 1024;

/// Digests everything `reader` yields.
pub fn sha256_of_reader<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/*
 * Calculates the SHA256 checksum of the file at `file_path`. Anything that is
 * not a regular file is rejected with `InvalidInput` rather than read.
 */
pub fn calculate_sha256_checksum(file_path: &Path) -> io::Result<String> {
    if !file_path.is_file() {
        log::warn!("ChecksumUtils: {file_path:?} is not a file, cannot calculate checksum.");
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a file", file_path.display()),
        ));
    }
    let checksum = sha256_of_reader(BufReader::new(File::open(file_path)?))?;
    log::debug!("ChecksumUtils: Checksum {checksum} for {file_path:?}");
    Ok(checksum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, tempdir};

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_checksum_of_known_content() -> io::Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        temp_file.as_file_mut().write_all(b"abc")?;

        let checksum = calculate_sha256_checksum(temp_file.path())?;

        assert_eq!(
            checksum,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        Ok(())
    }

    #[test]
    fn test_checksum_of_empty_file() -> io::Result<()> {
        let temp_file = NamedTempFile::new()?;
        assert_eq!(calculate_sha256_checksum(temp_file.path())?, EMPTY_SHA256);
        Ok(())
    }

    #[test]
    fn test_multi_chunk_input_matches_single_read() -> io::Result<()> {
        let content: Vec<u8> = (0..3 * CHUNK_SIZE + 17).map(|i| (i % 251) as u8).collect();
        let mut temp_file = NamedTempFile::new()?;
        temp_file.as_file_mut().write_all(&content)?;

        let from_file = calculate_sha256_checksum(temp_file.path())?;
        let from_memory = format!("{:x}", Sha256::digest(&content));
        assert_eq!(from_file, from_memory);
        Ok(())
    }

    #[test]
    fn test_checksum_rejects_directories_and_missing_files() {
        let dir = tempdir().unwrap();

        let on_dir = calculate_sha256_checksum(dir.path());
        assert_eq!(on_dir.unwrap_err().kind(), io::ErrorKind::InvalidInput);

        let missing = calculate_sha256_checksum(&dir.path().join("nope.c"));
        assert!(missing.is_err());
        assert_eq!(sha256_of_reader(io::empty()).unwrap(), EMPTY_SHA256);
    }
}
