/*
 * Downstream consumers of the selected files. The driver hands each file of a
 * traversal to one `FileProcessorOperations` implementation; an `Err` marks
 * that file as abandoned without stopping the run.
 */
use super::checksum_utils;
use std::io::{self, Write};
use std::path::Path;

pub trait FileProcessorOperations {
    fn process(&mut self, path: &Path) -> io::Result<()>;
}

/// Writes each path on a line of its own.
pub struct ListingProcessor<W: Write> {
    out: W,
}

impl<W: Write> ListingProcessor<W> {
    pub fn new(out: W) -> Self {
        ListingProcessor { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> FileProcessorOperations for ListingProcessor<W> {
    fn process(&mut self, path: &Path) -> io::Result<()> {
        writeln!(self.out, "{}", path.display())
    }
}

/*
 * Writes `<sha256-hex>  <path>` for each file, the layout `sha256sum -c`
 * reads back.
 */
pub struct ChecksumProcessor<W: Write> {
    out: W,
}

impl<W: Write> ChecksumProcessor<W> {
    pub fn new(out: W) -> Self {
        ChecksumProcessor { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> FileProcessorOperations for ChecksumProcessor<W> {
    fn process(&mut self, path: &Path) -> io::Result<()> {
        let checksum = checksum_utils::calculate_sha256_checksum(path)?;
        writeln!(self.out, "{checksum}  {}", path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_listing_writes_one_line_per_file() -> io::Result<()> {
        let mut processor = ListingProcessor::new(Vec::new());

        processor.process(Path::new("/src/a.c"))?;
        processor.process(Path::new("/src/b.c"))?;

        let text = String::from_utf8(processor.into_inner()).unwrap();
        assert_eq!(text, "/src/a.c\n/src/b.c\n");
        Ok(())
    }

    #[test]
    fn test_checksum_line_layout() -> io::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("empty.h");
        fs::write(&path, "")?;
        let mut processor = ChecksumProcessor::new(Vec::new());

        processor.process(&path)?;

        let text = String::from_utf8(processor.into_inner()).unwrap();
        assert_eq!(
            text,
            format!(
                "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855  {}\n",
                path.display()
            )
        );
        Ok(())
    }

    #[test]
    fn test_checksum_of_vanished_file_is_an_error_and_writes_nothing() {
        let dir = tempdir().unwrap();
        let mut processor = ChecksumProcessor::new(Vec::new());

        assert!(processor.process(&dir.path().join("gone.c")).is_err());
        assert!(processor.into_inner().is_empty());
    }
}
