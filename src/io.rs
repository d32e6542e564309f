//! Firmware image loading.

use memmap2::Mmap;
use std::fs::File;
use std::io::Read;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::Result;

enum Backing {
    Mapped(Mmap),
    /// Pipes and character devices, read once to EOF.
    Owned(Vec<u8>),
    Empty,
}

/// A read-only snapshot of a flash dump.
///
/// Regular files are mapped once, other sources are read once to EOF.
/// Scanning works on that snapshot and never goes back to the source.
pub struct FlashImage {
    path: PathBuf,
    backing: Backing,
}

impl FlashImage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        let metadata = file.metadata()?;

        // Only regular files report a meaningful length; mapping a
        // zero-length file fails on most platforms.
        let backing = if !metadata.is_file() {
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes)?;
            Backing::Owned(bytes)
        } else if metadata.len() == 0 {
            Backing::Empty
        } else {
            let mmap = unsafe { Mmap::map(&file) }?;

            #[cfg(unix)]
            {
                let _ = mmap.advise(memmap2::Advice::Sequential);
            }

            Backing::Mapped(mmap)
        };

        let image = Self {
            path: path.to_path_buf(),
            backing,
        };
        debug!(path = %path.display(), size = image.len(), "image opened");
        Ok(image)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn as_bytes(&self) -> &[u8] {
        match &self.backing {
            Backing::Mapped(mmap) => &mmap[..],
            Backing::Owned(bytes) => bytes,
            Backing::Empty => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Deref for FlashImage {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_open_regular_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"firmware bytes").unwrap();
        temp_file.flush().unwrap();

        let image = FlashImage::open(temp_file.path()).unwrap();
        assert_eq!(image.len(), 14);
        assert_eq!(&image[..8], b"firmware");
        assert_eq!(image.path(), temp_file.path());
    }

    #[test]
    fn test_open_empty_file() {
        let temp_file = NamedTempFile::new().unwrap();
        let image = FlashImage::open(temp_file.path()).unwrap();
        assert!(image.is_empty());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_open_fifo_reads_stream() {
        use crate::scanner::scan;
        use crate::types::{Access, VarType};
        use crate::VariableRecord;
        use std::process::Command;
        use std::thread;

        let dir = tempfile::tempdir().unwrap();
        let fifo = dir.path().join("fw.fifo");
        let status = Command::new("mkfifo").arg(&fifo).status().unwrap();
        assert!(status.success());

        let record =
            VariableRecord::new("motor_speed", 0x2000_0010, VarType::UInt16, Access::ReadWrite)
                .with_bounds(0.0, 3000.0);
        let bytes = record.encode();
        let writer_path = fifo.clone();
        let writer = thread::spawn(move || {
            let mut pipe = std::fs::OpenOptions::new().write(true).open(writer_path).unwrap();
            pipe.write_all(&bytes).unwrap();
        });

        let image = FlashImage::open(&fifo).unwrap();
        writer.join().unwrap();

        assert_eq!(image.len(), 84);
        let result = scan(&image);
        assert_eq!(result.len(), 1);
        assert_eq!(result.entries()[0].record.name(), "motor_speed");
    }

    #[test]
    fn test_open_missing_file() {
        assert!(FlashImage::open("/nonexistent/firmware.bin").is_err());
    }
}
