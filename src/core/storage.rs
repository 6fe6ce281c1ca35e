use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/*-------------------------------------------------------------------------------------------------
  Storage Capability
-------------------------------------------------------------------------------------------------*/

/// Raw byte storage used by the snapshot store. `write` must replace the full contents of the
/// target; partial writes or appends are not acceptable.
pub trait Storage: Send + Sync {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
    fn delete(&self, path: &Path) -> io::Result<()>;
    fn exists(&self, path: &Path) -> bool;
}

/*--------------------------------------------------------------------------------------
  Local Filesystem Storage
--------------------------------------------------------------------------------------*/

#[derive(Debug, Default, Clone, Copy)]
pub struct FileStorage;

impl Storage for FileStorage {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        // Ensure parent directories exist
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        // Write a temporary file next to the target, then rename it over the target so readers
        // see either the old or the new contents
        let mut temp_file = NamedTempFile::new_in(parent)?;
        temp_file.write_all(contents)?;
        temp_file.flush()?;
        temp_file.persist(path).map_err(|error| error.error)?;
        Ok(())
    }

    fn delete(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn exists(&self, path: &Path) -> bool {
        fs::metadata(path)
            .map(|metadata| metadata.is_file())
            .unwrap_or(false)
    }
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
