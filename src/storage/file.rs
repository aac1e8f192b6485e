//! Low-level file handle used by the index and table files.

use crate::error::{EngineError, Result};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};

/// A named file that may or may not currently be open.
///
/// Mirrors the storage layer's split between "a file we know the name of"
/// and "a file we have a live handle to" so callers can construct a handle
/// before deciding whether to create or open it.
pub struct FileHandle {
    name: String,
    file: Option<File>,
}

impl FileHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file: None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn open(&mut self, create: bool) -> Result<()> {
        if !self.is_closed() {
            return Err(EngineError::FileAlreadyOpened);
        }
        let file = if create {
            OpenOptions::new()
                .read(true)
                .write(true)
                .create_new(true)
                .open(&self.name)
                .map_err(|_| EngineError::BadFileOpen)?
        } else {
            OpenOptions::new()
                .read(true)
                .write(true)
                .open(&self.name)
                .map_err(|_| EngineError::BadFileOpen)?
        };
        self.file = Some(file);
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        self.file.take();
        Ok(())
    }

    pub fn write(&mut self, buf: &[u8]) -> Result<()> {
        self.handle()?.write_all(buf)?;
        Ok(())
    }

    pub fn write_byte_n(&mut self, byte: u8, n: usize) -> Result<()> {
        let padding = vec![byte; n];
        self.write(&padding)
    }

    pub fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        self.handle()?.read_exact(buf)?;
        Ok(())
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        let mut discard = vec![0u8; n];
        self.read(&mut discard)
    }

    pub fn seek(&mut self, offset: u64) -> Result<()> {
        self.handle()?.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.handle()?.flush()?;
        Ok(())
    }

    /// Close and delete the underlying file.
    pub fn remove_file(&mut self) -> Result<()> {
        self.close()?;
        std::fs::remove_file(&self.name)?;
        Ok(())
    }

    fn handle(&mut self) -> Result<&mut File> {
        self.file.as_mut().ok_or(EngineError::FileClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_then_reopen_and_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("handle.bin");
        let mut handle = FileHandle::new(path.to_str().unwrap());
        handle.open(true).unwrap();
        handle.write(b"hello").unwrap();
        handle.close().unwrap();

        let mut handle = FileHandle::new(path.to_str().unwrap());
        handle.open(false).unwrap();
        let mut buf = [0u8; 5];
        handle.read(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");
    }

    #[test]
    fn double_open_is_file_already_opened() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("handle2.bin");
        let mut handle = FileHandle::new(path.to_str().unwrap());
        handle.open(true).unwrap();
        assert!(matches!(
            handle.open(true),
            Err(EngineError::FileAlreadyOpened)
        ));
    }

    #[test]
    fn read_on_closed_file_errors() {
        let mut handle = FileHandle::new("does-not-matter");
        let mut buf = [0u8; 1];
        assert!(matches!(handle.read(&mut buf), Err(EngineError::FileClosed)));
    }
}
