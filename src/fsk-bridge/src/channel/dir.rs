//! Directory-backed channel.
//!
//! Artifacts are plain files in one directory, so any process that follows
//! the request/response artifact contract in that directory can sit on the
//! other end: a runtime build whose virtual filesystem is mounted on disk, or
//! a stand-in such as the crate's [`ServerLoop`](crate::ServerLoop).
//! There is no cross-process locking; the single-flight discipline is the
//! only coordination. Writes land through a rename, so the other side never
//! sees a half-written artifact.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use super::{Channel, ChannelError};

/// Suffix of the staging file an artifact is written to before the rename.
const PARTIAL_SUFFIX: &str = ".partial";

/// Channel whose artifacts are plain files in one directory.
#[derive(Debug, Clone)]
pub struct DirChannel {
    root: PathBuf,
}

impl DirChannel {
    /// Use `root` as the shared directory. It must already exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, ChannelError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(ChannelError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("channel directory {} does not exist", root.display()),
            )));
        }
        debug!(root = %root.display(), "Directory channel opened");
        Ok(Self { root })
    }

    /// Get the shared directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, ChannelError> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root.join(name)),
            _ => Err(ChannelError::InvalidName(name.to_string())),
        }
    }
}

impl Channel for DirChannel {
    fn write(&self, name: &str, content: &str) -> Result<(), ChannelError> {
        let path = self.path_for(name)?;
        let staging = self.root.join(format!("{name}{PARTIAL_SUFFIX}"));

        let staged = File::create(&staging).and_then(|file| {
            let mut writer = BufWriter::new(file);
            writer.write_all(content.as_bytes())?;
            writer.flush()?;
            writer.get_ref().sync_all()
        });
        if let Err(e) = staged.and_then(|()| fs::rename(&staging, &path)) {
            let _ = fs::remove_file(&staging);
            return Err(e.into());
        }

        debug!(artifact = name, bytes = content.len(), "Artifact written");
        Ok(())
    }

    fn read(&self, name: &str) -> Result<String, ChannelError> {
        let path = self.path_for(name)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ChannelError::NotFound(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        String::from_utf8(bytes).map_err(|_| ChannelError::NotUtf8(name.to_string()))
    }

    fn exists(&self, name: &str) -> Result<bool, ChannelError> {
        Ok(self.path_for(name)?.is_file())
    }

    fn delete(&self, name: &str) -> Result<(), ChannelError> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ChannelError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
