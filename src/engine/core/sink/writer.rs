use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::engine::errors::SinkError;

/// A long-term sink for merged columnar files. Implementations wrap object
/// stores, other Talaria instances, plain directories or fan-outs of those.
pub trait Writer: Send + Sync {
    fn write(&self, name: &str, value: &[u8]) -> Result<(), SinkError>;

    fn close(&self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Writes merged files into a directory tree, creating parents on demand.
/// The object name maps directly onto a relative path.
pub struct DirWriter {
    dir: PathBuf,
}

impl DirWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Result<DirWriter, SinkError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        info!(target: "talaria::sink", dir = %dir.display(), "Directory sink ready");
        Ok(DirWriter { dir })
    }

    fn path_for(&self, name: &str) -> PathBuf {
        // Object names are slash-separated; keep them inside the sink root.
        let relative: PathBuf = Path::new(name)
            .components()
            .filter(|c| matches!(c, std::path::Component::Normal(_)))
            .collect();
        self.dir.join(relative)
    }
}

impl Writer for DirWriter {
    fn write(&self, name: &str, value: &[u8]) -> Result<(), SinkError> {
        let path = self.path_for(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, value)?;
        debug!(
            target: "talaria::sink",
            path = %path.display(),
            bytes = value.len(),
            "Wrote merged file"
        );
        Ok(())
    }
}

/// Fans one write out to several sinks; the first failure wins.
pub struct MultiWriter {
    writers: Vec<Arc<dyn Writer>>,
}

impl MultiWriter {
    pub fn new(writers: Vec<Arc<dyn Writer>>) -> Self {
        Self { writers }
    }
}

impl Writer for MultiWriter {
    fn write(&self, name: &str, value: &[u8]) -> Result<(), SinkError> {
        for writer in &self.writers {
            writer.write(name, value)?;
        }
        Ok(())
    }

    fn close(&self) -> Result<(), SinkError> {
        for writer in &self.writers {
            writer.close()?;
        }
        Ok(())
    }
}
