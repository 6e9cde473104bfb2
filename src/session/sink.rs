use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::capture::Frame;

/// The clip file receiving appended frames: concatenated JPEG images
/// (`.mjpeg`), append-only while open.
///
/// The writer closes exactly once; an append after close is silently dropped,
/// which is what a frame racing a `stop` must do.
pub struct FrameSink {
    writer: Option<BufWriter<File>>,
    path: PathBuf,
    frames_written: u64,
    bytes_written: u64,
}

impl FrameSink {
    pub fn create(path: PathBuf) -> Result<Self> {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create sink file: {:?}", path))?;

        Ok(Self {
            writer: Some(BufWriter::new(file)),
            path,
            frames_written: 0,
            bytes_written: 0,
        })
    }

    pub fn append(&mut self, frame: &Frame) -> Result<()> {
        if let Some(writer) = &mut self.writer {
            writer
                .write_all(&frame.data)
                .with_context(|| format!("Failed to append frame to {:?}", self.path))?;
            self.frames_written += 1;
            self.bytes_written += frame.data.len() as u64;
        }

        Ok(())
    }

    /// Flush, fsync, and close. Idempotent; afterwards the file is fully on
    /// disk and safe for an upload attempt to read.
    pub fn finish(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer
                .flush()
                .with_context(|| format!("Failed to flush sink {:?}", self.path))?;
            writer
                .get_ref()
                .sync_all()
                .with_context(|| format!("Failed to sync sink {:?}", self.path))?;
        }

        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

impl Drop for FrameSink {
    fn drop(&mut self) {
        if self.writer.is_some() {
            if let Err(e) = self.finish() {
                warn!("Failed to finalize sink on drop: {:#}", e);
            }
        }
    }
}
