//! Filesystem Adapters
//!
//! Implements `BlockSink` on the local filesystem and writes channel create
//! transaction files.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::domain::{encode, ChannelError, ChannelId, ChannelProfile};
use crate::ports::{BlockSink, TransactionBuilder};

/// Permissions of a written genesis block (owner read/write).
pub const BLOCK_FILE_MODE: u32 = 0o600;
/// Permissions of a written channel create transaction.
pub const TX_FILE_MODE: u32 = 0o640;
/// Permissions of directories created for output files.
pub const OUTPUT_DIR_MODE: u32 = 0o750;

fn persist_err(path: &Path, e: std::io::Error) -> ChannelError {
    ChannelError::Persist {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

fn create_parent_dir(path: &Path) -> Result<(), ChannelError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => return Ok(()),
    };
    if parent.is_dir() {
        return Ok(());
    }

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(OUTPUT_DIR_MODE);
    }
    builder.create(parent).map_err(|e| persist_err(parent, e))
}

/// Write `data` to `path` atomically with `mode` permissions.
///
/// Missing parent directories are created. The data goes to a sibling temp
/// file which is synced and renamed over `path`, so readers never observe a
/// partial file.
pub fn write_file(path: &Path, data: &[u8], mode: u32) -> Result<(), ChannelError> {
    create_parent_dir(path)?;

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }

    let mut file = options
        .open(&temp_path)
        .map_err(|e| persist_err(&temp_path, e))?;
    file.write_all(data).map_err(|e| persist_err(&temp_path, e))?;
    file.sync_all().map_err(|e| persist_err(&temp_path, e))?;

    // A stale temp file keeps its old mode; reset it before the rename.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&temp_path, fs::Permissions::from_mode(mode))
            .map_err(|e| persist_err(&temp_path, e))?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    fs::rename(&temp_path, path).map_err(|e| persist_err(path, e))
}

/// Genesis block sink writing to the local filesystem.
#[derive(Clone, Debug, Default)]
pub struct FileBlockSink;

impl FileBlockSink {
    /// New filesystem sink.
    pub fn new() -> Self {
        Self
    }
}

impl BlockSink for FileBlockSink {
    fn write_block(&self, path: &Path, bytes: &[u8]) -> Result<(), ChannelError> {
        write_file(path, bytes, BLOCK_FILE_MODE)?;
        info!(
            "[qc-18] 💾 Wrote genesis block to {} ({} bytes)",
            path.display(),
            bytes.len()
        );
        Ok(())
    }
}

/// Generate the unsigned channel create transaction for `channel_id` and
/// write it to `output`, for later submission as a pre-built tx file.
pub fn write_channel_create_tx(
    builder: &dyn TransactionBuilder,
    channel_id: &ChannelId,
    base_profile: Option<&ChannelProfile>,
    output: impl Into<PathBuf>,
) -> Result<PathBuf, ChannelError> {
    let output = output.into();
    info!("[qc-18] Generating channel create tx for {}", channel_id);

    let envelope = builder.make_channel_creation_tx(channel_id, base_profile)?;
    write_file(&output, &encode(&envelope)?, TX_FILE_MODE)?;

    info!("[qc-18] Wrote channel create tx to {}", output.display());
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::TemplateTransactionBuilder;

    #[test]
    fn test_write_file_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/out.block");

        write_file(&path, b"block", BLOCK_FILE_MODE).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"block");
    }

    #[test]
    fn test_write_file_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.block");

        write_file(&path, b"one", BLOCK_FILE_MODE).unwrap();
        write_file(&path, b"two", BLOCK_FILE_MODE).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"two");
        assert!(!dir.path().join("c.block.tmp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_block_file_is_owner_read_write_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("perm.block");
        FileBlockSink::new().write_block(&path, b"block").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, BLOCK_FILE_MODE);
    }

    #[test]
    fn test_write_into_file_as_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();

        let result = write_file(&blocker.join("c.block"), b"block", BLOCK_FILE_MODE);
        assert!(matches!(result, Err(ChannelError::Persist { .. })));
    }

    #[test]
    fn test_write_channel_create_tx_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let builder = TemplateTransactionBuilder::default();
        let id = ChannelId::new("generated").unwrap();

        let path = write_channel_create_tx(&builder, &id, None, dir.path().join("tx/generated.tx"))
            .unwrap();
        let envelope = crate::algorithms::create_from_config_tx(&path).unwrap();
        assert!(!envelope.payload.is_empty());
    }
}
