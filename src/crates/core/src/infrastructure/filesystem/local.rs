//! Local filesystem directory service
//!
//! `tokio::fs` implementation bound to one canonical root directory. Deleted
//! entries are moved into a trash directory under the root so every delete is
//! recoverable.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use log::debug;
use tokio::fs;
use tokio::process::Command;

use crate::infrastructure::filesystem::directory_service::{DirectoryService, FileEntry};
use crate::infrastructure::filesystem::path_utils::{
    extension_of, is_hidden_name, join_rel, name_of, normalize_rel, parent_of,
    validate_entry_name,
};
use crate::util::errors::{TreelineError, TreelineResult};

/// Recoverable-delete location, relative to the service root.
pub const TRASH_DIR_NAME: &str = ".trash";

/// Directory service over the local filesystem.
///
/// Sibling order in listings is directories first, then case-insensitive by
/// name: stable across reads, and the order the engine renders verbatim.
pub struct LocalDirectoryService {
    root: PathBuf,
}

impl LocalDirectoryService {
    /// Bind the service to `root`. The path is canonicalized (UNC-free on
    /// Windows) and must be an existing directory.
    pub fn new(root: impl Into<PathBuf>) -> TreelineResult<Self> {
        let requested = root.into();
        let root = dunce::canonicalize(&requested).map_err(|e| {
            TreelineError::InvalidPath(format!("{}: {}", requested.display(), e))
        })?;
        if !root.is_dir() {
            return Err(TreelineError::InvalidPath(format!(
                "not a directory: {}",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path for a root-relative one. Normalization rejects traversal,
    /// so the result is always inside the root.
    fn resolve(&self, rel_path: &str) -> TreelineResult<PathBuf> {
        let rel = normalize_rel(rel_path)?;
        if rel.is_empty() {
            Ok(self.root.clone())
        } else {
            Ok(self.root.join(rel))
        }
    }

    async fn resolve_existing(&self, rel_path: &str) -> TreelineResult<PathBuf> {
        let abs = self.resolve(rel_path)?;
        if !fs::try_exists(&abs).await? {
            return Err(TreelineError::NotFound(format!(
                "\"{}\" does not exist",
                rel_path
            )));
        }
        Ok(abs)
    }

    fn make_entry(&self, name: String, path: String, metadata: &std::fs::Metadata) -> FileEntry {
        let is_directory = metadata.is_dir();
        let absolute_path = self.root.join(&path).to_string_lossy().into_owned();
        let (size, modified_time) = if is_directory {
            (None, None)
        } else {
            let modified = metadata
                .modified()
                .ok()
                .map(|t| DateTime::<Utc>::from(t).timestamp_millis());
            (Some(metadata.len()), modified)
        };
        FileEntry {
            extension: if is_directory {
                String::new()
            } else {
                extension_of(&name)
            },
            is_hidden: is_hidden_name(&name),
            name,
            path,
            absolute_path,
            is_directory,
            size,
            modified_time,
        }
    }

    /// Depth-first collection: each directory's children are appended right
    /// after it, descending only into expanded directories.
    fn collect_into<'a>(
        &'a self,
        dir_rel: String,
        expanded: &'a BTreeSet<String>,
        out: &'a mut Vec<FileEntry>,
    ) -> BoxFuture<'a, TreelineResult<()>> {
        Box::pin(async move {
            let abs = self.resolve(&dir_rel)?;
            let mut reader = fs::read_dir(&abs).await?;
            let mut children: Vec<FileEntry> = Vec::new();
            while let Some(dir_entry) = reader.next_entry().await? {
                let name = dir_entry.file_name().to_string_lossy().into_owned();
                if dir_rel.is_empty() && name == TRASH_DIR_NAME {
                    continue;
                }
                let metadata = dir_entry.metadata().await?;
                let rel_path = join_rel(&dir_rel, &name);
                children.push(self.make_entry(name, rel_path, &metadata));
            }
            children.sort_by(|a, b| {
                b.is_directory
                    .cmp(&a.is_directory)
                    .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            });
            for child in children {
                let descend = child.is_directory && expanded.contains(&child.path);
                let child_path = child.path.clone();
                out.push(child);
                if descend {
                    self.collect_into(child_path, expanded, out).await?;
                }
            }
            Ok(())
        })
    }

    /// Pick a non-colliding destination inside the trash directory, suffixing
    /// the stem with a counter (`b.md`, `b 1.md`, `b 2.md`, ...).
    async fn trash_destination(&self, name: &str) -> TreelineResult<PathBuf> {
        let trash = self.root.join(TRASH_DIR_NAME);
        fs::create_dir_all(&trash).await?;
        let (stem, suffix) = match name.rfind('.') {
            Some(idx) if idx > 0 => (&name[..idx], &name[idx..]),
            _ => (name, ""),
        };
        let mut candidate = trash.join(name);
        let mut counter = 1u32;
        while fs::try_exists(&candidate).await? {
            candidate = trash.join(format!("{} {}{}", stem, counter, suffix));
            counter += 1;
        }
        Ok(candidate)
    }
}

#[async_trait]
impl DirectoryService for LocalDirectoryService {
    async fn read_directory_recursive(
        &self,
        current_path: &str,
        expanded: &BTreeSet<String>,
    ) -> TreelineResult<Vec<FileEntry>> {
        let current = normalize_rel(current_path)?;
        let mut entries = Vec::new();
        self.collect_into(current, expanded, &mut entries).await?;
        debug!(
            "Directory read complete: root={} entries={}",
            self.root.display(),
            entries.len()
        );
        Ok(entries)
    }

    async fn create_file(&self, dir_path: &str, name: &str) -> TreelineResult<()> {
        validate_entry_name(name)?;
        let target = self.resolve(&join_rel(dir_path, name))?;
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .await
        {
            Ok(_) => {
                debug!("File created: path={}", target.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(TreelineError::AlreadyExists(
                format!("\"{}\" already exists", name),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn create_directory(&self, dir_path: &str, name: &str) -> TreelineResult<()> {
        validate_entry_name(name)?;
        let target = self.resolve(&join_rel(dir_path, name))?;
        match fs::create_dir(&target).await {
            Ok(()) => {
                debug!("Directory created: path={}", target.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(TreelineError::AlreadyExists(
                format!("\"{}\" already exists", name),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn rename(&self, target_path: &str, new_name: &str) -> TreelineResult<()> {
        validate_entry_name(new_name)?;
        let rel = normalize_rel(target_path)?;
        let source = self.resolve_existing(&rel).await?;
        let destination = self.resolve(&join_rel(parent_of(&rel), new_name))?;
        if fs::try_exists(&destination).await? {
            return Err(TreelineError::AlreadyExists(format!(
                "\"{}\" already exists",
                new_name
            )));
        }
        fs::rename(&source, &destination).await?;
        debug!(
            "Entry renamed: from={} to={}",
            source.display(),
            destination.display()
        );
        Ok(())
    }

    async fn delete(&self, target_path: &str) -> TreelineResult<()> {
        let rel = normalize_rel(target_path)?;
        let source = self.resolve_existing(&rel).await?;
        let destination = self.trash_destination(name_of(&rel)).await?;
        fs::rename(&source, &destination).await?;
        debug!(
            "Entry trashed: from={} to={}",
            source.display(),
            destination.display()
        );
        Ok(())
    }

    async fn open_with_system_app(&self, path: &str) -> TreelineResult<()> {
        let abs = self.resolve_existing(path).await?;
        spawn_detached(open_command(&abs), "open")
    }

    async fn show_in_folder(&self, path: &str) -> TreelineResult<()> {
        let abs = self.resolve_existing(path).await?;
        spawn_detached(reveal_command(&abs), "reveal")
    }
}

fn spawn_detached(mut command: Command, action: &str) -> TreelineResult<()> {
    match command.spawn() {
        Ok(_) => Ok(()),
        Err(e) => Err(TreelineError::OperationFailed(format!(
            "{} failed: {}",
            action, e
        ))),
    }
}

#[cfg(target_os = "macos")]
fn open_command(target: &Path) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(target);
    cmd
}

#[cfg(target_os = "windows")]
fn open_command(target: &Path) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "start", ""]).arg(target);
    cmd
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn open_command(target: &Path) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(target);
    cmd
}

#[cfg(target_os = "macos")]
fn reveal_command(target: &Path) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg("-R").arg(target);
    cmd
}

#[cfg(target_os = "windows")]
fn reveal_command(target: &Path) -> Command {
    let mut cmd = Command::new("explorer");
    cmd.arg(format!("/select,{}", target.display()));
    cmd
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn reveal_command(target: &Path) -> Command {
    // No portable "select in file manager" on Linux; open the parent folder.
    let mut cmd = Command::new("xdg-open");
    cmd.arg(target.parent().unwrap_or(target));
    cmd
}
