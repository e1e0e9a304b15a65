use camino::{Utf8Path, Utf8PathBuf};
use scpguard_domain::ScpError;
use std::io::Write;
use tracing::warn;
use walkdir::WalkDir;

/// Write `contents` to `path` through a temporary file in the same directory, then rename.
pub fn write_atomic(path: &Utf8Path, contents: &[u8]) -> Result<(), ScpError> {
    PreparedFile::new(path, contents)?.persist()
}

/// Contents already on disk next to their destination, waiting for the final rename.
///
/// Dropping an unpersisted file removes the temporary.
pub(crate) struct PreparedFile {
    tmp: tempfile::NamedTempFile,
    path: Utf8PathBuf,
}

impl PreparedFile {
    pub(crate) fn new(path: &Utf8Path, contents: &[u8]) -> Result<Self, ScpError> {
        let parent = parent_or_cwd(path);
        std::fs::create_dir_all(parent).map_err(|e| ScpError::io(parent, e))?;

        let mut tmp =
            tempfile::NamedTempFile::new_in(parent).map_err(|e| ScpError::io(parent, e))?;
        tmp.write_all(contents).map_err(|e| ScpError::io(path, e))?;
        Ok(Self {
            tmp,
            path: path.to_path_buf(),
        })
    }

    pub(crate) fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub(crate) fn persist(self) -> Result<(), ScpError> {
        self.tmp
            .persist(&self.path)
            .map_err(|e| ScpError::io(&self.path, e.error))?;
        Ok(())
    }
}

pub(crate) fn parent_or_cwd(path: &Utf8Path) -> &Utf8Path {
    path.parent()
        .filter(|p| !p.as_str().is_empty())
        .unwrap_or(Utf8Path::new("."))
}

/// Recursively copy `src` into `dst`. Symlinks are skipped.
pub(crate) fn copy_tree(src: &Utf8Path, dst: &Utf8Path) -> Result<(), ScpError> {
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e
                .path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| src.to_string());
            ScpError::io(path, e.into())
        })?;
        let Some(abs) = Utf8Path::from_path(entry.path()) else {
            warn!(path = %entry.path().display(), "skipping non-UTF-8 path while copying mirror");
            continue;
        };
        let rel = abs.strip_prefix(src).unwrap_or(abs);
        let target = dst.join(rel);

        let file_type = entry.file_type();
        if file_type.is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| ScpError::io(&target, e))?;
        } else if file_type.is_file() {
            std::fs::copy(abs, &target).map_err(|e| ScpError::io(&target, e))?;
        } else {
            warn!(path = %abs, "skipping symlink while copying mirror");
        }
    }
    Ok(())
}

/// A directory built next to its destination and renamed over it on [`Staging::commit`].
///
/// Dropping an uncommitted staging area removes it.
pub(crate) struct Staging {
    holder: tempfile::TempDir,
    dir: Utf8PathBuf,
    dest: Utf8PathBuf,
}

impl Staging {
    /// Create a staging area for `dest`, seeded with a copy of `dest` when it exists.
    pub(crate) fn seeded(dest: &Utf8Path) -> Result<Self, ScpError> {
        let base = parent_or_cwd(dest);
        std::fs::create_dir_all(base).map_err(|e| ScpError::io(base, e))?;

        let holder = tempfile::Builder::new()
            .prefix(".scpguard-staging-")
            .tempdir_in(base)
            .map_err(|e| ScpError::io(base, e))?;
        let holder_path = Utf8Path::from_path(holder.path())
            .ok_or_else(|| {
                ScpError::io(
                    holder.path().display(),
                    std::io::Error::new(std::io::ErrorKind::InvalidData, "non-UTF-8 temp path"),
                )
            })?
            .to_path_buf();
        let dir = holder_path.join("mirror");

        if dest.is_dir() {
            copy_tree(dest, &dir)?;
        } else {
            std::fs::create_dir_all(&dir).map_err(|e| ScpError::io(&dir, e))?;
        }

        Ok(Self {
            holder,
            dir,
            dest: dest.to_path_buf(),
        })
    }

    pub(crate) fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// Swap the staged tree into place. The previous tree is restored if the swap fails.
    pub(crate) fn commit(self) -> Result<(), ScpError> {
        let base = parent_or_cwd(&self.dest);
        if self.dest.exists() {
            let previous = tempfile::Builder::new()
                .prefix(".scpguard-previous-")
                .tempdir_in(base)
                .map_err(|e| ScpError::io(base, e))?;
            let parked = previous.path().join("mirror");
            std::fs::rename(&self.dest, &parked).map_err(|e| ScpError::io(&self.dest, e))?;
            if let Err(err) = std::fs::rename(&self.dir, &self.dest) {
                if let Err(restore) = std::fs::rename(&parked, &self.dest) {
                    warn!(error = %restore, path = %self.dest, "failed to restore previous mirror");
                }
                return Err(ScpError::io(&self.dest, err));
            }
            drop(previous);
        } else {
            std::fs::rename(&self.dir, &self.dest).map_err(|e| ScpError::io(&self.dest, e))?;
        }
        drop(self.holder);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn utf8_root(tmp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf8 path")
    }

    #[test]
    fn write_atomic_creates_parents_and_replaces() {
        let tmp = TempDir::new().expect("temp dir");
        let path = utf8_root(&tmp).join("a/b/file.tf");
        write_atomic(&path, b"one").expect("write");
        write_atomic(&path, b"two").expect("rewrite");
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "two");
    }

    #[test]
    fn dropped_prepared_file_leaves_destination_untouched() {
        let tmp = TempDir::new().expect("temp dir");
        let path = utf8_root(&tmp).join("imports.tf");
        write_atomic(&path, b"old").expect("write");

        drop(PreparedFile::new(&path, b"new").expect("prepare"));

        assert_eq!(std::fs::read_to_string(&path).expect("read"), "old");
        let entries = std::fs::read_dir(utf8_root(&tmp)).expect("read dir").count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn staging_keeps_existing_files_and_commits() {
        let tmp = TempDir::new().expect("temp dir");
        let dest = utf8_root(&tmp).join("mirror");
        std::fs::create_dir_all(dest.join("ROOT")).expect("mkdir");
        std::fs::write(dest.join("ROOT/hand.json"), "{}").expect("write");

        let staging = Staging::seeded(&dest).expect("stage");
        assert!(staging.dir().join("ROOT/hand.json").is_file());
        std::fs::write(staging.dir().join("ROOT/new.json"), "{}").expect("write");
        staging.commit().expect("commit");

        assert!(dest.join("ROOT/hand.json").is_file());
        assert!(dest.join("ROOT/new.json").is_file());
        let leftovers: Vec<_> = std::fs::read_dir(utf8_root(&tmp))
            .expect("read dir")
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(".scpguard-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn dropped_staging_leaves_destination_untouched() {
        let tmp = TempDir::new().expect("temp dir");
        let dest = utf8_root(&tmp).join("mirror");
        std::fs::create_dir_all(&dest).expect("mkdir");
        std::fs::write(dest.join("keep.json"), "{}").expect("write");

        {
            let staging = Staging::seeded(&dest).expect("stage");
            std::fs::write(staging.dir().join("partial.json"), "{}").expect("write");
        }

        assert!(dest.join("keep.json").is_file());
        assert!(!dest.join("partial.json").exists());
    }
}
