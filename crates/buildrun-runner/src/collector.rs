//! Merges per-task output directories into one distributable tree.

use std::fs;
use std::path::{Path, PathBuf};

use buildrun_core::CopySpec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::CollectError;

/// Totals for one collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectReport {
    /// Files written.
    pub files: u64,

    /// Directories visited on the destination side.
    pub directories: u64,

    /// Bytes copied.
    pub bytes: u64,

    /// Symbolic links recreated as links.
    pub symlinks: u64,
}

/// Copies build outputs under a common output root.
///
/// Existing destination content is overwritten file by file; nothing is
/// removed, so files that disappeared from a source stay in the output.
/// Symbolic links are copied as links and never followed.
#[derive(Debug, Clone)]
pub struct ArtifactCollector {
    output_root: PathBuf,
}

impl ArtifactCollector {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Ensure the output root exists, then copy each [`CopySpec`] recursively.
    ///
    /// Sources are all checked first: a missing source fails the call before
    /// any file is written.
    pub fn collect(&self, specs: &[CopySpec]) -> Result<CollectReport, CollectError> {
        for spec in specs {
            check_source(&spec.source)?;
        }

        self.ensure_output_root()?;

        let mut report = CollectReport::default();
        for spec in specs {
            info!(
                source = %spec.source.display(),
                destination = %spec.destination.display(),
                "Copying artifacts"
            );
            copy_dir(&spec.source, &spec.destination, &mut report)?;
        }

        info!(
            files = report.files,
            directories = report.directories,
            bytes = report.bytes,
            symlinks = report.symlinks,
            "Artifacts collected"
        );
        Ok(report)
    }

    fn ensure_output_root(&self) -> Result<(), CollectError> {
        if self.output_root.exists() {
            return Ok(());
        }
        debug!(path = %self.output_root.display(), "Creating output directory");
        fs::create_dir(&self.output_root).map_err(|e| CollectError::io(&self.output_root, e))
    }
}

fn check_source(source: &Path) -> Result<(), CollectError> {
    match fs::metadata(source) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(CollectError::NotADirectory(source.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(CollectError::SourceMissing(source.to_path_buf()))
        }
        Err(e) => Err(CollectError::io(source, e)),
    }
}

fn copy_dir(
    source: &Path,
    destination: &Path,
    report: &mut CollectReport,
) -> Result<(), CollectError> {
    fs::create_dir_all(destination).map_err(|e| CollectError::io(destination, e))?;
    report.directories += 1;

    let entries = fs::read_dir(source).map_err(|e| CollectError::io(source, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| CollectError::io(source, e))?;
        let path = entry.path();
        let target = destination.join(entry.file_name());

        let file_type = entry.file_type().map_err(|e| CollectError::io(&path, e))?;
        if file_type.is_symlink() {
            copy_link(&path, &target, report)?;
        } else if file_type.is_dir() {
            copy_dir(&path, &target, report)?;
        } else {
            copy_file(&path, &target, report)?;
        }
    }
    Ok(())
}

fn copy_file(source: &Path, target: &Path, report: &mut CollectReport) -> Result<(), CollectError> {
    let bytes = fs::copy(source, target).map_err(|e| CollectError::io(target, e))?;
    report.files += 1;
    report.bytes += bytes;
    Ok(())
}

/// Recreate the link at `target`, replacing a file or link already there.
/// Dangling links are copied as they are.
#[cfg(unix)]
fn copy_link(source: &Path, target: &Path, report: &mut CollectReport) -> Result<(), CollectError> {
    let link = fs::read_link(source).map_err(|e| CollectError::io(source, e))?;

    match fs::symlink_metadata(target) {
        Ok(meta) if meta.is_dir() => {
            return Err(CollectError::io(
                target,
                std::io::Error::other("a directory is in the way of a symlink"),
            ));
        }
        Ok(_) => fs::remove_file(target).map_err(|e| CollectError::io(target, e))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(CollectError::io(target, e)),
    }

    std::os::unix::fs::symlink(&link, target).map_err(|e| CollectError::io(target, e))?;
    report.symlinks += 1;
    Ok(())
}

/// Links need privileges to create here: file links are copied as files,
/// directory and dangling links are skipped.
#[cfg(not(unix))]
fn copy_link(source: &Path, target: &Path, report: &mut CollectReport) -> Result<(), CollectError> {
    match fs::metadata(source) {
        Ok(meta) if meta.is_file() => copy_file(source, target, report),
        Ok(_) => {
            tracing::warn!(path = %source.display(), "Skipping directory symlink");
            Ok(())
        }
        Err(e) => {
            tracing::warn!(path = %source.display(), error = %e, "Skipping dangling symlink");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn sample_tree(base: &Path) -> (PathBuf, PathBuf) {
        let client = base.join("client/dist");
        let server = base.join("server/dist");
        write(&client.join("index.html"), "<html></html>");
        write(&client.join("assets/js/app.js"), "console.log(1)");
        write(&server.join("FChat_linux_amd64"), "ELF");
        write(&server.join("FChat_windows_amd64.exe"), "MZ");
        (client, server)
    }

    #[test]
    fn test_collect_copies_nested_trees() {
        let dir = tempfile::tempdir().unwrap();
        let (client, server) = sample_tree(dir.path());
        let out = dir.path().join("dist");

        let collector = ArtifactCollector::new(&out);
        let report = collector
            .collect(&[
                CopySpec::new(&client, out.join("client")),
                CopySpec::new(&server, out.join("server")),
            ])
            .unwrap();

        assert_eq!(report.files, 4);
        assert_eq!(report.directories, 4);
        assert_eq!(
            fs::read_to_string(out.join("client/assets/js/app.js")).unwrap(),
            "console.log(1)"
        );
        assert_eq!(
            fs::read(out.join("server/FChat_windows_amd64.exe")).unwrap(),
            b"MZ"
        );
    }

    #[test]
    fn test_collect_twice_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let (client, _server) = sample_tree(dir.path());
        let out = dir.path().join("dist");
        let collector = ArtifactCollector::new(&out);
        let specs = [CopySpec::new(&client, out.join("client"))];

        collector.collect(&specs).unwrap();
        write(&client.join("index.html"), "<html>v2</html>");
        write(&out.join("client/stale.txt"), "old");
        let report = collector.collect(&specs).unwrap();

        assert_eq!(report.files, 2);
        assert_eq!(
            fs::read_to_string(out.join("client/index.html")).unwrap(),
            "<html>v2</html>"
        );
        // Overwrite only, nothing is pruned.
        assert!(out.join("client/stale.txt").exists());
    }

    #[test]
    fn test_existing_output_root_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let (client, _server) = sample_tree(dir.path());
        let out = dir.path().join("dist");
        write(&out.join("README.txt"), "keep me");

        ArtifactCollector::new(&out)
            .collect(&[CopySpec::new(&client, out.join("client"))])
            .unwrap();

        assert_eq!(fs::read_to_string(out.join("README.txt")).unwrap(), "keep me");
    }

    #[test]
    fn test_missing_source_copies_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (client, _server) = sample_tree(dir.path());
        let out = dir.path().join("dist");
        let missing = dir.path().join("server/build");

        let err = ArtifactCollector::new(&out)
            .collect(&[
                CopySpec::new(&client, out.join("client")),
                CopySpec::new(&missing, out.join("server")),
            ])
            .unwrap_err();

        assert!(matches!(err, CollectError::SourceMissing(ref p) if *p == missing));
        assert!(!out.exists());
    }

    #[test]
    fn test_source_must_be_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("artifact.bin");
        write(&file, "x");

        let err = ArtifactCollector::new(dir.path().join("dist"))
            .collect(&[CopySpec::new(&file, dir.path().join("dist/bin"))])
            .unwrap_err();

        assert!(matches!(err, CollectError::NotADirectory(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_copied_as_links() {
        use std::os::unix::fs::symlink;

        let dir = tempfile::tempdir().unwrap();
        let (client, _server) = sample_tree(dir.path());
        symlink("missing-target", client.join("latest")).unwrap();
        symlink("index.html", client.join("home.html")).unwrap();
        // Points back at an ancestor; following it would never end.
        symlink("..", client.join("assets/up")).unwrap();

        let out = dir.path().join("dist");
        let collector = ArtifactCollector::new(&out);
        let specs = [CopySpec::new(&client, out.join("client"))];

        let report = collector.collect(&specs).unwrap();
        assert_eq!(report.files, 2);
        assert_eq!(report.symlinks, 3);
        assert_eq!(
            fs::read_link(out.join("client/latest")).unwrap(),
            Path::new("missing-target")
        );
        assert_eq!(
            fs::read_to_string(out.join("client/home.html")).unwrap(),
            "<html></html>"
        );
        assert_eq!(fs::read_link(out.join("client/assets/up")).unwrap(), Path::new(".."));

        // A second run replaces the existing links.
        let report = collector.collect(&specs).unwrap();
        assert_eq!(report.symlinks, 3);
    }
}
