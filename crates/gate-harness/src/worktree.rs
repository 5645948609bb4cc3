// gate-harness/src/worktree.rs
// ============================================================================
// Module: Read-Only Worktree Copy
// Description: Copies a checked-out worktree into a scratch `TempDir` and
//              marks it read-only before any harness tool touches it.
// Purpose: Guarantee that a trusted-but-not-infallible third-party binary
//          cannot mutate (or be tricked into mutating) the real worktree the
//          rest of the pipeline still reads from.
// Dependencies: tempfile
// ============================================================================

use std::fs;
use std::path::Path;

use tempfile::Builder;
use tempfile::TempDir;

use crate::error::HarnessError;

/// Copies `source` into a fresh temporary directory and, on platforms where
/// it is meaningful, chmods every entry to `0o555` (read + execute, no
/// write) so a harness tool cannot modify the copy it was handed.
///
/// # Errors
/// Returns [`HarnessError::WorktreePrepare`] if the copy or permission
/// change fails.
pub fn prepare_readonly_copy(tool: &'static str, source: &Path) -> Result<TempDir, HarnessError> {
    let dir = Builder::new()
        .prefix("gate-harness-")
        .tempdir()
        .map_err(|source| HarnessError::WorktreePrepare { tool, source })?;

    copy_recursive(source, dir.path()).map_err(|source| HarnessError::WorktreePrepare { tool, source })?;
    lock_down(dir.path()).map_err(|source| HarnessError::WorktreePrepare { tool, source })?;

    Ok(dir)
}

fn copy_recursive(from: &Path, to: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let dest = to.join(entry.file_name());

        if file_type.is_dir() {
            fs::create_dir_all(&dest)?;
            copy_recursive(&entry.path(), &dest)?;
        } else if file_type.is_file() {
            fs::copy(entry.path(), &dest)?;
        }
        // Symlinks are neither followed nor recreated: a harness tool has no
        // legitimate reason to need one, and copying a symlink's target
        // verbatim could escape the worktree root.
    }
    Ok(())
}

#[cfg(unix)]
fn lock_down(root: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fn visit(path: &Path) -> std::io::Result<()> {
        fs::set_permissions(path, fs::Permissions::from_mode(0o555))?;
        if path.is_dir() {
            for entry in fs::read_dir(path)? {
                visit(&entry?.path())?;
            }
        }
        Ok(())
    }
    visit(root)
}

#[cfg(not(unix))]
fn lock_down(_root: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::prepare_readonly_copy;
    use std::fs;

    #[test]
    fn copies_nested_files() {
        let source = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(source.path().join("a/b")).expect("mkdir");
        fs::write(source.path().join("a/b/file.txt"), b"hello").expect("write");

        let copy = prepare_readonly_copy("test-tool", source.path()).expect("copy succeeds");
        let copied = fs::read_to_string(copy.path().join("a/b/file.txt")).expect("read copy");
        assert_eq!(copied, "hello");
    }

    #[cfg(unix)]
    #[test]
    fn copied_files_are_not_writable() {
        use std::os::unix::fs::PermissionsExt;

        let source = tempfile::tempdir().expect("tempdir");
        fs::write(source.path().join("file.txt"), b"hello").expect("write");

        let copy = prepare_readonly_copy("test-tool", source.path()).expect("copy succeeds");
        let mode = fs::metadata(copy.path().join("file.txt")).expect("metadata").permissions().mode() & 0o777;
        assert_eq!(mode, 0o555);
    }
}
