//! Helpers for tests that need a fake `mysqldump` / `mysql` on disk.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Writes an executable `/bin/sh` script named `name` into `dir`.
pub fn write_stub(dir: &Path, name: &str, body: &str) -> anyhow::Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body))?;
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
    Ok(path)
}

/// A dump stub that writes `content` to its `--result-file=` target and exits with `code`.
pub fn dump_stub(dir: &Path, content: &str, code: i32) -> anyhow::Result<PathBuf> {
    let body = format!(
        r#"for arg in "$@"; do
  case "$arg" in
    --result-file=*) printf '%s\n' '{content}' > "${{arg#--result-file=}}" ;;
  esac
done
exit {code}"#
    );
    write_stub(dir, "mysqldump", &body)
}
