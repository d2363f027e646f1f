//! Starter document written by `init`

use crossref_fs::{NormalizedPath, io};

use crate::Result;

/// A commented, valid starter configuration.
pub const INIT_TEMPLATE: &str = r#"# git-crossref configuration
#
# Each remote names an external git repository. Files listed under a
# remote are copied from that repository into this working tree, and the
# hash recorded after each sync is used to detect local edits.

remotes:
  upstream:
    url: https://github.com/example/project.git
    # Branch, tag or commit. Defaults to the remote's default branch.
    version: main
    # Subdirectory that sources are relative to.
    # base_path: src

files:
  upstream:
    - source: LICENSE
      destination: third_party/project/LICENSE
    # A trailing slash syncs a whole directory. With ignore_changes set,
    # local edits are overwritten on every sync.
    # - source: docs/
    #   destination: third_party/project/docs/
    #   ignore_changes: true
"#;

/// Write the starter document unless a file already exists at `path`.
///
/// Returns whether the file was written.
pub fn write_template(path: &NormalizedPath) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    io::write_text(path, INIT_TEMPLATE)?;
    Ok(true)
}
