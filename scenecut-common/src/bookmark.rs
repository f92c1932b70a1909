//! macOS security-scoped bookmark generation
//!
//! Bookmarks let the consuming editor reopen referenced media outside
//! its sandbox. They can only be minted by platform code, so this shells
//! out to `swift`. Failure here is fully non-fatal: a document without
//! bookmarks still imports, so every error path degrades to `None`.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;

/// Generate a base64 security bookmark for `path`, or `None` when the
/// toolchain or platform cannot produce one.
pub fn bookmark(path: &Path) -> Option<String> {
    if !path.exists() {
        return None;
    }

    let script = format!(
        r#"import Foundation

let url = URL(fileURLWithPath: "{}")
do {{
    let bookmarkData = try url.bookmarkData(options: [.suitableForBookmarkFile])
    print(bookmarkData.base64EncodedString())
}} catch {{
    print("ERROR: \(error)")
}}
"#,
        path.display()
    );

    let mut child = Command::new("swift")
        .arg("-")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .ok()?;
    child.stdin.take()?.write_all(script.as_bytes()).ok()?;
    let output = child.wait_with_output().ok()?;
    if !output.status.success() {
        debug!(path = %path.display(), "bookmark generation failed");
        return None;
    }

    let bookmark = String::from_utf8(output.stdout).ok()?.trim().to_string();
    if bookmark.is_empty() || bookmark.contains("ERROR") {
        debug!(path = %path.display(), "bookmark generation returned no data");
        return None;
    }
    Some(bookmark)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_none() {
        assert!(bookmark(Path::new("/nonexistent/clip.mov")).is_none());
    }
}
