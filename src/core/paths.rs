// src/core/paths.rs

use crate::constants::{MSYS_ENV_VAR, WINDOWS_EXEC_SUFFIX};
use std::path::{MAIN_SEPARATOR, Path};

/// The executable filename suffix for the host platform: `.exe` on Windows,
/// empty elsewhere.
pub fn default_exec_suffix() -> &'static str {
    if cfg!(target_os = "windows") {
        WINDOWS_EXEC_SUFFIX
    } else {
        ""
    }
}

/// True when running inside an MSYS/MinGW POSIX-emulation shell on Windows.
/// Host paths handed to programs launched from such a shell must be
/// rewritten with [`translate_msys_path`].
pub fn is_msys_environment() -> bool {
    std::env::var_os(MSYS_ENV_VAR).is_some()
}

/// Rewrites a host-native path for an MSYS-style environment: a drive letter
/// becomes a synthetic leading segment and separators are rejoined with `/`,
/// so `C:\work\matrix.bin` turns into `/C/work/matrix.bin`.
///
/// Relative paths without a drive letter only have their separators
/// rewritten.
pub fn translate_msys_path(path: &str) -> String {
    let mut chars = path.chars();
    let drive = match (chars.next(), chars.next()) {
        (Some(letter), Some(':')) if letter.is_ascii_alphabetic() => Some(letter),
        _ => None,
    };
    // The drive prefix is two ASCII chars, so the byte offset is exact.
    let rest = if drive.is_some() { &path[2..] } else { path };

    let mut segments: Vec<String> = rest.split(MAIN_SEPARATOR).map(str::to_string).collect();
    if let Some(letter) = drive {
        // A drive-qualified path is absolute; the split leaves a leading
        // empty segment and the drive letter slots in right after it.
        let slot = 1.min(segments.len());
        segments.insert(slot, letter.to_string());
    }
    segments.join("/")
}

/// A display-friendly string form of a path, with Windows UNC noise removed.
pub fn simplified(path: &Path) -> String {
    dunce::simplified(path).to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(path: &str) -> String {
        path.replace('/', &MAIN_SEPARATOR.to_string())
    }

    #[test]
    fn test_drive_letter_becomes_leading_segment() {
        let translated = translate_msys_path(&format!("C:{}", host("/work/matrix.bin")));
        assert_eq!(translated, "/C/work/matrix.bin");
    }

    #[test]
    fn test_relative_path_only_rewrites_separators() {
        let translated = translate_msys_path(&host("wdir/bwc"));
        assert_eq!(translated, "wdir/bwc");
    }

    #[test]
    fn test_suffix_is_empty_off_windows() {
        if cfg!(target_os = "windows") {
            assert_eq!(default_exec_suffix(), ".exe");
        } else {
            assert_eq!(default_exec_suffix(), "");
        }
    }
}
