// src/constants.rs

/// The default command-line flag prefix for named options.
pub const DEFAULT_OPTION_PREFIX: &str = "-";

/// Block size used when streaming file contents through the hasher.
pub const HASH_BLOCK_SIZE: usize = 65536;

/// Digests are truncated to 20 bytes (160 bits), the width the work-unit
/// protocol was deployed with.
pub const DIGEST_TRUNCATE_LENGTH: usize = 20;

/// Executable filename suffix appended on Windows hosts.
pub const WINDOWS_EXEC_SUFFIX: &str = ".exe";

/// Environment variable that marks a POSIX-emulation (MSYS/MinGW) shell on Windows.
pub const MSYS_ENV_VAR: &str = "MSYSTEM";

/// Default search path for program binaries.
pub const DEFAULT_SEARCH_PATH: &str = ".";

/// Configuration keys accepted by every program in addition to its own
/// parameter table: executable search overrides and the run prefix.
pub const EXEC_OVERRIDE_KEYS: &[&str] =
    &["execpath", "execsubdir", "execbin", "execsuffix", "runprefix"];
