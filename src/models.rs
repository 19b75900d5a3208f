// src/models.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// --- TYPED CONFIGURATION VALUES ---
// These are the primary structures exchanged between the parameter front end
// (TOML files, inline assignments) and the option-mapping engine.

/// A configuration value in its closed set of kinds. Scalars feed ordinary
/// options; a list is accepted only for a program's variadic entry.
///
/// The `untagged` representation lets TOML scalars map onto the matching
/// variant directly: `true`, `5`, `5.0`, `"foo.poly"`, `["a", "b"]`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<ParamValue>),
}

impl ParamValue {
    /// The kind name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::List(_) => "list",
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Str(s) => write!(f, "{}", s),
            Self::List(values) => {
                let rendered: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// The key→value mapping a caller supplies for one invocation. Keys without
/// a declared option are ignored by the engine; they are validated upstream.
pub type ParamMap = BTreeMap<String, ParamValue>;

/// The value type an option enforces before rendering. `Untyped` accepts any
/// scalar and stringifies it as-is.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CheckType {
    Bool,
    Int,
    Float,
    Str,
    Untyped,
}

impl CheckType {
    /// The type name used in error messages and `show` listings.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::Int => "integer",
            Self::Float => "float",
            Self::Str => "string",
            Self::Untyped => "untyped",
        }
    }
}

/// Whether an option's value names a file the invoked program reads or
/// writes. A single field keeps "both input and output" unrepresentable.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileRole {
    #[default]
    None,
    Input,
    Output,
}

// --- STDIO AND EXECUTION KNOBS ---

/// A stdout/stderr redirection target: the file path and whether the stream
/// appends to it instead of truncating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub target: String,
    pub append: bool,
}

impl Redirect {
    pub fn truncate(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            append: false,
        }
    }

    pub fn append(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            append: true,
        }
    }
}

/// The stdio redirection spec of one invocation. File names are kept as
/// strings; in work units they surface as shell redirection targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StdioSpec {
    pub stdin: Option<String>,
    pub stdout: Option<Redirect>,
    pub stderr: Option<Redirect>,
}

impl StdioSpec {
    /// True when stdout and stderr point at the same target, which renders
    /// as a `2>&1` stream merge.
    pub fn merges_stderr(&self) -> bool {
        match (&self.stdout, &self.stderr) {
            (Some(out), Some(err)) => out.target == err.target,
            _ => false,
        }
    }
}

/// Per-invocation construction knobs: stdio wiring, background execution,
/// and the executable search overrides shared by every program.
#[derive(Debug, Clone, Default)]
pub struct InvocationOptions {
    pub stdio: StdioSpec,
    /// Append ` &` to the shell command line. Requires stdout and stderr to
    /// be redirected to files.
    pub background: bool,
    /// Override the search path for the binary (table default otherwise).
    pub exec_path: Option<String>,
    /// Override the install subdirectory tried below the search path.
    pub exec_subdir: Option<String>,
    /// Override the binary filename.
    pub exec_binary: Option<String>,
    /// Override the executable suffix; the platform default applies otherwise.
    pub exec_suffix: Option<String>,
    /// Tokens prepended before the executable, e.g. an interpreter.
    pub run_prefix: Option<String>,
    /// Leave the executable path unresolved instead of failing when the
    /// binary does not exist on disk. Used for dry runs and self-tests.
    pub skip_binary_check: bool,
}
