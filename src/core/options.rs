// src/core/options.rs

use crate::constants::DEFAULT_OPTION_PREFIX;
use crate::models::{CheckType, FileRole, ParamValue};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum OptionError {
    #[error(
        "value {value} for parameter '{key}' is of kind {found}, but the declared type is {expected}"
    )]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
        value: String,
    },
    #[error("cannot convert floating-point value {value} for parameter '{key}' to an integer without loss")]
    LossyConversion { key: String, value: String },
    #[error("toggle '{key}' requires a boolean value, got {found}")]
    InvalidToggle { key: String, found: &'static str },
    #[error("option rendered before being bound to a configuration key; register it through a program table first")]
    UnboundOption,
}

/// How a configuration value turns into command-line tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// A single bare token.
    Positional,
    /// `prefix+name` followed by the value as a separate token.
    Flagged,
    /// A single `name=value` token.
    FlaggedEquals,
    /// `prefix+name` when true, nothing when false.
    Toggle,
}

/// A typed descriptor for converting one named configuration value into
/// command-line tokens.
///
/// A spec is declared without its configuration key; registering it in a
/// program table binds the key, which doubles as the command-line name
/// unless an explicit flag name was given (e.g. config key `threads`
/// mapping to `-t`).
#[derive(Debug, Clone)]
pub struct OptionSpec {
    kind: OptionKind,
    /// Canonical configuration key; bound at registration.
    name: Option<String>,
    /// Explicit command-line name, overriding the bound key.
    flag: Option<String>,
    prefix: String,
    role: FileRole,
    check: CheckType,
    host_path: bool,
}

impl OptionSpec {
    fn with_kind(kind: OptionKind, flag: Option<&str>) -> Self {
        Self {
            kind,
            name: None,
            flag: flag.map(str::to_string),
            prefix: DEFAULT_OPTION_PREFIX.to_string(),
            role: FileRole::None,
            check: if kind == OptionKind::Toggle {
                CheckType::Bool
            } else {
                CheckType::Untyped
            },
            host_path: false,
        }
    }

    /// A bare positional token.
    pub fn positional() -> Self {
        Self::with_kind(OptionKind::Positional, None)
    }

    /// A `-name value` pair, named after its configuration key.
    pub fn parameter() -> Self {
        Self::with_kind(OptionKind::Flagged, None)
    }

    /// A `-flag value` pair with an explicit command-line name.
    pub fn parameter_as(flag: &str) -> Self {
        Self::with_kind(OptionKind::Flagged, Some(flag))
    }

    /// A single `name=value` token.
    pub fn equals() -> Self {
        Self::with_kind(OptionKind::FlaggedEquals, None)
    }

    /// A single `flag=value` token with an explicit command-line name.
    pub fn equals_as(flag: &str) -> Self {
        Self::with_kind(OptionKind::FlaggedEquals, Some(flag))
    }

    /// A boolean switch: present when true, absent when false.
    pub fn toggle() -> Self {
        Self::with_kind(OptionKind::Toggle, None)
    }

    /// A boolean switch with an explicit command-line name.
    pub fn toggle_as(flag: &str) -> Self {
        Self::with_kind(OptionKind::Toggle, Some(flag))
    }

    /// Override the flag prefix, e.g. `:` or `--`.
    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    /// Declare the value type enforced before rendering.
    pub fn typed(mut self, check: CheckType) -> Self {
        self.check = check;
        self
    }

    /// The value names a file the program reads; it is collected into the
    /// work unit's FILE entries and placeholder-translated.
    pub fn input_file(mut self) -> Self {
        self.role = FileRole::Input;
        self
    }

    /// The value names a file the program writes; it is collected into the
    /// work unit's RESULT entries and placeholder-translated.
    pub fn output_file(mut self) -> Self {
        self.role = FileRole::Output;
        self
    }

    /// The value is a host filesystem path that must be rewritten under a
    /// POSIX-emulation environment on Windows.
    pub fn host_path(mut self) -> Self {
        self.host_path = true;
        self
    }

    /// Binds the configuration key. Called by program-table registration;
    /// an explicitly named spec keeps its flag name.
    pub(crate) fn bind(mut self, key: &str) -> Self {
        self.name = Some(key.to_string());
        self
    }

    pub fn kind(&self) -> OptionKind {
        self.kind
    }

    pub fn role(&self) -> FileRole {
        self.role
    }

    pub fn check_type(&self) -> CheckType {
        self.check
    }

    pub fn is_host_path(&self) -> bool {
        self.host_path
    }

    /// The bound configuration key, if registration has happened.
    pub fn key(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn command_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.flag.as_deref().unwrap_or(key)
    }

    /// Converts a value into command-line tokens, enforcing the declared
    /// type first.
    ///
    /// # Errors
    /// `UnboundOption` if the spec was never registered; `InvalidToggle`,
    /// `TypeMismatch`, or `LossyConversion` per the coercion rules.
    pub fn render(&self, value: &ParamValue) -> Result<Vec<String>, OptionError> {
        let key = self.name.as_deref().ok_or(OptionError::UnboundOption)?;
        match self.kind {
            OptionKind::Toggle => match value {
                ParamValue::Bool(true) => {
                    Ok(vec![format!("{}{}", self.prefix, self.command_name(key))])
                }
                ParamValue::Bool(false) => Ok(Vec::new()),
                other => Err(OptionError::InvalidToggle {
                    key: key.to_string(),
                    found: other.kind(),
                }),
            },
            OptionKind::Positional => Ok(vec![coerce(self.check, key, value)?]),
            OptionKind::Flagged => {
                let text = coerce(self.check, key, value)?;
                Ok(vec![
                    format!("{}{}", self.prefix, self.command_name(key)),
                    text,
                ])
            }
            OptionKind::FlaggedEquals => {
                let text = coerce(self.check, key, value)?;
                Ok(vec![format!("{}={}", self.command_name(key), text)])
            }
        }
    }
}

/// The coercion rules as a pure function over (declared type, value kind).
///
/// Two deliberate widenings: an integer is accepted where a float is
/// declared, and a fraction-free float is accepted where an integer is
/// declared. Everything else must match exactly.
fn coerce(check: CheckType, key: &str, value: &ParamValue) -> Result<String, OptionError> {
    let mismatch = || OptionError::TypeMismatch {
        key: key.to_string(),
        expected: check.name(),
        found: value.kind(),
        value: value.to_string(),
    };
    match (check, value) {
        // Lists only ever feed the variadic entry, element by element.
        (_, ParamValue::List(_)) => Err(mismatch()),
        (CheckType::Untyped, v) => Ok(v.to_string()),
        (CheckType::Bool, ParamValue::Bool(b)) => Ok(b.to_string()),
        (CheckType::Int, ParamValue::Int(i)) => Ok(i.to_string()),
        (CheckType::Int, ParamValue::Float(x)) => {
            // A fraction-free float prints without a decimal point, so the
            // rendered token is already the integer form.
            if x.fract() == 0.0 && x.is_finite() {
                Ok(x.to_string())
            } else {
                Err(OptionError::LossyConversion {
                    key: key.to_string(),
                    value: value.to_string(),
                })
            }
        }
        (CheckType::Float, ParamValue::Float(x)) => Ok(x.to_string()),
        (CheckType::Float, ParamValue::Int(i)) => Ok(i.to_string()),
        (CheckType::Str, ParamValue::Str(s)) => Ok(s.clone()),
        _ => Err(mismatch()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bound(spec: OptionSpec) -> OptionSpec {
        spec.bind("lim")
    }

    #[test]
    fn test_flagged_renders_prefix_and_value() {
        let spec = bound(OptionSpec::parameter().typed(CheckType::Int));
        let tokens = spec.render(&ParamValue::Int(42)).unwrap();
        assert_eq!(tokens, vec!["-lim".to_string(), "42".to_string()]);
    }

    #[test]
    fn test_explicit_flag_name_overrides_key() {
        let spec = OptionSpec::parameter_as("t")
            .typed(CheckType::Int)
            .bind("threads");
        let tokens = spec.render(&ParamValue::Int(4)).unwrap();
        assert_eq!(tokens, vec!["-t".to_string(), "4".to_string()]);
    }

    #[test]
    fn test_custom_prefix() {
        let spec = OptionSpec::toggle().prefix(":").bind("complete");
        let tokens = spec.render(&ParamValue::Bool(true)).unwrap();
        assert_eq!(tokens, vec![":complete".to_string()]);
    }

    #[test]
    fn test_equals_renders_single_token() {
        let spec = OptionSpec::equals_as("thr").bind("threads");
        let tokens = spec.render(&ParamValue::Str("2x2".to_string())).unwrap();
        assert_eq!(tokens, vec!["thr=2x2".to_string()]);
    }

    #[test]
    fn test_positional_renders_bare_token() {
        let spec = OptionSpec::positional().bind("inputpoly");
        let tokens = spec.render(&ParamValue::from("foo.poly")).unwrap();
        assert_eq!(tokens, vec!["foo.poly".to_string()]);
    }

    #[test]
    fn test_toggle_true_false_and_wrong_kind() {
        let spec = OptionSpec::toggle_as("v").bind("verbose");
        assert_eq!(
            spec.render(&ParamValue::Bool(true)).unwrap(),
            vec!["-v".to_string()]
        );
        assert!(spec.render(&ParamValue::Bool(false)).unwrap().is_empty());
        let err = spec.render(&ParamValue::Int(3)).unwrap_err();
        assert!(matches!(err, OptionError::InvalidToggle { .. }));
    }

    #[test]
    fn test_unbound_spec_refuses_to_render() {
        let spec = OptionSpec::parameter_as("t");
        let err = spec.render(&ParamValue::Int(1)).unwrap_err();
        assert_eq!(err, OptionError::UnboundOption);
    }

    #[test]
    fn test_int_check_accepts_whole_float() {
        let spec = bound(OptionSpec::parameter().typed(CheckType::Int));
        let tokens = spec.render(&ParamValue::Float(5.0)).unwrap();
        assert_eq!(tokens, vec!["-lim".to_string(), "5".to_string()]);
    }

    #[test]
    fn test_int_check_rejects_fractional_float() {
        let spec = bound(OptionSpec::parameter().typed(CheckType::Int));
        let err = spec.render(&ParamValue::Float(5.5)).unwrap_err();
        assert!(matches!(err, OptionError::LossyConversion { .. }));
    }

    #[test]
    fn test_float_check_accepts_int() {
        let spec = bound(OptionSpec::parameter().typed(CheckType::Float));
        let tokens = spec.render(&ParamValue::Int(5)).unwrap();
        assert_eq!(tokens, vec!["-lim".to_string(), "5".to_string()]);
    }

    #[test]
    fn test_type_mismatch_reports_kinds() {
        let spec = bound(OptionSpec::parameter().typed(CheckType::Int));
        let err = spec.render(&ParamValue::from("many")).unwrap_err();
        match err {
            OptionError::TypeMismatch {
                expected, found, ..
            } => {
                assert_eq!(expected, "integer");
                assert_eq!(found, "string");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_list_value_never_coerces() {
        let spec = bound(OptionSpec::parameter());
        let err = spec
            .render(&ParamValue::List(vec![ParamValue::Int(1)]))
            .unwrap_err();
        assert!(matches!(err, OptionError::TypeMismatch { .. }));
    }
}
