// src/core/command.rs

use crate::core::options::{OptionError, OptionKind, OptionSpec};
use crate::core::paths;
use crate::models::{FileRole, InvocationOptions, ParamMap, ParamValue, StdioSpec};
use crate::programs::ProgramSpec;
use log::debug;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("binary executable file '{binary}' not found under '{path}' (did you run \"make\"?)")]
    BinaryNotFound { binary: String, path: String },
    #[error("programs run in background must redirect both stdout and stderr to files")]
    BackgroundRequiresRedirection,
    #[error("configuration for '{program}' must set at least one of: {keys}")]
    MissingRequiredOption { program: String, keys: String },
    #[error("command token '{0}' cannot be shell-quoted")]
    Unquotable(String),
    #[error(transparent)]
    Option(#[from] OptionError),
}

/// One configured, immutable invocation of a program: the resolved
/// executable, the filtered parameter values in declaration order, the
/// variadic list, and the stdio wiring.
///
/// Construction performs every validation the engine owns (type checks,
/// the background/redirect rule, table requirement constraints, the
/// on-disk executable lookup), so rendering afterwards cannot surprise.
#[derive(Debug, Clone)]
pub struct ProgramInvocation<'p> {
    program: &'p ProgramSpec,
    exec_file: String,
    suggest_subdir: HashMap<String, String>,
    values: Vec<(String, ParamValue)>,
    varargs: Vec<ParamValue>,
    stdio: StdioSpec,
    background: bool,
    run_prefix: Option<String>,
}

impl<'p> ProgramInvocation<'p> {
    /// Filters `config` against the program's declared options and resolves
    /// the executable.
    ///
    /// Keys without a declared option are ignored; they belong to upstream
    /// layers. Values are type-checked here, at construction time.
    pub fn new(
        program: &'p ProgramSpec,
        config: &ParamMap,
        opts: InvocationOptions,
    ) -> Result<Self, CommandError> {
        let translate_host_paths = paths::is_msys_environment();

        let mut values = Vec::new();
        for (key, spec) in program.options() {
            let Some(value) = config.get(key) else {
                continue;
            };
            let value = if translate_host_paths && spec.is_host_path() {
                translate_host_path(value)
            } else {
                value.clone()
            };
            // Surface type errors now rather than at render time.
            spec.render(&value)?;
            values.push((key.clone(), value));
        }

        let mut varargs = Vec::new();
        if let Some((key, spec)) = program.vararg_entry() {
            if let Some(value) = config.get(key) {
                let elements = match value {
                    ParamValue::List(items) => items.clone(),
                    scalar => vec![scalar.clone()],
                };
                for element in &elements {
                    spec.render(element)?;
                }
                varargs = elements;
            }
        }

        if !program.required_one_of().is_empty() {
            let satisfied = program
                .required_one_of()
                .iter()
                .any(|key| values.iter().any(|(k, _)| k == key));
            if !satisfied {
                return Err(CommandError::MissingRequiredOption {
                    program: program.name().to_string(),
                    keys: program.required_one_of().join(", "),
                });
            }
        }

        if opts.background && (opts.stdio.stdout.is_none() || opts.stdio.stderr.is_none()) {
            return Err(CommandError::BackgroundRequiresRedirection);
        }

        let run_prefix = opts.run_prefix.clone().or_else(|| {
            if cfg!(target_os = "windows") {
                program.default_windows_run_prefix().map(str::to_string)
            } else {
                None
            }
        });

        let (exec_file, suggest_subdir) = resolve_executable(program, &opts)?;

        Ok(Self {
            program,
            exec_file,
            suggest_subdir,
            values,
            varargs,
            stdio: opts.stdio,
            background: opts.background,
            run_prefix,
        })
    }

    pub fn program(&self) -> &ProgramSpec {
        self.program
    }

    /// The resolved executable path, as it appears on the command line.
    pub fn exec_file(&self) -> &str {
        &self.exec_file
    }

    /// The install subdirectory hint recorded for a path during executable
    /// resolution, if any. Work units forward it as a SUGGEST line.
    pub fn suggested_subdir(&self, path: &str) -> Option<&str> {
        self.suggest_subdir.get(path).map(String::as_str)
    }

    pub fn stdio(&self) -> &StdioSpec {
        &self.stdio
    }

    pub fn background(&self) -> bool {
        self.background
    }

    /// The configured (spec, value) pairs in declaration order, excluding
    /// the variadic list.
    pub fn configured(&self) -> impl Iterator<Item = (&OptionSpec, &ParamValue)> {
        self.values
            .iter()
            .filter_map(|(key, value)| self.program.option(key).map(|spec| (spec, value)))
    }

    /// The variadic entry's spec and collected elements, when configured.
    pub fn varargs(&self) -> Option<(&OptionSpec, &[ParamValue])> {
        if self.varargs.is_empty() {
            return None;
        }
        self.program
            .vararg_entry()
            .map(|(_, spec)| (spec, self.varargs.as_slice()))
    }

    /// Renders the argument array: run-prefix tokens, the executable, named
    /// options in declaration order, positionals in declaration order, then
    /// each variadic element. Values of file-role parameters are passed
    /// through `translation` before rendering, which is how work units swap
    /// real paths for placeholders.
    pub fn command_array(
        &self,
        translation: Option<&HashMap<String, String>>,
    ) -> Result<Vec<String>, CommandError> {
        let mut command = Vec::new();
        if let Some(prefix) = &self.run_prefix {
            command.extend(prefix.split_whitespace().map(str::to_string));
        }
        command.push(translate(&self.exec_file, translation));

        for (spec, value) in self.configured() {
            if spec.kind() != OptionKind::Positional {
                command.extend(spec.render(&translate_value(spec, value, translation))?);
            }
        }
        for (spec, value) in self.configured() {
            if spec.kind() == OptionKind::Positional {
                command.extend(spec.render(&translate_value(spec, value, translation))?);
            }
        }
        if let Some((spec, elements)) = self.varargs() {
            for element in elements {
                command.extend(spec.render(&translate_value(spec, element, translation))?);
            }
        }
        Ok(command)
    }

    /// The directly executable form: shell-quoted tokens, redirection
    /// operators, and the background marker.
    pub fn shell_command_line(&self) -> Result<String, CommandError> {
        let tokens = self.command_array(None)?;
        let quoted: Result<Vec<String>, CommandError> = tokens.iter().map(|t| quote(t)).collect();
        let mut cmdline = quoted?.join(" ");

        if let Some(stdin) = &self.stdio.stdin {
            cmdline.push_str(" < ");
            cmdline.push_str(&quote(stdin)?);
        }
        if let Some(stdout) = &self.stdio.stdout {
            cmdline.push_str(if stdout.append { " >> " } else { " > " });
            cmdline.push_str(&quote(&stdout.target)?);
        }
        if self.stdio.merges_stderr() {
            cmdline.push_str(" 2>&1");
        } else if let Some(stderr) = &self.stdio.stderr {
            cmdline.push_str(if stderr.append { " 2>> " } else { " 2> " });
            cmdline.push_str(&quote(&stderr.target)?);
        }
        if self.background {
            cmdline.push_str(" &");
        }
        Ok(cmdline)
    }

    /// The form embedded in a work unit: unquoted tokens with placeholders
    /// substituted, no redirection suffixes. The worker wires stdio itself
    /// from the STD* entries.
    pub fn workunit_command_line(
        &self,
        translation: &HashMap<String, String>,
    ) -> Result<String, CommandError> {
        Ok(self.command_array(Some(translation))?.join(" "))
    }
}

fn quote(token: &str) -> Result<String, CommandError> {
    shlex::try_quote(token)
        .map(|quoted| quoted.into_owned())
        .map_err(|_| CommandError::Unquotable(token.to_string()))
}

fn translate(path: &str, translation: Option<&HashMap<String, String>>) -> String {
    translation
        .and_then(|map| map.get(path))
        .cloned()
        .unwrap_or_else(|| path.to_string())
}

/// Swaps a file-role value for its translated form, when a translation is
/// registered for its rendered path.
fn translate_value(
    spec: &OptionSpec,
    value: &ParamValue,
    translation: Option<&HashMap<String, String>>,
) -> ParamValue {
    if spec.role() == FileRole::None {
        return value.clone();
    }
    match translation.and_then(|map| map.get(&value.to_string())) {
        Some(substitute) => ParamValue::Str(substitute.clone()),
        None => value.clone(),
    }
}

fn translate_host_path(value: &ParamValue) -> ParamValue {
    match value {
        ParamValue::Str(s) => ParamValue::Str(paths::translate_msys_path(s)),
        other => other.clone(),
    }
}

/// Resolves the executable once, at construction. Candidates are
/// `path/subdir/binary` then `path/binary`; the first existing file wins.
/// With neither on disk the path stays `subdir/binary`, which is an error
/// unless the caller suppressed the check.
fn resolve_executable(
    program: &ProgramSpec,
    opts: &InvocationOptions,
) -> Result<(String, HashMap<String, String>), CommandError> {
    let path = opts
        .exec_path
        .clone()
        .unwrap_or_else(|| program.search_path().to_string());
    let subdir = opts
        .exec_subdir
        .clone()
        .unwrap_or_else(|| program.subdir().to_string());
    let suffix = opts.exec_suffix.clone().unwrap_or_else(|| {
        if cfg!(target_os = "windows") {
            program
                .default_windows_suffix()
                .unwrap_or(paths::default_exec_suffix())
                .to_string()
        } else {
            String::new()
        }
    });
    let binary = format!(
        "{}{}",
        opts.exec_binary.clone().unwrap_or_else(|| program.binary().to_string()),
        suffix
    );

    let subdir_candidate = Path::new(&path).join(&subdir).join(&binary);
    let direct_candidate = Path::new(&path).join(&binary);

    let (exec_file, subdir_qualified) =
        if subdir_candidate != direct_candidate && subdir_candidate.is_file() {
            (paths::simplified(&subdir_candidate), true)
        } else if direct_candidate.is_file() {
            (paths::simplified(&direct_candidate), false)
        } else {
            if !opts.skip_binary_check {
                return Err(CommandError::BinaryNotFound { binary, path });
            }
            (paths::simplified(&Path::new(&subdir).join(&binary)), true)
        };

    debug!("Resolved executable for '{}': {}", program.name(), exec_file);
    let mut suggest_subdir = HashMap::new();
    if subdir_qualified && !subdir.is_empty() {
        suggest_subdir.insert(exec_file.clone(), subdir);
    }
    Ok((exec_file, suggest_subdir))
}
