// src/core/workunit.rs

use crate::core::checksum::{ChecksumError, ContentHashCache};
use crate::core::command::{CommandError, ProgramInvocation};
use crate::core::files;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkUnitError {
    #[error("file '{path}' is referenced as both {existing} and {conflicting} within one work unit")]
    DuplicatePlaceholderPath {
        path: String,
        existing: &'static str,
        conflicting: &'static str,
    },
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Checksum(#[from] ChecksumError),
}

/// The directive categories of the work-unit format. The first three carry
/// `${CATEGORY<n>}` placeholders; the STD* streams are wired through shell
/// redirection on the worker and never placeholder-substituted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Category {
    File,
    ExecFile,
    Result,
    Stdout,
    Stderr,
    Stdin,
}

impl Category {
    fn key(self) -> &'static str {
        match self {
            Self::File => "FILE",
            Self::ExecFile => "EXECFILE",
            Self::Result => "RESULT",
            Self::Stdout => "STDOUT",
            Self::Stderr => "STDERR",
            Self::Stdin => "STDIN",
        }
    }

    fn bears_placeholder(self) -> bool {
        matches!(self, Self::File | Self::ExecFile | Self::Result)
    }
}

/// Serializes a configured invocation into the portable work-unit text a
/// remote worker consumes: the files to fetch (with content checksums), the
/// results to send back, the stdio wiring, and the command line with real
/// paths replaced by logical placeholders.
#[derive(Debug)]
pub struct WorkUnitSerializer<'c> {
    cache: &'c mut ContentHashCache,
}

impl<'c> WorkUnitSerializer<'c> {
    pub fn new(cache: &'c mut ContentHashCache) -> Self {
        Self { cache }
    }

    /// Renders the document for one named work unit. Byte-identical across
    /// calls for fixed inputs and an unchanged filesystem.
    ///
    /// # Errors
    /// `DuplicatePlaceholderPath` when one real path shows up under two
    /// placeholder-bearing categories; checksum I/O and rendering errors
    /// pass through.
    pub fn serialize(
        &mut self,
        name: &str,
        invocation: &ProgramInvocation<'_>,
    ) -> Result<String, WorkUnitError> {
        let mut writer = Writer {
            cache: &mut *self.cache,
            invocation,
            lines: vec![format!("WORKUNIT {name}")],
            counters: HashMap::new(),
            translation: HashMap::new(),
            owners: HashMap::new(),
        };

        for file in files::input_files(invocation) {
            writer.append_file(Category::File, &file, true)?;
        }
        for file in files::exec_files(invocation) {
            writer.append_file(Category::ExecFile, &file, true)?;
        }
        for file in files::output_files(invocation) {
            writer.append_file(Category::Result, &file, false)?;
        }
        let stdio = invocation.stdio();
        if let Some(stdout) = &stdio.stdout {
            writer.append_file(Category::Stdout, &stdout.target, false)?;
        }
        if let Some(stderr) = &stdio.stderr {
            writer.append_file(Category::Stderr, &stderr.target, false)?;
        }
        if let Some(stdin) = &stdio.stdin {
            writer.append_file(Category::Stdin, stdin, false)?;
        }

        let command = invocation.workunit_command_line(&writer.translation)?;
        let mut lines = writer.lines;
        lines.push(format!("COMMAND {command}"));

        let mut document = lines.join("\n");
        document.push('\n');
        Ok(document)
    }
}

struct Writer<'a, 'p> {
    cache: &'a mut ContentHashCache,
    invocation: &'a ProgramInvocation<'p>,
    lines: Vec<String>,
    counters: HashMap<Category, u32>,
    translation: HashMap<String, String>,
    owners: HashMap<String, Category>,
}

impl Writer<'_, '_> {
    fn append_file(
        &mut self,
        category: Category,
        filename: &str,
        with_checksum: bool,
    ) -> Result<(), WorkUnitError> {
        let counter = self.counters.entry(category).or_insert(1);
        let index = *counter;
        *counter += 1;

        if category.bears_placeholder() {
            if let Some(owner) = self.owners.get(filename) {
                return Err(WorkUnitError::DuplicatePlaceholderPath {
                    path: filename.to_string(),
                    existing: owner.key(),
                    conflicting: category.key(),
                });
            }
            self.translation
                .insert(filename.to_string(), format!("${{{}{}}}", category.key(), index));
            self.owners.insert(filename.to_string(), category);
        }

        self.lines
            .push(format!("{} {}", category.key(), basename(filename)));
        // A missing source file simply gets no checksum; the worker fetches
        // it from the server without an integrity check.
        if with_checksum && Path::new(filename).is_file() {
            let digest = self.cache.digest(Path::new(filename))?;
            self.lines.push(format!("CHECKSUM {digest}"));
        }
        if let Some(subdir) = self.invocation.suggested_subdir(filename) {
            self.lines
                .push(format!("SUGGEST_{} {}", category.key(), subdir));
        }
        Ok(())
    }
}

fn basename(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::options::OptionSpec;
    use crate::models::{
        CheckType, InvocationOptions, ParamMap, ParamValue, Redirect, StdioSpec,
    };
    use crate::programs::ProgramSpec;
    use std::fs;

    fn makefb_program() -> ProgramSpec {
        ProgramSpec::new("makefb", "makefb")
            .in_subdir("sieve")
            .arg("poly", OptionSpec::parameter().input_file())
            .arg("lim", OptionSpec::parameter().typed(CheckType::Int))
            .arg("out", OptionSpec::parameter().output_file())
    }

    fn config(pairs: &[(&str, ParamValue)]) -> ParamMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn unchecked() -> InvocationOptions {
        InvocationOptions {
            skip_binary_check: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_makefb_work_unit_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let poly = dir.path().join("foo.poly");
        fs::write(&poly, b"n: 1234567891011\n").unwrap();
        let poly_path = poly.display().to_string();

        let program = makefb_program();
        let params = config(&[
            ("poly", ParamValue::Str(poly_path.clone())),
            ("lim", ParamValue::Int(1)),
        ]);
        let invocation = ProgramInvocation::new(&program, &params, unchecked()).unwrap();

        let mut cache = ContentHashCache::new();
        let document = WorkUnitSerializer::new(&mut cache)
            .serialize("makefb_c60_wu1", &invocation)
            .unwrap();

        let lines: Vec<&str> = document.lines().collect();
        assert_eq!(lines.first(), Some(&"WORKUNIT makefb_c60_wu1"));
        assert_eq!(
            lines.iter().filter(|l| l.starts_with("FILE ")).count(),
            1
        );
        assert!(lines.contains(&"FILE foo.poly"));
        // The polynomial exists on disk, so its block carries a checksum.
        let file_pos = lines.iter().position(|l| *l == "FILE foo.poly").unwrap();
        assert!(lines[file_pos + 1].starts_with("CHECKSUM "));
        assert!(lines.contains(&"EXECFILE makefb"));
        let command = lines.last().unwrap();
        assert!(command.starts_with("COMMAND "));
        assert!(command.contains("-poly ${FILE1}"));
        assert!(command.contains("-lim 1"));
        assert!(!command.contains(&poly_path));
        assert!(document.ends_with('\n'));
    }

    #[test]
    fn test_missing_input_has_no_checksum() {
        let program = makefb_program();
        let params = config(&[("poly", ParamValue::from("absent.poly"))]);
        let invocation = ProgramInvocation::new(&program, &params, unchecked()).unwrap();

        let mut cache = ContentHashCache::new();
        let document = WorkUnitSerializer::new(&mut cache)
            .serialize("wu", &invocation)
            .unwrap();
        assert!(document.contains("FILE absent.poly"));
        assert!(!document.contains("CHECKSUM"));
    }

    #[test]
    fn test_output_param_becomes_result_placeholder() {
        let program = makefb_program();
        let params = config(&[("out", ParamValue::from("roots0.gz"))]);
        let invocation = ProgramInvocation::new(&program, &params, unchecked()).unwrap();

        let mut cache = ContentHashCache::new();
        let document = WorkUnitSerializer::new(&mut cache)
            .serialize("wu", &invocation)
            .unwrap();
        assert!(document.contains("RESULT roots0.gz"));
        assert!(document.contains("-out ${RESULT1}"));
    }

    #[test]
    fn test_stdio_entries_use_basenames_without_placeholders() {
        let program = makefb_program();
        let opts = InvocationOptions {
            stdio: StdioSpec {
                stdin: Some("in/spool.txt".to_string()),
                stdout: Some(Redirect::truncate("log/run.out")),
                stderr: Some(Redirect::truncate("log/run.err")),
                ..Default::default()
            },
            skip_binary_check: true,
            ..Default::default()
        };
        let invocation = ProgramInvocation::new(&program, &ParamMap::new(), opts).unwrap();

        let mut cache = ContentHashCache::new();
        let document = WorkUnitSerializer::new(&mut cache)
            .serialize("wu", &invocation)
            .unwrap();
        assert!(document.contains("STDOUT run.out"));
        // The stderr entry reports the stderr target itself.
        assert!(document.contains("STDERR run.err"));
        assert!(document.contains("STDIN spool.txt"));
        // Redirection targets surface as RESULT entries for the transfer
        // back, and stdin as a FILE entry to fetch.
        assert!(document.contains("RESULT run.out"));
        assert!(document.contains("FILE spool.txt"));
    }

    #[test]
    fn test_categories_keep_their_own_indices() {
        let program = ProgramSpec::new("dup1", "dup1")
            .in_subdir("filter")
            .vararg("args", OptionSpec::positional().input_file())
            .arg("out", OptionSpec::parameter().output_file());
        let params = config(&[
            (
                "args",
                ParamValue::List(vec![
                    ParamValue::from("rels0.gz"),
                    ParamValue::from("rels1.gz"),
                ]),
            ),
            ("out", ParamValue::from("dedup.gz")),
        ]);
        let invocation = ProgramInvocation::new(&program, &params, unchecked()).unwrap();

        let mut cache = ContentHashCache::new();
        let document = WorkUnitSerializer::new(&mut cache)
            .serialize("wu", &invocation)
            .unwrap();
        let command = document.lines().last().unwrap();
        assert!(command.contains("${FILE1} ${FILE2}"));
        assert!(command.contains("-out ${RESULT1}"));
    }

    #[test]
    fn test_repeated_path_reuses_one_placeholder() {
        let program = ProgramSpec::new("dup2", "dup2")
            .arg("poly", OptionSpec::parameter().input_file())
            .arg("filelist", OptionSpec::parameter().input_file());
        let params = config(&[
            ("poly", ParamValue::from("shared.poly")),
            ("filelist", ParamValue::from("shared.poly")),
        ]);
        let invocation = ProgramInvocation::new(&program, &params, unchecked()).unwrap();

        let mut cache = ContentHashCache::new();
        let document = WorkUnitSerializer::new(&mut cache)
            .serialize("wu", &invocation)
            .unwrap();
        let file_lines = document
            .lines()
            .filter(|l| l.starts_with("FILE "))
            .count();
        assert_eq!(file_lines, 1);
        let command = document.lines().last().unwrap();
        assert!(command.contains("-poly ${FILE1}"));
        assert!(command.contains("-filelist ${FILE1}"));
        assert!(!command.contains("${FILE2}"));
    }

    #[test]
    fn test_same_path_in_two_categories_is_rejected() {
        let program = makefb_program();
        let params = config(&[
            ("poly", ParamValue::from("clash.dat")),
            ("out", ParamValue::from("clash.dat")),
        ]);
        let invocation = ProgramInvocation::new(&program, &params, unchecked()).unwrap();

        let mut cache = ContentHashCache::new();
        let err = WorkUnitSerializer::new(&mut cache)
            .serialize("wu", &invocation)
            .unwrap_err();
        assert!(matches!(
            err,
            WorkUnitError::DuplicatePlaceholderPath { .. }
        ));
    }

    #[test]
    fn test_suggest_line_follows_the_executable() {
        let dir = tempfile::tempdir().unwrap();
        let subdir = dir.path().join("sieve");
        fs::create_dir(&subdir).unwrap();
        fs::write(subdir.join("makefb"), b"#!binary").unwrap();

        let program = makefb_program();
        let opts = InvocationOptions {
            exec_path: Some(dir.path().display().to_string()),
            ..Default::default()
        };
        let invocation = ProgramInvocation::new(&program, &ParamMap::new(), opts).unwrap();

        let mut cache = ContentHashCache::new();
        let document = WorkUnitSerializer::new(&mut cache)
            .serialize("wu", &invocation)
            .unwrap();
        assert!(document.contains("EXECFILE makefb"));
        assert!(document.contains("SUGGEST_EXECFILE sieve"));
        // The binary exists, so the EXECFILE block is checksummed.
        let lines: Vec<&str> = document.lines().collect();
        let exec_pos = lines.iter().position(|l| *l == "EXECFILE makefb").unwrap();
        assert!(lines[exec_pos + 1].starts_with("CHECKSUM "));
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let program = makefb_program();
        let params = config(&[
            ("poly", ParamValue::from("foo.poly")),
            ("lim", ParamValue::Int(1)),
            ("out", ParamValue::from("roots.gz")),
        ]);
        let invocation = ProgramInvocation::new(&program, &params, unchecked()).unwrap();

        let mut cache = ContentHashCache::new();
        let mut serializer = WorkUnitSerializer::new(&mut cache);
        let first = serializer.serialize("wu", &invocation).unwrap();
        let second = serializer.serialize("wu", &invocation).unwrap();
        assert_eq!(first, second);
    }
}
