// src/core/files.rs

//! Derives the file sets implied by a configured invocation. Order is
//! first-seen declaration order, deduplicated, so the work-unit serializer
//! emits identical documents for identical inputs.

use crate::core::command::ProgramInvocation;
use crate::models::FileRole;

fn push_unique(files: &mut Vec<String>, candidate: String) {
    if !files.contains(&candidate) {
        files.push(candidate);
    }
}

fn role_files(invocation: &ProgramInvocation<'_>, role: FileRole) -> Vec<String> {
    let mut files = Vec::new();
    for (spec, value) in invocation.configured() {
        if spec.role() == role {
            push_unique(&mut files, value.to_string());
        }
    }
    if let Some((spec, elements)) = invocation.varargs() {
        if spec.role() == role {
            for element in elements {
                push_unique(&mut files, element.to_string());
            }
        }
    }
    files
}

/// Files the program reads: values of input-role parameters (variadic
/// elements individually) plus the stdin source, if redirected.
pub fn input_files(invocation: &ProgramInvocation<'_>) -> Vec<String> {
    let mut files = role_files(invocation, FileRole::Input);
    if let Some(stdin) = &invocation.stdio().stdin {
        push_unique(&mut files, stdin.clone());
    }
    files
}

/// Files the program writes: values of output-role parameters plus the
/// stdout and stderr targets, if redirected.
pub fn output_files(invocation: &ProgramInvocation<'_>) -> Vec<String> {
    let mut files = role_files(invocation, FileRole::Output);
    if let Some(stdout) = &invocation.stdio().stdout {
        push_unique(&mut files, stdout.target.clone());
    }
    if let Some(stderr) = &invocation.stdio().stderr {
        push_unique(&mut files, stderr.target.clone());
    }
    files
}

/// Executables the worker must fetch. A single program means a single
/// entry today; the Vec keeps the serializer oblivious to that.
pub fn exec_files(invocation: &ProgramInvocation<'_>) -> Vec<String> {
    vec![invocation.exec_file().to_string()]
}
