// src/cli/handlers.rs

use crate::cli::args::{Cli, Commands, InvocationArgs};
use crate::core::checksum::ContentHashCache;
use crate::core::command::ProgramInvocation;
use crate::core::files;
use crate::core::workunit::WorkUnitSerializer;
use crate::models::{InvocationOptions, ParamMap, ParamValue, Redirect, StdioSpec};
use crate::programs::{BUILTIN_PROGRAMS, ProgramSpec};
use anyhow::{Context, Result, anyhow};
use colored::Colorize;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use uuid::Uuid;

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::List => handle_list(),
        Commands::Show { program } => handle_show(&program),
        Commands::Command(invocation) => handle_command(&invocation),
        Commands::Workunit { invocation, name } => handle_workunit(&invocation, name),
        Commands::Files { invocation, json } => handle_files(&invocation, json),
    }
}

fn registry_lookup(name: &str) -> Result<&'static ProgramSpec> {
    let registry: &'static crate::programs::ProgramRegistry = &BUILTIN_PROGRAMS;
    registry.get(name).ok_or_else(|| {
        anyhow!(
            "unknown program '{}'; run `wuforge list` to see the registry",
            name
        )
    })
}

fn handle_list() -> Result<()> {
    for program in BUILTIN_PROGRAMS.iter() {
        let location = if program.subdir().is_empty() {
            program.binary().to_string()
        } else {
            format!("{}/{}", program.subdir(), program.binary())
        };
        println!(
            "{:<20} {}",
            program.name().cyan().bold(),
            location.dimmed()
        );
    }
    Ok(())
}

fn handle_show(name: &str) -> Result<()> {
    let program = registry_lookup(name)?;
    println!(
        "{} {}",
        program.name().cyan().bold(),
        format!("({})", program.binary()).dimmed()
    );
    for (key, check) in program.accepted_keys() {
        println!("  {:<24} {}", key, check.name().dimmed());
    }
    if let Some((key, _)) = program.vararg_entry() {
        println!("  {:<24} {}", format!("{key}..."), "variadic".dimmed());
    }
    Ok(())
}

fn handle_command(args: &InvocationArgs) -> Result<()> {
    let program = registry_lookup(&args.program)?;
    let params = parse_params(args)?;
    let opts = invocation_options(args)?;
    let invocation = ProgramInvocation::new(program, &params, opts)
        .with_context(|| format!("failed to configure '{}'", args.program))?;
    println!("{}", invocation.shell_command_line()?);
    Ok(())
}

fn handle_workunit(args: &InvocationArgs, name: Option<String>) -> Result<()> {
    let program = registry_lookup(&args.program)?;
    let params = parse_params(args)?;
    let opts = invocation_options(args)?;
    let invocation = ProgramInvocation::new(program, &params, opts)
        .with_context(|| format!("failed to configure '{}'", args.program))?;

    let name =
        name.unwrap_or_else(|| format!("{}_{}", program.name(), Uuid::new_v4().simple()));
    let mut cache = ContentHashCache::new();
    let document = WorkUnitSerializer::new(&mut cache)
        .serialize(&name, &invocation)
        .with_context(|| format!("failed to serialize work unit '{name}'"))?;
    print!("{document}");
    Ok(())
}

fn handle_files(args: &InvocationArgs, json: bool) -> Result<()> {
    let program = registry_lookup(&args.program)?;
    let params = parse_params(args)?;
    let opts = invocation_options(args)?;
    let invocation = ProgramInvocation::new(program, &params, opts)
        .with_context(|| format!("failed to configure '{}'", args.program))?;

    let inputs = files::input_files(&invocation);
    let execs = files::exec_files(&invocation);
    let outputs = files::output_files(&invocation);

    if json {
        let payload = serde_json::json!({
            "input": inputs,
            "execfile": execs,
            "result": outputs,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    let print_section = |title: &str, entries: &[String]| {
        println!("{}", title.cyan().bold());
        for entry in entries {
            println!("  {entry}");
        }
    };
    print_section("input", &inputs);
    print_section("execfile", &execs);
    print_section("result", &outputs);
    Ok(())
}

/// Merges the parameter file (if any) with inline assignments; inline
/// values win.
fn parse_params(args: &InvocationArgs) -> Result<ParamMap> {
    let mut params = ParamMap::new();
    if let Some(path) = &args.params_file {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read parameter file '{}'", path.display()))?;
        let table: BTreeMap<String, ParamValue> = toml::from_str(&text)
            .with_context(|| format!("'{}' is not a valid parameter table", path.display()))?;
        params.extend(table);
    }
    for assignment in &args.params {
        let (key, raw) = assignment.split_once('=').ok_or_else(|| {
            anyhow!("parameter assignments take the form KEY=VALUE, got '{assignment}'")
        })?;
        params.insert(key.trim().to_string(), parse_value(raw.trim()));
    }
    Ok(params)
}

/// Parses an inline value as a TOML literal so it arrives typed; anything
/// that does not parse is a bare string, which keeps unquoted filenames
/// working.
fn parse_value(raw: &str) -> ParamValue {
    #[derive(Deserialize)]
    struct Wrapper {
        v: ParamValue,
    }
    toml::from_str::<Wrapper>(&format!("v = {raw}"))
        .map(|wrapper| wrapper.v)
        .unwrap_or_else(|_| ParamValue::Str(raw.to_string()))
}

fn invocation_options(args: &InvocationArgs) -> Result<InvocationOptions> {
    let exec_path = match &args.execpath {
        Some(raw) => Some(
            shellexpand::full(raw)
                .map_err(|e| anyhow!("failed to expand execpath '{raw}': {e}"))?
                .into_owned(),
        ),
        None => None,
    };
    Ok(InvocationOptions {
        stdio: StdioSpec {
            stdin: args.stdin.clone(),
            stdout: args.stdout.clone().map(|target| Redirect {
                target,
                append: args.append_stdout,
            }),
            stderr: args.stderr.clone().map(|target| Redirect {
                target,
                append: args.append_stderr,
            }),
        },
        background: args.background,
        exec_path,
        exec_subdir: args.execsubdir.clone(),
        exec_binary: args.execbin.clone(),
        exec_suffix: args.execsuffix.clone(),
        run_prefix: args.runprefix.clone(),
        skip_binary_check: args.no_binary_check,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_values_arrive_typed() {
        assert_eq!(parse_value("true"), ParamValue::Bool(true));
        assert_eq!(parse_value("5"), ParamValue::Int(5));
        assert_eq!(parse_value("5.0"), ParamValue::Float(5.0));
        assert_eq!(parse_value("\"foo.poly\""), ParamValue::from("foo.poly"));
        assert_eq!(
            parse_value("[\"a\", \"b\"]"),
            ParamValue::List(vec![ParamValue::from("a"), ParamValue::from("b")])
        );
    }

    #[test]
    fn test_bare_strings_survive() {
        assert_eq!(parse_value("foo.poly"), ParamValue::from("foo.poly"));
    }

    #[test]
    fn test_inline_assignments_override_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("params.toml");
        fs::write(&file, "lim = 100\npoly = \"foo.poly\"\n").unwrap();

        let args = InvocationArgs {
            program: "makefb".to_string(),
            params: vec!["lim=200".to_string()],
            params_file: Some(file),
            ..Default::default()
        };
        let params = parse_params(&args).unwrap();
        assert_eq!(params.get("lim"), Some(&ParamValue::Int(200)));
        assert_eq!(params.get("poly"), Some(&ParamValue::from("foo.poly")));
    }
}
