//! Contract → clap Command tree
//!
//! Every operation of a contract becomes a subcommand; its bound parameters
//! become arguments. Parsed matches convert back into the positional
//! argument list the dispatcher expects.

use std::collections::HashMap;

use clap::{Arg, ArgAction, Command};
use serde_json::Value;

use crate::contract::{ContractDescriptor, OperationDescriptor, ParamKind};
use crate::error::ConfigError;
use crate::naming::kebab_case;

/// Long names taken by the global options and clap's own help flag.
pub const RESERVED_OPTIONS: &[&str] = &["help", "base-url", "header", "strict", "dry-run", "log-level"];

/// Build a clap `Command` with one subcommand per contract operation.
///
/// Structure: `<name> <operation> [url params] [--name value]... [global options]`
///
/// Fails when two operations map to the same subcommand, or when an
/// operation exposes a long option twice or under a reserved name.
pub fn build_command(name: &str, contract: &ContractDescriptor) -> Result<Command, ConfigError> {
    let mut root = Command::new(name.to_owned())
        .about(format!("Call the {} API", contract.name))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .global(true)
                .help("Override the contract's base URL"),
        )
        .arg(
            Arg::new("header")
                .long("header")
                .short('H')
                .global(true)
                .action(ArgAction::Append)
                .help("Instance header as name:value (repeatable)"),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Reject arguments that would otherwise be skipped"),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print the request instead of sending it"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .default_value("warn")
                .help("Log level (trace, debug, info, warn, error)"),
        );

    let mut commands: HashMap<String, &str> = HashMap::new();
    for op in &contract.operations {
        let command = kebab_case(&op.id);
        if command.is_empty() || command == "help" {
            return Err(ConfigError::CliCommand {
                command,
                first: op.id.clone(),
                second: "help".to_string(),
            });
        }
        if let Some(first) = commands.insert(command.clone(), &op.id) {
            return Err(ConfigError::CliCommand {
                command,
                first: first.to_string(),
                second: op.id.clone(),
            });
        }
        root = root.subcommand(build_operation_command(op)?);
    }
    Ok(root)
}

/// Find the operation whose subcommand name is `command_name`.
pub fn find_operation<'a>(
    contract: &'a ContractDescriptor,
    command_name: &str,
) -> Option<&'a OperationDescriptor> {
    contract
        .operations
        .iter()
        .find(|op| kebab_case(&op.id) == command_name)
}

/// Positional arguments for `op` from parsed matches; absent values are `Null`.
pub fn arguments_from_matches(op: &OperationDescriptor, matches: &clap::ArgMatches) -> Vec<Value> {
    op.parameters
        .iter()
        .enumerate()
        .map(|(i, binding)| {
            if binding.kind == ParamKind::Unbound {
                return Value::Null;
            }
            matches
                .get_one::<String>(&arg_id(i))
                .map(|v| Value::String(v.clone()))
                .unwrap_or(Value::Null)
        })
        .collect()
}

fn arg_id(index: usize) -> String {
    format!("arg{index}")
}

fn build_operation_command(op: &OperationDescriptor) -> Result<Command, ConfigError> {
    let mut cmd = Command::new(kebab_case(&op.id)).about(format!("{} {}", op.method, op.path));
    let mut longs: HashMap<&str, ParamKind> = HashMap::new();

    for (i, binding) in op.parameters.iter().enumerate() {
        let arg = Arg::new(arg_id(i)).value_name(binding.name.clone());
        let arg = match binding.kind {
            // URL params → positional args
            ParamKind::UrlParam => arg.help(format!("Path parameter {}", binding.name)).required(true),
            ParamKind::Unbound => continue,
            kind => {
                check_option(op, &binding.name, kind, &mut longs)?;
                arg.long(binding.name.clone())
                    .help(format!("{} {}", kind_label(kind), binding.name))
                    .action(ArgAction::Set)
            }
        };
        cmd = cmd.arg(arg);
    }

    Ok(cmd)
}

fn check_option<'a>(
    op: &OperationDescriptor,
    name: &'a str,
    kind: ParamKind,
    longs: &mut HashMap<&'a str, ParamKind>,
) -> Result<(), ConfigError> {
    let reject = |reason: String| ConfigError::CliOption {
        operation: op.id.clone(),
        option: name.to_string(),
        reason,
    };
    if name.is_empty() || name.starts_with('-') {
        return Err(reject("not a valid option name".to_string()));
    }
    if RESERVED_OPTIONS.contains(&name) {
        return Err(reject("reserved for a global option".to_string()));
    }
    if let Some(first) = longs.insert(name, kind) {
        return Err(reject(format!(
            "bound both as {} and {}",
            kind_label(first).to_lowercase(),
            kind_label(kind).to_lowercase()
        )));
    }
    Ok(())
}

fn kind_label(kind: ParamKind) -> &'static str {
    match kind {
        ParamKind::Header => "Header",
        ParamKind::Cookie => "Cookie",
        ParamKind::UrlParam => "Path parameter",
        ParamKind::QueryParam => "Query parameter",
        ParamKind::BodyParam => "Body field",
        ParamKind::File => "File to upload as",
        ParamKind::Unbound => "Unused",
    }
}
