//! api-driver - call a declaratively described HTTP API from the shell
//!
//! Usage: `api-driver <CONTRACT.json> <operation> [args] [--base-url URL]
//! [-H name:value]... [--strict] [--dry-run] [--log-level LEVEL]`

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use api_driver::cli::{arguments_from_matches, build_command, find_operation};
use api_driver::contract::{ContractDescriptor, UrlSource};
use api_driver::driver::{connect, DriverOptions};
use api_driver::request::Body;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: api-driver <CONTRACT.json> <operation> [args] [options]";

fn main() -> ExitCode {
    match run(std::env::args_os().collect()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn run(mut argv: Vec<OsString>) -> Result<ExitCode> {
    let first = argv.get(1).map(|a| a.to_string_lossy().into_owned());
    match first {
        Some(path) if !path.starts_with('-') => {}
        _ => {
            eprintln!("{USAGE}");
            return Ok(ExitCode::from(2));
        }
    }
    let contract_path = PathBuf::from(argv.remove(1));
    let mut contract = ContractDescriptor::from_file(&contract_path)
        .with_context(|| format!("loading contract {}", contract_path.display()))?;

    let matches = build_command("api-driver", &contract)?.get_matches_from(argv);

    let log_level = matches
        .get_one::<String>("log-level")
        .map(String::as_str)
        .unwrap_or("warn");
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let (command_name, sub) = matches.subcommand().context("no operation given")?;
    let op = find_operation(&contract, command_name)
        .with_context(|| format!("unknown operation {command_name}"))?;
    let operation = op.id.clone();
    let args = arguments_from_matches(op, sub);

    if let Some(url) = matches.get_one::<String>("base-url") {
        contract.url = UrlSource::Static(url.clone());
    }

    let mut options = DriverOptions::new().strict(matches.get_flag("strict"));
    for header in matches.get_many::<String>("header").into_iter().flatten() {
        let Some((name, value)) = header.split_once(':') else {
            bail!("invalid --header format: {header} (expected name:value)");
        };
        options = options.header(name.trim(), value.trim());
    }

    let dispatcher = connect(contract, options)?;

    if matches.get_flag("dry-run") {
        let request = dispatcher.prepare(&operation, &args)?;
        println!("{} {}", request.method, request.url(dispatcher.base_url()));
        for (name, value) in request.headers.iter() {
            println!("{name}: {value}");
        }
        for attachment in &request.attachments {
            println!("attachment {}: {}", attachment.field, attachment.path.display());
        }
        match &request.body {
            Body::FormUrlEncoded { payload, .. } => {
                println!();
                println!("{payload}");
            }
            Body::Multipart { fields } => {
                for (name, value) in fields {
                    println!("field {name}: {value}");
                }
            }
            Body::Empty => {}
        }
        return Ok(ExitCode::SUCCESS);
    }

    let Some(response) = dispatcher.invoke(&operation, &args)?.into_response() else {
        return Ok(ExitCode::SUCCESS);
    };
    if let Some(error) = &response.error {
        eprintln!("transport error: {error}");
        return Ok(ExitCode::FAILURE);
    }
    if let Some(status) = response.status {
        eprintln!("HTTP {status}");
    }
    println!("{}", response.body);

    Ok(if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
