// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Marquez Control CLI
//!
//! CLI tool for registering lineage metadata with a Marquez service.
//!
//! Usage:
//!   marquez-ctl [--config <path>] <command> [options]
//!
//! Commands:
//!   bind <namespace> [--owner <owner>] [--description <text>]
//!   register-job <name> --namespace <ns> --location <loc> [--input <urn>]... [--output <urn>]...
//!   start-run <job> --namespace <ns> [--arg key=value]... [--nominal-start <ts>] [--nominal-end <ts>]
//!   get-run <run_id> --namespace <ns>
//!   mark-run <run_id> <running|completed|failed|aborted> --namespace <ns>
//!   list-datasets --namespace <ns>
//!   get-dataset <name> --namespace <ns>

use std::io;
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use marquez_client::{ClientConfig, MarquezClient, RunArgs, RunTransition};
use serde::Serialize;

fn print_usage() {
    eprintln!(
        r#"Usage: marquez-ctl [--config <path>] <command> [options]

Register namespaces, jobs and job runs with a Marquez service.

COMMANDS:
    bind <namespace>                Create or update a namespace
    register-job <name>             Create or update a job
    start-run <job>                 Create a job run (state CREATED)
    get-run <run_id>                Show a job run
    mark-run <run_id> <state>       Move a run to running|completed|failed|aborted
    list-datasets                   List datasets in a namespace
    get-dataset <name>              Show a dataset

BIND OPTIONS:
    --owner <owner>                 Namespace owner (default: default)
    --description <text>            Namespace description

NAMESPACE OPTIONS (every command except bind):
    --namespace <ns>                Existing namespace (required, never modified)

REGISTER-JOB OPTIONS:
    --location <loc>                Source location of the job (required)
    --input <urn>                   Input dataset URN (repeatable)
    --output <urn>                  Output dataset URN (repeatable)
    --job-description <text>        Job description

START-RUN OPTIONS:
    --arg <key=value>               Run argument (repeatable)
    --nominal-start <rfc3339>       Scheduled start time
    --nominal-end <rfc3339>         Scheduled end time

ENVIRONMENT:
    MARQUEZ_CONFIG                  Path to a YAML config (same as --config)
    MARQUEZ_HOST                    Service hostname (default: http://localhost)
    MARQUEZ_PORT                    Service port (default: 5000)
    RUST_LOG                        Log filter (default: warn)

EXAMPLES:
    marquez-ctl bind analytics --owner team-a
    marquez-ctl register-job etl_daily --namespace analytics --location git://etl \
        --input raw.events --output agg.daily
    marquez-ctl start-run etl_daily --namespace analytics --arg date=2024-01-01
    marquez-ctl mark-run 6f1c... running --namespace analytics
"#
    );
}

#[derive(Debug)]
struct Invocation {
    config_path: Option<String>,
    command: Command,
}

#[derive(Debug)]
enum Command {
    Bind {
        namespace: String,
        owner: Option<String>,
        description: Option<String>,
    },
    RegisterJob {
        name: String,
        namespace: String,
        location: String,
        inputs: Vec<String>,
        outputs: Vec<String>,
        description: Option<String>,
    },
    StartRun {
        job: String,
        namespace: String,
        run_args: RunArgs,
        nominal_start: Option<DateTime<Utc>>,
        nominal_end: Option<DateTime<Utc>>,
    },
    GetRun {
        run_id: String,
        namespace: String,
    },
    MarkRun {
        run_id: String,
        target: RunTransition,
        namespace: String,
    },
    ListDatasets {
        namespace: String,
    },
    GetDataset {
        name: String,
        namespace: String,
    },
}

fn parse_args() -> Result<Invocation, String> {
    let args: Vec<String> = std::env::args().collect();
    parse_args_from_vec(&args)
}

fn parse_timestamp(flag: &str, value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| format!("Invalid {} timestamp '{}': {}", flag, value, e))
}

fn parse_run_arg(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((key, val)) if !key.is_empty() => Ok((key.to_string(), val.to_string())),
        _ => Err(format!("Invalid --arg '{}', expected key=value", value)),
    }
}

fn parse_args_from_vec(args: &[String]) -> Result<Invocation, String> {
    let mut config_path: Option<String> = None;
    let mut start = 1;

    if args.get(1).map(String::as_str) == Some("--config") {
        config_path = Some(args.get(2).ok_or("--config requires a path")?.clone());
        start = 3;
    }

    let Some(command_name) = args.get(start) else {
        return Err("No command specified".to_string());
    };

    let expected_positionals = match command_name.as_str() {
        "help" | "--help" | "-h" => {
            print_usage();
            std::process::exit(0);
        }
        "get-run" | "bind" | "register-job" | "start-run" | "get-dataset" => 1,
        "mark-run" => 2,
        _ => 0,
    };
    let positionals: Vec<&String> = args[start + 1..]
        .iter()
        .take(expected_positionals)
        .take_while(|a| !a.starts_with("--"))
        .collect();
    let positional = |index: usize, what: &str| -> Result<String, String> {
        positionals
            .get(index)
            .map(|value| (*value).clone())
            .ok_or_else(|| format!("{} required", what))
    };

    let mut namespace: Option<String> = None;
    let mut owner: Option<String> = None;
    let mut description: Option<String> = None;
    let mut location: Option<String> = None;
    let mut job_description: Option<String> = None;
    let mut inputs: Vec<String> = Vec::new();
    let mut outputs: Vec<String> = Vec::new();
    let mut run_args = RunArgs::new();
    let mut nominal_start: Option<DateTime<Utc>> = None;
    let mut nominal_end: Option<DateTime<Utc>> = None;

    let mut i = start + 1 + positionals.len();
    while i < args.len() {
        match args[i].as_str() {
            "--namespace" => {
                i += 1;
                namespace = Some(args.get(i).ok_or("--namespace requires a value")?.clone());
            }
            "--owner" => {
                i += 1;
                owner = Some(args.get(i).ok_or("--owner requires a value")?.clone());
            }
            "--description" => {
                i += 1;
                description = Some(args.get(i).ok_or("--description requires a value")?.clone());
            }
            "--location" => {
                i += 1;
                location = Some(args.get(i).ok_or("--location requires a value")?.clone());
            }
            "--job-description" => {
                i += 1;
                job_description = Some(
                    args.get(i)
                        .ok_or("--job-description requires a value")?
                        .clone(),
                );
            }
            "--input" => {
                i += 1;
                inputs.push(args.get(i).ok_or("--input requires a URN")?.clone());
            }
            "--output" => {
                i += 1;
                outputs.push(args.get(i).ok_or("--output requires a URN")?.clone());
            }
            "--arg" => {
                i += 1;
                let (key, value) = parse_run_arg(args.get(i).ok_or("--arg requires key=value")?)?;
                run_args.insert(key, value.into());
            }
            "--nominal-start" => {
                i += 1;
                let value = args.get(i).ok_or("--nominal-start requires a timestamp")?;
                nominal_start = Some(parse_timestamp("--nominal-start", value)?);
            }
            "--nominal-end" => {
                i += 1;
                let value = args.get(i).ok_or("--nominal-end requires a timestamp")?;
                nominal_end = Some(parse_timestamp("--nominal-end", value)?);
            }
            arg => return Err(format!("Unknown argument: {}", arg)),
        }
        i += 1;
    }

    if command_name != "bind" && (owner.is_some() || description.is_some()) {
        return Err("--owner and --description are only valid for bind".to_string());
    }

    let command = match command_name.as_str() {
        "bind" => Command::Bind {
            namespace: positional(0, "Namespace")?,
            owner,
            description,
        },
        "register-job" => Command::RegisterJob {
            name: positional(0, "Job name")?,
            namespace: namespace.ok_or("--namespace is required")?,
            location: location.ok_or("--location is required")?,
            inputs,
            outputs,
            description: job_description,
        },
        "start-run" => Command::StartRun {
            job: positional(0, "Job name")?,
            namespace: namespace.ok_or("--namespace is required")?,
            run_args,
            nominal_start,
            nominal_end,
        },
        "get-run" => Command::GetRun {
            run_id: positional(0, "Run ID")?,
            namespace: namespace.ok_or("--namespace is required")?,
        },
        "mark-run" => {
            let run_id = positional(0, "Run ID")?;
            let target = positional(1, "Target state")?.parse::<RunTransition>()?;
            Command::MarkRun {
                run_id,
                target,
                namespace: namespace.ok_or("--namespace is required")?,
            }
        }
        "list-datasets" => Command::ListDatasets {
            namespace: namespace.ok_or("--namespace is required")?,
        },
        "get-dataset" => Command::GetDataset {
            name: positional(0, "Dataset name")?,
            namespace: namespace.ok_or("--namespace is required")?,
        },
        cmd => return Err(format!("Unknown command: {}", cmd)),
    };

    Ok(Invocation {
        config_path,
        command,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).map_err(|e| e.to_string())?
    );
    Ok(())
}

fn main() -> ExitCode {
    // Initialize minimal logging (default to warn if RUST_LOG not set)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(io::stderr)
        .init();

    let invocation = match parse_args() {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    let config = match &invocation.config_path {
        Some(path) => ClientConfig::from_path(path),
        None => ClientConfig::from_env(),
    };
    let config = match config {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut client = MarquezClient::new(config);

    match execute_command(&mut client, invocation.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute_command(client: &mut MarquezClient, cmd: Command) -> Result<(), String> {
    match cmd {
        Command::Bind {
            namespace,
            owner,
            description,
        } => {
            let ns = client
                .bind_namespace(&namespace, owner.as_deref(), description.as_deref())
                .map_err(|e| e.to_string())?;
            print_json(&ns)?;
        }

        // Everything below works on an existing namespace and never rewrites it.
        Command::RegisterJob {
            name,
            namespace,
            location,
            inputs,
            outputs,
            description,
        } => {
            let inputs: Vec<&str> = inputs.iter().map(String::as_str).collect();
            let outputs: Vec<&str> = outputs.iter().map(String::as_str).collect();
            let job = client
                .attach(&namespace)
                .register_job(&name, &location, &inputs, &outputs, description.as_deref())
                .map_err(|e| e.to_string())?;
            print_json(&job)?;
        }

        Command::StartRun {
            job,
            namespace,
            run_args,
            nominal_start,
            nominal_end,
        } => {
            let run = client
                .attach(&namespace)
                .start_run(&job, run_args, nominal_start, nominal_end)
                .map_err(|e| e.to_string())?;
            println!("{}", run.run_id);
        }

        Command::GetRun { run_id, namespace } => {
            let run = client
                .attach(&namespace)
                .get_run(&run_id)
                .map_err(|e| e.to_string())?;
            print_json(&run)?;
        }

        Command::MarkRun {
            run_id,
            target,
            namespace,
        } => {
            client
                .attach(&namespace)
                .transition_run(&run_id, target)
                .map_err(|e| e.to_string())?;
            println!("{}: {}", run_id, target.target_state());
        }

        Command::ListDatasets { namespace } => {
            let datasets = client
                .attach(&namespace)
                .list_datasets()
                .map_err(|e| e.to_string())?;
            print_json(&datasets)?;
        }

        Command::GetDataset { name, namespace } => {
            let dataset = client
                .attach(&namespace)
                .get_dataset(&name)
                .map_err(|e| e.to_string())?;
            print_json(&dataset)?;
        }
    }

    Ok(())
}
