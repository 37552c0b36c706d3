//! `duetask` entry point.
//!
//! Every command loads the task list first so ids can be given as unique
//! prefixes.

use clap::Parser;
use duetask_client::cli::{Cli, Command, EditArgs, WatchArgs};
use duetask_client::view::filter_tasks;
use duetask_client::{
    render_list, render_task_line, run_watch, ClientError, DueWatcher, Filter, HttpTaskApi,
    Shell, SystemClock, TaskClient, TerminalNotifier, WatchOptions,
};
use duetask_core::{
    init_console_logging, init_logging, now_epoch_ms, parse_due_input, Task, TaskPatch,
};
use log::error;
use serde::Serialize;
use std::error::Error;
use std::process::ExitCode;
use std::time::Duration;
use tokio::io::BufReader;

type CliResult = Result<(), Box<dyn Error>>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let logging = match cli.log_dir.as_deref() {
        Some(dir) => init_logging(&cli.log_level, dir),
        None => init_console_logging(&cli.log_level),
    };
    if let Err(err) = logging {
        eprintln!("duetask: {err}");
        return ExitCode::FAILURE;
    }

    let client = TaskClient::new(HttpTaskApi::new(cli.api_url));
    match execute(cli.command, cli.json, client).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("duetask: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn execute(command: Command, json: bool, mut client: TaskClient<HttpTaskApi>) -> CliResult {
    client.refresh().await?;
    let now = now_epoch_ms();

    match command {
        Command::List { filter } => {
            if json {
                print_json(&filter_tasks(client.state().tasks(), filter))?;
            } else {
                print!("{}", render_list(client.state(), filter, &[], now));
            }
        }
        Command::Add { title, due } => {
            let due_at = match due {
                Some(raw) => parse_due_input(&raw, now)?,
                None => None,
            };
            let task = client.add_task(&title.join(" "), due_at).await?;
            print_task(&task, json, now)?;
        }
        Command::Edit(args) => {
            let id = client.state().resolve(&args.id)?;
            let patch = edit_patch(&args, now)?;
            let task = client.update_task(id, &patch).await?;
            print_task(&task, json, now)?;
        }
        Command::Done { id } => {
            let id = client.state().resolve(&id)?;
            let task = client.update_task(id, &TaskPatch::completed(true)).await?;
            print_task(&task, json, now)?;
        }
        Command::Undone { id } => {
            let id = client.state().resolve(&id)?;
            let task = client.update_task(id, &TaskPatch::completed(false)).await?;
            print_task(&task, json, now)?;
        }
        Command::Star { id } => {
            let id = client.state().resolve(&id)?;
            let task = client.toggle_important(id).await?;
            print_task(&task, json, now)?;
        }
        Command::Rm { id } => {
            let id = client.state().resolve(&id)?;
            client.delete_task(id).await?;
            if json {
                print_json(&serde_json::json!({ "success": true }))?;
            } else {
                println!("deleted {id}");
            }
        }
        Command::Watch(args) => {
            let mut watcher = DueWatcher::new();
            let mut notifier = TerminalNotifier::stdout();
            run_watch(
                &mut client,
                &mut watcher,
                &mut notifier,
                &SystemClock,
                watch_options(args),
                ctrl_c(),
            )
            .await;
        }
        Command::Shell(args) => {
            print!("{}", render_list(client.state(), Filter::All, &[], now));
            println!("type `help` for commands");

            let mut notifier = TerminalNotifier::stdout();
            Shell::new(client)
                .run(
                    BufReader::new(tokio::io::stdin()),
                    std::io::stdout(),
                    &mut notifier,
                    &SystemClock,
                    watch_options(args),
                    ctrl_c(),
                )
                .await?;
        }
    }
    Ok(())
}

fn edit_patch(args: &EditArgs, now: i64) -> Result<TaskPatch, ClientError> {
    let due_at = if args.clear_due {
        Some(None)
    } else {
        match args.due.as_deref() {
            Some(raw) => Some(parse_due_input(raw, now)?),
            None => None,
        }
    };
    let patch = TaskPatch {
        title: args.title.clone(),
        due_at,
        ..TaskPatch::default()
    };
    if patch.is_empty() {
        return Err(ClientError::Validation(
            "nothing to change; pass --title, --due or --clear-due".to_string(),
        ));
    }
    Ok(patch)
}

fn watch_options(args: WatchArgs) -> WatchOptions {
    WatchOptions {
        interval: Duration::from_millis(args.interval_ms),
        refresh_every: args.refresh_every,
    }
}

fn print_task(task: &Task, json: bool, now: i64) -> CliResult {
    if json {
        print_json(task)
    } else {
        println!("{}", render_task_line(task, now));
        Ok(())
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("event=client_stop module=client status=error error_code=signal_failed error={err}");
        std::future::pending::<()>().await;
    }
}
