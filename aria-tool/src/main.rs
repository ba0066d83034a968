mod assistant;
mod config;
mod error;
mod gate;
mod logging;
#[cfg(feature = "chat")]
mod reminder;
mod store;
mod upload;

#[cfg(feature = "chat")]
mod chat;

use std::path::PathBuf;

use anyhow::bail;
use aria_cal::{AppState, Event, FileStorage, Storage, class_groups};
use chrono::Local;
use clap::{Parser, Subcommand};

use crate::config::{load_config, resolve_store_path};
use crate::gate::Gate;
use crate::store::{data_dir, open_state};
use crate::upload::read_upload;

#[derive(Parser)]
#[command(name = "aria")]
#[command(about = "Aria, a calendar you talk to", long_about = None)]
struct Cli {
    /// Path to the events file
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Password, when one is configured
    #[arg(long, global = true, env = "ARIA_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[cfg(feature = "chat")]
    /// Start the interactive calendar
    Chat {
        /// Model to use
        #[arg(short, long)]
        model: Option<String>,
    },
    /// Run one command, e.g. `aria ask add gym tomorrow at 7am`
    Ask {
        /// Model to use
        #[arg(short, long)]
        model: Option<String>,

        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },
    /// Import a photo of a weekly timetable
    Scan {
        /// Model to use
        #[arg(short, long)]
        model: Option<String>,

        image: PathBuf,
    },
    /// Print stored events
    List {
        /// Show the class roster instead
        #[arg(long)]
        classes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "chat")]
    let interactive = matches!(cli.command, Command::Chat { .. });
    #[cfg(not(feature = "chat"))]
    let interactive = false;
    if interactive {
        logging::init_file(&data_dir().join("aria.log"))?;
    } else {
        logging::init_stderr();
    }

    let config = load_config();
    let store_path = resolve_store_path(cli.data, &config);
    let mut gate = Gate::new(config.password());

    match cli.command {
        #[cfg(feature = "chat")]
        Command::Chat { model } => {
            if let Some(attempt) = cli.password.as_deref() {
                gate.try_unlock(attempt);
            }
            let assistant = assistant::build(&config, model)?;
            let state = open_state(&store_path, config.horizon_weeks())?;
            let permission = reminder::NotificationPermission::from_config(config.notifications);
            chat::run(state, assistant, gate, permission).await?;
        }
        Command::Ask { model, text } => {
            gate.require(cli.password.as_deref())?;
            let assistant = assistant::build(&config, model)?;
            let mut state = open_state(&store_path, config.horizon_weeks())?;
            ask(&mut state, &assistant, &text.join(" ")).await?;
        }
        Command::Scan { model, image } => {
            gate.require(cli.password.as_deref())?;
            let assistant = assistant::build(&config, model)?;
            let mut state = open_state(&store_path, config.horizon_weeks())?;
            scan(&mut state, &assistant, &image).await?;
        }
        Command::List { classes } => {
            gate.require(cli.password.as_deref())?;
            let state = open_state(&store_path, config.horizon_weeks())?;
            list(&state, classes);
        }
    }

    Ok(())
}

async fn ask(
    state: &mut AppState<FileStorage>,
    assistant: &assistant::Assistant,
    text: &str,
) -> anyhow::Result<()> {
    let Some(request) = state.submit_command(text, Local::now()) else {
        bail!("Nothing to ask");
    };
    let result = assistant.command(&request).await;
    state.complete_command(result, Local::now(), &mut rand::rng())?;
    print_reply(state);
    Ok(())
}

async fn scan(
    state: &mut AppState<FileStorage>,
    assistant: &assistant::Assistant,
    image: &std::path::Path,
) -> anyhow::Result<()> {
    let upload = read_upload(image)?;
    if !upload.is_image() {
        bail!("{} is not an image ({})", image.display(), upload.media_type);
    }
    let Some(request) = state.submit_scan(&upload.media_type, upload.data, Local::now()) else {
        return Ok(());
    };
    let result = assistant.scan(&request).await;
    state.complete_scan(result, Local::now())?;
    print_reply(state);
    Ok(())
}

fn print_reply<S: Storage>(state: &AppState<S>) {
    if let Some(reply) = state.transcript.last() {
        println!("{}", reply.text);
    }
}

fn list<S: Storage>(state: &AppState<S>, classes: bool) {
    let events = state.store.list();
    if classes {
        let groups = class_groups(events, Local::now());
        if groups.is_empty() {
            println!("No classes yet. Run `aria scan <image>` to import a timetable.");
        }
        for group in groups {
            let next = group
                .next
                .map(|d| d.format("%a %b %-d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{} {:<24} {:<10} {:>3} sessions  next {}",
                group.attendance.icon(),
                group.title,
                group.attendance.label(),
                group.sessions,
                next
            );
        }
        return;
    }

    if events.is_empty() {
        println!("No events yet. Try `aria ask add gym tomorrow at 7am`.");
    }
    for event in events {
        println!("{}", format_event(event));
    }
}

fn format_event(event: &Event) -> String {
    let mut line = format!(
        "{:>4}  {}  {} {}",
        event.id,
        event.date.format("%a %Y-%m-%d %H:%M"),
        event.attendance.icon(),
        event.title
    );
    if let Some(location) = &event.location {
        line.push_str(&format!(" @ {}", location));
    }
    line
}
