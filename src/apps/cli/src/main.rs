//! Treeline CLI - terminal driver for the explorer engine
//!
//! Stands in for a host application's rendering layer: subscribes to
//! snapshots, prints them, and forwards line commands to the manager.

mod ui;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use treeline_core::{ExplorerManager, LocalDirectoryService, OperationResult};

#[derive(Parser)]
#[command(
    name = "treeline-cli",
    about = "Terminal driver for the Treeline explorer engine",
    version
)]
struct Args {
    /// Root directory to explore
    root: PathBuf,
}

/// `.` on the command line means the explorer root.
fn dir_arg(raw: &str) -> &str {
    if raw == "." {
        ""
    } else {
        raw
    }
}

fn report(result: OperationResult) {
    if result.success {
        println!("{}", result.message);
    } else {
        eprintln!("{} ({})", result.message, result.error.unwrap_or_default());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let service = Arc::new(LocalDirectoryService::new(&args.root)?);
    println!("treeline: exploring {}", service.root().display());

    let manager = ExplorerManager::new(service);
    manager.subscribe(|state| {
        if !state.loading {
            print!("{}", ui::render_state(state));
        }
    });
    manager.refresh().await;
    println!("{}", ui::render_help());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut parts = line.splitn(3, ' ');
        let command = parts.next().unwrap_or_default();
        match command {
            "ls" => print!("{}", ui::render_state(&manager.state())),
            "expand" => match parts.next() {
                Some(path) => manager.toggle_expand(dir_arg(path)).await,
                None => eprintln!("usage: expand <path>"),
            },
            "collapse-all" => manager.collapse_all().await,
            "select" => manager.select(parts.next()),
            "new" => match (parts.next(), parts.next()) {
                (Some(dir), Some(name)) => report(manager.create_file(dir_arg(dir), name).await),
                _ => eprintln!("usage: new <dir> <name>"),
            },
            "mkdir" => match (parts.next(), parts.next()) {
                (Some(dir), Some(name)) => {
                    report(manager.create_directory(dir_arg(dir), name).await)
                }
                _ => eprintln!("usage: mkdir <dir> <name>"),
            },
            "mv" => match (parts.next(), parts.next()) {
                (Some(path), Some(new_name)) => report(manager.rename(path, new_name).await),
                _ => eprintln!("usage: mv <path> <new-name>"),
            },
            "rm" => match parts.next() {
                Some(path) => report(manager.delete(path).await),
                None => eprintln!("usage: rm <path>"),
            },
            "open" => match parts.next() {
                Some(path) => report(manager.open_with_system_app(path).await),
                None => eprintln!("usage: open <path>"),
            },
            "reveal" => match parts.next() {
                Some(path) => report(manager.show_in_folder(path).await),
                None => eprintln!("usage: reveal <path>"),
            },
            "refresh" => manager.refresh().await,
            "help" => println!("{}", ui::render_help()),
            "quit" | "exit" => break,
            other => eprintln!("unknown command: {} (try 'help')", other),
        }
    }

    manager.destroy();
    Ok(())
}
