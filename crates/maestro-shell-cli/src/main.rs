#![deny(unsafe_code)]

//! maestro-shell — interactive command shell for the maestro daemon.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::filter::FilterExt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use maestro_shell_config::ShellConfig;
use maestro_shell_core::{DebugGate, Dispatcher, Notification, Outcome, Session, build_info};

/// Query and configure a running maestro daemon.
#[derive(Parser, Debug)]
#[command(name = "maestro-shell", version, about, long_about = None)]
struct Cli {
    /// Path to the daemon's API socket.
    #[arg(short, long = "sock")]
    sock: Option<PathBuf>,

    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref()).await?;

    let debug_flag = Arc::new(AtomicBool::new(config.logging.debug));
    init_tracing(&config, cli.verbose, Arc::clone(&debug_flag));

    let socket_path = resolve_socket_path(cli.sock.as_deref(), &config);
    let (tx, rx) = mpsc::channel(config.events.channel_capacity);

    let session = match Session::connect(&socket_path, tx).await {
        Ok(session) => session.with_debug_flag(debug_flag),
        Err(e) => {
            eprintln!("maestro-shell: {e}");
            std::process::exit(1);
        }
    };
    info!(path = %socket_path.display(), "connected");

    println!("{}", build_info::banner());
    println!("Type 'help' for a list of commands.");

    let printer = tokio::spawn(print_notifications(rx));

    let dispatcher = Dispatcher::new(&session);
    let stdin = BufReader::new(tokio::io::stdin());
    let result = run_repl(&dispatcher, stdin, tokio::io::stdout(), &config.shell.prompt).await;

    session.close().await;
    printer.abort();
    result
}

/// Level filter from `RUST_LOG`, else `-v`, else the config file, with the
/// debug toggle layered on top.
fn init_tracing(config: &ShellConfig, verbose: u8, debug_flag: Arc<AtomicBool>) {
    let level = match verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let filter = env_filter.or(DebugGate::new(debug_flag));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(filter),
        )
        .init();
}

/// The `--sock` flag wins over the config file.
fn resolve_socket_path(flag: Option<&Path>, config: &ShellConfig) -> PathBuf {
    flag.map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&config.daemon.socket_path))
}

async fn load_config(path: Option<&Path>) -> Result<ShellConfig> {
    match path {
        Some(path) => ShellConfig::load(path).await.map_err(|e| {
            anyhow::anyhow!("failed to load config '{}': {e}", path.display())
        }),
        None => {
            debug!("no config file given, using defaults");
            Ok(ShellConfig::default())
        }
    }
}

async fn print_notifications(mut rx: mpsc::Receiver<Notification>) {
    while let Some(notification) = rx.recv().await {
        println!("\n{notification}");
    }
}

/// Read command lines until `exit` or end of input.
async fn run_repl<R, W>(
    dispatcher: &Dispatcher<'_>,
    input: R,
    mut out: W,
    prompt: &str,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    loop {
        out.write_all(prompt.as_bytes()).await?;
        out.flush().await?;

        let Some(line) = lines.next_line().await? else {
            out.write_all(b"\n").await?;
            break;
        };

        let outcome = dispatcher.execute(&line).await;
        if outcome == Outcome::Exit {
            break;
        }
        if let Some(mut text) = outcome.display() {
            if !text.ends_with('\n') {
                text.push('\n');
            }
            out.write_all(text.as_bytes()).await?;
        }
    }
    out.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use maestro_shell_test_utils::config::TestConfigBuilder;
    use pretty_assertions::assert_eq;

    async fn repl_output(session: &Session, input: &str) -> String {
        let dispatcher = Dispatcher::new(session);
        let mut out = Vec::new();
        run_repl(&dispatcher, input.as_bytes(), &mut out, "> ")
            .await
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_flags_parse() {
        let cli = Cli::try_parse_from(["maestro-shell", "-s", "/run/m.sock", "-vv"]).unwrap();
        assert_eq!(cli.sock.as_deref(), Some(Path::new("/run/m.sock")));
        assert_eq!(cli.verbose, 2);
        assert!(cli.config.is_none());

        let cli = Cli::try_parse_from(["maestro-shell", "--sock", "/a", "-c", "shell.toml"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some(Path::new("shell.toml")));
    }

    #[test]
    fn test_unknown_flag_rejected() {
        assert!(Cli::try_parse_from(["maestro-shell", "--bogus"]).is_err());
    }

    #[test]
    fn test_socket_flag_wins_over_config() {
        let config = TestConfigBuilder::new().socket_path("/from/config.sock").build();
        assert_eq!(
            resolve_socket_path(None, &config),
            PathBuf::from("/from/config.sock")
        );
        assert_eq!(
            resolve_socket_path(Some(Path::new("/from/flag.sock")), &config),
            PathBuf::from("/from/flag.sock")
        );
    }

    #[tokio::test]
    async fn test_load_config_defaults_without_flag() {
        let config = load_config(None).await.unwrap();
        assert_eq!(config.daemon.socket_path, "/tmp/maestroapi.sock");
    }

    #[tokio::test]
    async fn test_load_config_missing_file_is_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = load_config(Some(&dir.path().join("absent.toml")))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }

    #[tokio::test]
    async fn test_load_config_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("shell.toml");
        tokio::fs::write(&path, "[shell]\nprompt = \"m> \"\n")
            .await
            .unwrap();
        let config = load_config(Some(&path)).await.unwrap();
        assert_eq!(config.shell.prompt, "m> ");
    }

    #[test_log::test(tokio::test)]
    async fn test_repl_stops_at_exit() {
        let session = Session::disconnected();
        let out = repl_output(&session, "debug on\nbogus\n\nexit\nhelp\n").await;
        assert_eq!(
            out,
            "> Debug is on\n> [ERROR] no command: bogus\n> > "
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_repl_ends_at_eof() {
        let session = Session::disconnected();
        let out = repl_output(&session, "alive\n").await;
        assert_eq!(out, "> [ERROR] Maestro could not connect.\n> \n");
    }
}
