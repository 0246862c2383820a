//! Command dispatch — maps typed command lines to daemon operations.
//!
//! A line is split on whitespace into a verb and its arguments. The verb is
//! looked up in [`COMMANDS`]; `net`, `log` and `jobs` look their first
//! argument up in a second table. Every failure becomes an
//! [`Outcome::Error`], so a bad command never ends the shell. Only `exit`
//! does, through [`Outcome::Exit`].

use tracing::debug;

use crate::client::ClientError;
use crate::session::Session;

/// Prefix of every error line shown to the operator.
pub const ERROR_MARKER: &str = "[ERROR]";

/// Result of one command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Text to show.
    Output(String),
    /// A failure message, without the error marker.
    Error(String),
    /// The operator asked to leave.
    Exit,
    /// Blank input.
    Nothing,
}

impl Outcome {
    /// The line to print, if any.
    pub fn display(&self) -> Option<String> {
        match self {
            Outcome::Output(text) => Some(text.clone()),
            Outcome::Error(message) => Some(format!("{ERROR_MARKER} {message}")),
            Outcome::Exit | Outcome::Nothing => None,
        }
    }
}

/// Errors raised while dispatching, before or after the daemon is involved.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("no command: {0}")]
    NoCommand(String),

    #[error("{0}: not enough args")]
    NotEnoughArgs(&'static str),

    #[error("Must be on/off")]
    MustBeOnOff,

    #[error("Not implemented yet")]
    NotImplemented,

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// One row of a command table.
#[derive(Debug, Clone, Copy)]
pub struct Entry<T> {
    pub name: &'static str,
    pub op: T,
    pub description: &'static str,
}

const fn entry<T>(name: &'static str, op: T, description: &'static str) -> Entry<T> {
    Entry {
        name,
        op,
        description,
    }
}

fn lookup<T: Copy>(table: &[Entry<T>], name: &str) -> Option<T> {
    table.iter().find(|e| e.name == name).map(|e| e.op)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Exit,
    Alive,
    Debug,
    Net,
    Log,
    Jobs,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetOp {
    GetInterfaces,
    Events,
    ConfigInterface,
    GetDns,
    AddDns,
    DeleteDns,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOp {
    Get,
    Set,
    Delete,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobsOp {
    Get,
    Start,
    Stop,
    Register,
    Help,
}

pub const COMMANDS: &[Entry<Op>] = &[
    entry("exit", Op::Exit, "Exit shell"),
    entry("alive", Op::Alive, "Check if maestro is running & get up time"),
    entry("debug", Op::Debug, "Turn on / off debug print outs"),
    entry("net", Op::Net, "Query or change network interfaces"),
    entry("log", Op::Log, "Query or change logging parameters"),
    entry("jobs", Op::Jobs, "Query or change job configs"),
    entry("help", Op::Help, "Print available commands."),
];

pub const NET_COMMANDS: &[Entry<NetOp>] = &[
    entry("get-interfaces", NetOp::GetInterfaces, "Show configurations for all interfaces"),
    entry("events", NetOp::Events, "Listen for network events"),
    entry("config-interface", NetOp::ConfigInterface, "Enter config for an interface"),
    entry("get-dns", NetOp::GetDns, "Show all domain name servers"),
    entry("add-dns", NetOp::AddDns, "Add a new domain name server"),
    entry("delete-dns", NetOp::DeleteDns, "Delete an existing domain name server"),
    entry("help", NetOp::Help, "Print net subcommands"),
];

pub const LOG_COMMANDS: &[Entry<LogOp>] = &[
    entry("get", LogOp::Get, "Show configurations for all logging targets"),
    entry("set", LogOp::Set, "Set configurations for a logging target"),
    entry("delete", LogOp::Delete, "Delete a configuration for a logging target"),
    entry("help", LogOp::Help, "Print log subcommands"),
];

pub const JOBS_COMMANDS: &[Entry<JobsOp>] = &[
    entry("get", JobsOp::Get, "Show all running jobs."),
    entry("start", JobsOp::Start, "Start one or more jobs by unique name"),
    entry("stop", JobsOp::Stop, "Stop one or more jobs by unique name"),
    entry("register", JobsOp::Register, "Register (define) a new job using a JSON string"),
    entry("help", JobsOp::Help, "Print jobs subcommands"),
];

fn table_help<T>(title: &str, table: &[Entry<T>], width: usize, hint: Option<&str>) -> String {
    let mut out = format!("{title}:\n");
    for e in table {
        out.push_str(&format!("{:<width$}- {}\n", e.name, e.description));
    }
    out.push_str("--\n");
    if let Some(hint) = hint {
        out.push_str(hint);
    }
    out
}

/// Top-level help text.
pub fn commands_help() -> String {
    table_help("Commands", COMMANDS, 15, None)
}

pub fn net_help() -> String {
    table_help(
        "Net Subcommands",
        NET_COMMANDS,
        17,
        Some("Specify options as <opt>=<arg>, like IfName=eth0"),
    )
}

pub fn log_help() -> String {
    table_help(
        "Log Subcommands",
        LOG_COMMANDS,
        17,
        Some("Specify options as <opt>=<arg>, like target=id"),
    )
}

pub fn jobs_help() -> String {
    table_help("Jobs Subcommands", JOBS_COMMANDS, 17, None)
}

/// Runs command lines against a [`Session`].
pub struct Dispatcher<'s> {
    session: &'s Session,
}

impl<'s> Dispatcher<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// Execute one command line.
    pub async fn execute(&self, line: &str) -> Outcome {
        let args: Vec<&str> = line.split_whitespace().collect();
        let Some((&verb, rest)) = args.split_first() else {
            return Outcome::Nothing;
        };

        match self.run(verb, rest).await {
            Ok(Some(text)) => Outcome::Output(text),
            Ok(None) => Outcome::Exit,
            Err(e) => {
                debug!(verb, error = %e, "command failed");
                Outcome::Error(e.to_string())
            }
        }
    }

    /// `Ok(None)` means exit.
    async fn run(&self, verb: &str, args: &[&str]) -> Result<Option<String>, CommandError> {
        let op = lookup(COMMANDS, verb).ok_or_else(|| CommandError::NoCommand(verb.to_string()))?;
        let text = match op {
            Op::Exit => return Ok(None),
            Op::Alive => self.alive().await?,
            Op::Debug => self.debug(args)?,
            Op::Net => self.net(args).await?,
            Op::Log => self.log(args).await?,
            Op::Jobs => self.jobs(args).await?,
            Op::Help => commands_help(),
        };
        Ok(Some(text))
    }

    async fn alive(&self) -> Result<String, CommandError> {
        let alive = self.session.client()?.alive().await?;
        debug!(?alive, "alive");
        Ok(format!("Maestro Up. Uptime = {}s", alive.uptime_display()))
    }

    fn debug(&self, args: &[&str]) -> Result<String, CommandError> {
        match args.first() {
            Some(&"on") => self.session.set_debug(true),
            Some(&"off") => self.session.set_debug(false),
            Some(_) => return Err(CommandError::MustBeOnOff),
            None => {}
        }
        let state = if self.session.debug_enabled() { "on" } else { "off" };
        Ok(format!("Debug is {state}"))
    }

    async fn net(&self, args: &[&str]) -> Result<String, CommandError> {
        let (sub, rest) = split_sub("net", args)?;
        let op = lookup(NET_COMMANDS, sub)
            .ok_or_else(|| CommandError::NoCommand(format!("net {sub}")))?;
        if op == NetOp::Help {
            return Ok(net_help());
        }

        let client = self.session.client()?;
        let text = match op {
            NetOp::GetInterfaces => client.net_interfaces().await?,
            NetOp::Events => client.subscribe_net_events().await?,
            NetOp::ConfigInterface => client.config_net_interface(rest).await?,
            NetOp::GetDns => client.dns().await?,
            NetOp::AddDns => client.add_dns(rest).await?,
            NetOp::DeleteDns => client.delete_dns(rest).await?,
            NetOp::Help => net_help(),
        };
        Ok(text)
    }

    async fn log(&self, args: &[&str]) -> Result<String, CommandError> {
        let (sub, rest) = split_sub("log", args)?;
        let op = lookup(LOG_COMMANDS, sub)
            .ok_or_else(|| CommandError::NoCommand(format!("log {sub}")))?;
        if op == LogOp::Help {
            return Ok(log_help());
        }

        let client = self.session.client()?;
        let text = match op {
            LogOp::Get => client.logging().await?,
            LogOp::Set => client.set_logging(rest).await?,
            LogOp::Delete => client.delete_logging(rest).await?,
            LogOp::Help => log_help(),
        };
        Ok(text)
    }

    async fn jobs(&self, args: &[&str]) -> Result<String, CommandError> {
        let (sub, _rest) = split_sub("jobs", args)?;
        let op = lookup(JOBS_COMMANDS, sub)
            .ok_or_else(|| CommandError::NoCommand(format!("jobs {sub}")))?;
        if op == JobsOp::Help {
            return Ok(jobs_help());
        }

        let client = self.session.client()?;
        match op {
            JobsOp::Get => Ok(client.job_status().await?),
            JobsOp::Start | JobsOp::Stop | JobsOp::Register => Err(CommandError::NotImplemented),
            JobsOp::Help => Ok(jobs_help()),
        }
    }
}

fn split_sub<'a, 'b>(
    verb: &'static str,
    args: &'b [&'a str],
) -> Result<(&'a str, &'b [&'a str]), CommandError> {
    args.split_first()
        .map(|(&sub, rest)| (sub, rest))
        .ok_or(CommandError::NotEnoughArgs(verb))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;

    use super::*;
    use crate::client::DaemonClient;
    use crate::transport::scripted::ScriptedTransport;

    fn connected(scripted: ScriptedTransport) -> (Arc<ScriptedTransport>, Session) {
        let scripted = Arc::new(scripted);
        let (tx, _rx) = mpsc::channel(4);
        let client = DaemonClient::new(scripted.clone(), tx);
        (scripted, Session::new(Some(client)))
    }

    fn error(message: &str) -> Outcome {
        Outcome::Error(message.to_string())
    }

    #[tokio::test]
    async fn test_no_client_means_could_not_connect() {
        let session = Session::disconnected();
        let d = Dispatcher::new(&session);
        for line in ["net get-dns", "alive", "log get", "jobs get", "jobs start"] {
            assert_eq!(d.execute(line).await, error("Maestro could not connect."), "{line}");
        }
    }

    #[tokio::test]
    async fn test_debug_toggle() {
        let session = Session::disconnected();
        let d = Dispatcher::new(&session);

        assert_eq!(d.execute("debug on").await, Outcome::Output("Debug is on".into()));
        assert!(session.debug_enabled());
        assert_eq!(d.execute("debug").await, Outcome::Output("Debug is on".into()));
        assert_eq!(d.execute("debug off").await, Outcome::Output("Debug is off".into()));
        assert!(!session.debug_enabled());
        assert_eq!(d.execute("debug loud").await, error("Must be on/off"));
        assert!(!session.debug_enabled());
    }

    #[tokio::test]
    async fn test_unknown_commands() {
        let (scripted, session) = connected(ScriptedTransport::new());
        let d = Dispatcher::new(&session);

        assert_eq!(d.execute("reboot now").await, error("no command: reboot"));
        assert_eq!(d.execute("net").await, error("net: not enough args"));
        assert_eq!(d.execute("net flap").await, error("no command: net flap"));
        assert_eq!(d.execute("log rotate").await, error("no command: log rotate"));
        assert_eq!(d.execute("jobs").await, error("jobs: not enough args"));
        assert!(scripted.requests().is_empty());
    }

    #[tokio::test]
    async fn test_blank_and_exit() {
        let session = Session::disconnected();
        let d = Dispatcher::new(&session);
        assert_eq!(d.execute("").await, Outcome::Nothing);
        assert_eq!(d.execute("   \t ").await, Outcome::Nothing);
        assert_eq!(d.execute("exit").await, Outcome::Exit);
    }

    #[tokio::test]
    async fn test_help_tables() {
        let session = Session::disconnected();
        let d = Dispatcher::new(&session);

        let Outcome::Output(help) = d.execute("help").await else {
            panic!("help should succeed");
        };
        assert!(help.starts_with("Commands:\n"));
        assert!(help.contains("exit           - Exit shell\n"));
        assert!(help.ends_with("--\n"));

        let Outcome::Output(net) = d.execute("net help").await else {
            panic!("net help should succeed without a client");
        };
        assert!(net.contains("get-interfaces   - Show configurations for all interfaces\n"));
        assert!(net.ends_with("like IfName=eth0"));

        let Outcome::Output(log) = d.execute("log help").await else {
            panic!("log help should succeed");
        };
        assert!(log.starts_with("Log Subcommands:\n"));
    }

    #[tokio::test]
    async fn test_alive_output() {
        let (_, session) = connected(
            ScriptedTransport::new().reply("/alive", 200, r#"{"ok":true,"uptime":90000000042}"#),
        );
        let out = Dispatcher::new(&session).execute("alive").await;
        assert_eq!(out, Outcome::Output("Maestro Up. Uptime = 90.000000042s".into()));
    }

    #[tokio::test]
    async fn test_config_interface_errors_before_request() {
        let (scripted, session) = connected(ScriptedTransport::new());
        let d = Dispatcher::new(&session);

        assert_eq!(
            d.execute("net config-interface ipv4addr=10.0.0.2").await,
            error("Missing IfName")
        );
        assert_eq!(
            d.execute("net config-interface ifname=eth0 dhcpv4enabled=notabool").await,
            error("Invalid argument: dhcpv4enabled=notabool")
        );
        assert_eq!(
            d.execute("net config-interface ifname=eth0 down").await,
            error("Invalid option: down")
        );
        assert!(scripted.requests().is_empty());
    }

    #[tokio::test]
    async fn test_config_interface_status_line() {
        let (_, session) = connected(ScriptedTransport::new().reply("/net/interfaces", 200, ""));
        let out = Dispatcher::new(&session)
            .execute("net config-interface IfName=eth0 DhcpV4Enabled=true")
            .await;
        assert_eq!(out, Outcome::Output("200 OK".into()));
    }

    #[tokio::test]
    async fn test_jobs_not_implemented() {
        let (_, session) = connected(ScriptedTransport::new());
        let d = Dispatcher::new(&session);
        for line in ["jobs start relay", "jobs stop relay", "jobs register {}"] {
            assert_eq!(d.execute(line).await, error("Not implemented yet"));
        }
    }

    #[tokio::test]
    async fn test_daemon_failure_is_reported_not_fatal() {
        let (_, session) = connected(
            ScriptedTransport::new()
                .reply("/jobs", 500, r#"{"error": "job db offline"}"#)
                .reply("/jobs", 200, r#"[{"job": "relay"}]"#),
        );
        let d = Dispatcher::new(&session);
        assert_eq!(d.execute("jobs get").await, error("job db offline"));
        assert_eq!(
            d.execute("jobs get").await,
            Outcome::Output("jobs:\n[0]: {\n    job: \"relay\"\n}\n".into())
        );
    }

    #[test]
    fn test_error_display_has_marker() {
        assert_eq!(
            error("no command: x").display().as_deref(),
            Some("[ERROR] no command: x")
        );
        assert_eq!(Outcome::Exit.display(), None);
    }
}
