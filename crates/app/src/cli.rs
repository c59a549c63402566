//! Command-line parsing and command execution.

use std::io::Write;
use std::path::PathBuf;

use rolegate_application::{ClientError, RolegateClient, SessionState};
use rolegate_domain::{ManagedUser, NewManagedUser, Role};
use thiserror::Error;
use tracing::debug;

/// Usage text printed on argument errors.
pub const USAGE: &str = "\
Usage: rolegate [--config <file>] <command>

Commands:
  login <email> <password>                 sign in and store the session
  whoami                                   show the signed-in role
  users                                    list managed users (admins)
  create-user <email> <password> <role>    create a managed user
  logout                                   sign out and forget the session";

/// A command to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Password login.
    Login {
        /// Login email.
        email: String,
        /// Password.
        password: String,
    },
    /// Show the current session.
    WhoAmI,
    /// List managed users.
    Users,
    /// Create a managed user.
    CreateUser(NewManagedUser),
    /// End the session.
    Logout,
}

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Explicit configuration file.
    pub config: Option<PathBuf>,
    /// The command to run.
    pub command: Command,
}

impl Invocation {
    /// Parses the arguments following the program name.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Usage` for unknown commands or wrong arity.
    pub fn parse(args: &[String]) -> Result<Self, CliError> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let (config, rest) = match args.as_slice() {
            ["--config", path, rest @ ..] => (Some(PathBuf::from(*path)), rest),
            ["--config"] => return Err(usage("--config needs a file")),
            rest => (None, rest),
        };

        let command = match rest {
            ["login", email, password] => Command::Login {
                email: (*email).to_string(),
                password: (*password).to_string(),
            },
            ["whoami"] => Command::WhoAmI,
            ["users"] => Command::Users,
            ["create-user", email, password, role] => {
                Command::CreateUser(NewManagedUser::new(*email, *password, Role::new(*role)))
            }
            ["logout"] => Command::Logout,
            [] => return Err(usage("no command given")),
            [name, ..] => return Err(usage(&format!("unknown command or wrong arguments: {name}"))),
        };

        Ok(Self { config, command })
    }
}

fn usage(message: &str) -> CliError {
    CliError::Usage(message.to_string())
}

/// Errors reported by the command line.
#[derive(Debug, Error)]
pub enum CliError {
    /// The arguments could not be parsed.
    #[error("{0}")]
    Usage(String),

    /// The command needs a session and none is stored.
    #[error("not signed in")]
    NotSignedIn,

    /// The client call failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Writing output failed.
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Returns true when the user has to sign in again.
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        match self {
            Self::NotSignedIn => true,
            Self::Client(e) => e.requires_login(),
            Self::Usage(_) | Self::Io(_) => false,
        }
    }
}

/// Runs `command` against `client`, writing human-readable output to `out`.
///
/// Every command except `login` starts by restoring the persisted session.
///
/// # Errors
///
/// Returns the client error of the failed call, `CliError::NotSignedIn`
/// when a command needs a session and none is stored, or an output error.
pub async fn run<W: Write>(
    client: &RolegateClient,
    command: Command,
    out: &mut W,
) -> Result<(), CliError> {
    if !matches!(command, Command::Login { .. }) {
        client.restore_session().await?;
    }
    debug!(?command, state = ?client.state(), "running command");

    match command {
        Command::Login { email, password } => {
            let session = client.login(&email, &password).await?;
            writeln!(out, "Signed in as {email} ({})", session.role)?;
        }
        Command::WhoAmI => match client.state() {
            SessionState::Authenticated { role } => writeln!(out, "Signed in ({role})")?,
            SessionState::Anonymous => writeln!(out, "Not signed in")?,
        },
        Command::Users => {
            let role = signed_in_role(client)?;
            let users = client.managed_users().list().await?;
            // Advisory only: the server decides what the list contains.
            if role.is_admin() {
                render_users(out, &users)?;
            } else {
                writeln!(out, "The user list is available to admins only.")?;
            }
        }
        Command::CreateUser(new_user) => {
            signed_in_role(client)?;
            let created = client.managed_users().create(&new_user).await?;
            writeln!(
                out,
                "Created user {} ({}) with id {}",
                created.email, created.role, created.id
            )?;
        }
        Command::Logout => {
            client.logout().await?;
            writeln!(out, "Signed out")?;
        }
    }
    Ok(())
}

fn signed_in_role(client: &RolegateClient) -> Result<Role, CliError> {
    match client.state() {
        SessionState::Authenticated { role } => Ok(role),
        SessionState::Anonymous => Err(CliError::NotSignedIn),
    }
}

fn render_users<W: Write>(out: &mut W, users: &[ManagedUser]) -> std::io::Result<()> {
    let width = users
        .iter()
        .map(|u| u.email.len())
        .max()
        .unwrap_or(0)
        .max("EMAIL".len());
    writeln!(out, "{:>6}  {:<width$}  ROLE", "ID", "EMAIL")?;
    for user in users {
        writeln!(out, "{:>6}  {:<width$}  {}", user.id, user.email, user.role)?;
    }
    Ok(())
}
