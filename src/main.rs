//! chatmux - Entry Point

use chatmux::model::AppError;
use chatmux::session::{event_channel, LoopbackSession};
use chatmux::state::Core;
use chatmux::view::ColorConfig;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// chatmux - terminal client multiplexing conversations into numbered tabs
#[derive(Parser, Debug)]
#[command(name = "chatmux")]
#[command(version)]
#[command(about = "Terminal chat client with numbered tabs and correctable messages")]
pub struct Args {
    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Nickname used for your messages and highlights
    #[arg(short, long)]
    pub nick: Option<String>,

    /// Keep closed tabs as gaps so tab numbers never shift
    #[arg(long, value_name = "BOOL")]
    pub gaps: Option<bool>,

    /// Disable colors
    #[arg(long)]
    pub no_color: bool,
}

fn main() -> Result<(), AppError> {
    let args = Args::parse();

    // Load configuration with full precedence chain:
    // Defaults → Config File → Env Vars → CLI Args
    let config = {
        let config_file = chatmux::config::load_config_with_precedence(args.config.clone())?;
        let merged = chatmux::config::merge_config(config_file);
        let with_env = chatmux::config::apply_env_overrides(merged);
        chatmux::config::apply_cli_overrides(with_env, args.nick.clone(), args.gaps)
    };

    // Keep the guard alive so buffered log lines are flushed on exit
    let _log_guard = chatmux::logging::init(&config.log_file_path)?;

    info!(
        config = ?config,
        "Configuration loaded and resolved"
    );

    let (events_tx, events_rx) = event_channel();
    let session = LoopbackSession::new(events_tx, &config.own_nick);
    session.connect();

    let mut core = Core::new(config, Box::new(session), events_rx);
    let colors = ColorConfig::from_env_and_args(args.no_color);
    chatmux::view::run(&mut core, colors).map_err(|err| match err {
        chatmux::view::TuiError::Io(io) => AppError::Terminal(io),
    })?;

    info!("Bye");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_help_does_not_error() {
        // Help returns Err with DisplayHelp, which is success
        let result = Args::try_parse_from(["chatmux", "--help"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_does_not_error() {
        let result = Args::try_parse_from(["chatmux", "--version"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_no_args_defaults() {
        let args = Args::parse_from(["chatmux"]);
        assert_eq!(args.config, None);
        assert_eq!(args.nick, None);
        assert_eq!(args.gaps, None);
        assert!(!args.no_color);
    }

    #[test]
    fn test_nick_short_and_long() {
        let args = Args::parse_from(["chatmux", "-n", "alice"]);
        assert_eq!(args.nick.as_deref(), Some("alice"));
        let args = Args::parse_from(["chatmux", "--nick", "bob"]);
        assert_eq!(args.nick.as_deref(), Some("bob"));
    }

    #[test]
    fn test_gaps_takes_a_boolean() {
        let args = Args::parse_from(["chatmux", "--gaps", "true"]);
        assert_eq!(args.gaps, Some(true));
        let args = Args::parse_from(["chatmux", "--gaps", "false"]);
        assert_eq!(args.gaps, Some(false));
        assert!(Args::try_parse_from(["chatmux", "--gaps", "maybe"]).is_err());
    }

    #[test]
    fn test_config_path() {
        let args = Args::parse_from(["chatmux", "--config", "/tmp/chatmux.toml"]);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/chatmux.toml")));
    }

    #[test]
    fn test_no_color_flag() {
        let args = Args::parse_from(["chatmux", "--no-color"]);
        assert!(args.no_color);
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        let result = Args::try_parse_from(["chatmux", "--follow"]);
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), clap::error::ErrorKind::UnknownArgument);
    }
}
