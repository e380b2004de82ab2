use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "arcade",
    about = "Arcade user registry: serve the API or manage records directly",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML config file. Environment variables are used when absent.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// List or add users
    Users(UsersArgs),
    /// Print signed URLs for the configured images
    Images,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Keep everything in memory instead of the filesystem bucket
    #[arg(long)]
    pub in_memory: bool,
}

#[derive(Args)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub action: UsersAction,
}

#[derive(Subcommand)]
pub enum UsersAction {
    /// List users without their favourite numbers
    List,
    /// Append a user
    Add(AddUserArgs),
}

#[derive(Args)]
pub struct AddUserArgs {
    #[arg(long)]
    pub first_name: String,
    #[arg(long)]
    pub surname: String,
    #[arg(long)]
    pub birthday: String,
    #[arg(long)]
    pub colour: String,
    #[arg(long, allow_hyphen_values = true)]
    pub number: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_serve() {
        let cli = Cli::try_parse_from(["arcade", "serve"]).unwrap();
        if let Command::Serve(args) = cli.command {
            assert!(!args.in_memory);
        } else {
            panic!("wrong command");
        }
        assert!(cli.config.is_none());
    }

    #[test]
    fn parse_serve_in_memory_with_config() {
        let cli = Cli::try_parse_from(["arcade", "serve", "--in-memory", "--config", "arcade.toml"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("arcade.toml")));
        if let Command::Serve(args) = cli.command {
            assert!(args.in_memory);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_users_list() {
        let cli = Cli::try_parse_from(["arcade", "users", "list"]).unwrap();
        if let Command::Users(args) = cli.command {
            assert!(matches!(args.action, UsersAction::List));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_users_add() {
        let cli = Cli::try_parse_from([
            "arcade",
            "users",
            "add",
            "--first-name",
            "Amy",
            "--surname",
            "Lee",
            "--birthday",
            "2000-01-01",
            "--colour",
            "blue",
            "--number",
            "-3",
        ])
        .unwrap();
        if let Command::Users(UsersArgs {
            action: UsersAction::Add(args),
        }) = cli.command
        {
            assert_eq!(args.first_name, "Amy");
            assert_eq!(args.colour, "blue");
            assert_eq!(args.number, -3);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn users_add_requires_every_field() {
        assert!(Cli::try_parse_from(["arcade", "users", "add", "--first-name", "Amy"]).is_err());
    }

    #[test]
    fn parse_images() {
        let cli = Cli::try_parse_from(["arcade", "images"]).unwrap();
        assert!(matches!(cli.command, Command::Images));
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["arcade", "--verbose", "images"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn parse_json_format() {
        let cli = Cli::try_parse_from(["arcade", "users", "list", "--format", "json"]).unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
    }
}
