#![forbid(unsafe_code)]

use std::process::ExitCode;

use clap::{CommandFactory as _, Parser, Subcommand};

use crate::config;
use crate::task::operator::TaskOperator;
use crate::task::store::{LoadMode, TaskStore};

#[derive(Debug, Parser)]
#[command(name = "ttd", version, about = "Manage your to-do list from the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Add(AddArgs),
    List(ListArgs),
    #[command(alias = "lc")]
    Completed(CompletedArgs),
    #[command(alias = "rm")]
    Delete(DeleteArgs),
    #[command(alias = "done")]
    Complete(CompleteArgs),
    Priority(PriorityArgs),
    Log(LogArgs),
    Config(ConfigArgs),
    Completion(CompletionArgs),
}

#[derive(Debug, Parser)]
pub struct AddArgs {
    /// Task text
    pub text: String,
    /// Priority between 1 and 4 (0 = none)
    #[arg(short = 'p', long = "priority", default_value_t = 0,
          value_parser = clap::value_parser!(u8).range(0..=4))]
    pub priority: u8,
}

#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Sort by priority, highest first
    #[arg(short = 'p', long = "priority-sort")]
    pub priority_sort: bool,
    /// Show all task fields
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

#[derive(Debug, Parser)]
pub struct CompletedArgs {
    /// How many entries: positive for the most recent n, negative for
    /// the oldest |n|
    #[arg(short = 'n', long = "recent", allow_negative_numbers = true)]
    pub recent: Option<i64>,
    /// Show every completed task
    #[arg(short = 'a', long = "all")]
    pub all: bool,
    /// Sort by priority, highest first
    #[arg(short = 'p', long = "priority-sort")]
    pub priority_sort: bool,
    /// Show all task fields
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

#[derive(Debug, Parser)]
pub struct DeleteArgs {
    /// Task indices; negative counts from the end (-1 = last)
    #[arg(required = true, allow_negative_numbers = true)]
    pub indices: Vec<i64>,
}

#[derive(Debug, Parser)]
pub struct CompleteArgs {
    /// Task indices; negative counts from the end (-1 = last)
    #[arg(required = true, allow_negative_numbers = true)]
    pub indices: Vec<i64>,
}

#[derive(Debug, Parser)]
pub struct PriorityArgs {
    /// Task index
    #[arg(allow_negative_numbers = true)]
    pub index: i64,
    /// New priority between 0 and 4
    #[arg(allow_negative_numbers = true)]
    pub priority: i64,
}

#[derive(Debug, Parser)]
pub struct LogArgs {
    /// Show the whole action log
    #[arg(short = 'a', long = "all")]
    pub all: bool,
}

#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub cmd: ConfigCmd,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCmd {
    List,
    Set(ConfigSetArgs),
    Get(ConfigGetArgs),
}

#[derive(Debug, Parser)]
pub struct ConfigSetArgs {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Parser)]
pub struct ConfigGetArgs {
    pub key: String,
}

#[derive(Debug, Parser)]
pub struct CompletionArgs {
    pub shell: clap_complete::Shell,
}

pub fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.cmd {
        None => {
            Cli::command().print_help()?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Completion(args)) => {
            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "ttd", &mut std::io::stdout());
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Config(args)) => match args.cmd {
            ConfigCmd::List => {
                print!("{}", config::list_resolved_toml()?);
                Ok(ExitCode::SUCCESS)
            }
            ConfigCmd::Set(set) => {
                config::set_value_string(&set.key, &set.value)?;
                println!("Set {} = {}", set.key, set.value);
                Ok(ExitCode::SUCCESS)
            }
            ConfigCmd::Get(get) => {
                let val = config::get_value_string(&get.key)?;
                match val {
                    Some(v) => {
                        println!("{v}");
                        Ok(ExitCode::SUCCESS)
                    }
                    None => anyhow::bail!(
                        "configuration key '{}' not found - use 'ttd config list' to see available keys",
                        get.key
                    ),
                }
            }
        },
        Some(Commands::Add(args)) => cmd_add(args),
        Some(Commands::List(args)) => cmd_list(args),
        Some(Commands::Completed(args)) => cmd_completed(args),
        Some(Commands::Delete(args)) => cmd_delete(args),
        Some(Commands::Complete(args)) => cmd_complete(args),
        Some(Commands::Priority(args)) => cmd_priority(args),
        Some(Commands::Log(args)) => cmd_log(args),
    }
}

fn load_operator() -> anyhow::Result<(config::Config, TaskOperator)> {
    let (cfg, _paths) = config::load()?;
    let dir = config::expand_path(&cfg.storage.dir)?;
    let mode = if cfg.storage.strict_load {
        LoadMode::Strict
    } else {
        LoadMode::Lenient
    };
    Ok((cfg, TaskOperator::new(TaskStore::new(dir, mode))))
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

fn cmd_add(args: AddArgs) -> anyhow::Result<ExitCode> {
    let (_cfg, op) = load_operator()?;
    print_lines(&op.add(&args.text, args.priority)?);
    Ok(ExitCode::SUCCESS)
}

fn cmd_list(args: ListArgs) -> anyhow::Result<ExitCode> {
    let (_cfg, op) = load_operator()?;
    print_lines(&op.list_incomplete(args.priority_sort, args.verbose)?);
    Ok(ExitCode::SUCCESS)
}

fn cmd_completed(args: CompletedArgs) -> anyhow::Result<ExitCode> {
    let (cfg, op) = load_operator()?;
    let n = args.recent.unwrap_or(cfg.list.completed_recent);
    print_lines(&op.list_completed(n, args.all, args.priority_sort, args.verbose)?);
    Ok(ExitCode::SUCCESS)
}

fn cmd_delete(args: DeleteArgs) -> anyhow::Result<ExitCode> {
    let (_cfg, op) = load_operator()?;
    print_lines(&op.delete(&args.indices)?);
    Ok(ExitCode::SUCCESS)
}

fn cmd_complete(args: CompleteArgs) -> anyhow::Result<ExitCode> {
    let (_cfg, op) = load_operator()?;
    print_lines(&op.complete(&args.indices)?);
    Ok(ExitCode::SUCCESS)
}

fn cmd_priority(args: PriorityArgs) -> anyhow::Result<ExitCode> {
    let (_cfg, op) = load_operator()?;
    print_lines(&op.set_priority(args.index, args.priority)?);
    Ok(ExitCode::SUCCESS)
}

fn cmd_log(args: LogArgs) -> anyhow::Result<ExitCode> {
    let (cfg, op) = load_operator()?;
    print_lines(&op.view_log(args.all, cfg.list.log_recent)?);
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_all_subcommands() {
        Cli::command().debug_assert();

        let cli = Cli::parse_from(["ttd", "add", "Buy milk", "-p", "2"]);
        let Some(Commands::Add(args)) = cli.cmd else {
            panic!("expected add");
        };
        assert_eq!(args.text, "Buy milk");
        assert_eq!(args.priority, 2);

        let cli = Cli::parse_from(["ttd", "delete", "1", "-2"]);
        let Some(Commands::Delete(args)) = cli.cmd else {
            panic!("expected delete");
        };
        assert_eq!(args.indices, vec![1, -2]);

        let cli = Cli::parse_from(["ttd", "done", "-1"]);
        let Some(Commands::Complete(args)) = cli.cmd else {
            panic!("expected complete");
        };
        assert_eq!(args.indices, vec![-1]);

        let cli = Cli::parse_from(["ttd", "completed", "-n", "-5", "-v"]);
        let Some(Commands::Completed(args)) = cli.cmd else {
            panic!("expected completed");
        };
        assert_eq!(args.recent, Some(-5));
        assert!(args.verbose);
        assert!(!args.all);
    }

    #[test]
    fn cli_rejects_out_of_range_add_priority() {
        assert!(Cli::try_parse_from(["ttd", "add", "x", "-p", "9"]).is_err());
    }

    #[test]
    fn no_subcommand_parses_to_none() {
        let cli = Cli::parse_from(["ttd"]);
        assert!(cli.cmd.is_none());
    }
}
