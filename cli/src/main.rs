mod file_store;
mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use odd1out_core::memory::{MemoryAuth, MemoryRemoteStore};
use odd1out_core::{
    parse_catalog, ActionOutcome, AuthError, DayKey, GameAction, GameController, GameRules,
    Identity, LoginFlow,
};
use rand::Rng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use crate::file_store::{FileCatalog, FileLocalStore};
use crate::render::{render_stats, render_summary, render_view};

#[derive(Parser)]
#[command(name = "odd1out-cli", version, about = "Play and check daily odd-one-out puzzles")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play today's puzzles in the terminal.
    Play {
        #[arg(long, env = "ODD1OUT_CATALOG", default_value = "puzzles.json")]
        catalog: PathBuf,
        #[arg(long, env = "ODD1OUT_STATE_DIR", default_value = ".odd1out")]
        state_dir: PathBuf,
        /// Day to play, YYYY-MM-DD. Defaults to the local date.
        #[arg(long)]
        date: Option<String>,
        #[arg(long, env = "ODD1OUT_SEED")]
        seed: Option<String>,
    },
    Catalog {
        #[command(subcommand)]
        command: CatalogCommand,
    },
}

#[derive(Subcommand)]
enum CatalogCommand {
    /// Validate a puzzle document and list its puzzles.
    Check { path: PathBuf },
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Select(usize),
    Submit,
    Shuffle,
    Continue,
    Review,
    Previous,
    Next,
    Login { email: String, password: String },
    Logout,
    Stats,
    Help,
    Quit,
}

const HELP: &str = "\
  1-5        select a token (again to clear)
  s          submit the selection
  h          shuffle the tokens
  c          continue after a result
  r          review a finished game
  p / n      previous / next puzzle in review
  login E P  sign in (or create an account) for this run
  logout     sign out
  stats      show your stats
  q          quit";

type Controller = GameController<MemoryAuth, MemoryRemoteStore, FileLocalStore, FileCatalog>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            catalog,
            state_dir,
            date,
            seed,
        } => {
            let today = match date.as_deref() {
                Some(raw) => DayKey::parse(raw)?,
                None => local_today()?,
            };
            let seed = match seed.as_deref() {
                Some(raw) => parse_seed_arg(raw)?,
                None => rand::rng().random(),
            };
            let rules = GameRules::default();
            let controller = GameController::new(
                MemoryAuth::new(),
                MemoryRemoteStore::new(),
                FileLocalStore::new(state_dir),
                FileCatalog::new(catalog, rules),
                rules,
                seed,
            );
            play(&controller, today).await?;
        }
        Commands::Catalog { command } => match command {
            CatalogCommand::Check { path } => {
                let bytes = tokio::fs::read(&path).await?;
                let puzzles = parse_catalog(&bytes, &GameRules::default())?;
                println!("{}: {} puzzles", path.display(), puzzles.len());
                for (index, puzzle) in puzzles.iter().enumerate() {
                    println!(
                        "  {}. {} [{}] odd one: {}",
                        index + 1,
                        puzzle.category,
                        puzzle.tokens.join(", "),
                        puzzle.answer().unwrap_or("?")
                    );
                }
            }
        },
    }

    Ok(())
}

async fn play(controller: &Controller, today: DayKey) -> Result<(), Box<dyn std::error::Error>> {
    controller.identity_changed(None, today.clone()).await?;
    print!("{}", render_view(&controller.view()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(command) = parse_command(&line) else {
            if !line.trim().is_empty() {
                println!("unknown command, try `help`");
            }
            continue;
        };
        match command {
            Command::Quit => break,
            Command::Help => {
                println!("{HELP}");
                continue;
            }
            Command::Stats => {
                println!("{}", render_stats(&controller.context().stats()));
                continue;
            }
            Command::Select(slot) => {
                controller
                    .act(GameAction::SelectSlot {
                        slot: slot.saturating_sub(1),
                    })
                    .await;
            }
            Command::Submit => {
                if let ActionOutcome::Submit(outcome) = controller.act(GameAction::Submit).await {
                    let summary = controller
                        .context()
                        .session()
                        .and_then(|session| session.result_summary(&outcome));
                    if let Some(summary) = summary {
                        print!("{}", render_summary(&summary));
                    }
                }
            }
            Command::Shuffle => {
                controller.act(GameAction::Shuffle).await;
            }
            Command::Continue => {
                controller.act(GameAction::Continue).await;
            }
            Command::Review => {
                controller.act(GameAction::EnterReview).await;
            }
            Command::Previous => {
                controller.act(GameAction::Navigate { direction: -1 }).await;
            }
            Command::Next => {
                controller.act(GameAction::Navigate { direction: 1 }).await;
            }
            Command::Login { email, password } => {
                match log_in(controller.auth(), &email, &password).await {
                    Ok(identity) => {
                        controller
                            .identity_changed(Some(identity), today.clone())
                            .await?;
                    }
                    Err(err) => println!("{}", err.user_message()),
                }
            }
            Command::Logout => {
                controller.sign_out(today.clone()).await?;
            }
        }
        print!("{}", render_view(&controller.view()));
    }
    Ok(())
}

async fn log_in(auth: &MemoryAuth, email: &str, password: &str) -> Result<Identity, AuthError> {
    let mut flow = LoginFlow::new(GameRules::default());
    flow.submit_email(auth, email).await?;
    flow.submit_password(auth, password).await
}

fn parse_command(line: &str) -> Option<Command> {
    let mut words = line.split_whitespace();
    let head = words.next()?.to_ascii_lowercase();
    let command = match head.as_str() {
        "s" | "submit" => Command::Submit,
        "h" | "shuffle" => Command::Shuffle,
        "c" | "continue" => Command::Continue,
        "r" | "review" => Command::Review,
        "p" | "prev" => Command::Previous,
        "n" | "next" => Command::Next,
        "logout" => Command::Logout,
        "stats" => Command::Stats,
        "help" | "?" => Command::Help,
        "q" | "quit" => Command::Quit,
        "login" => {
            let email = words.next()?.to_string();
            let password = words.next()?.to_string();
            Command::Login { email, password }
        }
        other => Command::Select(other.parse().ok().filter(|slot| *slot > 0)?),
    };
    Some(command)
}

fn local_today() -> Result<DayKey, Box<dyn std::error::Error>> {
    let today = chrono::Local::now().date_naive();
    Ok(DayKey::parse(&today.format("%Y-%m-%d").to_string())?)
}

fn parse_seed_arg(raw: &str) -> Result<u64, Box<dyn std::error::Error>> {
    let trimmed = raw.trim();
    let value = if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16)?
    } else {
        trimmed.parse::<u64>()?
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_parse() {
        assert_eq!(parse_command(" 3 "), Some(Command::Select(3)));
        assert_eq!(parse_command("S"), Some(Command::Submit));
        assert_eq!(parse_command("n"), Some(Command::Next));
        assert_eq!(
            parse_command("login ada@example.com secret1"),
            Some(Command::Login {
                email: "ada@example.com".to_string(),
                password: "secret1".to_string(),
            })
        );
        assert_eq!(parse_command("login ada@example.com"), None);
        assert_eq!(parse_command("0"), None);
        assert_eq!(parse_command("dance"), None);
        assert_eq!(parse_command("   "), None);
    }

    #[test]
    fn seeds_accept_hex_and_decimal() {
        assert_eq!(parse_seed_arg("0x10").unwrap(), 16);
        assert_eq!(parse_seed_arg(" 42 ").unwrap(), 42);
        assert!(parse_seed_arg("zz").is_err());
    }
}
