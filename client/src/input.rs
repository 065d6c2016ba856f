//! Text commands typed by the player

use shared::{GameId, Move};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `place [slot] <row> <col>`; the slot defaults to 0
    Place(Move),
    Rotate { slot: usize },
    Say(String),
    Create,
    Join(String),
    Launch(GameId),
    Leave,
    Board,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}', type 'help'")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("'{0}' is not a number")]
    NotANumber(String),
    #[error("unknown game '{0}', use reproduction or tetris")]
    UnknownGame(String),
}

pub const HELP: &str = "\
commands:
  place [slot] <row> <col>   put a piece with its top-left cell at row/col
  rotate <slot>              turn a piece clockwise
  say <text>                 chat with the room
  create | join <code>       open or enter a room
  launch reproduction|tetris start a game (host only)
  leave                      leave the room
  board                      redraw the screen
  quit";

fn number<T: std::str::FromStr>(word: &str) -> Result<T, CommandError> {
    word.parse()
        .map_err(|_| CommandError::NotANumber(word.to_string()))
}

pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    match verb.to_ascii_lowercase().as_str() {
        "" => Err(CommandError::Empty),
        "place" | "p" => match args.as_slice() {
            [row, col] => Ok(Command::Place(Move::new(0, number(row)?, number(col)?))),
            [slot, row, col] => Ok(Command::Place(Move::new(
                number(slot)?,
                number(row)?,
                number(col)?,
            ))),
            _ => Err(CommandError::Usage("place [slot] <row> <col>")),
        },
        "rotate" | "r" => match args.as_slice() {
            [] => Ok(Command::Rotate { slot: 0 }),
            [slot] => Ok(Command::Rotate {
                slot: number(slot)?,
            }),
            _ => Err(CommandError::Usage("rotate <slot>")),
        },
        "say" | "s" => {
            if rest.is_empty() {
                Err(CommandError::Usage("say <text>"))
            } else {
                Ok(Command::Say(rest.to_string()))
            }
        }
        "create" => Ok(Command::Create),
        "join" => match args.as_slice() {
            [code] => Ok(Command::Join(code.to_ascii_uppercase())),
            _ => Err(CommandError::Usage("join <code>")),
        },
        "launch" => match args.as_slice() {
            [game] => game
                .parse()
                .map(Command::Launch)
                .map_err(|_| CommandError::UnknownGame(game.to_string())),
            _ => Err(CommandError::Usage("launch reproduction|tetris")),
        },
        "leave" => Ok(Command::Leave),
        "board" | "b" => Ok(Command::Board),
        "help" | "?" => Ok(Command::Help),
        "quit" | "q" | "exit" => Ok(Command::Quit),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}
