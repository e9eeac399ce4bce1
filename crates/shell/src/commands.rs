//! Line command parsing.

use reelscout_core::FilterInput;
use thiserror::Error;

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Trending,
    Search(String),
    Restore,
    Clear,
    Filter(FilterInput),
    Reset,
    More,
    Genres,
    Fav(u32),
    Favs,
    Detail(u32),
    Show { json: bool },
    Dismiss,
    Metrics,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("Unknown command '{0}'. Type 'help' for a list of commands.")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Invalid value for '{key}': {value}")]
    InvalidValue { key: String, value: String },
}

pub const HELP: &str = "\
Commands:
  trending                      show trending movies
  search <text>                 search movies by title
  restore                       re-run the last search
  clear                         leave search mode
  filter genres=<ids> [years=<a>-<b>] [rating=<a>-<b>] [sort=<key>]
                                discover movies (genre ids comma-separated)
  reset                         clear the filter
  more                          load the next page of the current list
  genres                        list genres with their ids
  fav <id>                      toggle a favorite
  favs                          list favorites
  detail <id>                   show movie details
  show [json]                   redraw the current list
  dismiss                       clear the error message
  metrics                       print metrics
  help                          show this help
  quit                          exit";

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    let command = match name.to_lowercase().as_str() {
        "trending" => Command::Trending,
        "search" => {
            if rest.is_empty() {
                return Err(ParseError::Usage("search <text>"));
            }
            Command::Search(rest.to_string())
        }
        "restore" => Command::Restore,
        "clear" => Command::Clear,
        "filter" => Command::Filter(parse_filter(rest)?),
        "reset" => Command::Reset,
        "more" => Command::More,
        "genres" => Command::Genres,
        "fav" => Command::Fav(parse_id(rest, "fav <id>")?),
        "favs" => Command::Favs,
        "detail" => Command::Detail(parse_id(rest, "detail <id>")?),
        "show" => Command::Show {
            json: rest.eq_ignore_ascii_case("json"),
        },
        "dismiss" => Command::Dismiss,
        "metrics" => Command::Metrics,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(ParseError::Unknown(other.to_string())),
    };

    Ok(Some(command))
}

fn parse_id(rest: &str, usage: &'static str) -> Result<u32, ParseError> {
    rest.parse().map_err(|_| ParseError::Usage(usage))
}

fn parse_filter(rest: &str) -> Result<FilterInput, ParseError> {
    let mut input = FilterInput::default();

    for token in rest.split_whitespace() {
        let (key, value) = token
            .split_once('=')
            .ok_or(ParseError::Usage("filter genres=<ids> [years=<a>-<b>] [rating=<a>-<b>] [sort=<key>]"))?;
        let invalid = || ParseError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };

        match key {
            "genres" => {
                input.genres = value
                    .split(',')
                    .filter(|s| !s.is_empty())
                    .map(|s| s.parse::<u32>().map_err(|_| invalid()))
                    .collect::<Result<_, _>>()?;
            }
            "years" => {
                let (from, to) = parse_range::<i32>(value).ok_or_else(invalid)?;
                input = input.years(from, to);
            }
            "rating" => {
                let (from, to) = parse_range::<f32>(value).ok_or_else(invalid)?;
                input = input.rating(from, to);
            }
            "sort" => input = input.sort_by(value),
            _ => return Err(invalid()),
        }
    }

    Ok(input)
}

fn parse_range<T: std::str::FromStr>(value: &str) -> Option<(T, T)> {
    let (from, to) = value.split_once('-')?;
    Some((from.trim().parse().ok()?, to.trim().parse().ok()?))
}
