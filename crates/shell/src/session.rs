//! Command dispatch into the catalog manager.

use std::sync::Arc;

use reelscout_core::{CatalogManager, FilterInput, LoadOutcome, Movie};
use tracing::{debug, warn};

use crate::commands::{Command, HELP};
use crate::metrics::{encode_metrics, COMMANDS_TOTAL};
use crate::render;

/// What the input loop should do after a command.
#[derive(Debug, PartialEq)]
pub enum Flow {
    /// Print the output and read the next line.
    Continue(String),
    Quit,
}

/// One interactive session over a shared manager.
pub struct Session {
    manager: Arc<CatalogManager>,
    image_base_url: String,
}

impl Session {
    pub fn new(manager: Arc<CatalogManager>, image_base_url: impl Into<String>) -> Self {
        Self {
            manager,
            image_base_url: image_base_url.into(),
        }
    }

    /// Initial loads: first trending page and the genre list.
    pub async fn start(&self) -> String {
        let (trending, genres) = tokio::join!(
            self.manager.load_trending_page(1),
            self.manager.load_genres()
        );
        if trending == LoadOutcome::Failed {
            warn!("Initial trending load failed");
        }
        if genres == LoadOutcome::Failed {
            warn!("Initial genre load failed");
        }

        let snapshot = self.manager.snapshot();
        let mut out = render::listing(&snapshot);
        if !snapshot.last_search.is_empty() {
            out.push_str(&format!(
                "Last search: \"{}\" ('restore' to run it again)\n",
                snapshot.last_search
            ));
        }
        out
    }

    pub async fn handle(&self, command: Command) -> Flow {
        let name = command_name(&command);
        COMMANDS_TOTAL.with_label_values(&[name]).inc();
        debug!("Handling command '{}'", name);

        let output = match command {
            Command::Trending => {
                self.manager.clear_search();
                self.manager.apply_filter(FilterInput::default()).await;
                self.manager.load_trending_page(1).await;
                self.listing()
            }
            Command::Search(query) => {
                self.manager.search(&query, 1).await;
                self.listing()
            }
            Command::Restore => match self.manager.restore_last_search().await {
                LoadOutcome::Skipped => "No previous search to restore.\n".to_string(),
                _ => self.listing(),
            },
            Command::Clear => {
                self.manager.clear_search();
                self.ensure_trending().await;
                self.listing()
            }
            Command::Filter(input) => {
                if self.manager.apply_filter(input).await == LoadOutcome::FilterCleared {
                    self.ensure_trending().await;
                }
                self.listing()
            }
            Command::Reset => {
                self.manager.apply_filter(FilterInput::default()).await;
                self.ensure_trending().await;
                self.listing()
            }
            Command::More => match self.manager.load_more().await {
                LoadOutcome::Skipped => "Nothing more to load.\n".to_string(),
                _ => self.listing(),
            },
            Command::Genres => {
                self.manager.load_genres().await;
                match self.manager.error() {
                    Some(error) if self.manager.genres().is_empty() => format!("! {}\n", error),
                    _ => render::genres(&self.manager.genres()),
                }
            }
            Command::Fav(movie_id) => match self.find_movie(movie_id) {
                Some(movie) => {
                    let added = self.manager.toggle_favorite(&movie);
                    let mut out = format!(
                        "{} \"{}\" {} favorites.\n",
                        if added { "Added" } else { "Removed" },
                        movie.title,
                        if added { "to" } else { "from" }
                    );
                    if let Some(error) = self.manager.error() {
                        out.push_str(&format!("! {}\n", error));
                    }
                    out
                }
                None => format!("Movie {} is not in any loaded list.\n", movie_id),
            },
            Command::Favs => render::favorites(&self.manager.favorites()),
            Command::Detail(movie_id) => match self.manager.load_detail(movie_id).await {
                LoadOutcome::Applied => match self.manager.detail() {
                    Some(detail) => render::detail(
                        &detail,
                        &self.image_base_url,
                        self.manager.is_favorite(movie_id),
                    ),
                    None => String::new(),
                },
                _ => format!(
                    "! {}\n",
                    self.manager.error().unwrap_or_default()
                ),
            },
            Command::Show { json } => {
                if json {
                    match serde_json::to_string_pretty(&self.manager.snapshot()) {
                        Ok(json) => format!("{}\n", json),
                        Err(e) => format!("! Failed to encode state: {}\n", e),
                    }
                } else {
                    self.listing()
                }
            }
            Command::Dismiss => {
                self.manager.dismiss_error();
                self.listing()
            }
            Command::Metrics => encode_metrics(),
            Command::Help => format!("{}\n", HELP),
            Command::Quit => return Flow::Quit,
        };

        Flow::Continue(output)
    }

    fn listing(&self) -> String {
        render::listing(&self.manager.snapshot())
    }

    async fn ensure_trending(&self) {
        if self.manager.snapshot().trending.is_empty() {
            self.manager.load_trending_page(1).await;
        }
    }

    /// Look a movie up in everything the session has loaded.
    fn find_movie(&self, movie_id: u32) -> Option<Movie> {
        let snapshot = self.manager.snapshot();
        snapshot
            .display
            .movies
            .iter()
            .chain(&snapshot.favorites)
            .chain(&snapshot.trending.movies)
            .chain(&snapshot.search.results.movies)
            .chain(&snapshot.filtered.results.movies)
            .chain(snapshot.detail.as_ref().map(|d| &d.movie))
            .find(|m| m.id == movie_id)
            .cloned()
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Trending => "trending",
        Command::Search(_) => "search",
        Command::Restore => "restore",
        Command::Clear => "clear",
        Command::Filter(_) => "filter",
        Command::Reset => "reset",
        Command::More => "more",
        Command::Genres => "genres",
        Command::Fav(_) => "fav",
        Command::Favs => "favs",
        Command::Detail(_) => "detail",
        Command::Show { .. } => "show",
        Command::Dismiss => "dismiss",
        Command::Metrics => "metrics",
        Command::Help => "help",
        Command::Quit => "quit",
    }
}
