//! Plain-text rendering of manager state.

use std::fmt::Write;

use reelscout_core::catalog::{BACKDROP_SIZE, POSTER_SIZE};
use reelscout_core::{CatalogSnapshot, Genre, Movie, MovieDetail};

const TOP_CAST: usize = 6;

fn movie_line(movie: &Movie, favorite: bool) -> String {
    let year = movie
        .year()
        .map(|y| y.to_string())
        .unwrap_or_else(|| "----".to_string());
    format!(
        "{} {:>8}  {}  {:<40}  {:.1}",
        if favorite { "*" } else { " " },
        movie.id,
        year,
        movie.title,
        movie.vote_average
    )
}

/// The displayed collection with its heading and status lines.
pub fn listing(snapshot: &CatalogSnapshot) -> String {
    let display = &snapshot.display;
    let is_favorite = |id: u32| snapshot.favorites.iter().any(|m| m.id == id);

    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", display.title);

    if display.movies.is_empty() {
        if !snapshot.loading {
            let _ = writeln!(out, "  No movies to show.");
        }
    } else {
        for movie in &display.movies {
            let _ = writeln!(out, "{}", movie_line(movie, is_favorite(movie.id)));
        }
    }

    if snapshot.loading {
        let _ = writeln!(out, "  Loading...");
    } else if display.has_more {
        let _ = writeln!(out, "  ('more' for the next page)");
    }

    if let Some(error) = &snapshot.error {
        let _ = writeln!(out, "! {}", error);
    }

    out
}

/// Favorites in insertion order.
pub fn favorites(movies: &[Movie]) -> String {
    let mut out = String::from("== Favorites ==\n");
    if movies.is_empty() {
        out.push_str("  No favorites yet. Use 'fav <id>' to add one.\n");
    }
    for movie in movies {
        let _ = writeln!(out, "{}", movie_line(movie, true));
    }
    out
}

/// Genres with their ids, for building filters.
pub fn genres(genres: &[Genre]) -> String {
    let mut out = String::from("== Genres ==\n");
    for genre in genres {
        let _ = writeln!(out, "  {:>6}  {}", genre.id, genre.name);
    }
    out
}

/// Full detail view.
pub fn detail(detail: &MovieDetail, image_base_url: &str, favorite: bool) -> String {
    let movie = &detail.movie;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "== {}{} ==",
        movie.title,
        movie.year().map(|y| format!(" ({})", y)).unwrap_or_default()
    );
    if let Some(tagline) = &detail.tagline {
        let _ = writeln!(out, "\"{}\"", tagline);
    }

    let mut facts = vec![format!("{:.1}/10 ({} votes)", movie.vote_average, movie.vote_count)];
    if let Some(runtime) = detail.runtime_minutes {
        facts.push(format!("{}h {}m", runtime / 60, runtime % 60));
    }
    if !detail.genres.is_empty() {
        let names: Vec<&str> = detail.genres.iter().map(|g| g.name.as_str()).collect();
        facts.push(names.join(", "));
    }
    if favorite {
        facts.push("favorite".to_string());
    }
    let _ = writeln!(out, "{}", facts.join(" | "));

    if !movie.overview.is_empty() {
        let _ = writeln!(out, "\n{}", movie.overview);
    }

    let cast = detail.top_cast(TOP_CAST);
    if !cast.is_empty() {
        let _ = writeln!(out, "\nCast:");
        for member in cast {
            if member.character.is_empty() {
                let _ = writeln!(out, "  {}", member.name);
            } else {
                let _ = writeln!(out, "  {} as {}", member.name, member.character);
            }
        }
    }

    let _ = writeln!(out);
    if let Some(url) = movie.poster_url(image_base_url, POSTER_SIZE) {
        let _ = writeln!(out, "Poster:   {}", url);
    }
    if let Some(url) = movie.backdrop_url(image_base_url, BACKDROP_SIZE) {
        let _ = writeln!(out, "Backdrop: {}", url);
    }
    if let Some(url) = detail.trailer().and_then(|t| t.youtube_url()) {
        let _ = writeln!(out, "Trailer:  {}", url);
    }

    out
}
