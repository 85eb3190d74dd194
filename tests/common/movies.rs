use marquee::types::{CastMember, CrewMember, Movie, MovieId, Tag};

pub fn tag(name: &str) -> Tag {
    Tag {
        id: 0,
        name: name.to_string(),
    }
}

/// A movie with one director, a billed cast, genres, keywords and an overview.
pub fn movie(
    id: MovieId,
    title: &str,
    director: &str,
    cast: &[&str],
    genres: &[&str],
    keywords: &[&str],
    overview: &str,
) -> Movie {
    let mut m = Movie::new(id, title);
    m.crew = vec![CrewMember {
        id: 0,
        name: director.to_string(),
        job: "Director".to_string(),
        department: Some("Directing".to_string()),
    }];
    m.cast = cast
        .iter()
        .enumerate()
        .map(|(i, name)| CastMember {
            id: 0,
            name: name.to_string(),
            character: None,
            order: i as i32,
        })
        .collect();
    m.genres = genres.iter().map(|g| tag(g)).collect();
    m.keywords = keywords.iter().map(|k| tag(k)).collect();
    m.overview = overview.to_string();
    m
}

/// Bare movies with only ids and titles.
pub fn bare(ids: &[MovieId]) -> Vec<Movie> {
    ids.iter()
        .map(|&id| Movie::new(id, format!("Movie {id}")))
        .collect()
}

/// Six movies in three loose groups: heist thrillers, space adventures and romances.
pub fn sample_movies() -> Vec<Movie> {
    vec![
        movie(
            10,
            "The Vault",
            "Ann Reyes",
            &["Tom Hale", "Mia Park"],
            &["Crime", "Thriller"],
            &["heist", "bank"],
            "A crew of thieves plans a bank heist in the city.",
        ),
        movie(
            20,
            "Night Job",
            "Ann Reyes",
            &["Tom Hale", "Leo Grant"],
            &["Crime", "Thriller"],
            &["heist", "betrayal"],
            "Thieves attempt one last heist before the police close in.",
        ),
        movie(
            30,
            "Orbit",
            "Sam Okafor",
            &["Nina Cole", "Raj Mehta"],
            &["Science Fiction", "Adventure"],
            &["space", "astronaut"],
            "An astronaut is stranded in orbit after a space station fails.",
        ),
        movie(
            40,
            "Deep Field",
            "Sam Okafor",
            &["Nina Cole", "Omar Diaz"],
            &["Science Fiction", "Adventure"],
            &["space", "alien"],
            "A space crew follows a signal from an alien world.",
        ),
        movie(
            50,
            "Late Spring",
            "Lena Fischer",
            &["Clara Moss", "Ben Ito"],
            &["Romance", "Drama"],
            &["love", "wedding"],
            "Two old friends fall in love before a wedding.",
        ),
        movie(
            60,
            "Paper Hearts",
            "Lena Fischer",
            &["Clara Moss", "Dan Hart"],
            &["Romance", "Drama"],
            &["love", "letters"],
            "Letters between strangers turn into an unlikely love story.",
        ),
    ]
}
