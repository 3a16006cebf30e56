//! Built-in demo catalog.
//!
//! A small fixed set of streams with popularity/recency signals and
//! co-occurrence data, plus a few users with viewing histories. Lets the
//! CLI exercise the full pipeline without any external collaborators.

use sources::{Candidate, InMemoryCandidateSource, InMemorySignalFetcher, SignalSet};

/// Demo users and their recent histories, most-recent-first.
pub const DEMO_USERS: &[(&str, &[&str])] = &[
    ("alice", &["lofi-beats", "jazz-cafe"]),
    ("bob", &["retro-gaming", "speedrun-central"]),
    ("carol", &["city-pop-radio"]),
    ("dave", &[]),
];

/// (stream_id, popularity, recency, co-occurring streams)
const CATALOG: &[(&str, f64, f64, &[&str])] = &[
    ("lofi-beats", 0.95, 0.40, &["jazz-cafe", "ambient-focus"]),
    ("jazz-cafe", 0.80, 0.30, &["lofi-beats", "city-pop-radio"]),
    ("city-pop-radio", 0.70, 0.85, &["jazz-cafe", "synthwave-drive"]),
    ("synthwave-drive", 0.60, 0.90, &["city-pop-radio", "retro-gaming"]),
    ("ambient-focus", 0.55, 0.20, &["lofi-beats"]),
    ("retro-gaming", 0.85, 0.60, &["speedrun-central", "synthwave-drive"]),
    ("speedrun-central", 0.50, 0.75, &["retro-gaming"]),
    ("morning-news", 0.65, 0.95, &[]),
    ("cooking-live", 0.45, 0.50, &["morning-news"]),
    ("late-night-talk", 0.40, 0.10, &["jazz-cafe"]),
];

/// Candidate source serving the whole catalog to every user.
///
/// The pool deliberately includes streams the user has already watched so
/// the history filter has real work to do.
pub fn candidate_source() -> InMemoryCandidateSource {
    let pool: Vec<Candidate> = CATALOG
        .iter()
        .map(|(stream_id, _, _, _)| Candidate::new(*stream_id))
        .collect();
    InMemoryCandidateSource::new().with_fallback(pool)
}

/// Signal fetcher with full signal coverage of the catalog.
pub fn signal_fetcher() -> InMemorySignalFetcher {
    CATALOG.iter().fold(
        InMemorySignalFetcher::new(),
        |fetcher, (stream_id, popularity, recency, co_occurring)| {
            fetcher.with_signals(
                *stream_id,
                SignalSet {
                    popularity: *popularity,
                    recency: *recency,
                    co_occurring: co_occurring.iter().map(|s| s.to_string()).collect(),
                },
            )
        },
    )
}

/// Recent history for a demo user, empty for unknown users.
pub fn recent_history(user_id: &str) -> Vec<String> {
    DEMO_USERS
        .iter()
        .find(|(id, _)| *id == user_id)
        .map(|(_, recent)| recent.iter().map(|s| s.to_string()).collect())
        .unwrap_or_default()
}
