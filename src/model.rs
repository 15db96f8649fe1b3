use serde::{Deserialize, Serialize};

/// The single account owning the watchlist. Stored under a fixed key, see
/// `database::UserDb`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub name: String,
    pub username: String,
    pub password_hash: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Movie {
    pub title: String,
    // Kept as an opaque string: the only rule on it is "exactly 4
    // characters", non-numeric years included.
    pub year: String,
}
