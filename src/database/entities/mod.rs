pub mod matches;
pub mod matches_played;
pub mod profiles;
pub mod settings;
pub mod streaks;
pub mod users;
