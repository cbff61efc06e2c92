pub mod answer;
pub mod bot;
pub mod health;
pub mod sessions;
