pub mod health;
pub mod profile;
pub mod token;
pub mod users;
