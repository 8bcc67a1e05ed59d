pub mod achievements;
pub mod auth;
pub mod events;
pub mod grades;
pub mod health;
pub mod milestones;
pub mod projects;
pub mod reports;
pub mod settings;
pub mod topics;
pub mod users;
