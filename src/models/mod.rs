pub mod achievement;
pub mod event;
pub mod grade;
pub mod milestone;
pub mod project;
pub mod report;
pub mod settings;
pub mod topic;
pub mod user;
