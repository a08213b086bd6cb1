pub mod billing;
pub mod booking;
pub mod jobs;
pub mod lessons;
pub mod teachers;
