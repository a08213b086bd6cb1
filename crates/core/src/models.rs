pub mod availability;
pub mod billing;
pub mod lesson;
pub mod slot;
