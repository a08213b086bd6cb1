//! # LessonSync Core
//!
//! Domain layer for the LessonSync lesson scheduling service. This crate holds
//! the pure pieces of the system: calendar arithmetic for weekly recurring
//! slots, the availability/conflict checker, the domain models with their
//! closed status enumerations, and the error taxonomy shared by every other
//! crate.
//!
//! Nothing in this crate performs I/O. Time is injected through the [`clock`]
//! module and outbound mail goes through the [`email`] collaborator trait, so
//! scheduling and billing decisions stay deterministic under test.

/// Weekly occurrence expansion and per-month occurrence counting
pub mod calendar;
/// Injected wall-clock time
pub mod clock;
/// Pure booking conflict checker
pub mod conflict;
/// Outbound email collaborator trait
pub mod email;
/// Shared error taxonomy
pub mod errors;
/// Domain and request/response models
pub mod models;
