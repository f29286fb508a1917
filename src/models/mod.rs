//! Domain model module declarations.

pub mod schedule;
pub mod session;
pub mod track;
