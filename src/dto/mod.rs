//! Data transfer objects exposed over HTTP.

pub mod board;
pub mod form;
pub mod health;
pub mod picker;
pub mod roster;
pub mod tables;
pub mod validation;
