//! Flutter bridge for taskpad core.

pub mod api;
