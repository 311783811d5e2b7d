//! Database operations for the ReviewIntel service

pub mod analysis;
pub mod datasets;
pub mod reviews;
