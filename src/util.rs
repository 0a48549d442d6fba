//! Shared utility modules used across Falchion components.

pub mod arena;
pub mod varint;
