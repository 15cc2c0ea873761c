//! Domain layer - core feed logic

pub mod feed;
