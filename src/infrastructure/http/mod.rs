//! REST backend adapter

pub mod client;
pub mod dto;

pub use client::HttpBackend;
