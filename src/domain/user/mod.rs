//! User domain

pub mod entity;

pub use entity::Actor;
