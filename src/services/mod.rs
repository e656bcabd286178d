// src/services/mod.rs

pub mod moderation;
pub mod notifications;
pub mod rating;
