// src/handlers/mod.rs

pub mod admin;
pub mod auth;
pub mod games;
pub mod news;
pub mod notifications;
pub mod reports;
pub mod users;
