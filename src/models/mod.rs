// src/models/mod.rs

pub mod community;
pub mod game;
pub mod news;
pub mod notification;
pub mod report;
pub mod review;
pub mod user;
