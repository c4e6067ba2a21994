pub mod admin;
pub mod health;
pub mod news;
pub mod pages;
