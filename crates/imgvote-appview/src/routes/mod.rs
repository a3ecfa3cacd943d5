pub mod admin;
pub mod health;
pub mod images;
pub mod likes;
pub mod sheets;
pub mod upload;
