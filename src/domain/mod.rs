pub mod article;
pub mod interaction;
