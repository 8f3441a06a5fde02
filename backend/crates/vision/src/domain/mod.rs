pub mod normalize;
pub mod prompt;
pub mod repository;
