pub mod categories;
pub mod repository;
pub mod service;
