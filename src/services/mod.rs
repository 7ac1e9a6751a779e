pub mod export;
pub mod parser;
pub mod query;
pub mod sessions;
