pub mod aggregate;
pub mod artwork;
pub mod config;
pub mod fetch;
pub mod ingest;
pub mod language;
pub mod name;
pub mod parser;
pub mod schema;
pub mod series;
pub mod store;
pub mod table;
