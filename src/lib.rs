pub mod builder;
pub mod config;
pub mod fetch;
pub mod geojson;
pub mod output;
pub mod pipeline;
pub mod source;
pub mod traffic;
