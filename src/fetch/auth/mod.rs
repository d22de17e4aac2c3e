//! Wrappers that attach the traffic API key to every outgoing request.

mod api_key;
mod url_param;

pub use api_key::BearerKey;
pub use url_param::QueryKey;
