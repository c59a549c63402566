//! Authorization server adapters.

mod token_endpoint;

pub use token_endpoint::{ClientCredentials, OAuth2TokenEndpoint};
