//! Transport adapters.

mod reqwest_client;

pub use reqwest_client::{DEFAULT_REQUEST_TIMEOUT, ReqwestHttpClient};
