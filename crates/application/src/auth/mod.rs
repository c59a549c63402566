//! Token lifecycle: storage, session boundary, refresh and the
//! authenticated request path.

mod refresh;
mod session;
mod token_store;
mod transport;

pub use refresh::{PendingRequest, RefreshCoordinator, RefreshState};
pub use session::{LogoutReason, SessionBoundary, SessionEvent, SessionState};
pub use token_store::TokenStore;
pub use transport::AuthenticatedTransport;
