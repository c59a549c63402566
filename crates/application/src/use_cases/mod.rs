//! Application use cases (resource API orchestration).

mod managed_users;

pub use managed_users::ManagedUsers;
