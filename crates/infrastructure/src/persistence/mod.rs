//! Session persistence adapters.

mod memory;
mod session_repository;

pub use memory::InMemorySessionStorage;
pub use session_repository::FileSessionRepository;
