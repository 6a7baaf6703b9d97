pub mod presence;

pub use presence::InMemoryPresenceRepository;
