pub mod client;
pub mod errors;
pub mod identity;

pub use client::MediaClient;
pub use errors::NetworkError;
pub use identity::IdentityProfile;
