//! Request extractors for authentication.

pub mod owner_auth;

pub use owner_auth::AuthenticatedOwner;
