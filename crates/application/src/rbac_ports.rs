mod identity;
mod repository;

pub use identity::IdentityProvider;
pub use repository::RbacRepository;
