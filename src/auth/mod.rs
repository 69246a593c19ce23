pub mod audit;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod service;

pub use repo_types::{NewUser, Role, User};
pub use service::{AuthService, SessionContext};
