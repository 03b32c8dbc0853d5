pub mod credentials;

pub use credentials::Argon2Credentials;
