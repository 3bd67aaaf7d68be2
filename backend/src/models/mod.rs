pub mod customer;
pub mod macros;
pub mod password;

pub use customer::*;
pub use password::{digest_password, verify_password};
