pub mod password;

pub use password::{hash_password, verify_against_dummy, verify_password, Password};
