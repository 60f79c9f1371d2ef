pub mod env;
pub mod fixed;
pub mod hashing;
pub mod logging;
pub mod net;
pub mod types;
