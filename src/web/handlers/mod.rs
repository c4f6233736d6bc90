pub mod health;
pub mod sessions;
pub mod status;
pub mod stream;
