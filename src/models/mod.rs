pub mod pickup;
pub mod session;
pub mod user;
