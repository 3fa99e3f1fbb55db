pub mod auth;
pub mod home;
pub mod shared;
pub mod snippets;
