mod auth;
mod health;
mod projects;
mod tasks;
mod users;

pub use auth::*;
pub use health::*;
pub use projects::*;
pub use tasks::*;
pub use users::*;
