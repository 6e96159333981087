mod assignment;
mod category;
mod comment;
mod project;
mod task;
mod user;

pub use assignment::*;
pub use category::*;
pub use comment::*;
pub use project::*;
pub use task::*;
pub use user::*;
