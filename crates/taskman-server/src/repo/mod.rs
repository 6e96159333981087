mod projects;
mod tasks;

pub use projects::ProjectRepo;
pub use tasks::TaskRepo;
