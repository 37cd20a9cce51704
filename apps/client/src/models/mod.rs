pub mod application;
pub mod company;
pub mod job;
pub mod notification;
pub mod user;

pub use application::{Application, ApplicationStatus};
pub use company::Company;
pub use job::Job;
pub use notification::Notification;
pub use user::{Identity, UserProfile};
