pub mod job;

pub use job::{HEALTH_CHECK, HEALTH_REPLY, Job, JobClass, JobRequest};
