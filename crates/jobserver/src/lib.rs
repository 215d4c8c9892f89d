//! Job lifecycle management: submission, supervision, status queries,
//! cancellation and durable result storage.

pub mod registry;
pub mod server;
pub mod storage;
pub mod supervisor;

pub use registry::{JobHandle, JobRegistry};
pub use server::JobServer;
pub use storage::{FileSystemJobStorage, InMemoryJobStorage};
pub use supervisor::{CompletionCallback, JobSupervisor};
