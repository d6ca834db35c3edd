pub mod bulk_task_service;
pub mod failure_writer;

pub use bulk_task_service::BulkTaskService;
pub use failure_writer::FailureWriter;
