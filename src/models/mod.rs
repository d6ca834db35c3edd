pub mod item;
pub mod job;
pub mod loaders;
pub mod outcome;
pub mod policy;

pub use item::{ItemIdentity, OperationItem, TaskRef};
pub use job::{BulkJob, BulkVerb};
pub use loaders::{load_all_job_files, load_job_file};
pub use outcome::{BatchReport, OperationOutcome, OutcomeResult};
pub use policy::{BatchOptions, BatchPolicy, PolicyInput};
