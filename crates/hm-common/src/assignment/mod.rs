pub mod memory;
pub mod records;
pub mod service;
pub mod store;

pub use memory::MemoryStore;
pub use records::{AssignmentRecord, AssignmentStatus, TaskRecord, TaskStatus, UserRecord};
pub use service::{
    AssignError, AssignmentService, BatchAssignOutcome, CandidateMatch, TaskAssignOutcome,
};
pub use store::{AssignmentStore, StoreError};
