pub mod batch;
pub mod offline;
pub mod remote;

pub use batch::{BatchPlan, Pause, ThreadSleep, MAX_BATCH_SIZE};
pub use remote::RemoteGenerator;
