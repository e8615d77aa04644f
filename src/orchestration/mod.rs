pub mod admission;
pub mod helper;
pub mod snapshot_job;

pub use admission::{Admission, AdmissionError, GuildAdmission};
pub use helper::PortfolioHelper;
pub use snapshot_job::{SnapshotJob, SnapshotJobError, SnapshotRunSummary};
