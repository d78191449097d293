mod errors;
mod gps_time;
mod logical_file;
mod process;
mod segment_definer;
mod state_segment;
mod unique_id;

pub use errors::StateDbError;
pub use gps_time::{gps_seconds_from_unix, gps_seconds_from_utc, FixedGpsClock, GpsClock, SystemGpsClock, GPS_EPOCH_UNIX};
pub use logical_file::{FrameFileName, LogicalFile};
pub use process::{ProcessInfo, ProcessRecord};
pub use segment_definer::{DefinerKey, SegmentDefiner, AUTO_DEFINER_COMMENT};
pub use state_segment::{SegmentInterval, StateSegment};
pub use unique_id::UniqueId;
