mod capture;
mod devices;
mod track;

pub use capture::{Acquired, CaptureController, RestartOutcome, RestartTicket};
pub use devices::{MediaDevices, SyntheticDevices};
pub use track::{LocalMedia, LocalMediaSummary, LocalTrack, MediaKind};
