//! Analytics over a loaded model: channel names, contributions, summaries and
//! response curves.

pub mod channels;
pub mod contribution;
pub mod curves;
pub mod saturation;

pub use channels::{DEFAULT_CHANNEL_NAMES, extract_channel_names, validate_channel_names};
pub use contribution::{ContributionTable, channel_summary, contribution_data};
pub use curves::{generate_curve, generate_curves};
pub use saturation::find_saturation_point;
