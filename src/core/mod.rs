pub mod attribution;
pub mod dataset;
pub mod error;
pub mod flip;
pub mod listing;
pub mod stats;
pub mod tensor;

pub use attribution::{attribute_and_split, AttributionReport, LabelAttribution, SourceSelection};
pub use dataset::{DataLoader, Dataset, ImageLabelDataset, SplitRecord};
pub use error::{DatasetError, DatasetResult};
pub use flip::{flip_horizontal, flip_vertical, Flip};
pub use listing::list_identifiers;
pub use stats::{single_batch_stats, streaming_stats, ChannelStats, RunningMoments};
pub use tensor::to_chw_tensor;
