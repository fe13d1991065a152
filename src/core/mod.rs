pub mod etl;
pub mod flatten;
pub mod normalize;
pub mod pipeline;
pub mod writer;

pub use crate::domain::model::{ExportSummary, ExportTable, ParticipantDocument};
pub use crate::domain::ports::{ConfigProvider, DocumentSource, Pipeline, Storage};
pub use crate::utils::error::Result;
