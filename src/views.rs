pub mod results;
pub mod selection;
pub mod upload;

pub use results::{ResultRow, ResultsView, ScoreBand};
pub use selection::FileSelection;
pub use upload::UploadForm;
