pub mod error;
pub mod pipeline;
pub mod progress;
pub mod query;
pub mod session;

pub use error::SearchError;
pub use pipeline::{PipelineSettings, RankingPipeline};
pub use progress::{ProgressFn, SearchStage};
pub use query::{RankedFacility, SearchResult, UserQuery};
pub use session::SearchSession;
