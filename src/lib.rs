pub mod sdk;

pub use sdk::config::FinderConfig;
pub use sdk::directory::{Category, FacilityDirectory, FacilityRecord, Rating};
pub use sdk::routing::distance::{directions_url, haversine_distance};
pub use sdk::routing::geocode::GeoPoint;
pub use sdk::routing::route::DrivingDistance;
pub use sdk::search::{
    PipelineSettings, RankedFacility, RankingPipeline, SearchError, SearchResult, SearchSession,
    SearchStage, UserQuery,
};
