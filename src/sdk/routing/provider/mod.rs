pub mod nominatim;
pub mod osrm;
pub mod types;

pub use nominatim::NominatimGeocoder;
pub use osrm::OsrmRouter;
