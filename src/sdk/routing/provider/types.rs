use serde::Deserialize;

// --- Data structures for parsing Nominatim and OSRM responses ---

#[derive(Deserialize, Debug)]
pub struct SearchPlace {
    // Nominatim encodes coordinates as strings
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct RouteResponse {
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub routes: Vec<Route>,
}

#[derive(Deserialize, Debug, Clone, Copy)]
pub struct Route {
    pub distance: f64,
    pub duration: f64,
}
