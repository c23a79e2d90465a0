use crate::sdk::routing::geocode::GeoPoint;
use csv::ReaderBuilder;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Failed to read directory {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse JSON directory: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse CSV directory: {0}")]
    Csv(#[from] csv::Error),

    #[error("Duplicate facility id {0}")]
    DuplicateId(u32),

    #[error("Unsupported directory format: {0}")]
    UnsupportedFormat(String),
}

/// Treatment types offered by facilities in the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Chiropractic Care")]
    ChiropracticCare,
    #[serde(rename = "Imaging Facility")]
    ImagingFacility,
    #[serde(rename = "Mental Health")]
    MentalHealth,
    #[serde(rename = "Neurology")]
    Neurology,
    #[serde(rename = "Pain Management")]
    PainManagement,
    #[serde(rename = "Physical Therapy")]
    PhysicalTherapy,
    #[serde(rename = "Virtual Pharmacy")]
    VirtualPharmacy,
    #[serde(rename = "Initial Visit Virtual MD")]
    InitialVisitVirtualMd,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::ChiropracticCare,
        Category::ImagingFacility,
        Category::MentalHealth,
        Category::Neurology,
        Category::PainManagement,
        Category::PhysicalTherapy,
        Category::VirtualPharmacy,
        Category::InitialVisitVirtualMd,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::ChiropracticCare => "Chiropractic Care",
            Category::ImagingFacility => "Imaging Facility",
            Category::MentalHealth => "Mental Health",
            Category::Neurology => "Neurology",
            Category::PainManagement => "Pain Management",
            Category::PhysicalTherapy => "Physical Therapy",
            Category::VirtualPharmacy => "Virtual Pharmacy",
            Category::InitialVisitVirtualMd => "Initial Visit Virtual MD",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    /// Accepts the display label in any case, with spaces, dashes or underscores.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_label(s);
        Category::ALL
            .into_iter()
            .find(|c| normalize_label(c.label()) == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = Category::ALL.iter().map(|c| c.label()).collect();
                format!("unknown category \"{}\" (expected one of: {})", s, known.join(", "))
            })
    }
}

fn normalize_label(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| if c == '-' || c == '_' { ' ' } else { c.to_ascii_lowercase() })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Facility rating, 1 to 3 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 3;

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Rating(value))
        } else {
            Err(format!(
                "rating must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                value
            ))
        }
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u8 = s
            .trim()
            .parse()
            .map_err(|_| format!("invalid rating \"{}\"", s))?;
        Rating::try_from(value)
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One row of the static facility directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityRecord {
    pub id: u32,
    pub name: String,
    pub category: Category,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    // Written back under the directory file's own field names
    #[serde(
        default,
        rename = "language",
        alias = "languages",
        deserialize_with = "one_or_many"
    )]
    pub languages: Vec<String>,
    #[serde(default)]
    pub rating: Option<Rating>,
    #[serde(default)]
    pub insurance: Option<String>,
    #[serde(default, rename = "markedGreen", alias = "preferred")]
    pub preferred: bool,
    #[serde(default)]
    pub hours: Option<String>,
    #[serde(default)]
    pub services: Option<String>,
}

impl FacilityRecord {
    /// The facility's position, if both coordinates are present and finite.
    pub fn coordinates(&self) -> Option<GeoPoint> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => {
                Some(GeoPoint::new(lat, lng))
            }
            _ => None,
        }
    }

    pub fn speaks(&self, language: &str) -> bool {
        self.languages.iter().any(|l| l == language)
    }

    /// Address-text heuristic for telehealth-only facilities.
    ///
    /// Misfires on street names containing "tele" or "virtual"; search
    /// eligibility is decided by [`FacilityRecord::coordinates`] instead.
    pub fn is_virtual(&self) -> bool {
        match self.address.as_deref() {
            None => true,
            Some(address) => {
                let lower = address.to_lowercase();
                lower.contains("virtual") || lower.contains("tele") || address.trim().len() < 10
            }
        }
    }
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    let raw: Option<OneOrMany> = Option::deserialize(deserializer)?;
    let languages = match raw {
        None => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
    };
    Ok(languages
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect())
}

// Flat CSV layout; languages are `;`-separated.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CsvRow {
    id: u32,
    name: String,
    category: Category,
    address: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    #[serde(alias = "languages")]
    language: Option<String>,
    rating: Option<Rating>,
    insurance: Option<String>,
    #[serde(default, alias = "markedGreen")]
    preferred: Option<bool>,
    hours: Option<String>,
    services: Option<String>,
}

impl From<CsvRow> for FacilityRecord {
    fn from(row: CsvRow) -> Self {
        let languages = row
            .language
            .unwrap_or_default()
            .split(';')
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        FacilityRecord {
            id: row.id,
            name: row.name,
            category: row.category,
            address: row.address.filter(|a| !a.trim().is_empty()),
            lat: row.lat,
            lng: row.lng,
            languages,
            rating: row.rating,
            insurance: row.insurance.filter(|s| !s.trim().is_empty()),
            preferred: row.preferred.unwrap_or(false),
            hours: row.hours.filter(|s| !s.trim().is_empty()),
            services: row.services.filter(|s| !s.trim().is_empty()),
        }
    }
}

/// The read-only facility table, loaded once and shared across searches.
#[derive(Debug, Clone)]
pub struct FacilityDirectory {
    records: Arc<[FacilityRecord]>,
}

impl FacilityDirectory {
    pub fn from_records(records: Vec<FacilityRecord>) -> Result<Self, DirectoryError> {
        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if !seen.insert(record.id) {
                return Err(DirectoryError::DuplicateId(record.id));
            }
        }
        Ok(Self {
            records: records.into(),
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, DirectoryError> {
        let records: Vec<FacilityRecord> = serde_json::from_str(json)?;
        Self::from_records(records)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, DirectoryError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| DirectoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&data)
    }

    pub fn from_csv_file<P: AsRef<Path>>(path: P) -> Result<Self, DirectoryError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DirectoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut rdr = ReaderBuilder::new().delimiter(b',').trim(csv::Trim::All).from_reader(file);

        let mut records = Vec::new();
        for row in rdr.deserialize::<CsvRow>() {
            records.push(FacilityRecord::from(row?));
        }
        Self::from_records(records)
    }

    /// Loads JSON or CSV depending on the file extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DirectoryError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Self::from_json_file(path),
            "csv" => Self::from_csv_file(path),
            other => Err(DirectoryError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn records(&self) -> &[FacilityRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &FacilityRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&FacilityRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Number of records usable for distance search.
    pub fn with_coordinates(&self) -> usize {
        self.records.iter().filter(|r| r.coordinates().is_some()).count()
    }

    /// Distinct declared languages, sorted.
    pub fn languages(&self) -> Vec<String> {
        self.records
            .iter()
            .flat_map(|r| r.languages.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"[
        {"id": 1, "name": "Peachtree Chiro", "category": "Chiropractic Care",
         "address": "100 Peachtree St NW, Atlanta, GA 30303", "lat": 33.757, "lng": -84.388,
         "language": "Russian", "rating": 2, "markedGreen": true},
        {"id": 2, "name": "Tele Neuro", "category": "Neurology",
         "address": "Virtual", "lat": null, "lng": null,
         "language": ["English", "Spanish"]},
        {"id": 3, "name": "Midtown Imaging", "category": "Imaging Facility",
         "address": "55 10th St, Atlanta, GA", "lat": 33.781, "lng": -84.386}
    ]"#;

    #[test]
    fn test_parse_json_directory() {
        let dir = FacilityDirectory::from_json_str(SAMPLE).expect("valid sample");
        assert_eq!(dir.len(), 3);
        assert_eq!(dir.with_coordinates(), 2);

        let first = dir.get(1).expect("record 1");
        assert_eq!(first.languages, vec!["Russian".to_string()]);
        assert!(first.preferred);
        assert_eq!(first.rating.map(Rating::value), Some(2));

        let second = dir.get(2).expect("record 2");
        assert_eq!(second.languages.len(), 2);
        assert!(second.coordinates().is_none());
        assert!(second.is_virtual());

        assert!(dir.get(3).expect("record 3").languages.is_empty());
    }

    #[test]
    fn test_languages_are_sorted_and_distinct() {
        let dir = FacilityDirectory::from_json_str(SAMPLE).expect("valid sample");
        assert_eq!(dir.languages(), vec!["English", "Russian", "Spanish"]);
    }

    #[test]
    fn test_rating_out_of_range_is_rejected() {
        let json = r#"[{"id": 1, "name": "x", "category": "Neurology", "rating": 5}]"#;
        assert!(matches!(
            FacilityDirectory::from_json_str(json),
            Err(DirectoryError::Json(_))
        ));
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let json = r#"[
            {"id": 7, "name": "a", "category": "Neurology"},
            {"id": 7, "name": "b", "category": "Neurology"}
        ]"#;
        assert!(matches!(
            FacilityDirectory::from_json_str(json),
            Err(DirectoryError::DuplicateId(7))
        ));
    }

    #[test]
    fn test_category_from_str_is_lenient() {
        assert_eq!("neurology".parse::<Category>(), Ok(Category::Neurology));
        assert_eq!("pain-management".parse::<Category>(), Ok(Category::PainManagement));
        assert_eq!(
            "Initial Visit Virtual MD".parse::<Category>(),
            Ok(Category::InitialVisitVirtualMd)
        );
        assert!("Dentistry".parse::<Category>().is_err());
    }

    #[test]
    fn test_partial_coordinates_are_unusable() {
        let record = FacilityRecord {
            id: 1,
            name: "half".into(),
            category: Category::Neurology,
            address: Some("1 Real Street, Decatur, GA".into()),
            lat: Some(33.7),
            lng: None,
            languages: vec![],
            rating: None,
            insurance: None,
            preferred: false,
            hours: None,
            services: None,
        };
        assert!(record.coordinates().is_none());
        assert!(!record.is_virtual());
    }

    #[test]
    fn test_load_csv_directory() {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .expect("temp file");
        writeln!(
            file,
            "id,name,category,address,lat,lng,language,rating,insurance,preferred,hours,services"
        )
        .expect("write header");
        writeln!(
            file,
            "1,Decatur PT,Physical Therapy,\"200 Church St, Decatur, GA\",33.774,-84.296,Russian;English,3,Lien,true,Mon-Fri 9-5,"
        )
        .expect("write row");
        writeln!(file, "2,Online Rx,Virtual Pharmacy,,,,,,,,,").expect("write row");

        let dir = FacilityDirectory::from_path(file.path()).expect("csv loads");
        assert_eq!(dir.len(), 2);

        let pt = dir.get(1).expect("record 1");
        assert_eq!(pt.languages, vec!["Russian", "English"]);
        assert_eq!(pt.insurance.as_deref(), Some("Lien"));
        assert!(pt.preferred);
        assert!(pt.services.is_none());

        let rx = dir.get(2).expect("record 2");
        assert!(rx.address.is_none());
        assert!(rx.coordinates().is_none());
        assert!(rx.rating.is_none());
    }

    #[test]
    fn test_unknown_extension() {
        assert!(matches!(
            FacilityDirectory::from_path("facilities.xlsx"),
            Err(DirectoryError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_records_keep_directory_field_names_when_written() {
        let dir = FacilityDirectory::from_json_str(SAMPLE).expect("valid sample");
        let first = dir.get(1).expect("record 1");

        let value = serde_json::to_value(first).expect("serializes");
        assert_eq!(value["language"], serde_json::json!(["Russian"]));
        assert_eq!(value["markedGreen"], serde_json::json!(true));
        assert!(value.get("languages").is_none());
        assert!(value.get("preferred").is_none());

        let reread: FacilityRecord = serde_json::from_value(value).expect("reads back");
        assert_eq!(&reread, first);
    }

    #[test]
    fn test_long_field_names_are_accepted() {
        let json = r#"[{"id": 1, "name": "x", "category": "Neurology",
                        "languages": ["English"], "preferred": true}]"#;
        let dir = FacilityDirectory::from_json_str(json).expect("valid");
        let record = dir.get(1).expect("record 1");
        assert_eq!(record.languages, vec!["English".to_string()]);
        assert!(record.preferred);
    }
}
