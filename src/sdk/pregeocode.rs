//! Offline pass that fills in facility coordinates so searches never have to
//! geocode facilities.

use crate::sdk::directory::FacilityRecord;
use crate::sdk::routing::service::Geocoder;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

lazy_static! {
    // Suite/unit fragments confuse geocoders
    static ref UNIT_FRAGMENT: Regex = Regex::new(
        r"(?i),?\s*(?:\b(?:Suite|Unit|Building)\b|\b(?:Ste|Bldg)\b\.?|#)\s*[^\s,]+"
    )
    .expect("valid unit regex");
    static ref DOUBLE_COMMA: Regex = Regex::new(r",\s*,").expect("valid comma regex");
    static ref MULTI_SPACE: Regex = Regex::new(r"\s{2,}").expect("valid space regex");
    static ref TRAILING_ZIP: Regex = Regex::new(r"(\d{5})(-\d{4})?$").expect("valid zip regex");
}

const PROGRESS_EVERY: usize = 25;

/// How often the CLI saves a partially geocoded directory.
pub const CHECKPOINT_EVERY: usize = 100;

/// The state appended to addresses that don't name one.
#[derive(Debug, Clone)]
pub struct StateHint {
    code: String,
    name: Option<String>,
    code_pattern: Regex,
    name_pattern: Option<Regex>,
}

impl StateHint {
    pub fn new(code: &str, name: Option<&str>) -> Result<Self, regex::Error> {
        let word = |s: &str| Regex::new(&format!(r"(?i)\b{}\b", regex::escape(s)));
        Ok(Self {
            code: code.to_string(),
            name: name.map(str::to_string),
            code_pattern: word(code)?,
            name_pattern: name.map(word).transpose()?,
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn is_named_in(&self, address: &str) -> bool {
        self.code_pattern.is_match(address)
            || self
                .name_pattern
                .as_ref()
                .is_some_and(|p| p.is_match(address))
    }
}

impl Default for StateHint {
    fn default() -> Self {
        Self::new("GA", Some("Georgia")).expect("valid default state pattern")
    }
}

/// Normalises a directory address for geocoding.
pub fn clean_address(address: &str, state: &StateHint) -> String {
    let s = address
        .trim()
        .replace('\u{a0}', " ")
        .replace(['\n', '\r'], " ");
    let s = UNIT_FRAGMENT.replace_all(&s, "");
    let s = DOUBLE_COMMA.replace_all(&s, ",");
    let s = MULTI_SPACE.replace_all(&s, " ");
    let s = s.trim().trim_end_matches(',').trim().to_string();

    if s.is_empty() || state.is_named_in(&s) {
        return s;
    }

    match TRAILING_ZIP.find(&s) {
        Some(zip) => {
            let before = s[..zip.start()].trim_end_matches([',', ' ']);
            format!("{}, {} {}", before, state.code(), zip.as_str())
        }
        None => format!("{}, {}", s, state.code()),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PregeocodeReport {
    pub geocoded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub failed_addresses: Vec<String>,
}

fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

/// Geocodes every non-virtual record, replacing any existing coordinates.
///
/// Virtual records and failed lookups end up without coordinates, which keeps
/// them out of distance search.
pub async fn geocode_directory<G: Geocoder>(
    records: &mut [FacilityRecord],
    geocoder: &G,
    state: &StateHint,
) -> PregeocodeReport {
    let outcome = geocode_directory_with_checkpoints(records, geocoder, state, 0, |_| {
        Ok::<(), std::convert::Infallible>(())
    })
    .await;
    match outcome {
        Ok(report) => report,
        Err(never) => match never {},
    }
}

/// Same as [`geocode_directory`], but hands the partially updated records to
/// `checkpoint` after every `every` records (0 disables it) so a long batch
/// can be saved as it goes. The final state is left to the caller.
pub async fn geocode_directory_with_checkpoints<G, F, E>(
    records: &mut [FacilityRecord],
    geocoder: &G,
    state: &StateHint,
    every: usize,
    mut checkpoint: F,
) -> Result<PregeocodeReport, E>
where
    G: Geocoder,
    F: FnMut(&[FacilityRecord]) -> Result<(), E>,
{
    let total = records.len();
    let mut report = PregeocodeReport::default();

    for i in 0..total {
        geocode_record(&mut records[i], geocoder, state, &mut report).await;

        let done = i + 1;
        if done % PROGRESS_EVERY == 0 || done == total {
            log::info!(
                "[{}/{}] geocoded={} skipped={} failed={}",
                done,
                total,
                report.geocoded,
                report.skipped,
                report.failed
            );
        }
        if every > 0 && done % every == 0 && done < total {
            checkpoint(records)?;
            log::info!("Checkpoint saved after {} records", done);
        }
    }

    Ok(report)
}

async fn geocode_record<G: Geocoder>(
    facility: &mut FacilityRecord,
    geocoder: &G,
    state: &StateHint,
    report: &mut PregeocodeReport,
) {
    facility.lat = None;
    facility.lng = None;

    if facility.is_virtual() {
        report.skipped += 1;
        return;
    }

    let address = facility.address.clone().unwrap_or_default();
    let query = clean_address(&address, state);
    match geocoder.geocode(&query).await {
        Some(point) => {
            facility.lat = Some(round6(point.lat));
            facility.lng = Some(round6(point.lng));
            report.geocoded += 1;
        }
        None => {
            log::warn!("FAILED: {} (searched as \"{}\")", address, query);
            report.failed += 1;
            report.failed_addresses.push(address);
        }
    }
}
