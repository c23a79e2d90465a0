use std::fmt;

/// Where a search currently is. Reported to the progress callback on every
/// transition; purely informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStage {
    Idle,
    Geocoding,
    Filtering,
    PreRanking,
    EnrichingDriving { completed: usize, total: usize },
    FinalRanking,
    Done,
    Failed,
}

impl SearchStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, SearchStage::Done | SearchStage::Failed)
    }
}

impl fmt::Display for SearchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchStage::Idle => write!(f, "Waiting…"),
            SearchStage::Geocoding => write!(f, "Locating address…"),
            SearchStage::Filtering => write!(f, "Finding facilities…"),
            SearchStage::PreRanking => write!(f, "Measuring distances…"),
            SearchStage::EnrichingDriving { completed, total } => {
                let current = (*completed + 1).min(*total);
                write!(f, "Calculating route {} of {}…", current, total)
            }
            SearchStage::FinalRanking => write!(f, "Ranking results…"),
            SearchStage::Done => write!(f, "Done"),
            SearchStage::Failed => write!(f, "Search failed"),
        }
    }
}

/// Callback receiving each stage transition.
pub type ProgressFn<'a> = &'a (dyn Fn(SearchStage) + Send + Sync);

/// A progress callback that ignores everything.
pub fn no_progress(_: SearchStage) {}
