use thiserror::Error;

/// Terminal outcomes of a search that did not produce a result.
///
/// Per-facility routing failures never show up here; they are absorbed as a
/// missing driving distance.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Address not found: {0}")]
    AddressNotFound(String),

    #[error("No facilities match the selected filters")]
    NoMatches,

    #[error("Search failed: {0}")]
    TransportFailure(String),

    #[error("Search was superseded by a newer one")]
    Superseded,
}

impl SearchError {
    /// Message suitable for showing to the person who ran the search.
    pub fn user_message(&self) -> &'static str {
        match self {
            SearchError::InvalidQuery(_) => "Please enter your street address to search.",
            SearchError::AddressNotFound(_) => {
                "We could not locate that address. Please double-check the address and try again. \
                 Make sure to include the city and state (e.g., '123 Main St, Atlanta, GA')."
            }
            SearchError::NoMatches => {
                "No facilities match your selected filters. Please try broadening your search criteria."
            }
            SearchError::TransportFailure(_) => {
                "An error occurred while searching. Please try again in a moment."
            }
            SearchError::Superseded => "A newer search replaced this one.",
        }
    }

    /// Whether the user can fix the problem by changing the query.
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            SearchError::InvalidQuery(_) | SearchError::AddressNotFound(_) | SearchError::NoMatches
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_matches_and_transport_are_distinct() {
        assert!(SearchError::NoMatches.is_user_correctable());
        assert!(!SearchError::TransportFailure("boom".into()).is_user_correctable());
        assert_ne!(
            SearchError::NoMatches.user_message(),
            SearchError::TransportFailure("boom".into()).user_message()
        );
    }
}
