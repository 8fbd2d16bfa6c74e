//! Shared User-Agent strings for index and content HTTP clients.
//!
//! Single source for the project URL and UA format so archive traffic stays
//! identifiable and consistent across both services.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/wayback-mirror";

/// Default User-Agent for content retrieval requests.
#[must_use]
pub(crate) fn default_retrieval_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("wayback-mirror/{version} (site-mirror; +{PROJECT_UA_URL})")
}

/// Default User-Agent for snapshot index queries.
#[must_use]
pub(crate) fn default_index_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("wayback-mirror/{version} (snapshot-index; +{PROJECT_UA_URL})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_format_consistency() {
        let retrieval_ua = default_retrieval_user_agent();
        let index_ua = default_index_user_agent();
        for ua in [&retrieval_ua, &index_ua] {
            assert!(ua.contains(PROJECT_UA_URL), "UA must contain project URL: {ua}");
            assert_eq!(
                Some(env!("CARGO_PKG_VERSION")),
                ua.strip_prefix("wayback-mirror/")
                    .and_then(|s| s.split(' ').next()),
                "UA must contain crate version: {ua}"
            );
        }
    }

    #[test]
    fn test_ua_format_keywords() {
        assert!(default_retrieval_user_agent().contains("site-mirror"));
        assert!(default_index_user_agent().contains("snapshot-index"));
    }
}
