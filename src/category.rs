use serde::{Deserialize, Serialize};

/// Coarse content domain a page path belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Feed,
    Messaging,
    Videos,
    Discovery,
    Profile,
    Shopping,
    Maps,
    Settings,
    Ai,
    Creation,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Feed => "feed",
            Category::Messaging => "messaging",
            Category::Videos => "videos",
            Category::Discovery => "discovery",
            Category::Profile => "profile",
            Category::Shopping => "shopping",
            Category::Maps => "maps",
            Category::Settings => "settings",
            Category::Ai => "ai",
            Category::Creation => "creation",
            Category::Other => "other",
        }
    }
}

/// Ordered prefix table; the first matching prefix wins, so more specific
/// routes must appear before shorter ones that would shadow them.
const PAGE_PREFIXES: &[(&str, Category)] = &[
    ("/home", Category::Feed),
    ("/feed", Category::Feed),
    ("/messages", Category::Messaging),
    ("/chat", Category::Messaging),
    ("/videos", Category::Videos),
    ("/watch", Category::Videos),
    ("/discover", Category::Discovery),
    ("/explore", Category::Discovery),
    ("/search", Category::Discovery),
    ("/profile", Category::Profile),
    ("/marketplace", Category::Shopping),
    ("/shop", Category::Shopping),
    ("/maps", Category::Maps),
    ("/settings", Category::Settings),
    ("/assistant", Category::Ai),
    ("/ai", Category::Ai),
    ("/create", Category::Creation),
    ("/compose", Category::Creation),
];

/// Classify a page path into its content category.
///
/// The bare root route counts as the feed; anything that matches no prefix
/// falls through to `Other`.
pub fn categorize(page: &str) -> Category {
    if page == "/" {
        return Category::Feed;
    }

    PAGE_PREFIXES
        .iter()
        .find(|(prefix, _)| page.starts_with(prefix))
        .map(|(_, category)| *category)
        .unwrap_or(Category::Other)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_prefixes() {
        assert_eq!(categorize("/home"), Category::Feed);
        assert_eq!(categorize("/messages/42"), Category::Messaging);
        assert_eq!(categorize("/videos"), Category::Videos);
        assert_eq!(categorize("/marketplace/listings/9"), Category::Shopping);
        assert_eq!(categorize("/settings/privacy"), Category::Settings);
    }

    #[test]
    fn root_route_is_feed() {
        assert_eq!(categorize("/"), Category::Feed);
    }

    #[test]
    fn unknown_routes_fall_through_to_other() {
        assert_eq!(categorize("/admin"), Category::Other);
        assert_eq!(categorize(""), Category::Other);
    }

    #[test]
    fn first_matching_prefix_wins() {
        // Matching is plain starts_with over the ordered table, with no
        // path-segment awareness.
        assert_eq!(categorize("/ai/chat"), Category::Ai);
        assert_eq!(categorize("/searching"), Category::Discovery);
    }
}
