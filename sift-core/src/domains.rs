/// Low-value domains whose results are dropped before any crawling:
/// social networks, app stores, dictionaries and marketplaces.
pub const DEFAULT_DENY_DOMAINS: &[&str] = &[
    "facebook.com",
    "instagram.com",
    "twitter.com",
    "tiktok.com",
    "pinterest.com",
    "linkedin.com",
    "threads.net",
    "apps.apple.com",
    "play.google.com",
    "microsoft.com/store",
    "dictionary.com",
    "dictionary.cambridge.org",
    "merriam-webster.com",
    "wiktionary.org",
    "amazon.com",
    "ebay.com",
    "aliexpress.com",
    "taobao.com",
    "shopee.",
];

/// Reputable news and technology sites that earn the authority bonus.
pub const DEFAULT_AUTHORITY_DOMAINS: &[&str] = &[
    "theverge.com",
    "wired.com",
    "reuters.com",
    "bloomberg.com",
    "techcrunch.com",
    "cnet.com",
    "engadget.com",
    "digitaltrends.com",
    "bbc.com",
    "arstechnica.com",
    "technologyreview.com",
];

/// Case-insensitive substring match of `url` against any of `domains`.
pub fn matches_any(url: &str, domains: &[String]) -> bool {
    let url = url.to_lowercase();
    domains
        .iter()
        .filter(|d| !d.is_empty())
        .any(|d| url.contains(&d.to_lowercase()))
}

pub fn to_owned_list(domains: &[&str]) -> Vec<String> {
    domains.iter().map(|d| d.to_string()).collect()
}
