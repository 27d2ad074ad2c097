//! 路由关键词表：导航意图没有匹配到 Marker 时的兜底

const ROUTE_KEYWORDS: [(&str, &str); 8] = [
    ("home", "/"),
    ("dashboard", "/dashboard"),
    ("billing", "/billing"),
    ("settings", "/settings"),
    ("profile", "/profile"),
    ("account", "/account"),
    ("integrations", "/integrations"),
    ("help", "/help"),
];

/// 以 "/" 开头的检索文本直接作为路由，否则按关键词表查找（表中靠前者优先）
pub fn resolve_route(search: &str) -> Option<String> {
    let search = search.trim();
    if search.starts_with('/') {
        return search.split_whitespace().next().map(str::to_string);
    }
    let words: Vec<&str> = search.split_whitespace().collect();
    ROUTE_KEYWORDS
        .iter()
        .find(|(keyword, _)| words.contains(keyword))
        .map(|(_, route)| route.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_route() {
        assert_eq!(resolve_route("billing").as_deref(), Some("/billing"));
        assert_eq!(resolve_route("home").as_deref(), Some("/"));
        assert_eq!(resolve_route("/reports/weekly").as_deref(), Some("/reports/weekly"));
        assert_eq!(resolve_route("account settings").as_deref(), Some("/settings"));
        assert_eq!(resolve_route("nowhere"), None);
        assert_eq!(resolve_route(""), None);
    }
}
