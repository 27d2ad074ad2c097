//! 关键词族识别与 Marker 匹配

use std::sync::OnceLock;

use regex::Regex;

use crate::protocol::Marker;

/// 关键词族，按优先级排列
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Family {
    Navigate,
    Click,
    Scroll,
    Highlight,
    Fill,
}

impl Family {
    pub const ORDERED: [Family; 5] = [
        Family::Navigate,
        Family::Click,
        Family::Scroll,
        Family::Highlight,
        Family::Fill,
    ];

    /// 每族的触发短语；同族内长短语在前，避免 "scroll" 抢先于 "scroll to"
    pub fn phrases(self) -> &'static [&'static str] {
        match self {
            Family::Navigate => &["navigate to", "take me to", "go to", "open"],
            Family::Click => &["click", "press"],
            Family::Scroll => &["scroll to", "show me", "scroll"],
            Family::Highlight => &["highlight", "show"],
            Family::Fill => &["fill", "enter", "type", "put"],
        }
    }

    fn pattern(self) -> Option<&'static Regex> {
        static CELLS: [OnceLock<Option<Regex>>; 5] = [
            OnceLock::new(),
            OnceLock::new(),
            OnceLock::new(),
            OnceLock::new(),
            OnceLock::new(),
        ];
        let idx = self as usize;
        CELLS[idx]
            .get_or_init(|| {
                let alternatives = self
                    .phrases()
                    .iter()
                    .map(|p| regex::escape(p))
                    .collect::<Vec<_>>()
                    .join("|");
                Regex::new(&format!(r"\b(?:{alternatives})\b")).ok()
            })
            .as_ref()
    }
}

/// 命中的关键词族与其后的检索文本（已清理）
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FamilyMatch {
    pub family: Family,
    /// 触发短语在归一化文本中的结束位置
    pub phrase_end: usize,
    pub search: String,
}

/// 小写、去首尾空白、压缩连续空白
pub fn normalize(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// 按族顺序查找第一个命中的族
pub fn detect_family(normalized: &str) -> Option<FamilyMatch> {
    Family::ORDERED.iter().find_map(|&family| {
        let m = family.pattern()?.find(normalized)?;
        Some(FamilyMatch {
            family,
            phrase_end: m.end(),
            search: clean_search(&normalized[m.end()..]),
        })
    })
}

const RETRY_PHRASES: [&str; 3] = ["retry", "try again", "fix"];

/// 输入是否以独立词的形式要求重试
pub fn is_retry_request(normalized: &str) -> bool {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            let alternatives = RETRY_PHRASES
                .iter()
                .map(|p| regex::escape(p))
                .collect::<Vec<_>>()
                .join("|");
            Regex::new(&format!(r"\b(?:{alternatives})\b")).ok()
        })
        .as_ref()
        .is_some_and(|re| re.is_match(normalized))
}

const LEADING_FILLERS: [&str; 4] = ["on", "the", "a", "my"];
const TRAILING_NOUNS: [&str; 6] = ["button", "link", "field", "page", "tab", "section"];

/// 去掉标点、前导虚词与末尾的控件名词
pub fn clean_search(residual: &str) -> String {
    let stripped: String = residual
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '/' | '-' | '_' | '@' | '.') {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .to_lowercase();
    let mut words: Vec<&str> = stripped
        .split_whitespace()
        .map(|w| w.trim_matches('.'))
        .filter(|w| !w.is_empty())
        .collect();

    while words
        .first()
        .is_some_and(|w| LEADING_FILLERS.contains(w))
    {
        words.remove(0);
    }
    while words.len() > 1 && words.last().is_some_and(|w| TRAILING_NOUNS.contains(w)) {
        words.pop();
    }
    words.join(" ")
}

/// 按文档顺序返回第一个与检索文本互相包含的 Marker
pub fn find_marker<'a>(markers: &'a [Marker], search: &str) -> Option<&'a Marker> {
    let search = search.trim().to_lowercase();
    if search.is_empty() {
        return None;
    }
    markers.iter().find(|marker| {
        let label = marker.label.to_lowercase();
        let haystack = format!("{} {}", label, marker.intent.to_lowercase());
        haystack.contains(&search)
            || search.contains(haystack.trim())
            || (!label.trim().is_empty() && search.contains(label.trim()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers() -> Vec<Marker> {
        vec![
            Marker::new("nav_billing", "Billing", "open billing settings", "link"),
            Marker::new("connect_stripe", "Connect Stripe", "connect payment provider", "button"),
            Marker::new("email", "Email", "account email address", "input"),
        ]
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Go   TO Billing \n"), "go to billing");
    }

    #[test]
    fn test_family_order() {
        let m = detect_family("go to billing").unwrap();
        assert_eq!(m.family, Family::Navigate);
        assert_eq!(m.search, "billing");

        // "show me" 属于滚动族，先于高亮族的 "show"
        let m = detect_family("show me the faq section").unwrap();
        assert_eq!(m.family, Family::Scroll);
        assert_eq!(m.search, "faq");

        let m = detect_family("show the plan").unwrap();
        assert_eq!(m.family, Family::Highlight);
        assert_eq!(m.search, "plan");

        assert!(detect_family("hello there").is_none());
    }

    #[test]
    fn test_word_boundaries() {
        // "reopen" 不应触发 "open"，"typeface" 不应触发 "type"
        assert!(detect_family("reopen typeface").is_none());
        assert!(is_retry_request("please retry"));
        assert!(!is_retry_request("retrying"));
        assert!(is_retry_request("can you try again?"));
        assert!(is_retry_request("fix it"));
        assert!(!is_retry_request("prefix"));
    }

    #[test]
    fn test_clean_search_strips_fillers() {
        assert_eq!(clean_search(" on the Connect Stripe button!"), "connect stripe");
        assert_eq!(clean_search("my billing page?"), "billing");
        assert_eq!(clean_search("/settings"), "/settings");
        assert_eq!(clean_search("the tab"), "tab");
    }

    #[test]
    fn test_find_marker_containment() {
        let markers = markers();
        assert_eq!(find_marker(&markers, "stripe").unwrap().id, "connect_stripe");
        assert_eq!(find_marker(&markers, "billing").unwrap().id, "nav_billing");
        // 检索文本包含标签
        assert_eq!(find_marker(&markers, "email please").unwrap().id, "email");
        assert!(find_marker(&markers, "").is_none());
        assert!(find_marker(&markers, "dashboard").is_none());
    }
}
