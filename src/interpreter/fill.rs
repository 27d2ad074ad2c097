//! 填写意图：从原始大小写文本中拆出「目标 Marker」与「值」
//!
//! 三个模式依次尝试，每个模式产生一个候选；第一个 Marker 部分能匹配上 Marker 的候选胜出。
//! 值部分本身读起来像控件引用（如 "the email field"）的候选让位于后面的候选。

use std::sync::OnceLock;

use regex::Regex;

use super::matcher::{clean_search, find_marker};
use crate::protocol::Marker;

const VERBS: &str = r"(?:fill|enter|type|put)";

/// 拆分结果
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FillTarget<'a> {
    pub marker: &'a Marker,
    pub value: String,
}

fn patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            // 先目标后值：fill [in|out] [the] <marker> with|in|into <value>
            format!(
                r"(?i)\b{VERBS}\s+(?:(?:in|out)\s+)?(?:the\s+)?(?P<marker>.+?)\s+(?:with|in|into)\s+(?P<value>.+?)\s*$"
            ),
            // 先值后目标：enter <value> in|into [the] <marker>
            format!(r"(?i)\b{VERBS}\s+(?P<value>.+?)\s+(?:in|into)\s+(?:the\s+)?(?P<marker>.+?)\s*$"),
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

/// 兜底模式：作用于动词之后的剩余文本
fn bare_pattern() -> Option<&'static Regex> {
    static BARE: OnceLock<Option<Regex>> = OnceLock::new();
    BARE.get_or_init(|| Regex::new(r"(?i)^\s*(?P<value>.+?)\s+in\s+(?:the\s+)?(?P<marker>.+?)\s*$").ok())
        .as_ref()
}

/// 动词之后的原始文本；没有动词时为整句
fn residual_after_verb(original: &str) -> &str {
    static VERB: OnceLock<Option<Regex>> = OnceLock::new();
    VERB.get_or_init(|| Regex::new(&format!(r"(?i)\b{VERBS}\b")).ok())
        .as_ref()
        .and_then(|re| re.find(original))
        .map_or(original, |m| &original[m.end()..])
}

/// 去掉值两端成对的引号与句末标点
pub fn strip_quotes(value: &str) -> String {
    let trimmed = value.trim().trim_end_matches(['.', '!', '?']).trim();
    for (open, close) in [('"', '"'), ('\'', '\''), ('“', '”'), ('`', '`')] {
        if let Some(inner) = trimmed
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        {
            return inner.to_string();
        }
    }
    trimmed.to_string()
}

fn candidate<'a>(
    re: &Regex,
    text: &str,
    markers: &'a [Marker],
) -> Option<FillTarget<'a>> {
    let caps = re.captures(text)?;
    let marker_part = caps.name("marker")?.as_str();
    let value = strip_quotes(caps.name("value")?.as_str());
    if value.is_empty() {
        return None;
    }
    let marker = find_marker(markers, &clean_search(marker_part))?;
    Some(FillTarget { marker, value })
}

/// 值带冠词或控件名词且清理后能匹配某个 Marker
fn value_names_marker(value: &str, markers: &[Marker]) -> bool {
    let cleaned = clean_search(value);
    cleaned != value.to_lowercase() && find_marker(markers, &cleaned).is_some()
}

/// 依次尝试三个模式；`original` 是原始大小写的输入
pub fn extract<'a>(original: &str, markers: &'a [Marker]) -> Option<FillTarget<'a>> {
    let mut candidates = patterns()
        .iter()
        .filter_map(|re| candidate(re, original, markers))
        .chain(bare_pattern().and_then(|re| candidate(re, residual_after_verb(original), markers)));
    let first = candidates.next()?;
    if !value_names_marker(&first.value, markers) {
        return Some(first);
    }
    candidates
        .find(|c| !value_names_marker(&c.value, markers))
        .or(Some(first))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers() -> Vec<Marker> {
        vec![
            Marker::new("email", "Email", "account email address", "input"),
            Marker::new("card_form", "Card details", "payment card form", "form"),
        ]
    }

    #[test]
    fn test_marker_then_value() {
        let markers = markers();
        let t = extract("Fill the email field with Jane@Example.com", &markers).unwrap();
        assert_eq!(t.marker.id, "email");
        assert_eq!(t.value, "Jane@Example.com");
    }

    #[test]
    fn test_value_then_marker() {
        let markers = markers();
        // 第一个模式把 "a@b.com" 当作目标，匹配不到 Marker，落到第二个模式
        let t = extract("enter a@b.com into the email field", &markers).unwrap();
        assert_eq!(t.marker.id, "email");
        assert_eq!(t.value, "a@b.com");
    }

    #[test]
    fn test_quotes_stripped() {
        let markers = markers();
        let t = extract("type \"4242 4242\" in card details", &markers).unwrap();
        assert_eq!(t.marker.id, "card_form");
        assert_eq!(t.value, "4242 4242");
    }

    #[test]
    fn test_bare_residual_fallback() {
        let markers = markers();
        let t = extract("jane@x.io in the email", &markers).unwrap();
        assert_eq!(t.marker.id, "email");
        assert_eq!(t.value, "jane@x.io");
    }

    #[test]
    fn test_value_that_names_a_field_yields() {
        let markers = markers();
        let t = extract("type email in the email field", &markers).unwrap();
        assert_eq!(t.marker.id, "email");
        assert_eq!(t.value, "email");
    }

    #[test]
    fn test_no_value() {
        let markers = markers();
        assert!(extract("fill the email field", &markers).is_none());
    }

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes("'hello'"), "hello");
        assert_eq!(strip_quotes("plain."), "plain");
        assert_eq!(strip_quotes("\"unbalanced"), "\"unbalanced");
    }
}
