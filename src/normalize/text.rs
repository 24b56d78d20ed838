pub const TIP_MAX_CHARS: usize = 200;
const TIP_MAX_SENTENCES: usize = 3;

pub const DEFAULT_KID_KEYWORDS: &[&str] = &["아이", "가족", "유모차", "어린이", "키즈"];

/// Split a free-text introduction into (tip, description).
///
/// The description is the whole trimmed text. The tip is its first
/// `TIP_MAX_CHARS` characters, or the first three `.`-terminated sentences
/// when that prefix is shorter. Blank input gives `(None, None)`.
pub fn split_tip(introduction: Option<&str>) -> (Option<String>, Option<String>) {
    let Some(text) = introduction.map(str::trim).filter(|t| !t.is_empty()) else {
        return (None, None);
    };

    let head_end = text
        .char_indices()
        .nth(TIP_MAX_CHARS)
        .map_or(text.len(), |(i, _)| i);
    let sentences_end = text
        .match_indices('.')
        .nth(TIP_MAX_SENTENCES - 1)
        .map_or(text.len(), |(i, _)| i + 1);

    let tip = &text[..head_end.min(sentences_end)];
    (Some(tip.trim_end().to_string()), Some(text.to_string()))
}

/// True if any keyword occurs in the tag text or the introduction.
pub fn mentions_any(keywords: &[String], alltag: Option<&str>, introduction: Option<&str>) -> bool {
    let text = format!(
        "{} {}",
        alltag.unwrap_or_default(),
        introduction.unwrap_or_default()
    );
    keywords.iter().any(|k| !k.is_empty() && text.contains(k.as_str()))
}

/// Individual tags from the comma-separated tag string.
pub fn split_tags(alltag: Option<&str>) -> Vec<String> {
    alltag
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kid_keywords() -> Vec<String> {
        DEFAULT_KID_KEYWORDS.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn blank_introduction() {
        assert_eq!(split_tip(None), (None, None));
        assert_eq!(split_tip(Some("")), (None, None));
        assert_eq!(split_tip(Some("   \n")), (None, None));
    }

    #[test]
    fn short_text_is_tip_and_description() {
        let (tip, desc) = split_tip(Some("  오름 정상에서 보는 일출. "));
        assert_eq!(tip.as_deref(), Some("오름 정상에서 보는 일출."));
        assert_eq!(desc.as_deref(), Some("오름 정상에서 보는 일출."));
    }

    #[test]
    fn three_sentences_when_shorter() {
        let text = "첫째. 둘째. 셋째. 넷째. 다섯째.";
        let (tip, desc) = split_tip(Some(text));
        assert_eq!(tip.as_deref(), Some("첫째. 둘째. 셋째."));
        assert_eq!(desc.as_deref(), Some(text));
    }

    #[test]
    fn char_bound_when_sentences_are_long() {
        let text = format!("{}. 끝.", "가".repeat(300));
        let (tip, desc) = split_tip(Some(&text));
        let tip = tip.unwrap();
        assert_eq!(tip.chars().count(), TIP_MAX_CHARS);
        assert!(desc.unwrap().starts_with(&tip));
    }

    #[test]
    fn decimal_points_count_as_sentence_breaks() {
        let (tip, _) = split_tip(Some("높이 1.5 km. 길이 3.2 km. 더 있음."));
        assert_eq!(tip.as_deref(), Some("높이 1.5 km. 길이 3."));
    }

    #[test]
    fn tip_is_bounded_prefix_of_description() {
        let samples = [
            "a".repeat(500),
            "짧은 문장.".to_string(),
            format!("{} . . . {}", "x ".repeat(120), "y".repeat(90)),
            "  앞뒤 공백  .  두번째 .   ".to_string(),
            ".....".to_string(),
        ];
        for s in &samples {
            let (tip, desc) = split_tip(Some(s));
            let (tip, desc) = (tip.unwrap(), desc.unwrap());
            assert!(tip.chars().count() <= TIP_MAX_CHARS, "{s}");
            assert!(desc.starts_with(&tip), "{s}");
        }
    }

    #[test]
    fn kid_keywords_in_tags_or_text() {
        let kw = kid_keywords();
        assert!(mentions_any(&kw, Some("가족여행,해변"), None));
        assert!(mentions_any(&kw, None, Some("유모차 대여 가능")));
        assert!(!mentions_any(&kw, Some("야경"), Some("조용한 산책로")));
        assert!(!mentions_any(&kw, None, None));
    }

    #[test]
    fn tags_are_trimmed_and_non_empty() {
        assert_eq!(split_tags(Some(" 해변, ,일몰 ,")), vec!["해변", "일몰"]);
        assert!(split_tags(None).is_empty());
    }
}
