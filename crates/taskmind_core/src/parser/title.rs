//! Title extraction.
//!
//! # Invariants
//! - Cleanup steps run in fixed order: command prefix, trailing punctuation,
//!   priority adjectives, relative-date words, final normalization.
//! - A title shorter than `MIN_TITLE_CHARS` characters is rejected rather than
//!   silently producing an empty-looking task.

use once_cell::sync::Lazy;
use regex::Regex;

/// Minimum title length, counted in Unicode scalar values.
pub const MIN_TITLE_CHARS: usize = 3;

static COMMAND_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?:(?:请|麻烦)?(?:帮我|帮忙)?(?:添加|新增|创建|新建|加入|记录|记一下|我要)|请帮我|帮我|(?:add|create)\b)\s*(?:一个|一条|个)?\s*(?:新的)?\s*(?:任务|事项|待办|task)?\s*[：:]?\s*",
    )
    .expect("valid command prefix regex")
});
static TASK_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*任务\s*[：:]\s*").expect("valid task label regex"));
static TRAILING_PUNCT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[，。！？、；,.!?;…\s]+$").expect("valid trailing punct regex"));
static LEADING_PUNCT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[：:，。！？、；,.!?;…\s]+").expect("valid leading punct regex"));
// A lone `急` only counts at a clause boundary or after a degree adverb,
// so words such as `急诊` keep it.
static PRIORITY_WORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:不|很|非常|特别|比较|十分)*(?:重要|紧急)|(?:不|很|非常|特别|比较|十分)+急|(?P<head>^|[：:，。！？、；,.!?;\s])急(?P<tail>[：:，。！？、；,.!?;\s]|$)",
    )
    .expect("valid priority regex")
});
static RELATIVE_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"今天|今日|明天|明日|后天|下周|下个月").expect("valid relative date regex")
});
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));
static DANGLING_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[，,]\s*[，,]").expect("valid separator regex"));

/// Derives a display title from raw input, or `None` when too little remains.
pub fn extract_title(text: &str) -> Option<String> {
    let title = strip_command_prefix(text.trim());
    let title = TRAILING_PUNCT_RE.replace(&title, "");
    let title = PRIORITY_WORD_RE.replace_all(&title, "${head}${tail}");
    let title = RELATIVE_DATE_RE.replace_all(&title, "");
    let title = normalize(&title);

    if title.chars().count() < MIN_TITLE_CHARS {
        return None;
    }
    Some(title)
}

fn strip_command_prefix(text: &str) -> String {
    let without_command = COMMAND_PREFIX_RE.replace(text, "");
    TASK_LABEL_RE.replace(&without_command, "").into_owned()
}

fn normalize(text: &str) -> String {
    let collapsed = WHITESPACE_RE.replace_all(text, " ");
    let collapsed = DANGLING_SEPARATOR_RE.replace_all(&collapsed, "，");
    let trimmed = LEADING_PUNCT_RE.replace(&collapsed, "");
    let trimmed = TRAILING_PUNCT_RE.replace(&trimmed, "");
    trimmed.trim().to_string()
}
