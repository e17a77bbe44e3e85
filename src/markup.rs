//! # Markup Module
//!
//! Converts platform formatting spans into the HTML subset accepted by the
//! messaging platform, and sanitizes externally authored markup into the
//! same safe, well-nested subset.
//!
//! ## Features
//!
//! - `render`: plain text plus formatting spans (UTF-16 offsets) to markup
//! - `sanitize`: allow-list filtering with an explicit tag stack; never fails
//! - `plain_text` / `preview`: tag-free views of stored markup for listings

use lazy_static::lazy_static;
use log::{debug, warn};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// Deepest tag nesting `sanitize` will reproduce before falling back to plain text
pub const MAX_NESTING_DEPTH: usize = 32;

lazy_static! {
    static ref TAG_RE: Regex = Regex::new(r"<[^<>]*>").expect("Tag scanner pattern should be valid");
    static ref TAG_PARTS_RE: Regex = Regex::new(r"^<(/?)([A-Za-z][A-Za-z0-9-]*)(\s[^>]*)?/?>$")
        .expect("Tag parts pattern should be valid");
    static ref ATTR_RE: Regex =
        Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#)
            .expect("Attribute pattern should be valid");
    static ref ENTITY_RE: Regex = Regex::new(r"^&(?:lt|gt|amp|quot|#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6});")
        .expect("Entity pattern should be valid");
    static ref ANY_ENTITY_RE: Regex = Regex::new(r"&(lt|gt|amp|quot|#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6});")
        .expect("Entity pattern should be valid");
    static ref LANGUAGE_RE: Regex =
        Regex::new(r"^language-[A-Za-z0-9_+#-]+$").expect("Language class pattern should be valid");
}

/// Formatting applied by a span
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanKind {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Spoiler,
    Link(String),
    Quote,
    Code,
    Pre(Option<String>),
}

impl SpanKind {
    fn open_tag(&self) -> String {
        match self {
            SpanKind::Bold => "<b>".to_string(),
            SpanKind::Italic => "<i>".to_string(),
            SpanKind::Underline => "<u>".to_string(),
            SpanKind::Strikethrough => "<s>".to_string(),
            SpanKind::Spoiler => r#"<span class="tg-spoiler">"#.to_string(),
            SpanKind::Link(url) => format!(r#"<a href="{}">"#, escape_attr(url)),
            SpanKind::Quote => "<blockquote>".to_string(),
            SpanKind::Code => "<code>".to_string(),
            SpanKind::Pre(None) => "<pre>".to_string(),
            SpanKind::Pre(Some(lang)) => {
                format!(r#"<pre><code class="language-{}">"#, escape_attr(lang))
            }
        }
    }

    /// Drop a `pre` language that would not survive `sanitize` as a class
    fn normalized(&self) -> SpanKind {
        match self {
            SpanKind::Pre(Some(lang)) if !LANGUAGE_RE.is_match(&format!("language-{lang}")) => SpanKind::Pre(None),
            other => other.clone(),
        }
    }

    fn close_tag(&self) -> &'static str {
        match self {
            SpanKind::Bold => "</b>",
            SpanKind::Italic => "</i>",
            SpanKind::Underline => "</u>",
            SpanKind::Strikethrough => "</s>",
            SpanKind::Spoiler => "</span>",
            SpanKind::Link(_) => "</a>",
            SpanKind::Quote => "</blockquote>",
            SpanKind::Code => "</code>",
            SpanKind::Pre(None) => "</pre>",
            SpanKind::Pre(Some(_)) => "</code></pre>",
        }
    }
}

/// A formatting span; `offset` and `length` count UTF-16 code units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub offset: usize,
    pub length: usize,
    pub kind: SpanKind,
}

impl Span {
    pub fn new(offset: usize, length: usize, kind: SpanKind) -> Self {
        Self { offset, length, kind }
    }
}

/// Failure inside the sanitizer's main pass; callers only ever see the fallback
#[derive(Debug, Clone, PartialEq)]
pub enum MarkupError {
    NestingTooDeep(usize),
}

impl std::fmt::Display for MarkupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarkupError::NestingTooDeep(depth) => write!(f, "Tag nesting deeper than {depth}"),
        }
    }
}

impl std::error::Error for MarkupError {}

/// Escape the characters that are significant in markup text
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_attr(value: &str) -> String {
    escape(value).replace('"', "&quot;")
}

/// Escape text that may already contain entities, leaving valid entities intact
fn escape_preserving_entities(text: &str, quote: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, ch) in text.char_indices() {
        match ch {
            '&' if ENTITY_RE.is_match(&text[i..]) => out.push('&'),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if quote => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Byte offset of the char boundary at or before each UTF-16 position
fn utf16_boundaries(text: &str) -> Vec<usize> {
    let mut map = Vec::with_capacity(text.len() + 1);
    for (byte_idx, ch) in text.char_indices() {
        for _ in 0..ch.len_utf16() {
            map.push(byte_idx);
        }
    }
    map.push(text.len());
    map
}

struct ResolvedSpan {
    start: usize,
    end: usize,
    kind: SpanKind,
}

/// Render plain text and formatting spans into safe, well-nested markup.
///
/// At equal positions closing tags are emitted before opening tags, outer
/// (longer) spans open before inner ones, and spans that cross each other
/// are closed and reopened around the crossing point.
pub fn render(text: &str, spans: &[Span]) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    if spans.is_empty() {
        return escape(text);
    }

    let map = utf16_boundaries(text);
    let last = map.len() - 1;
    let to_byte = |units: usize| map[units.min(last)];

    let mut resolved: Vec<ResolvedSpan> = spans
        .iter()
        .map(|span| ResolvedSpan {
            start: to_byte(span.offset),
            end: to_byte(span.offset.saturating_add(span.length)),
            kind: span.kind.normalized(),
        })
        .filter(|span| span.start < span.end)
        .collect();
    resolved.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut positions: Vec<usize> = resolved.iter().flat_map(|s| [s.start, s.end]).collect();
    positions.sort_unstable();
    positions.dedup();

    let mut out = String::with_capacity(text.len() * 2);
    let mut stack: Vec<usize> = Vec::new();
    let mut last_pos = 0;

    for pos in positions {
        if pos > last_pos {
            out.push_str(&escape(&text[last_pos..pos]));
            last_pos = pos;
        }

        let mut to_open: Vec<usize> = Vec::new();
        if let Some(depth) = stack.iter().position(|&idx| resolved[idx].end == pos) {
            while stack.len() > depth {
                if let Some(idx) = stack.pop() {
                    out.push_str(resolved[idx].kind.close_tag());
                    if resolved[idx].end > pos {
                        to_open.push(idx);
                    }
                }
            }
        }
        to_open.extend((0..resolved.len()).filter(|&idx| resolved[idx].start == pos));
        to_open.sort_by(|&a, &b| {
            resolved[b]
                .end
                .cmp(&resolved[a].end)
                .then(resolved[a].start.cmp(&resolved[b].start))
                .then(a.cmp(&b))
        });

        for idx in to_open {
            out.push_str(&resolved[idx].kind.open_tag());
            stack.push(idx);
        }
    }

    if last_pos < text.len() {
        out.push_str(&escape(&text[last_pos..]));
    }
    while let Some(idx) = stack.pop() {
        out.push_str(resolved[idx].kind.close_tag());
    }

    debug!("Rendered {} spans into {} bytes of markup", spans.len(), out.len());
    out
}

fn canonical_tag(name: &str) -> Option<&'static str> {
    match name.to_ascii_lowercase().as_str() {
        "b" | "strong" => Some("b"),
        "i" | "em" => Some("i"),
        "u" | "ins" => Some("u"),
        "s" | "strike" | "del" => Some("s"),
        "a" => Some("a"),
        "code" => Some("code"),
        "pre" => Some("pre"),
        "span" => Some("span"),
        "blockquote" => Some("blockquote"),
        "tg-spoiler" => Some("tg-spoiler"),
        _ => None,
    }
}

fn attribute(attrs: &str, wanted: &str) -> Option<String> {
    ATTR_RE.captures_iter(attrs).find_map(|caps| {
        if !caps[1].eq_ignore_ascii_case(wanted) {
            return None;
        }
        caps.get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| m.as_str().to_string())
    })
}

/// Canonical opening tag for an allowed element, or `None` when it must be dropped
fn opening_tag(name: &str, attrs: &str) -> Option<String> {
    match name {
        "a" => attribute(attrs, "href")
            .filter(|href| !href.trim().is_empty())
            .map(|href| format!(r#"<a href="{}">"#, escape_preserving_entities(&href, true))),
        "span" => attribute(attrs, "class")
            .filter(|class| class.split_whitespace().any(|c| c == "tg-spoiler"))
            .map(|_| r#"<span class="tg-spoiler">"#.to_string()),
        "code" => match attribute(attrs, "class") {
            Some(class) if LANGUAGE_RE.is_match(&class) => Some(format!(r#"<code class="{class}">"#)),
            _ => Some("<code>".to_string()),
        },
        other => Some(format!("<{other}>")),
    }
}

fn try_sanitize(markup: &str) -> Result<String, MarkupError> {
    let mut out = String::with_capacity(markup.len());
    // (name, emitted); rejected openers stay on the stack so their closers pair up
    let mut open_tags: Vec<(&'static str, bool)> = Vec::new();
    let mut last = 0;

    for tag in TAG_RE.find_iter(markup) {
        if tag.start() > last {
            out.push_str(&escape_preserving_entities(&markup[last..tag.start()], false));
        }
        last = tag.end();

        let Some(parts) = TAG_PARTS_RE.captures(tag.as_str()) else {
            out.push_str(&escape_preserving_entities(tag.as_str(), false));
            continue;
        };
        let Some(name) = canonical_tag(&parts[2]) else {
            continue;
        };

        if !parts[1].is_empty() {
            if let Some(&(top, emitted)) = open_tags.last() {
                if top == name {
                    open_tags.pop();
                    if emitted {
                        out.push_str(&format!("</{name}>"));
                    }
                }
            }
            continue;
        }

        if open_tags.len() >= MAX_NESTING_DEPTH {
            return Err(MarkupError::NestingTooDeep(MAX_NESTING_DEPTH));
        }
        let attrs = parts.get(3).map_or("", |m| m.as_str());
        match opening_tag(name, attrs) {
            Some(open) => {
                open_tags.push((name, true));
                out.push_str(&open);
            }
            None => open_tags.push((name, false)),
        }
    }

    if last < markup.len() {
        out.push_str(&escape_preserving_entities(&markup[last..], false));
    }
    while let Some((name, emitted)) = open_tags.pop() {
        if emitted {
            out.push_str(&format!("</{name}>"));
        }
    }

    Ok(out)
}

/// Remove every tag and escape what remains
pub fn strip_tags(markup: &str) -> String {
    escape_preserving_entities(&TAG_RE.replace_all(markup, ""), false)
}

/// Sanitize externally authored markup into the safe subset.
///
/// Unknown tags and mismatched closers are dropped, text is escaped, and any
/// tags still open at the end are closed in reverse order. Never fails: on
/// an internal error the markup is reduced to escaped plain text.
pub fn sanitize(markup: &str) -> String {
    if markup.is_empty() {
        return String::new();
    }
    match try_sanitize(markup) {
        Ok(clean) => clean,
        Err(e) => {
            warn!("Markup sanitization failed, stripping tags: {e}");
            strip_tags(markup)
        }
    }
}

/// Decode markup into plain text: tags removed, entities resolved
pub fn plain_text(markup: &str) -> String {
    let stripped = TAG_RE.replace_all(markup, "");
    ANY_ENTITY_RE
        .replace_all(&stripped, |caps: &Captures| match &caps[1] {
            "lt" => "<".to_string(),
            "gt" => ">".to_string(),
            "amp" => "&".to_string(),
            "quot" => "\"".to_string(),
            numeric => {
                let code = match numeric.strip_prefix("#x").or_else(|| numeric.strip_prefix("#X")) {
                    Some(hex) => u32::from_str_radix(hex, 16).ok(),
                    None => numeric[1..].parse::<u32>().ok(),
                };
                code.and_then(char::from_u32)
                    .map(String::from)
                    .unwrap_or_else(|| caps[0].to_string())
            }
        })
        .into_owned()
}

/// Escaped, tag-free excerpt of markup limited to `max_chars` characters
pub fn preview(markup: &str, max_chars: usize) -> String {
    let plain = plain_text(markup);
    let plain = plain.trim();
    if plain.chars().count() <= max_chars {
        return escape(plain);
    }
    let cut: String = plain.chars().take(max_chars).collect();
    format!("{}…", escape(cut.trim_end()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_plain_text_is_escaped() {
        assert_eq!(render("a < b & c", &[]), "a &lt; b &amp; c");
    }

    #[test]
    fn test_render_blank_input() {
        assert_eq!(render("", &[]), "");
        assert_eq!(render("   \n\t", &[Span::new(0, 2, SpanKind::Bold)]), "");
    }

    #[test]
    fn test_render_single_span() {
        let spans = [Span::new(6, 5, SpanKind::Bold)];
        assert_eq!(render("Hello world", &spans), "Hello <b>world</b>");
    }

    #[test]
    fn test_render_nested_spans() {
        let spans = [
            Span::new(0, 5, SpanKind::Italic),
            Span::new(0, 11, SpanKind::Bold),
        ];
        assert_eq!(render("Hello world", &spans), "<b><i>Hello</i> world</b>");
    }

    #[test]
    fn test_render_equal_boundaries_close_before_open() {
        let spans = [
            Span::new(0, 3, SpanKind::Bold),
            Span::new(3, 3, SpanKind::Italic),
        ];
        assert_eq!(render("abcdef", &spans), "<b>abc</b><i>def</i>");
    }

    #[test]
    fn test_render_identical_spans_stay_nested() {
        let spans = [
            Span::new(0, 3, SpanKind::Bold),
            Span::new(0, 3, SpanKind::Italic),
        ];
        assert_eq!(render("abc", &spans), "<b><i>abc</i></b>");
    }

    #[test]
    fn test_render_crossing_spans_are_split() {
        let spans = [
            Span::new(0, 4, SpanKind::Bold),
            Span::new(2, 4, SpanKind::Italic),
        ];
        assert_eq!(render("abcdef", &spans), "<b>ab<i>cd</i></b><i>ef</i>");
    }

    #[test]
    fn test_render_link_url_is_quoted() {
        let spans = [Span::new(0, 4, SpanKind::Link("https://x.y/?a=1&b=\"2\"".to_string()))];
        assert_eq!(
            render("site", &spans),
            r#"<a href="https://x.y/?a=1&amp;b=&quot;2&quot;">site</a>"#
        );
    }

    #[test]
    fn test_render_utf16_offsets() {
        // "🗽" is two UTF-16 code units
        let spans = [Span::new(3, 2, SpanKind::Bold)];
        assert_eq!(render("🗽 ok", &spans), "🗽 <b>ok</b>");
    }

    #[test]
    fn test_render_clamps_out_of_range_spans() {
        let spans = [Span::new(2, 100, SpanKind::Underline), Span::new(50, 3, SpanKind::Bold)];
        assert_eq!(render("abcd", &spans), "ab<u>cd</u>");
    }

    #[test]
    fn test_render_spoiler_and_quote() {
        let spans = [
            Span::new(0, 3, SpanKind::Spoiler),
            Span::new(4, 3, SpanKind::Quote),
        ];
        assert_eq!(
            render("abc def", &spans),
            r#"<span class="tg-spoiler">abc</span> <blockquote>def</blockquote>"#
        );
    }

    #[test]
    fn test_render_pre_language_matches_sanitize() {
        let rust = render("fn x", &[Span::new(0, 4, SpanKind::Pre(Some("rust".to_string())))]);
        assert_eq!(rust, r#"<pre><code class="language-rust">fn x</code></pre>"#);
        assert_eq!(sanitize(&rust), rust);

        let odd = render("fn x", &[Span::new(0, 4, SpanKind::Pre(Some("my lang\"".to_string())))]);
        assert_eq!(odd, "<pre>fn x</pre>");
        assert_eq!(sanitize(&odd), odd);
    }

    #[test]
    fn test_sanitize_escapes_text_and_keeps_allowed_tags() {
        assert_eq!(sanitize("<b>1 < 2</b>"), "<b>1 &lt; 2</b>");
        assert_eq!(sanitize("<script>x</script>"), "x");
    }

    #[test]
    fn test_sanitize_drops_mismatched_closers() {
        assert_eq!(sanitize("<b>x</i>y</b>"), "<b>xy</b>");
        assert_eq!(sanitize("</b>x"), "x");
    }

    #[test]
    fn test_sanitize_closes_open_tags_in_reverse() {
        assert_eq!(sanitize("<b><i>x"), "<b><i>x</i></b>");
    }

    #[test]
    fn test_sanitize_canonicalises_aliases() {
        assert_eq!(sanitize("<strong>a</strong><EM>b</em>"), "<b>a</b><i>b</i>");
    }

    #[test]
    fn test_sanitize_attributes() {
        assert_eq!(
            sanitize(r#"<a href='https://e.com/?q="x"' onclick="evil()">e</a>"#),
            r#"<a href="https://e.com/?q=&quot;x&quot;">e</a>"#
        );
        assert_eq!(sanitize("<a>no link</a>"), "no link");
        assert_eq!(
            sanitize(r#"<span class="tg-spoiler">s</span><span>p</span>"#),
            r#"<span class="tg-spoiler">s</span>p"#
        );
    }

    #[test]
    fn test_sanitize_dropped_opener_keeps_its_closer() {
        assert_eq!(
            sanitize(r#"<span class="tg-spoiler">secret <span>x</span> still secret</span>"#),
            r#"<span class="tg-spoiler">secret x still secret</span>"#
        );
        assert_eq!(
            sanitize(r#"<a href="https://e.com">out <a>in</a> out</a>"#),
            r#"<a href="https://e.com">out in out</a>"#
        );
    }

    #[test]
    fn test_sanitize_preserves_existing_entities() {
        assert_eq!(sanitize("&lt;tag&gt; &amp; &#128509; & more"), "&lt;tag&gt; &amp; &#128509; &amp; more");
    }

    #[test]
    fn test_sanitize_non_tag_angle_runs_are_text() {
        assert_eq!(sanitize("a < b > c"), "a &lt; b &gt; c");
        assert_eq!(sanitize("<3 <b>x</b>"), "&lt;3 <b>x</b>");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let inputs = [
            "<b>bold <i>both</b> italic?</i>",
            "<a href=\"https://e.com/?a=1&b=2\">l</a> & <u>u",
            "plain & <weird> </b> text",
            "<blockquote><tg-spoiler>s</tg-spoiler>",
            "&amp;lt; &#x1F5FD; &bogus;",
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "input: {input}");
        }
    }

    #[test]
    fn test_sanitize_deep_nesting_falls_back_to_text() {
        let markup = format!("{}x", "<b>".repeat(MAX_NESTING_DEPTH + 1));
        assert_eq!(sanitize(&markup), "x");
    }

    #[test]
    fn test_plain_text_and_preview() {
        assert_eq!(plain_text("<b>a &lt; b</b> &#65;&#x42;"), "a < b AB");
        assert_eq!(preview("<i>hello world</i>", 5), "hello…");
        assert_eq!(preview("<b>1 &lt; 2</b>", 10), "1 &lt; 2");
    }
}
