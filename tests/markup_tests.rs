use regex::Regex;

use menubot::markup::{escape, render, sanitize, Span, SpanKind};

/// Check that every opened tag is closed in LIFO order
fn is_well_formed(markup: &str) -> bool {
    let tag = Regex::new(r"<(/?)([a-z-]+)[^>]*>").unwrap();
    let mut stack: Vec<String> = Vec::new();
    for caps in tag.captures_iter(markup) {
        let name = caps[2].to_string();
        if caps[1].is_empty() {
            stack.push(name);
        } else if stack.pop().as_deref() != Some(name.as_str()) {
            return false;
        }
    }
    stack.is_empty()
}

fn strip(markup: &str) -> String {
    Regex::new(r"<[^>]*>").unwrap().replace_all(markup, "").into_owned()
}

#[test]
fn test_render_strips_back_to_escaped_text() {
    let cases: Vec<(&str, Vec<Span>)> = vec![
        ("plain & simple", vec![]),
        ("bold then italic", vec![Span::new(0, 4, SpanKind::Bold), Span::new(10, 6, SpanKind::Italic)]),
        (
            "a <tag> & a link",
            vec![
                Span::new(2, 5, SpanKind::Code),
                Span::new(12, 4, SpanKind::Link("https://example.com/?a=1&b=\"2\"".to_string())),
            ],
        ),
        (
            "Привет 👋 мир",
            vec![Span::new(0, 6, SpanKind::Underline), Span::new(10, 3, SpanKind::Spoiler)],
        ),
        ("quoted\nlines", vec![Span::new(0, 12, SpanKind::Quote)]),
    ];

    for (text, spans) in cases {
        let markup = render(text, &spans);
        assert_eq!(strip(&markup), escape(text), "render({text:?})");
        assert!(is_well_formed(&markup), "not well formed: {markup}");
    }
}

#[test]
fn test_render_overlaps_are_well_formed() {
    let text = "overlapping spans here";
    let spans = vec![
        Span::new(0, 11, SpanKind::Bold),
        Span::new(5, 12, SpanKind::Italic),
        Span::new(5, 6, SpanKind::Strikethrough),
        Span::new(12, 10, SpanKind::Underline),
    ];
    let markup = render(text, &spans);
    assert!(is_well_formed(&markup), "not well formed: {markup}");
    assert_eq!(strip(&markup), text);
    assert_eq!(markup, render(text, &spans));
}

#[test]
fn test_sanitize_properties() {
    let inputs = [
        "",
        "plain",
        "<b>bold <i>both</b> italic?</i>",
        "<div>unknown</div> <script>alert(1)</script>",
        "<a href=\"https://x.y/?q=1&r=2\">link</a> <a>bare</a>",
        "5 < 6 && 7 > 3",
        "&lt;b&gt; stays text &amp; &#128512;",
        "</b></i>closers first<u>",
        "<span class=\"tg-spoiler\">hidden</span><span>plain</span>",
        "<pre><code class=\"language-rust\">fn main() {}</code></pre>",
        "<STRONG>loud</STRONG> <em>soft</em>",
    ];

    for input in inputs {
        let once = sanitize(input);
        assert_eq!(sanitize(&once), once, "not idempotent for {input:?}");
        assert!(is_well_formed(&once), "not well formed: {once}");
    }
}

#[test]
fn test_sanitized_render_is_stable() {
    let markup = render(
        "Sale: 50% off <today>",
        &[Span::new(0, 4, SpanKind::Bold), Span::new(6, 11, SpanKind::Italic)],
    );
    assert_eq!(sanitize(&markup), markup);
}
