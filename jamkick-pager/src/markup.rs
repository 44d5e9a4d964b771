//! Light-weight markup to text conversion for terminal output.
//!
//! This is a tag stripper, not a parser: it breaks lines at common block
//! elements, drops `<script>`/`<style>` bodies, decodes the handful of entities
//! the results templates emit and collapses whitespace.

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "li", "br", "ul", "ol", "tr", "table", "section", "article", "h1", "h2", "h3",
    "h4", "h5", "h6", "dt", "dd", "dl",
];

/// Visible text of a fragment, one line per block element.
///
/// ```
/// use jamkick_pager::markup::text_content;
///
/// let text = text_content("<h2>2010-02-16</h2><ul><li>Vampire Weekend &amp; guests</li></ul>");
/// assert_eq!(text, "2010-02-16\nVampire Weekend & guests");
/// ```
pub fn text_content(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len() / 2);
    let mut skip_until: Option<&str> = None;
    let mut rest = fragment;

    while let Some(lt) = rest.find('<') {
        if skip_until.is_none() {
            out.push_str(&rest[..lt]);
        }
        let after = &rest[lt + 1..];
        let Some(gt) = after.find('>') else {
            // Unterminated tag: keep the remainder as text.
            if skip_until.is_none() {
                out.push_str(&rest[lt..]);
            }
            rest = "";
            break;
        };
        let tag = &after[..gt];
        rest = &after[gt + 1..];

        let closing = tag.starts_with('/');
        let name: String = tag
            .trim_start_matches('/')
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        if let Some(raw) = skip_until {
            if closing && name == raw {
                skip_until = None;
            }
            continue;
        }

        match name.as_str() {
            "script" if !closing => skip_until = Some("script"),
            "style" if !closing => skip_until = Some("style"),
            n if BLOCK_TAGS.contains(&n) => out.push('\n'),
            _ => {}
        }
    }
    if skip_until.is_none() {
        out.push_str(rest);
    }

    decode_entities(&out)
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}
