use std::collections::HashSet;

/// Cleans authored question text before it is stored.
///
/// Whitelist-based: coding prompts legitimately embed snippets, so the
/// code-bearing tags (<pre>, <code>) and basic formatting survive while
/// <script>, <iframe> and event-handler attributes are stripped. Fail-safe
/// against stored XSS from the admin panel.
pub fn sanitize_question_text(input: &str) -> String {
    let tags: HashSet<&str> = [
        "b", "i", "em", "strong", "p", "br", "pre", "code", "ul", "ol", "li", "sub", "sup",
    ]
    .into_iter()
    .collect();

    ammonia::Builder::default()
        .tags(tags)
        .clean(input)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_but_keeps_code_blocks() {
        let dirty = "What does <code>printf(\"%d\")</code> print?<script>alert(1)</script>";
        let clean = sanitize_question_text(dirty);
        assert!(clean.contains("<code>"));
        assert!(!clean.contains("script"));
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(sanitize_question_text("2+2?"), "2+2?");
    }
}
