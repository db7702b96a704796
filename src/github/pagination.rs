/// Pagination state threaded through a scan loop.
///
/// The cursor is an opaque URL taken verbatim from the previous response's
/// Link header; None means the listing is exhausted.
#[derive(Debug, Clone, Default)]
pub struct PageState {
    pub next_cursor: Option<String>,
}

/// Extract the rel="next" target from an RFC 8288 Link header.
///
/// GitHub sends e.g.
///   <https://api.github.com/...&page=2>; rel="next", <...&page=5>; rel="last"
/// The URL is returned verbatim; callers must not try to reconstruct it.
pub fn parse_next_link(link_header: &str) -> Option<String> {
    for part in link_header.split(',') {
        let mut sections = part.split(';');
        let target = sections.next()?.trim();
        let is_next = sections
            .any(|param| param.trim() == r#"rel="next""# || param.trim() == "rel=next");
        if is_next {
            let url = target.strip_prefix('<')?.strip_suffix('>')?;
            return Some(url.to_string());
        }
    }
    None
}
