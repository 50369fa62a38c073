//! Cursor pagination for the Admin REST API via the `Link` response header.
//!
//! Each list response carries sibling-page URLs in the `Link` header; the
//! cursor is the `page_info` query parameter of the `rel="next"` entry:
//!
//! ```text
//! <https://shop.myshopify.com/admin/api/2025-01/products.json?limit=250&page_info=PREV>; rel="previous",
//! <https://shop.myshopify.com/admin/api/2025-01/products.json?limit=250&page_info=NEXT>; rel="next"
//! ```

/// Extracts the `page_info` cursor for the next page from a `Link` header.
///
/// Returns `None` when no header was present, when there is no `rel="next"`
/// entry (last page), or when the next-page URL carries no `page_info`
/// parameter. Cursors are base64url and need no percent-decoding.
#[must_use]
pub fn next_page_cursor(link_header: Option<&str>) -> Option<String> {
    for entry in link_header?.split(',') {
        let entry = entry.trim();
        if !entry.contains(r#"rel="next""#) {
            continue;
        }

        let url = entry
            .split_once('<')
            .and_then(|(_, rest)| rest.split_once('>'))
            .map(|(url, _)| url)?;

        let query = url.split_once('?').map(|(_, q)| q)?;
        return query.split('&').find_map(|pair| {
            pair.strip_prefix("page_info=")
                .filter(|v| !v.is_empty())
                .map(ToOwned::to_owned)
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN_URL: &str = "https://shop.myshopify.com/admin/api/2025-01/products.json";

    #[test]
    fn none_header_yields_none() {
        assert!(next_page_cursor(None).is_none());
        assert!(next_page_cursor(Some("")).is_none());
    }

    #[test]
    fn single_next_entry() {
        let header = format!(r#"<{ADMIN_URL}?limit=250&page_info=eyJsYXN0X2lkIjo5fQ>; rel="next""#);
        assert_eq!(
            next_page_cursor(Some(&header)).as_deref(),
            Some("eyJsYXN0X2lkIjo5fQ")
        );
    }

    #[test]
    fn combined_previous_and_next_entries() {
        let header = format!(
            r#"<{ADMIN_URL}?limit=250&page_info=PREV>; rel="previous", <{ADMIN_URL}?limit=250&page_info=NEXT>; rel="next""#
        );
        assert_eq!(next_page_cursor(Some(&header)).as_deref(), Some("NEXT"));
    }

    #[test]
    fn previous_only_is_last_page() {
        let header = format!(r#"<{ADMIN_URL}?limit=250&page_info=PREV>; rel="previous""#);
        assert!(next_page_cursor(Some(&header)).is_none());
    }

    #[test]
    fn next_without_page_info_yields_none() {
        let header = format!(r#"<{ADMIN_URL}?limit=250>; rel="next""#);
        assert!(next_page_cursor(Some(&header)).is_none());
    }

    #[test]
    fn page_info_in_any_query_position() {
        let header =
            format!(r#"<{ADMIN_URL}?limit=250&fields=id&page_info=CURSOR42>; rel="next""#);
        assert_eq!(next_page_cursor(Some(&header)).as_deref(), Some("CURSOR42"));
    }

    #[test]
    fn tolerates_whitespace_after_comma() {
        let header = format!(
            "<{ADMIN_URL}?page_info=A>; rel=\"previous\",    <{ADMIN_URL}?page_info=B>; rel=\"next\""
        );
        assert_eq!(next_page_cursor(Some(&header)).as_deref(), Some("B"));
    }
}
