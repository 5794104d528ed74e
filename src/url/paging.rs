use url::Url;

/// One way of addressing a numbered listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageUrlFormat {
    /// `?{name}=N`, replacing any existing value for `name`
    Query(String),
    /// `/page/N` appended to the listing path
    PathSegment,
}

impl PageUrlFormat {
    /// Builds the address of page `page` from the listing root
    pub fn apply(&self, base: &Url, page: u32) -> Url {
        let mut url = base.clone();
        url.set_fragment(None);

        match self {
            Self::Query(name) => {
                let kept: Vec<(String, String)> = base
                    .query_pairs()
                    .filter(|(k, _)| k != name)
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect();
                url.query_pairs_mut()
                    .clear()
                    .extend_pairs(kept)
                    .append_pair(name, &page.to_string());
            }
            Self::PathSegment => {
                let path = strip_page_segment(base.path());
                url.set_path(&format!("{}/page/{}", path.trim_end_matches('/'), page));
            }
        }

        url
    }
}

/// Removes a trailing `/page/N` from a path
fn strip_page_segment(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if let Some((head, last)) = trimmed.rsplit_once('/') {
        if !last.is_empty() && last.chars().all(|c| c.is_ascii_digit()) {
            if let Some(head) = head.strip_suffix("/page") {
                return head;
            }
        }
    }
    path
}

/// The ordered list of formats tried when navigating to a page
///
/// Every configured query parameter name comes first, then the path format.
pub fn page_formats(params: &[String]) -> Vec<PageUrlFormat> {
    params
        .iter()
        .map(|name| PageUrlFormat::Query(name.clone()))
        .chain(std::iter::once(PageUrlFormat::PathSegment))
        .collect()
}

/// Builds the address of one listing page
pub fn page_url(base: &str, format: &PageUrlFormat, page: u32) -> Result<String, url::ParseError> {
    let base = Url::parse(base)?;
    Ok(format.apply(&base, page).to_string())
}
