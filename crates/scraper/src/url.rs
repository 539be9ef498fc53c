// ABOUTME: URL helpers for wine page links: tracking-parameter stripping and year parameter access.
// ABOUTME: The `year` query parameter selects the vintage and is the only one kept.

use url::Url;

use crate::error::ScrapeError;

/// The query parameter selecting a vintage.
pub const YEAR_PARAM: &str = "year";

fn parse(raw: &str, op: &str) -> Result<Url, ScrapeError> {
    let parsed = Url::parse(raw.trim()).map_err(|e| {
        ScrapeError::invalid_url(raw, op, Some(anyhow::anyhow!("invalid URL: {}", e)))
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        _ => Err(ScrapeError::invalid_url(
            raw,
            op,
            Some(anyhow::anyhow!("scheme must be http or https")),
        )),
    }
}

/// Drops the fragment and every query parameter except `year`.
pub fn sanitize_url(raw: &str) -> Result<String, ScrapeError> {
    let mut parsed = parse(raw, "Sanitize")?;
    let year = parsed
        .query_pairs()
        .find(|(k, _)| k == YEAR_PARAM)
        .map(|(_, v)| v.into_owned());

    parsed.set_fragment(None);
    match year {
        Some(y) => {
            parsed.query_pairs_mut().clear().append_pair(YEAR_PARAM, &y);
        }
        None => parsed.set_query(None),
    }
    Ok(parsed.to_string())
}

/// Reads the `year` query parameter, if present and numeric.
pub fn year_param(raw: &str) -> Option<i32> {
    let parsed = Url::parse(raw.trim()).ok()?;
    let value = parsed
        .query_pairs()
        .find(|(k, _)| k == YEAR_PARAM)
        .map(|(_, v)| v.into_owned())?;
    value.trim().parse().ok()
}

/// Returns `raw` with its `year` parameter set to `year`, other parameters untouched.
pub fn with_year(raw: &str, year: i32) -> Result<String, ScrapeError> {
    let mut parsed = parse(raw, "WithYear")?;
    let mut pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    match pairs.iter_mut().find(|(k, _)| k == YEAR_PARAM) {
        Some((_, v)) => *v = year.to_string(),
        None => pairs.push((YEAR_PARAM.to_string(), year.to_string())),
    }

    {
        let mut query = parsed.query_pairs_mut();
        query.clear();
        for (k, v) in &pairs {
            query.append_pair(k, v);
        }
    }
    Ok(parsed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sanitize_keeps_only_year() {
        let out = sanitize_url(
            "https://www.vivino.com/US/en/chateau-example/w/123?utm_source=app&year=2018&price_id=9#reviews",
        )
        .unwrap();
        assert_eq!(out, "https://www.vivino.com/US/en/chateau-example/w/123?year=2018");
    }

    #[test]
    fn test_sanitize_without_year_drops_query() {
        let out = sanitize_url("https://www.vivino.com/wines/12345?ref=share").unwrap();
        assert_eq!(out, "https://www.vivino.com/wines/12345");
    }

    #[test]
    fn test_sanitize_rejects_garbage() {
        assert!(sanitize_url("not a url").unwrap_err().is_invalid_url());
        assert!(sanitize_url("ftp://example.com/w/1").unwrap_err().is_invalid_url());
    }

    #[test]
    fn test_year_param() {
        assert_eq!(year_param("https://example.com/w/1?year=2019"), Some(2019));
        assert_eq!(year_param("https://example.com/w/1?year=NV"), None);
        assert_eq!(year_param("https://example.com/w/1"), None);
    }

    #[test]
    fn test_with_year_replaces_in_place() {
        let out = with_year("https://example.com/w/1?year=2018", 2019).unwrap();
        assert_eq!(out, "https://example.com/w/1?year=2019");
    }

    #[test]
    fn test_with_year_appends_when_missing() {
        let out = with_year("https://example.com/w/1", 2017).unwrap();
        assert_eq!(out, "https://example.com/w/1?year=2017");
    }
}
