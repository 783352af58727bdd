use std::collections::HashMap;
use std::fmt;

use regex::Regex;
use reqwest::blocking::Client;
use tracing::warn;

use crate::fetch;
use crate::registry::{Category, CategoryConfig};

/// One extracted station. Six common fields plus the category's own fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationRecord {
    pub name: String,
    pub licence_number: String,
    pub contact_details: String,
    pub telephone: String,
    pub website: String,
    pub email: String,
    pub extra: CategoryFields,
}

/// Category-specific trailing columns. One variant per registry; the closed
/// enum means an unknown category cannot reach the pipeline at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFields {
    Community {
        frequency: String,
        airing_from: String,
        airing_to: String,
        licencee: String,
        group: String,
    },
    Digital {
        multiplex: String,
    },
    SmallScale {
        frequency: String,
        licensee: String,
    },
}

impl StationRecord {
    /// Column values in header order: the six common fields, then the
    /// category fields. Must stay in step with `Category::headers`.
    pub fn values(&self) -> Vec<&str> {
        let mut cols = vec![
            self.name.as_str(),
            self.licence_number.as_str(),
            self.contact_details.as_str(),
            self.telephone.as_str(),
            self.website.as_str(),
            self.email.as_str(),
        ];
        match &self.extra {
            CategoryFields::Community {
                frequency,
                airing_from,
                airing_to,
                licencee,
                group,
            } => cols.extend([
                frequency.as_str(),
                airing_from.as_str(),
                airing_to.as_str(),
                licencee.as_str(),
                group.as_str(),
            ]),
            CategoryFields::Digital { multiplex } => cols.push(multiplex.as_str()),
            CategoryFields::SmallScale {
                frequency,
                licensee,
            } => cols.extend([frequency.as_str(), licensee.as_str()]),
        }
        cols
    }
}

/// One recorded per-station failure, written to the category's error file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorNote {
    /// The detail page came back but its title pattern did not match.
    NotFound { url: String },
    /// The detail page could not be fetched at all. Kept distinct from
    /// `NotFound` so the error file says which stations actually failed on
    /// the network rather than on page shape.
    FetchFailed { url: String, reason: String },
}

impl fmt::Display for ErrorNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorNote::NotFound { url } => write!(f, "No URL at {url}"),
            ErrorNote::FetchFailed { url, reason } => {
                write!(f, "Fetch failed at {url}: {reason}")
            }
        }
    }
}

/// Fetch one station's detail page and extract a record from it.
///
/// The detail URL is plain concatenation of the category's base URL and the
/// link; the config strings guarantee that forms a valid URL.
pub fn extract_station(
    client: &Client,
    cfg: &CategoryConfig,
    link: &str,
) -> Result<StationRecord, ErrorNote> {
    let url = format!("{}{}", cfg.detail_base_url, link);
    let body = match fetch::fetch_page(client, &url) {
        Ok(body) => body,
        Err(e) => {
            warn!("Detail fetch failed for {}: {}", url, e);
            return Err(ErrorNote::FetchFailed {
                url,
                reason: e.to_string(),
            });
        }
    };
    extract_from_body(cfg, &url, &body)
}

/// Pattern-match a detail page body. Both patterns run against the raw HTML
/// text, not a parsed DOM.
pub fn extract_from_body(
    cfg: &CategoryConfig,
    url: &str,
    body: &str,
) -> Result<StationRecord, ErrorNote> {
    let name = cfg
        .title
        .captures(body)
        .and_then(|caps| caps.name("name"))
        .map(|m| m.as_str().to_string())
        .filter(|name| !name.is_empty());

    let Some(name) = name else {
        return Err(ErrorNote::NotFound {
            url: url.to_string(),
        });
    };

    let caps = capture_map(&cfg.detail, body);
    let field = |key: &str| caps.get(key).cloned().unwrap_or_default();

    Ok(StationRecord {
        name,
        licence_number: field("licence"),
        contact_details: normalize_paragraphs(&field("contact"), " "),
        telephone: field("telephone"),
        website: field("website"),
        email: field("email"),
        extra: apply_category_fields(cfg.category, &caps),
    })
}

/// Build the category's trailing columns from the detail match set. Every
/// field falls back to the empty string when its group never matched.
pub fn apply_category_fields(
    category: Category,
    caps: &HashMap<String, String>,
) -> CategoryFields {
    let field = |key: &str| caps.get(key).cloned().unwrap_or_default();
    match category {
        Category::Community => CategoryFields::Community {
            frequency: normalize_paragraphs(&field("frequency"), " "),
            airing_from: field("airing_from"),
            airing_to: field("airing_to"),
            licencee: field("licencee"),
            group: field("group"),
        },
        Category::Digital => CategoryFields::Digital {
            multiplex: field("multiplex"),
        },
        Category::SmallScale => CategoryFields::SmallScale {
            frequency: normalize_paragraphs(&field("frequency"), ", "),
            licensee: field("licensee"),
        },
    }
}

/// Run the detail alternation over the whole body and collect the first
/// value captured under each group name. A page can populate any subset of
/// the groups; the rest stay absent.
pub fn capture_map(detail: &Regex, body: &str) -> HashMap<String, String> {
    let names: Vec<&str> = detail.capture_names().flatten().collect();
    let mut map = HashMap::new();
    for caps in detail.captures_iter(body) {
        for name in names.iter().copied() {
            if let Some(m) = caps.name(name) {
                map.entry(name.to_string())
                    .or_insert_with(|| m.as_str().to_string());
            }
        }
    }
    map
}

/// Collapse embedded paragraph breaks: literal `</p><p>` markers become the
/// join delimiter and a trailing `</p>` is dropped.
pub fn normalize_paragraphs(raw: &str, delimiter: &str) -> String {
    let joined = raw.replace("</p><p>", delimiter);
    joined.strip_suffix("</p>").unwrap_or(&joined).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry;

    fn config(category: Category) -> registry::CategoryConfig {
        registry::all()
            .into_iter()
            .find(|c| c.category == category)
            .unwrap()
    }

    const COMMUNITY_PAGE: &str = r#"<html><body>
<h1 class="page-title">Radio Sunrise</h1>
<dl class="station-facts">
<dt>Licence number</dt>
<dd>CR000123</dd>
<dt>Frequency</dt>
<dd>
<p>96.4 MHz</p><p>106.2 MHz</p>
</dd>
<dt>Contact details</dt>
<dd>
<p>1 High Street</p><p>Lincoln LN1 1AA</p>
</dd>
<dt>Telephone</dt>
<dd>01522 000000</dd>
<dt>Website</dt>
<dd>
<a href="http://radiosunrise.example">http://radiosunrise.example</a>
</dd>
<dt>Email</dt>
<dd>studio@radiosunrise.example</dd>
<dt>Airing from</dt>
<dd>01 January 2010</dd>
<dt>Airing to</dt>
<dd>31 December 2030</dd>
<dt>Licencee</dt>
<dd>Sunrise Community Media Ltd</dd>
<dt>Station group</dt>
<dd>Lincolnshire</dd>
</dl>
</body></html>"#;

    #[test]
    fn community_page_extracts_all_fields() {
        let cfg = config(Category::Community);
        let record = extract_from_body(&cfg, "https://x/crs001", COMMUNITY_PAGE).unwrap();

        assert_eq!(record.name, "Radio Sunrise");
        assert_eq!(record.licence_number, "CR000123");
        assert_eq!(record.contact_details, "1 High Street Lincoln LN1 1AA");
        assert_eq!(record.telephone, "01522 000000");
        assert_eq!(record.website, "http://radiosunrise.example");
        assert_eq!(record.email, "studio@radiosunrise.example");
        assert_eq!(
            record.extra,
            CategoryFields::Community {
                frequency: "96.4 MHz 106.2 MHz".into(),
                airing_from: "01 January 2010".into(),
                airing_to: "31 December 2030".into(),
                licencee: "Sunrise Community Media Ltd".into(),
                group: "Lincolnshire".into(),
            }
        );
    }

    #[test]
    fn digital_page_with_only_title_and_multiplex() {
        let cfg = config(Category::Digital);
        let body = r#"<html><body>
<h1>Test FM</h1>
<dl>
<dt>SSDAB multiplex</dt>
<dd>SSDAB1</dd>
</dl>
</body></html>"#;

        let record = extract_from_body(&cfg, "https://x/cdp123", body).unwrap();
        assert_eq!(record.name, "Test FM");
        assert_eq!(record.extra, CategoryFields::Digital { multiplex: "SSDAB1".into() });
        // Everything the page does not carry stays empty, record still exists.
        assert_eq!(record.licence_number, "");
        assert_eq!(record.contact_details, "");
        assert_eq!(record.telephone, "");
        assert_eq!(record.website, "");
        assert_eq!(record.email, "");
    }

    #[test]
    fn missing_title_yields_not_found_note() {
        let cfg = config(Category::Digital);
        let body = "<html><body><p>no heading here</p></body></html>";
        let err = extract_from_body(&cfg, "https://x/cdp123", body).unwrap_err();
        assert_eq!(err.to_string(), "No URL at https://x/cdp123");
    }

    #[test]
    fn empty_title_counts_as_not_found() {
        let cfg = config(Category::Community);
        let body = "<html><body><h1></h1></body></html>";
        assert!(matches!(
            extract_from_body(&cfg, "https://x/crs9", body),
            Err(ErrorNote::NotFound { .. })
        ));
    }

    #[test]
    fn small_scale_frequency_joins_with_comma_space() {
        let cfg = config(Category::SmallScale);
        let body = r#"<h1>Micro FM</h1>
<dt>Frequency</dt>
<dd><p>87.7 MHz</p><p>88.1 MHz</p><p>90.0 MHz</p></dd>
<dt>Licensee</dt>
<dd>Micro Radio CIC</dd>"#;

        let record = extract_from_body(&cfg, "https://x/ssr1", body).unwrap();
        assert_eq!(
            record.extra,
            CategoryFields::SmallScale {
                frequency: "87.7 MHz, 88.1 MHz, 90.0 MHz".into(),
                licensee: "Micro Radio CIC".into(),
            }
        );
    }

    #[test]
    fn normalize_strips_trailing_paragraph_close() {
        assert_eq!(normalize_paragraphs("a</p><p>b</p>", " "), "a b");
        assert_eq!(normalize_paragraphs("a</p><p>b", ", "), "a, b");
        assert_eq!(normalize_paragraphs("plain", " "), "plain");
        assert_eq!(normalize_paragraphs("", " "), "");
    }

    #[test]
    fn name_whitespace_is_preserved() {
        let cfg = config(Category::Digital);
        let body = "<h1>  Spaced Out FM </h1>";
        let record = extract_from_body(&cfg, "https://x/cdp9", body).unwrap();
        assert_eq!(record.name, "  Spaced Out FM ");
    }
}
