use std::fmt;
use std::str::FromStr;

use regex::Regex;

/// The three Ofcom station registries this tool knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Community,
    Digital,
    SmallScale,
}

impl Category {
    /// Name used in output file names.
    pub fn name(self) -> &'static str {
        match self {
            Category::Community => "Community",
            Category::Digital => "Digital",
            Category::SmallScale => "SmallScale",
        }
    }

    /// CSV header row: six common columns, then the category's own columns.
    pub fn headers(self) -> Vec<&'static str> {
        let mut cols = vec![
            "Name",
            "Licence Number",
            "Contact Details",
            "Telephone",
            "Website",
            "Email",
        ];
        match self {
            Category::Community => cols.extend([
                "Frequency",
                "Airing From",
                "Airing To",
                "Licencee",
                "Group",
            ]),
            Category::Digital => cols.push("SSDAB multiplex"),
            Category::SmallScale => cols.extend(["Frequency", "Licensee"]),
        }
        cols
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "community" => Ok(Category::Community),
            "digital" => Ok(Category::Digital),
            "small-scale" | "smallscale" | "small_scale" => Ok(Category::SmallScale),
            other => Err(format!("unknown category: {other:?}")),
        }
    }
}

/// Static configuration for one registry: where its listing and detail pages
/// live, and the patterns used to pick links and pull fields out of raw HTML.
pub struct CategoryConfig {
    pub category: Category,
    pub listing_url: &'static str,
    pub detail_base_url: &'static str,
    pub link_prefix: Regex,
    pub title: Regex,
    pub detail: Regex,
}

// Station title sits in the page <h1>; fields in a <dt>/<dd> facts list.
// Both patterns run against the raw HTML body as one blob, so the detail
// patterns carry (?s) to let . cross line breaks. Multi-paragraph <dd>
// captures keep their inner </p><p> markers; normalization happens in
// the extractor.
const TITLE_PATTERN: &str = r"<h1[^>]*>(?P<name>[^<]*)</h1>";

const COMMON_FIELDS: &str = concat!(
    r"Licence number</dt>\s*<dd>(?P<licence>[^<]*)</dd>",
    r"|Contact details</dt>\s*<dd>\s*<p>(?P<contact>.*?)</p>\s*</dd>",
    r"|Telephone</dt>\s*<dd>(?P<telephone>[^<]*)</dd>",
    r"|Website</dt>\s*<dd>\s*<a[^>]*>(?P<website>[^<]*)</a>",
    r"|Email</dt>\s*<dd>(?P<email>[^<]*)</dd>",
);

const FREQUENCY_FIELD: &str = r"|Frequency</dt>\s*<dd>\s*<p>(?P<frequency>.*?)</p>\s*</dd>";

fn detail_pattern(category: Category) -> String {
    let extra = match category {
        Category::Community => format!(
            "{FREQUENCY_FIELD}\
             |Airing from</dt>\\s*<dd>(?P<airing_from>[^<]*)</dd>\
             |Airing to</dt>\\s*<dd>(?P<airing_to>[^<]*)</dd>\
             |Licencee</dt>\\s*<dd>(?P<licencee>[^<]*)</dd>\
             |Station group</dt>\\s*<dd>(?P<group>[^<]*)</dd>"
        ),
        Category::Digital => r"|SSDAB multiplex</dt>\s*<dd>(?P<multiplex>[^<]*)</dd>".to_string(),
        Category::SmallScale => {
            format!("{FREQUENCY_FIELD}|Licensee</dt>\\s*<dd>(?P<licensee>[^<]*)</dd>")
        }
    };
    format!("(?s){COMMON_FIELDS}{extra}")
}

fn listing_url(category: Category) -> &'static str {
    match category {
        Category::Community => {
            "https://www.ofcom.org.uk/manage-your-licence/radio-broadcast-licensing/community-radio-stations"
        }
        Category::Digital => {
            "https://www.ofcom.org.uk/manage-your-licence/radio-broadcast-licensing/community-digital-providers"
        }
        Category::SmallScale => {
            "https://www.ofcom.org.uk/manage-your-licence/radio-broadcast-licensing/small-scale-radio"
        }
    }
}

// Detail links on the listing pages are relative; base + link is crafted to
// always form a valid URL by plain concatenation.
fn detail_base_url(category: Category) -> &'static str {
    match category {
        Category::Community => {
            "https://www.ofcom.org.uk/manage-your-licence/radio-broadcast-licensing/community-radio-stations/"
        }
        Category::Digital => {
            "https://www.ofcom.org.uk/manage-your-licence/radio-broadcast-licensing/community-digital-providers/"
        }
        Category::SmallScale => {
            "https://www.ofcom.org.uk/manage-your-licence/radio-broadcast-licensing/small-scale-radio/"
        }
    }
}

fn link_prefix(category: Category) -> &'static str {
    match category {
        Category::Community => "^crs",
        Category::Digital => "^cdp",
        Category::SmallScale => "^ssr",
    }
}

/// Build the three registry configurations. Called once at startup; the
/// configs are immutable and shared by reference for the rest of the run.
pub fn all() -> Vec<CategoryConfig> {
    [Category::Community, Category::Digital, Category::SmallScale]
        .into_iter()
        .map(|category| CategoryConfig {
            category,
            listing_url: listing_url(category),
            detail_base_url: detail_base_url(category),
            link_prefix: Regex::new(link_prefix(category)).expect("link prefix pattern"),
            title: Regex::new(TITLE_PATTERN).expect("title pattern"),
            detail: Regex::new(&detail_pattern(category)).expect("detail pattern"),
        })
        .collect()
}
