use par_core::models::season_label;
use par_core::season::SeasonTarget;

const FBREF_BASE: &str = "https://fbref.com/en/comps";

/// An FBref competition: numeric id plus the slug used in page names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FbrefCompetition {
    pub id: u32,
    pub slug: String,
}

impl Default for FbrefCompetition {
    /// The Premier League.
    fn default() -> Self {
        Self {
            id: 9,
            slug: "Premier-League".to_string(),
        }
    }
}

impl FbrefCompetition {
    pub fn new(id: u32, slug: impl Into<String>) -> Self {
        Self {
            id,
            slug: slug.into(),
        }
    }

    pub fn standard_url(&self, start_year: u16) -> String {
        self.page_url(start_year, "stats")
    }

    pub fn shooting_url(&self, start_year: u16) -> String {
        self.page_url(start_year, "shooting")
    }

    fn page_url(&self, start_year: u16, page: &str) -> String {
        let span = format!("{}-{}", start_year, start_year + 1);
        format!(
            "{FBREF_BASE}/{}/{span}/{page}/{span}-{}-Stats",
            self.id, self.slug
        )
    }

    pub fn target(&self, start_year: u16) -> SeasonTarget {
        SeasonTarget {
            start_year,
            label: season_label(start_year),
            standard_url: self.standard_url(start_year),
            shooting_url: self.shooting_url(start_year),
        }
    }
}
