use serde::{Deserialize, Serialize};

/// Lifecycle status of a processed note.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NoteStatus {
    Processing,
    #[default]
    Completed,
    Failed,
}

impl std::fmt::Display for NoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for NoteStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Unknown note status: {s}")),
        }
    }
}

/// Stage at which a pipeline run failed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Upload,
    Extraction,
    Generation,
    Persist,
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upload => write!(f, "upload"),
            Self::Extraction => write!(f, "extraction"),
            Self::Generation => write!(f, "generation"),
            Self::Persist => write!(f, "persist"),
        }
    }
}

/// Formatting style requested for generated notes. Unrecognized values fall
/// back to [`NoteStyle::Comprehensive`] rather than being rejected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NoteStyle {
    #[default]
    Comprehensive,
    Concise,
    Detailed,
    Summary,
}

impl NoteStyle {
    /// Lenient parse: anything unknown is treated as the default style.
    pub fn from_request(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("concise") => Self::Concise,
            Some("detailed") => Self::Detailed,
            Some("summary") => Self::Summary,
            _ => Self::Comprehensive,
        }
    }
}

impl std::fmt::Display for NoteStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Comprehensive => write!(f, "comprehensive"),
            Self::Concise => write!(f, "concise"),
            Self::Detailed => write!(f, "detailed"),
            Self::Summary => write!(f, "summary"),
        }
    }
}

/// Page-based pagination metadata for history listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u32,
    pub pages: u32,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u32) -> Self {
        let pages = if limit == 0 { 0 } else { total.div_ceil(limit) };
        Self {
            page,
            limit,
            total,
            pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_status_round_trips_through_strings() {
        for status in [
            NoteStatus::Processing,
            NoteStatus::Completed,
            NoteStatus::Failed,
        ] {
            let parsed: NoteStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!("archived".parse::<NoteStatus>().is_err());
    }

    #[test]
    fn note_style_falls_back_to_comprehensive() {
        assert_eq!(NoteStyle::from_request(None), NoteStyle::Comprehensive);
        assert_eq!(
            NoteStyle::from_request(Some("bullet-points")),
            NoteStyle::Comprehensive
        );
        assert_eq!(NoteStyle::from_request(Some("Concise")), NoteStyle::Concise);
        assert_eq!(
            NoteStyle::from_request(Some(" summary ")),
            NoteStyle::Summary
        );
    }

    #[test]
    fn pagination_rounds_pages_up() {
        let p = Pagination::new(1, 20, 41);
        assert_eq!(p.pages, 3);

        let p = Pagination::new(1, 20, 40);
        assert_eq!(p.pages, 2);

        let p = Pagination::new(1, 20, 0);
        assert_eq!(p.pages, 0);
    }
}
