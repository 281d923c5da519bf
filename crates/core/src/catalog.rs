//! Catalog rules shared by the store and query layers: page windows,
//! theme filtering, ingestion field normalization and the featured-usage
//! formula.

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Page size for representative listings.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Upper bound for a caller-supplied `limit`.
pub const MAX_PAGE_SIZE: i64 = 50;

/// Minimum usage assigned to a promoted ("featured") template.
pub const FEATURED_USAGE_FLOOR: i64 = 1000;

/// Signed URL lifetime bounds, in seconds.
pub const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 3600;
pub const MIN_SIGNED_URL_TTL_SECS: u64 = 60;
pub const MAX_SIGNED_URL_TTL_SECS: u64 = 7 * 24 * 3600;

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// Clamp a user-provided limit to valid bounds.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided 1-based page number.
pub fn clamp_page(page: Option<i64>) -> i64 {
    page.unwrap_or(1).max(1)
}

/// A resolved 1-based page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub limit: i64,
}

impl PageWindow {
    /// Resolve raw query values against the representative page bounds.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: clamp_page(page),
            limit: clamp_limit(limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// The part of `items` that falls inside this window.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = usize::try_from(self.offset()).unwrap_or(usize::MAX).min(items.len());
        let end = start
            .saturating_add(usize::try_from(self.limit).unwrap_or(0))
            .min(items.len());
        &items[start..end]
    }
}

// ---------------------------------------------------------------------------
// Theme filter
// ---------------------------------------------------------------------------

/// Theme filter for representative listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeFilter {
    /// Every prompt that has a theme.
    All,
    /// Prompts whose theme equals this value, case-insensitively.
    Theme(String),
}

impl ThemeFilter {
    /// Parse a `theme` query value; absent, blank and `all` mean [`ThemeFilter::All`].
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Self::All,
            Some(value) if value.eq_ignore_ascii_case("all") => Self::All,
            Some(value) => Self::Theme(value.to_string()),
        }
    }

    /// Whether a prompt with `theme` passes this filter. Unthemed prompts
    /// never match.
    pub fn matches(&self, theme: Option<&str>) -> bool {
        match (self, theme) {
            (_, None) => false,
            (Self::All, Some(_)) => true,
            (Self::Theme(wanted), Some(theme)) => theme.to_lowercase() == wanted.to_lowercase(),
        }
    }

    /// The concrete theme, if any.
    pub fn theme(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Theme(theme) => Some(theme),
        }
    }
}

// ---------------------------------------------------------------------------
// Ingestion fields
// ---------------------------------------------------------------------------

/// Trim an optional form field; blank values become `None`.
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validate and trim the required prompt text.
pub fn require_prompt_text(value: Option<String>) -> Result<String, CoreError> {
    normalize_optional(value).ok_or_else(|| CoreError::Validation("prompt is required".into()))
}

/// Parse a required id field. Absent or blank is "`field` is required";
/// anything that is not a UUID is rejected too.
pub fn require_id(field: &str, value: Option<&str>) -> Result<DbId, CoreError> {
    let raw = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| CoreError::Validation(format!("{field} is required")))?;
    DbId::parse_str(raw).map_err(|_| CoreError::Validation(format!("{field} must be a UUID")))
}

/// Whether a declared content type is an image type.
pub fn is_image_content_type(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| ct.trim().to_ascii_lowercase().starts_with("image/"))
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Usage assigned on promotion: one above the group's current maximum, and
/// never below `floor`.
pub fn featured_usage(current_group_max: i64, floor: i64) -> i64 {
    current_group_max.saturating_add(1).max(floor)
}

/// Clamp a requested signed URL lifetime.
pub fn clamp_signed_url_ttl(ttl_secs: Option<u64>) -> u64 {
    ttl_secs
        .unwrap_or(DEFAULT_SIGNED_URL_TTL_SECS)
        .clamp(MIN_SIGNED_URL_TTL_SECS, MAX_SIGNED_URL_TTL_SECS)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn clamp_limit_bounds() {
        assert_eq!(clamp_limit(None, 50, 50), 50);
        assert_eq!(clamp_limit(Some(0), 50, 50), 1);
        assert_eq!(clamp_limit(Some(500), 50, 50), 50);
        assert_eq!(clamp_limit(Some(20), 50, 50), 20);
    }

    #[test]
    fn clamp_page_floors_at_one() {
        assert_eq!(clamp_page(None), 1);
        assert_eq!(clamp_page(Some(-3)), 1);
        assert_eq!(clamp_page(Some(4)), 4);
    }

    #[test]
    fn pagination_of_127_items_by_50() {
        let items: Vec<i64> = (0..127).collect();

        let sizes: Vec<usize> = (1..=4)
            .map(|page| PageWindow::new(Some(page), Some(50)).slice(&items).len())
            .collect();
        assert_eq!(sizes, vec![50, 50, 27, 0]);

        let third = PageWindow::new(Some(3), None);
        assert_eq!(third.offset(), 100);
        assert_eq!(third.slice(&items)[0], 100);
    }

    #[test]
    fn theme_filter_parse_and_match() {
        assert_eq!(ThemeFilter::parse(None), ThemeFilter::All);
        assert_eq!(ThemeFilter::parse(Some("ALL")), ThemeFilter::All);
        assert_eq!(ThemeFilter::parse(Some("  ")), ThemeFilter::All);

        let holiday = ThemeFilter::parse(Some("Holiday"));
        assert!(holiday.matches(Some("holiday")));
        assert!(holiday.matches(Some("HOLIDAY")));
        assert!(!holiday.matches(Some("halloween")));
        assert!(!holiday.matches(None));

        assert!(ThemeFilter::All.matches(Some("anything")));
        assert!(!ThemeFilter::All.matches(None));
    }

    #[test]
    fn optional_fields_are_trimmed() {
        assert_eq!(normalize_optional(Some("  ".into())), None);
        assert_eq!(normalize_optional(Some(" holiday ".into())), Some("holiday".into()));
        assert_eq!(normalize_optional(None), None);
    }

    #[test]
    fn prompt_text_is_required() {
        assert_matches!(require_prompt_text(None), Err(CoreError::Validation(_)));
        assert_matches!(require_prompt_text(Some("".into())), Err(CoreError::Validation(_)));
        assert_eq!(
            require_prompt_text(Some("  A {{pet_by_breed}} portrait ".into())).unwrap(),
            "A {{pet_by_breed}} portrait"
        );
    }

    #[test]
    fn image_content_types() {
        assert!(is_image_content_type(Some("image/png")));
        assert!(is_image_content_type(Some("IMAGE/JPEG")));
        assert!(!is_image_content_type(Some("application/pdf")));
        assert!(!is_image_content_type(None));
    }

    #[test]
    fn ids_are_required_and_parsed() {
        assert_matches!(
            require_id("prompt_id", None),
            Err(CoreError::Validation(msg)) if msg == "prompt_id is required"
        );
        assert_matches!(require_id("prompt_id", Some(" ")), Err(CoreError::Validation(_)));
        assert_matches!(
            require_id("prompt_id", Some("42")),
            Err(CoreError::Validation(msg)) if msg == "prompt_id must be a UUID"
        );
        let id = DbId::new_v4();
        assert_eq!(require_id("prompt_id", Some(&id.to_string())).unwrap(), id);
    }

    #[test]
    fn signed_url_ttl_is_clamped() {
        assert_eq!(clamp_signed_url_ttl(None), 3600);
        assert_eq!(clamp_signed_url_ttl(Some(1)), 60);
        assert_eq!(clamp_signed_url_ttl(Some(900)), 900);
        assert_eq!(clamp_signed_url_ttl(Some(u64::MAX)), 604_800);
    }

    #[test]
    fn featured_usage_formula() {
        assert_eq!(featured_usage(0, FEATURED_USAGE_FLOOR), 1000);
        assert_eq!(featured_usage(998, FEATURED_USAGE_FLOOR), 1000);
        assert_eq!(featured_usage(1000, FEATURED_USAGE_FLOOR), 1001);
        assert_eq!(featured_usage(5000, FEATURED_USAGE_FLOOR), 5001);
    }
}
