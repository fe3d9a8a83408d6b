//! Client-side search, status filter and pagination over the fetched list.

use std::str::FromStr;

use crate::{
    error::BursaryError,
    models::{Application, ApplicationStatus},
    utils::format_amount,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(ApplicationStatus),
}

impl StatusFilter {
    pub fn matches(&self, application: &Application) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(status) => application.application_status == *status,
        }
    }

    /// All → Pending → Approved → Rejected → All
    pub fn next(self) -> Self {
        match self {
            StatusFilter::All => StatusFilter::Only(ApplicationStatus::Pending),
            StatusFilter::Only(ApplicationStatus::Pending) => {
                StatusFilter::Only(ApplicationStatus::Approved)
            }
            StatusFilter::Only(ApplicationStatus::Approved) => {
                StatusFilter::Only(ApplicationStatus::Rejected)
            }
            StatusFilter::Only(ApplicationStatus::Rejected) => StatusFilter::All,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Only(status) => status.as_str(),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = BursaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        ApplicationStatus::from_str(s)
            .map(StatusFilter::Only)
            .map_err(BursaryError::InvalidInput)
    }
}

/// Case-insensitive substring match across the searchable columns. An empty
/// query matches everything.
pub fn matches_query(application: &Application, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }

    let amount = &application.amount_applied_for;
    let haystack = [
        application.applicant_full_name.as_str(),
        application.admission_number.as_str(),
        application.school_name.as_str(),
        application.enrolled_course.as_str(),
        application.year_of_study.as_str(),
        application.application_status.as_str(),
        application.batch_label().unwrap_or_default(),
    ];

    haystack
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
        || amount.to_string().to_lowercase().contains(&needle)
        || format_amount(amount.amount).contains(&needle)
        || amount.amount.to_string().contains(&needle)
}

pub fn filter<'a>(
    applications: &'a [Application],
    query: &str,
    status: StatusFilter,
) -> Vec<&'a Application> {
    applications
        .iter()
        .filter(|app| status.matches(app) && matches_query(app, query))
        .collect()
}

/// One page of a filtered list
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a> {
    pub items: Vec<&'a Application>,
    /// 1-based, already clamped
    pub number: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl Page<'_> {
    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn label(&self) -> String {
        format!(
            "Page {} of {} ({} applications)",
            self.number, self.total_pages, self.total_items
        )
    }
}

pub fn total_pages(total_items: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);
    total_items.div_ceil(page_size).max(1)
}

/// Slice `items` into page `requested`, clamped to `[1, total_pages]`
pub fn paginate<'a>(items: &[&'a Application], requested: usize, page_size: usize) -> Page<'a> {
    let page_size = page_size.max(1);
    let total_pages = total_pages(items.len(), page_size);
    let number = requested.clamp(1, total_pages);

    let start = (number - 1) * page_size;
    let end = (start + page_size).min(items.len());
    let slice = if start < items.len() {
        items[start..end].to_vec()
    } else {
        Vec::new()
    };

    Page {
        items: slice,
        number,
        total_pages,
        total_items: items.len(),
    }
}
