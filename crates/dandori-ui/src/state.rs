//! Presentation-only state.
//! Conversation state lives in `dandori_core::store::ChatStore`; this is
//! just what the panels need between frames.

use std::collections::HashSet;

use serde_json::Value;

use dandori_types::course::UserProfile;

/// Which main view is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Chat,
    Courses,
}

/// Sort order for the course grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    Relevance,
    PriceLow,
    PriceHigh,
    Rating,
}

impl SortBy {
    pub fn all() -> &'static [SortBy] {
        &[
            SortBy::Relevance,
            SortBy::PriceLow,
            SortBy::PriceHigh,
            SortBy::Rating,
        ]
    }

    pub fn label(&self) -> &str {
        match self {
            SortBy::Relevance => "Relevance",
            SortBy::PriceLow => "Price: low to high",
            SortBy::PriceHigh => "Price: high to low",
            SortBy::Rating => "Rating",
        }
    }
}

pub const DEFAULT_PRICE_RANGE: (f64, f64) = (0.0, 500.0);

/// Client-side filters over a fetched course list
#[derive(Debug, Clone)]
pub struct CourseFilters {
    pub location: String,
    pub course_type: String,
    pub price_range: (f64, f64),
    pub sort_by: SortBy,
}

impl Default for CourseFilters {
    fn default() -> Self {
        Self {
            location: String::new(),
            course_type: String::new(),
            price_range: DEFAULT_PRICE_RANGE,
            sort_by: SortBy::Relevance,
        }
    }
}

pub struct UiState {
    pub view: View,
    /// Chat input field content
    pub input_text: String,
    /// Tool bubbles the user has expanded, by tool-call id
    pub expanded_tools: HashSet<String>,
    pub show_settings: bool,

    // Course search
    pub search_query: String,
    pub courses: Vec<Value>,
    pub filters: CourseFilters,
    pub is_searching: bool,

    // Session
    pub api_base: String,
    pub profile: Option<UserProfile>,
    pub login_email: String,
    pub login_password: String,
    pub auth_feedback: Option<String>,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            view: View::Chat,
            input_text: String::new(),
            expanded_tools: HashSet::new(),
            show_settings: false,
            search_query: String::new(),
            courses: Vec::new(),
            filters: CourseFilters::default(),
            is_searching: false,
            api_base: String::new(),
            profile: None,
            login_email: String::new(),
            login_password: String::new(),
            auth_feedback: None,
        }
    }

    pub fn toggle_tool_expanded(&mut self, id: &str) {
        if !self.expanded_tools.remove(id) {
            self.expanded_tools.insert(id.to_string());
        }
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}
