//! Typed per-conversation context shared by every agent.

use serde::Serialize;
use trainbot_kb::{Course, CourseType, FaqEntry};

/// Courses shown per page.
pub const PAGE_SIZE: usize = 5;

/// What the assistant last presented, used to interpret short follow-ups.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LastAction {
    #[default]
    None,
    CourseList,
    FeaturedList,
    SearchResult,
    FaqList,
    SubsidyInfo,
    SubsidyQuestion,
    PromptSearch,
}

impl LastAction {
    /// Whether a paginated course list is on screen.
    pub fn is_course_listing(&self) -> bool {
        matches!(self, Self::CourseList | Self::FeaturedList | Self::SearchResult)
    }

    pub fn is_subsidy(&self) -> bool {
        matches!(self, Self::SubsidyInfo | Self::SubsidyQuestion)
    }
}

/// Applicant employment status. Sticky once known.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentStatus {
    #[default]
    Unknown,
    Employed,
    Unemployed,
}

impl EmploymentStatus {
    pub fn course_type(&self) -> Option<CourseType> {
        match self {
            Self::Unknown => None,
            Self::Employed => Some(CourseType::Employed),
            Self::Unemployed => Some(CourseType::Unemployed),
        }
    }

    pub fn is_known(&self) -> bool {
        *self != Self::Unknown
    }
}

impl From<CourseType> for EmploymentStatus {
    fn from(value: CourseType) -> Self {
        match value {
            CourseType::Employed => Self::Employed,
            CourseType::Unemployed => Self::Unemployed,
        }
    }
}

/// Conversation context.
///
/// The open course list, its page offset and the search keyword change
/// together through [`ConversationContext::open_course_list`] and
/// [`ConversationContext::advance_page`], which keeps the offset within the
/// list.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversationContext {
    pub last_action: LastAction,
    /// Course most recently shown in detail.
    pub last_course: Option<Course>,
    pub employment_status: EmploymentStatus,
    /// FAQ candidates offered for numeric selection.
    pub faq_results: Vec<FaqEntry>,
    search_keyword: String,
    display_offset: usize,
    current_course_list: Vec<Course>,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the open list, rewinding to the first page.
    pub fn open_course_list(
        &mut self,
        kind: LastAction,
        courses: Vec<Course>,
        keyword: Option<String>,
    ) {
        self.last_action = kind;
        self.current_course_list = courses;
        self.display_offset = 0;
        self.search_keyword = keyword.unwrap_or_default();
    }

    /// Move to the next page. Returns `false` and leaves the offset unchanged
    /// when the current page is the last one.
    pub fn advance_page(&mut self) -> bool {
        if self.display_offset + PAGE_SIZE >= self.current_course_list.len() {
            return false;
        }
        self.display_offset += PAGE_SIZE;
        true
    }

    /// Whether a non-empty course list is open for paging and selection.
    pub fn has_open_list(&self) -> bool {
        self.last_action.is_course_listing() && !self.current_course_list.is_empty()
    }

    pub fn display_offset(&self) -> usize {
        self.display_offset
    }

    pub fn search_keyword(&self) -> &str {
        &self.search_keyword
    }

    pub fn course_list(&self) -> &[Course] {
        &self.current_course_list
    }

    /// Courses on the current page.
    pub fn current_page(&self) -> &[Course] {
        let start = self.display_offset.min(self.current_course_list.len());
        let end = (start + PAGE_SIZE).min(self.current_course_list.len());
        &self.current_course_list[start..end]
    }

    /// Whether courses remain after the current page.
    pub fn has_more(&self) -> bool {
        self.display_offset + PAGE_SIZE < self.current_course_list.len()
    }

    /// Resolve a page-relative label (1-based) to a course.
    pub fn course_on_page(&self, label: usize) -> Option<&Course> {
        label
            .checked_sub(1)
            .and_then(|index| self.current_page().get(index))
    }

    /// Drop the cached FAQ candidates.
    pub fn clear_faq(&mut self) {
        self.faq_results.clear();
        if self.last_action == LastAction::FaqList {
            self.last_action = LastAction::None;
        }
    }

    /// Whether anything has been recorded.
    pub fn is_set(&self) -> bool {
        self.last_action != LastAction::None
            || self.last_course.is_some()
            || self.employment_status.is_known()
            || !self.faq_results.is_empty()
            || !self.current_course_list.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use trainbot_kb::{Fee, Location, Schedule};

    pub(crate) fn course(id: u32) -> Course {
        Course {
            id,
            global_number: Some(id),
            course_type: CourseType::Unemployed,
            course_name: format!("課程{}", id),
            full_name: None,
            schedule: Schedule {
                total_hours: 100,
                class_time: "週一至週五".to_string(),
                start_date: None,
                enrollment_deadline: None,
            },
            fee: Fee {
                amount: "免費".to_string(),
                note: None,
            },
            location: Location {
                address: "桃園市".to_string(),
                note: None,
            },
            content: String::new(),
            keywords: Vec::new(),
            featured: false,
            priority: None,
            url: None,
            eligibility: None,
            capacity: None,
            interview: None,
            related_questions: Vec::new(),
        }
    }

    fn courses(n: u32) -> Vec<Course> {
        (1..=n).map(course).collect()
    }

    #[test]
    fn test_open_list_resets_offset_and_keyword() {
        let mut ctx = ConversationContext::new();
        ctx.open_course_list(LastAction::SearchResult, courses(12), Some("AI".to_string()));
        assert!(ctx.advance_page());
        assert_eq!(ctx.display_offset(), 5);

        ctx.open_course_list(LastAction::CourseList, courses(3), None);
        assert_eq!(ctx.display_offset(), 0);
        assert_eq!(ctx.search_keyword(), "");
        assert_eq!(ctx.current_page().len(), 3);
    }

    #[test]
    fn test_pagination_stops_at_last_page() {
        let mut ctx = ConversationContext::new();
        ctx.open_course_list(LastAction::CourseList, courses(12), None);

        assert!(ctx.has_more());
        assert!(ctx.advance_page());
        assert!(ctx.advance_page());
        assert_eq!(ctx.display_offset(), 10);
        assert_eq!(ctx.current_page().len(), 2);
        assert!(!ctx.has_more());

        assert!(!ctx.advance_page());
        assert_eq!(ctx.display_offset(), 10);
    }

    #[test]
    fn test_exact_multiple_of_page_size() {
        let mut ctx = ConversationContext::new();
        ctx.open_course_list(LastAction::CourseList, courses(10), None);
        assert!(ctx.advance_page());
        assert!(!ctx.advance_page());
        assert_eq!(ctx.display_offset(), 5);
    }

    #[test]
    fn test_page_relative_labels() {
        let mut ctx = ConversationContext::new();
        ctx.open_course_list(LastAction::CourseList, courses(7), None);
        assert_eq!(ctx.course_on_page(3).unwrap().id, 3);

        ctx.advance_page();
        assert_eq!(ctx.course_on_page(1).unwrap().id, 6);
        assert_eq!(ctx.course_on_page(2).unwrap().id, 7);
        assert!(ctx.course_on_page(3).is_none());
        assert!(ctx.course_on_page(0).is_none());
    }

    #[test]
    fn test_clear_faq_only_resets_faq_action() {
        let mut ctx = ConversationContext::new();
        ctx.last_action = LastAction::SubsidyInfo;
        ctx.clear_faq();
        assert_eq!(ctx.last_action, LastAction::SubsidyInfo);

        ctx.last_action = LastAction::FaqList;
        ctx.clear_faq();
        assert_eq!(ctx.last_action, LastAction::None);
        assert!(!ctx.is_set());
    }
}
