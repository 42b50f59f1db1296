//! Knowledge document models.
//!
//! Every document is a self-describing JSON record. Field names follow the
//! on-disk format, so most structs deserialize directly without renames.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Known knowledge documents, in load order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DocumentKind {
    CourseList,
    CourseMapping,
    EmployedRules,
    UnemployedRules,
    SubsidyFaq,
    GeneralFaq,
    EnrollmentProcess,
    ServiceInfo,
    DefaultResponses,
    QuickOptions,
}

impl DocumentKind {
    /// All documents the store knows about.
    pub const ALL: [DocumentKind; 10] = [
        Self::CourseList,
        Self::CourseMapping,
        Self::EmployedRules,
        Self::UnemployedRules,
        Self::SubsidyFaq,
        Self::GeneralFaq,
        Self::EnrollmentProcess,
        Self::ServiceInfo,
        Self::DefaultResponses,
        Self::QuickOptions,
    ];

    /// Path relative to the knowledge root.
    pub fn relative_path(&self) -> &'static str {
        match self {
            Self::CourseList => "courses/course_list.json",
            Self::CourseMapping => "courses/course_mapping.json",
            Self::EmployedRules => "subsidy/employed_rules.json",
            Self::UnemployedRules => "subsidy/unemployed_rules.json",
            Self::SubsidyFaq => "subsidy/subsidy_faq.json",
            Self::GeneralFaq => "faq/general_faq.json",
            Self::EnrollmentProcess => "faq/enrollment_process.json",
            Self::ServiceInfo => "contacts/service_info.json",
            Self::DefaultResponses => "greetings/default_responses.json",
            Self::QuickOptions => "quick_options/button_config.json",
        }
    }

    /// Human readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::CourseList => "Course List",
            Self::CourseMapping => "Course Mapping",
            Self::EmployedRules => "Employed Subsidy Rules",
            Self::UnemployedRules => "Unemployed Subsidy Rules",
            Self::SubsidyFaq => "Subsidy FAQ",
            Self::GeneralFaq => "General FAQ",
            Self::EnrollmentProcess => "Enrollment Process",
            Self::ServiceInfo => "Service Info",
            Self::DefaultResponses => "Default Responses",
            Self::QuickOptions => "Quick Options",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.relative_path())
    }
}

// ----------------------------------------------------------------------------
// Courses
// ----------------------------------------------------------------------------

/// Course track, which doubles as the applicant's employment type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CourseType {
    Employed,
    Unemployed,
}

impl CourseType {
    /// Short Chinese label (在職 / 待業).
    pub fn label(&self) -> &'static str {
        match self {
            Self::Employed => "在職",
            Self::Unemployed => "待業",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Schedule {
    pub total_hours: u32,
    pub class_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrollment_deadline: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Fee {
    pub amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A catalogued course.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Course {
    pub id: u32,
    /// Catalog number, attached from the mapping document at load time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_number: Option<u32>,
    #[serde(rename = "type")]
    pub course_type: CourseType,
    pub course_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub schedule: Schedule,
    pub fee: Fee,
    pub location: Location,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Who the course admits (招生對象 / 資格).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eligibility: Option<String>,
    /// Seats per class.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    /// Admission interview or test arrangements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interview: Option<String>,
    #[serde(default)]
    pub related_questions: Vec<String>,
}

impl Course {
    /// Case-insensitive match against name, full name, content and keywords.
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        let needle = keyword.to_lowercase();
        if needle.is_empty() {
            return false;
        }
        let contains = |text: &str| text.to_lowercase().contains(&needle);

        contains(&self.course_name)
            || self.full_name.as_deref().map_or(false, contains)
            || contains(&self.content)
            || self.keywords.iter().any(|kw| contains(kw))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseListDocument {
    pub courses: Vec<Course>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseMappingDocument {
    /// Catalog number (as a string key) to course id.
    pub number_to_id: BTreeMap<String, u32>,
}

/// Filters accepted by [`crate::KnowledgeStore::query_courses`].
#[derive(Debug, Clone, Default)]
pub struct CourseFilter {
    pub course_type: Option<CourseType>,
    pub featured_only: bool,
    pub keyword: Option<String>,
}

impl CourseFilter {
    pub fn by_type(course_type: CourseType) -> Self {
        Self {
            course_type: Some(course_type),
            ..Self::default()
        }
    }

    pub fn featured() -> Self {
        Self {
            featured_only: true,
            ..Self::default()
        }
    }

    pub fn keyword(keyword: impl Into<String>) -> Self {
        Self {
            keyword: Some(keyword.into()),
            ..Self::default()
        }
    }
}

// ----------------------------------------------------------------------------
// FAQ
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
    #[serde(default)]
    pub related_questions: Vec<String>,
}

impl FaqEntry {
    /// Case-insensitive substring match on question, answer or keywords.
    ///
    /// A keyword matches when either string contains the other, so both
    /// "報名" and "請問怎麼報名" hit an entry tagged with "報名".
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return false;
        }

        self.question.to_lowercase().contains(&query)
            || self.answer.to_lowercase().contains(&query)
            || self.keywords.iter().any(|kw| {
                let kw = kw.to_lowercase();
                !kw.is_empty() && (kw.contains(&query) || query.contains(&kw))
            })
    }

    /// Sort key: explicit priority first, missing priority last.
    pub fn sort_key(&self) -> u32 {
        self.priority.unwrap_or(u32::MAX)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqDocument {
    pub faqs: Vec<FaqEntry>,
}

// ----------------------------------------------------------------------------
// Subsidy
// ----------------------------------------------------------------------------

/// An applicant category that qualifies for the maximum subsidy rate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpecialIdentity {
    pub name: String,
    #[serde(default)]
    pub criteria: String,
    #[serde(default)]
    pub documents: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubsidyRule {
    pub title: String,
    pub subsidy_rate: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub special_identities: Vec<SpecialIdentity>,
    #[serde(default)]
    pub documents_required: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubsidyRuleSet {
    pub rules: Vec<SubsidyRule>,
}

impl SubsidyRuleSet {
    /// Every special identity across all rules, paired with its rule.
    pub fn special_identities(&self) -> impl Iterator<Item = (&SubsidyRule, &SpecialIdentity)> {
        self.rules
            .iter()
            .flat_map(|rule| rule.special_identities.iter().map(move |id| (rule, id)))
    }

    /// First note found in the rule set.
    pub fn note(&self) -> Option<&str> {
        self.rules.iter().find_map(|rule| rule.note.as_deref())
    }
}

// ----------------------------------------------------------------------------
// Enrollment
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrollmentStep {
    pub step: u32,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub documents: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrollmentProcess {
    pub title: String,
    pub steps: Vec<EnrollmentStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentDocument {
    pub employed_process: EnrollmentProcess,
    pub unemployed_process: EnrollmentProcess,
}

impl EnrollmentDocument {
    pub fn process(&self, track: CourseType) -> &EnrollmentProcess {
        match track {
            CourseType::Employed => &self.employed_process,
            CourseType::Unemployed => &self.unemployed_process,
        }
    }
}

// ----------------------------------------------------------------------------
// Service info
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoneContact {
    pub display: String,
    #[serde(default)]
    pub main: Vec<String>,
    pub available_hours: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineContact {
    pub id: String,
    pub link: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailContact {
    pub general: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressContact {
    pub full: String,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub phone: PhoneContact,
    pub line: LineContact,
    pub email: EmailContact,
    pub address: AddressContact,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceHours {
    pub weekdays: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekends: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub organization: Organization,
    pub contact: Contact,
    pub service_hours: ServiceHours,
}

// ----------------------------------------------------------------------------
// Canned responses and menus
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GreetingResponse {
    #[serde(default)]
    pub trigger: Vec<String>,
    pub response: String,
    #[serde(default)]
    pub quick_options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GreetingSet {
    pub responses: Vec<GreetingResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnknownResponse {
    pub default: String,
    #[serde(default)]
    pub quick_options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnknownSet {
    pub responses: Vec<UnknownResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultResponses {
    pub greetings: GreetingSet,
    pub unknown: UnknownSet,
}

impl DefaultResponses {
    /// Greeting whose trigger list contains `trigger`, else the first one.
    pub fn greeting(&self, trigger: Option<&str>) -> Option<&GreetingResponse> {
        trigger
            .and_then(|t| {
                self.greetings
                    .responses
                    .iter()
                    .find(|r| r.trigger.iter().any(|candidate| candidate == t))
            })
            .or_else(|| self.greetings.responses.first())
    }

    pub fn unknown(&self) -> Option<&UnknownResponse> {
        self.unknown.responses.first()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickOptionItem {
    pub label: String,
}

/// Named menus of quick options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuKind {
    Main,
    Course,
    Subsidy,
}

impl MenuKind {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Main => "main_menu",
            Self::Course => "course_menu",
            Self::Subsidy => "subsidy_menu",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickOptionConfig {
    pub quick_options: BTreeMap<String, Vec<QuickOptionItem>>,
    #[serde(default)]
    pub related_questions: BTreeMap<String, Vec<String>>,
}

impl QuickOptionConfig {
    /// Labels of a named menu; empty when the menu is not configured.
    pub fn menu(&self, menu: MenuKind) -> Vec<String> {
        self.quick_options
            .get(menu.key())
            .map(|items| items.iter().map(|item| item.label.clone()).collect())
            .unwrap_or_default()
    }

    /// Every label defined anywhere in the config.
    pub fn all_labels(&self) -> impl Iterator<Item = &str> {
        self.quick_options
            .values()
            .flat_map(|items| items.iter().map(|item| item.label.as_str()))
            .chain(self.related_questions.values().flatten().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn faq(question: &str, keywords: &[&str]) -> FaqEntry {
        FaqEntry {
            question: question.to_string(),
            answer: "答案".to_string(),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            priority: None,
            related_questions: Vec::new(),
        }
    }

    #[test]
    fn test_faq_matches_question_and_keywords() {
        let entry = faq("如何報名課程？", &["報名", "申請"]);
        assert!(entry.matches("報名"));
        assert!(entry.matches("請問要怎麼申請"));
        assert!(!entry.matches("停車"));
        assert!(!entry.matches("   "));
    }

    #[test]
    fn test_faq_sort_key_missing_priority_last() {
        let mut entry = faq("Q", &[]);
        assert_eq!(entry.sort_key(), u32::MAX);
        entry.priority = Some(3);
        assert_eq!(entry.sort_key(), 3);
    }

    #[test]
    fn test_course_type_deserialize() {
        let t: CourseType = serde_json::from_str("\"unemployed\"").unwrap();
        assert_eq!(t, CourseType::Unemployed);
        assert_eq!(t.label(), "待業");
    }

    #[test]
    fn test_document_paths_unique() {
        let mut paths: Vec<_> = DocumentKind::ALL.iter().map(|d| d.relative_path()).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), DocumentKind::ALL.len());
    }

    #[test]
    fn test_greeting_trigger_lookup() {
        let responses = DefaultResponses {
            greetings: GreetingSet {
                responses: vec![
                    GreetingResponse {
                        trigger: vec!["你好".to_string()],
                        response: "您好".to_string(),
                        quick_options: Vec::new(),
                    },
                    GreetingResponse {
                        trigger: vec!["謝謝".to_string()],
                        response: "不客氣".to_string(),
                        quick_options: Vec::new(),
                    },
                ],
            },
            unknown: UnknownSet { responses: Vec::new() },
        };

        assert_eq!(responses.greeting(Some("謝謝")).unwrap().response, "不客氣");
        assert_eq!(responses.greeting(Some("早安")).unwrap().response, "您好");
        assert!(responses.unknown().is_none());
    }
}
