//! Knowledge directory validation.

use std::collections::HashSet;
use std::path::PathBuf;

use tracing::debug;
use walkdir::WalkDir;

use crate::error::KnowledgeError;
use crate::models::{CourseType, DocumentKind, FaqDocument, MenuKind};
use crate::store::KnowledgeStore;

/// Validation result with details.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Per-document entry counts, in load order.
    pub counts: Vec<(DocumentKind, usize)>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            ..Self::default()
        }
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(message.into());
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn merge(&mut self, other: ValidationResult) {
        if !other.valid {
            self.valid = false;
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.counts.extend(other.counts);
    }
}

/// Validator for a knowledge directory.
pub struct KnowledgeValidator;

impl KnowledgeValidator {
    /// Load every document through `store` and report problems.
    ///
    /// Load failures become errors rather than aborting, so one run lists
    /// every broken document.
    pub fn validate(store: &KnowledgeStore) -> ValidationResult {
        let mut result = ValidationResult::new();

        result.merge(Self::validate_courses(store));
        for status in [CourseType::Employed, CourseType::Unemployed] {
            result.merge(Self::validate_subsidy(store, status));
        }
        result.merge(Self::validate_faq(DocumentKind::SubsidyFaq, store.subsidy_faq()));
        result.merge(Self::validate_faq(DocumentKind::GeneralFaq, store.general_faq()));
        result.merge(Self::validate_enrollment(store));
        result.merge(Self::validate_service_info(store));
        result.merge(Self::validate_responses(store));
        result.merge(Self::validate_menus(store));
        result.merge(Self::validate_layout(store));

        result
    }

    fn load_error(result: &mut ValidationResult, err: KnowledgeError) {
        result.add_error(err.to_string());
    }

    fn validate_courses(store: &KnowledgeStore) -> ValidationResult {
        let mut result = ValidationResult::new();
        let catalog = match store.catalog() {
            Ok(catalog) => catalog,
            Err(e) => {
                Self::load_error(&mut result, e);
                return result;
            }
        };

        if catalog.is_empty() {
            result.add_warning("Course list is empty");
        }

        for course in catalog.courses() {
            if course.course_name.trim().is_empty() {
                result.add_error(format!("Course {} has an empty name", course.id));
            }
            if course.content.trim().is_empty() {
                result.add_warning(format!(
                    "Course '{}' has no content description",
                    course.course_name
                ));
            }
            if course.keywords.is_empty() {
                result.add_warning(format!(
                    "Course '{}' has no keywords and will not appear in searches",
                    course.course_name
                ));
            }
        }

        result.counts.push((DocumentKind::CourseList, catalog.len()));
        result
    }

    fn validate_subsidy(store: &KnowledgeStore, status: CourseType) -> ValidationResult {
        let mut result = ValidationResult::new();
        let kind = match status {
            CourseType::Employed => DocumentKind::EmployedRules,
            CourseType::Unemployed => DocumentKind::UnemployedRules,
        };

        match store.subsidy_rules(status) {
            Ok(rules) => {
                if rules.rules.is_empty() {
                    result.add_error(format!("{} defines no rules", kind));
                }
                for (rule, identity) in rules.special_identities() {
                    if identity.documents.is_empty() {
                        result.add_warning(format!(
                            "Identity '{}' in rule '{}' lists no documents",
                            identity.name, rule.title
                        ));
                    }
                }
                result.counts.push((kind, rules.rules.len()));
            }
            Err(e) => Self::load_error(&mut result, e),
        }

        result
    }

    fn validate_faq(
        kind: DocumentKind,
        doc: Result<std::sync::Arc<FaqDocument>, KnowledgeError>,
    ) -> ValidationResult {
        let mut result = ValidationResult::new();
        let doc = match doc {
            Ok(doc) => doc,
            Err(e) => {
                Self::load_error(&mut result, e);
                return result;
            }
        };

        let mut seen = HashSet::new();
        for faq in &doc.faqs {
            if faq.answer.trim().is_empty() {
                result.add_error(format!("{}: '{}' has an empty answer", kind, faq.question));
            }
            if !seen.insert(faq.question.as_str()) {
                result.add_warning(format!("{}: duplicate question '{}'", kind, faq.question));
            }
        }

        result.counts.push((kind, doc.faqs.len()));
        result
    }

    fn validate_enrollment(store: &KnowledgeStore) -> ValidationResult {
        let mut result = ValidationResult::new();
        match store.enrollment() {
            Ok(doc) => {
                for track in [CourseType::Employed, CourseType::Unemployed] {
                    if doc.process(track).steps.is_empty() {
                        result.add_error(format!(
                            "Enrollment process for {} courses has no steps",
                            track.label()
                        ));
                    }
                }
                let steps = doc.employed_process.steps.len() + doc.unemployed_process.steps.len();
                result.counts.push((DocumentKind::EnrollmentProcess, steps));
            }
            Err(e) => Self::load_error(&mut result, e),
        }
        result
    }

    fn validate_service_info(store: &KnowledgeStore) -> ValidationResult {
        let mut result = ValidationResult::new();
        match store.service_info() {
            Ok(info) => {
                if info.contact.phone.display.trim().is_empty() {
                    result.add_error("Service info has no phone number");
                }
                if info.contact.line.link.trim().is_empty() {
                    result.add_warning("Service info has no LINE link");
                }
                result.counts.push((DocumentKind::ServiceInfo, 1));
            }
            Err(e) => Self::load_error(&mut result, e),
        }
        result
    }

    fn validate_responses(store: &KnowledgeStore) -> ValidationResult {
        let mut result = ValidationResult::new();
        match store.default_responses() {
            Ok(responses) => {
                if responses.greeting(None).is_none() {
                    result.add_error("Default responses define no greeting");
                }
                if responses.unknown().is_none() {
                    result.add_error("Default responses define no unknown-intent reply");
                }
                result.counts.push((
                    DocumentKind::DefaultResponses,
                    responses.greetings.responses.len() + responses.unknown.responses.len(),
                ));
            }
            Err(e) => Self::load_error(&mut result, e),
        }
        result
    }

    fn validate_menus(store: &KnowledgeStore) -> ValidationResult {
        let mut result = ValidationResult::new();
        match store.quick_options() {
            Ok(config) => {
                for menu in [MenuKind::Main, MenuKind::Course, MenuKind::Subsidy] {
                    if config.menu(menu).is_empty() {
                        result.add_warning(format!(
                            "Menu '{}' is not configured; built-in defaults will be used",
                            menu.key()
                        ));
                    }
                }
                result
                    .counts
                    .push((DocumentKind::QuickOptions, config.all_labels().count()));
            }
            Err(e) => Self::load_error(&mut result, e),
        }
        result
    }

    /// Warn about JSON files the store never reads.
    fn validate_layout(store: &KnowledgeStore) -> ValidationResult {
        let mut result = ValidationResult::new();
        let known: HashSet<PathBuf> = DocumentKind::ALL
            .iter()
            .map(|kind| store.document_path(*kind))
            .collect();

        for entry in WalkDir::new(store.root())
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") && !known.contains(path) {
                debug!("Unrecognized knowledge file {:?}", path);
                result.add_warning(format!("Unrecognized knowledge file: {}", path.display()));
            }
        }

        result
    }
}
