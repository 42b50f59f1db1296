//! Integration tests for the knowledge store against the shipped documents.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::tempdir;
use walkdir::WalkDir;

use trainbot_kb::{
    CourseFilter, CourseType, DocumentKind, KnowledgeError, KnowledgeStore, KnowledgeValidator,
    MenuKind,
};

fn knowledge_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../../knowledge"))
}

/// Copy the shipped knowledge directory into `dest`.
fn copy_knowledge(dest: &Path) {
    let src = knowledge_dir();
    for entry in WalkDir::new(&src).into_iter().filter_map(|e| e.ok()) {
        let relative = entry.path().strip_prefix(&src).unwrap();
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).unwrap();
        } else {
            fs::copy(entry.path(), &target).unwrap();
        }
    }
}

#[test]
fn test_shipped_knowledge_loads_and_validates() {
    let store = KnowledgeStore::new(knowledge_dir());
    store.load_all().unwrap();

    let result = KnowledgeValidator::validate(&store);
    assert!(result.valid, "Validation failed: {:?}", result.errors);
    assert!(result
        .counts
        .iter()
        .any(|(kind, count)| *kind == DocumentKind::CourseList && *count > 0));
}

#[test]
fn test_course_queries() {
    let store = KnowledgeStore::new(knowledge_dir());

    let unemployed = store
        .query_courses(&CourseFilter::by_type(CourseType::Unemployed))
        .unwrap();
    assert!(unemployed.len() > 5, "pagination fixtures need more than one page");
    assert!(unemployed
        .iter()
        .all(|c| c.course_type == CourseType::Unemployed));

    // Priority ascending, missing priority last.
    let priorities: Vec<u32> = unemployed
        .iter()
        .map(|c| c.priority.unwrap_or(u32::MAX))
        .collect();
    let mut sorted = priorities.clone();
    sorted.sort();
    assert_eq!(priorities, sorted);

    let featured = store.query_courses(&CourseFilter::featured()).unwrap();
    assert!(!featured.is_empty());
    assert!(featured.iter().all(|c| c.featured));

    let ai = store.query_courses(&CourseFilter::keyword("AI")).unwrap();
    assert!(ai.iter().any(|c| c.course_type == CourseType::Employed));
    assert!(ai.iter().any(|c| c.course_type == CourseType::Unemployed));
}

#[test]
fn test_catalog_numbers_round_trip() {
    let store = KnowledgeStore::new(knowledge_dir());
    let catalog = store.catalog().unwrap();

    for course in catalog.courses() {
        let number = course.global_number.expect("every course has a catalog number");
        assert_eq!(store.course_by_number(number).unwrap().unwrap().id, course.id);
        assert_eq!(store.course_by_id(course.id).unwrap().unwrap().global_number, Some(number));
    }
    assert!(store.course_by_number(999).unwrap().is_none());
}

#[test]
fn test_faq_and_menus() {
    let store = KnowledgeStore::new(knowledge_dir());

    let all = store.search_general_faq(None).unwrap();
    assert_eq!(all.len(), store.general_faq().unwrap().faqs.len());
    // Entries without a priority sort last.
    assert!(all.last().unwrap().priority.is_none());

    let hits = store.search_general_faq(Some("報名")).unwrap();
    assert!(!hits.is_empty());

    assert!(!store.menu(MenuKind::Main).unwrap().is_empty());
    assert_eq!(
        store.menu(MenuKind::Subsidy).unwrap(),
        vec!["我是在職者", "我是待業者", "不確定身份"]
    );

    let process = store.enrollment_process(CourseType::Unemployed).unwrap();
    assert!(process.steps.windows(2).all(|w| w[0].step < w[1].step));
}

#[test]
fn test_malformed_document_reports_name() {
    let temp = tempdir().unwrap();
    copy_knowledge(temp.path());
    fs::write(
        temp.path().join("faq/general_faq.json"),
        r#"{ "faqs": [ { "question": "缺少答案" } ] }"#,
    )
    .unwrap();

    let store = KnowledgeStore::new(temp.path());
    let err = store.general_faq().unwrap_err();
    assert!(matches!(err, KnowledgeError::Malformed { .. }));
    assert!(err.to_string().contains("faq/general_faq.json"));

    // Other documents are unaffected.
    assert!(store.subsidy_faq().is_ok());
}

#[test]
fn test_missing_document_reports_name() {
    let temp = tempdir().unwrap();
    copy_knowledge(temp.path());
    fs::remove_file(temp.path().join("contacts/service_info.json")).unwrap();

    let store = KnowledgeStore::new(temp.path());
    let err = store.service_info().unwrap_err();
    assert!(matches!(err, KnowledgeError::NotFound { .. }));
    assert_eq!(err.document(), "contacts/service_info.json");

    let result = KnowledgeValidator::validate(&store);
    assert!(!result.valid);
    assert!(result.errors.iter().any(|e| e.contains("service_info.json")));
}

#[test]
fn test_broken_mapping_rejected_at_load() {
    let temp = tempdir().unwrap();
    copy_knowledge(temp.path());
    fs::write(
        temp.path().join("courses/course_mapping.json"),
        r#"{ "number_to_id": { "1": 101, "2": 101 } }"#,
    )
    .unwrap();

    let store = KnowledgeStore::new(temp.path());
    let err = store.catalog().unwrap_err();
    assert!(matches!(err, KnowledgeError::Inconsistent { .. }));
    assert_eq!(err.document(), "courses/course_mapping.json");
}

#[test]
fn test_invalidate_reloads_from_disk() {
    let temp = tempdir().unwrap();
    copy_knowledge(temp.path());

    let store = KnowledgeStore::new(temp.path());
    let before = store.general_faq().unwrap();

    fs::write(
        temp.path().join("faq/general_faq.json"),
        r#"{ "faqs": [ { "question": "新問題", "answer": "新答案" } ] }"#,
    )
    .unwrap();

    // Still served from cache.
    assert_eq!(store.general_faq().unwrap().faqs.len(), before.faqs.len());

    store.invalidate();
    let after = store.general_faq().unwrap();
    assert_eq!(after.faqs.len(), 1);
    assert_eq!(after.faqs[0].question, "新問題");
}

#[test]
fn test_stray_files_are_warnings() {
    let temp = tempdir().unwrap();
    copy_knowledge(temp.path());
    fs::write(temp.path().join("faq/old_faq.json"), "{}").unwrap();

    let store = KnowledgeStore::new(temp.path());
    let result = KnowledgeValidator::validate(&store);
    assert!(result.valid, "Validation failed: {:?}", result.errors);
    assert!(result.warnings.iter().any(|w| w.contains("old_faq.json")));
}
