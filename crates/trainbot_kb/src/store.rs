//! Knowledge store: lazy, process-wide cache over the JSON documents.

use std::any::Any;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::{KnowledgeError, KnowledgeResult};
use crate::models::{
    Course, CourseFilter, CourseListDocument, CourseMappingDocument, CourseType, DefaultResponses,
    DocumentKind, EnrollmentDocument, EnrollmentProcess, FaqDocument, FaqEntry, MenuKind,
    QuickOptionConfig, ServiceInfo, SubsidyRuleSet,
};

type CachedDocument = Arc<dyn Any + Send + Sync>;

/// Course list joined with the catalog-number mapping.
///
/// Construction checks that the id↔number mapping is a bijection over the
/// listed courses, and stamps each course with its catalog number.
#[derive(Debug, Clone)]
pub struct CourseCatalog {
    courses: Vec<Course>,
    number_to_id: BTreeMap<u32, u32>,
    id_to_number: HashMap<u32, u32>,
}

impl CourseCatalog {
    pub fn from_documents(
        list: CourseListDocument,
        mapping: CourseMappingDocument,
    ) -> KnowledgeResult<Self> {
        let mapping_doc = DocumentKind::CourseMapping.to_string();

        let mut ids = HashSet::new();
        for course in &list.courses {
            if !ids.insert(course.id) {
                return Err(KnowledgeError::inconsistent(
                    DocumentKind::CourseList.to_string(),
                    format!("duplicate course id {}", course.id),
                ));
            }
        }

        let mut number_to_id = BTreeMap::new();
        let mut id_to_number = HashMap::new();
        for (key, id) in &mapping.number_to_id {
            let number: u32 = key.trim().parse().map_err(|_| KnowledgeError::Malformed {
                document: mapping_doc.clone(),
                message: format!("catalog number '{}' is not an integer", key),
            })?;
            if !ids.contains(id) {
                return Err(KnowledgeError::inconsistent(
                    &mapping_doc,
                    format!("number {} points to unknown course id {}", number, id),
                ));
            }
            if id_to_number.insert(*id, number).is_some() {
                return Err(KnowledgeError::inconsistent(
                    &mapping_doc,
                    format!("course id {} has more than one catalog number", id),
                ));
            }
            if number_to_id.insert(number, *id).is_some() {
                return Err(KnowledgeError::inconsistent(
                    &mapping_doc,
                    format!("catalog number {} is listed twice", number),
                ));
            }
        }

        if let Some(orphan) = list.courses.iter().find(|c| !id_to_number.contains_key(&c.id)) {
            return Err(KnowledgeError::inconsistent(
                &mapping_doc,
                format!("course id {} has no catalog number", orphan.id),
            ));
        }

        let courses = list
            .courses
            .into_iter()
            .map(|mut course| {
                course.global_number = id_to_number.get(&course.id).copied();
                course
            })
            .collect();

        Ok(Self {
            courses,
            number_to_id,
            id_to_number,
        })
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    pub fn by_id(&self, id: u32) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == id)
    }

    pub fn by_number(&self, number: u32) -> Option<&Course> {
        self.number_to_id.get(&number).and_then(|id| self.by_id(*id))
    }

    pub fn number_of(&self, id: u32) -> Option<u32> {
        self.id_to_number.get(&id).copied()
    }

    /// Filter and order courses. Ordering is by priority (missing last),
    /// then by catalog order.
    pub fn query(&self, filter: &CourseFilter) -> Vec<Course> {
        let mut courses: Vec<Course> = self
            .courses
            .iter()
            .filter(|c| filter.course_type.map_or(true, |t| c.course_type == t))
            .filter(|c| !filter.featured_only || c.featured)
            .filter(|c| {
                filter
                    .keyword
                    .as_deref()
                    .map_or(true, |kw| c.matches_keyword(kw))
            })
            .cloned()
            .collect();

        courses.sort_by_key(|c| c.priority.unwrap_or(u32::MAX));
        courses
    }
}

/// Read-only knowledge store rooted at a directory of JSON documents.
///
/// Documents are parsed on first use and shared as `Arc`s. Concurrent first
/// readers may both parse a document; the first one stored wins and the
/// others reuse it. [`KnowledgeStore::invalidate`] drops the cache.
pub struct KnowledgeStore {
    root: PathBuf,
    cache: RwLock<HashMap<DocumentKind, CachedDocument>>,
}

impl KnowledgeStore {
    /// Create a store over `root`. Nothing is read until a document is needed.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a document.
    pub fn document_path(&self, kind: DocumentKind) -> PathBuf {
        self.root.join(kind.relative_path())
    }

    /// Drop every cached document; the next access reloads from disk.
    pub fn invalidate(&self) {
        let mut cache = self.cache.write();
        info!(documents = cache.len(), "Invalidating knowledge cache");
        cache.clear();
    }

    /// Eagerly load every document, failing on the first broken one.
    pub fn load_all(&self) -> KnowledgeResult<()> {
        self.catalog()?;
        self.subsidy_rules(CourseType::Employed)?;
        self.subsidy_rules(CourseType::Unemployed)?;
        self.subsidy_faq()?;
        self.general_faq()?;
        self.enrollment()?;
        self.service_info()?;
        self.default_responses()?;
        self.quick_options()?;
        Ok(())
    }

    /// Parse one document from disk without touching the cache.
    pub fn read_document<T: DeserializeOwned>(&self, kind: DocumentKind) -> KnowledgeResult<T> {
        let path = self.document_path(kind);
        debug!("Reading knowledge document {:?}", path);

        if !path.exists() {
            return Err(KnowledgeError::NotFound {
                document: kind.to_string(),
                path,
            });
        }

        let content = fs::read_to_string(&path).map_err(|source| KnowledgeError::Io {
            document: kind.to_string(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|e| KnowledgeError::Malformed {
            document: kind.to_string(),
            message: e.to_string(),
        })
    }

    fn cached<T, F>(&self, kind: DocumentKind, load: F) -> KnowledgeResult<Arc<T>>
    where
        T: Any + Send + Sync,
        F: FnOnce(&Self) -> KnowledgeResult<T>,
    {
        if let Some(doc) = self.cache.read().get(&kind).cloned() {
            if let Ok(doc) = doc.downcast::<T>() {
                return Ok(doc);
            }
        }

        let loaded = Arc::new(load(self)?);
        debug!(document = %kind, "Cached knowledge document");

        let stored = self
            .cache
            .write()
            .entry(kind)
            .or_insert_with(|| loaded.clone() as CachedDocument)
            .clone();

        Ok(stored.downcast::<T>().unwrap_or(loaded))
    }

    // ------------------------------------------------------------------
    // Courses
    // ------------------------------------------------------------------

    pub fn catalog(&self) -> KnowledgeResult<Arc<CourseCatalog>> {
        self.cached(DocumentKind::CourseList, |store| {
            let list = store.read_document(DocumentKind::CourseList)?;
            let mapping = store.read_document(DocumentKind::CourseMapping)?;
            CourseCatalog::from_documents(list, mapping)
        })
    }

    pub fn query_courses(&self, filter: &CourseFilter) -> KnowledgeResult<Vec<Course>> {
        Ok(self.catalog()?.query(filter))
    }

    pub fn course_by_id(&self, id: u32) -> KnowledgeResult<Option<Course>> {
        Ok(self.catalog()?.by_id(id).cloned())
    }

    pub fn course_by_number(&self, number: u32) -> KnowledgeResult<Option<Course>> {
        Ok(self.catalog()?.by_number(number).cloned())
    }

    // ------------------------------------------------------------------
    // Subsidy
    // ------------------------------------------------------------------

    pub fn subsidy_rules(&self, status: CourseType) -> KnowledgeResult<Arc<SubsidyRuleSet>> {
        let kind = match status {
            CourseType::Employed => DocumentKind::EmployedRules,
            CourseType::Unemployed => DocumentKind::UnemployedRules,
        };
        self.cached(kind, |store| store.read_document(kind))
    }

    pub fn subsidy_faq(&self) -> KnowledgeResult<Arc<FaqDocument>> {
        self.cached(DocumentKind::SubsidyFaq, |store| {
            store.read_document(DocumentKind::SubsidyFaq)
        })
    }

    // ------------------------------------------------------------------
    // FAQ and enrollment
    // ------------------------------------------------------------------

    pub fn general_faq(&self) -> KnowledgeResult<Arc<FaqDocument>> {
        self.cached(DocumentKind::GeneralFaq, |store| {
            store.read_document(DocumentKind::GeneralFaq)
        })
    }

    /// General FAQ entries matching `keyword` (all entries when `None`),
    /// ordered by priority.
    pub fn search_general_faq(&self, keyword: Option<&str>) -> KnowledgeResult<Vec<FaqEntry>> {
        let doc = self.general_faq()?;
        let mut results: Vec<FaqEntry> = doc
            .faqs
            .iter()
            .filter(|faq| keyword.map_or(true, |kw| faq.matches(kw)))
            .cloned()
            .collect();
        results.sort_by_key(FaqEntry::sort_key);
        Ok(results)
    }

    pub fn enrollment(&self) -> KnowledgeResult<Arc<EnrollmentDocument>> {
        self.cached(DocumentKind::EnrollmentProcess, |store| {
            store.read_document(DocumentKind::EnrollmentProcess)
        })
    }

    pub fn enrollment_process(&self, track: CourseType) -> KnowledgeResult<EnrollmentProcess> {
        Ok(self.enrollment()?.process(track).clone())
    }

    // ------------------------------------------------------------------
    // Contact, canned responses, menus
    // ------------------------------------------------------------------

    pub fn service_info(&self) -> KnowledgeResult<Arc<ServiceInfo>> {
        self.cached(DocumentKind::ServiceInfo, |store| {
            store.read_document(DocumentKind::ServiceInfo)
        })
    }

    pub fn default_responses(&self) -> KnowledgeResult<Arc<DefaultResponses>> {
        self.cached(DocumentKind::DefaultResponses, |store| {
            store.read_document(DocumentKind::DefaultResponses)
        })
    }

    pub fn quick_options(&self) -> KnowledgeResult<Arc<QuickOptionConfig>> {
        self.cached(DocumentKind::QuickOptions, |store| {
            store.read_document(DocumentKind::QuickOptions)
        })
    }

    pub fn menu(&self, menu: MenuKind) -> KnowledgeResult<Vec<String>> {
        Ok(self.quick_options()?.menu(menu))
    }
}
