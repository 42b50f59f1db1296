//! # trainbot_kb
//!
//! Read-only knowledge store for the training-provider assistant.
//!
//! The knowledge base is a directory of JSON documents: the course catalog
//! and its catalog-number mapping, subsidy rules per employment status, two
//! FAQ corpora, enrollment procedures, contact details, canned greetings and
//! quick-option menus. Documents are parsed on first use and cached for the
//! life of the process.
//!
//! ## Example
//!
//! ```rust,no_run
//! use trainbot_kb::{CourseFilter, CourseType, KnowledgeStore};
//!
//! let store = KnowledgeStore::new("./knowledge");
//! let courses = store
//!     .query_courses(&CourseFilter::by_type(CourseType::Unemployed))
//!     .unwrap();
//! for course in &courses {
//!     println!("{} {}", course.global_number.unwrap_or_default(), course.course_name);
//! }
//! ```

pub mod error;
pub mod models;
pub mod store;
pub mod validator;

pub use error::{KnowledgeError, KnowledgeResult};
pub use models::*;
pub use store::{CourseCatalog, KnowledgeStore};
pub use validator::{KnowledgeValidator, ValidationResult};
