//! Context disambiguation.
//!
//! Short follow-ups ("3", "更多", "需要什麼證明") only make sense against
//! what was shown last. The tiers below are evaluated in order and the first
//! hit decides the route, ahead of the stateless classifier.

use tracing::debug;

use crate::context::{ConversationContext, LastAction};
use crate::router::{self, RouteTarget};
use crate::vocab;

/// Longest phrase treated as a search term after a search prompt.
const MAX_SEARCH_PHRASE_CHARS: usize = 20;

/// Outcome of a tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    QuickAction(RouteTarget),
    /// 1-based position in the cached FAQ candidates.
    FaqSelection(usize),
    /// 1-based label on the current course page.
    CourseSelection(usize),
    Pagination,
    Subsidy,
    CourseFollowUp,
    PromptedSearch(String),
}

/// A named predicate.
pub struct Tier {
    pub name: &'static str,
    pub check: fn(&str, &ConversationContext) -> Option<Resolution>,
}

fn quick_action(input: &str, _ctx: &ConversationContext) -> Option<Resolution> {
    router::match_label(input).map(Resolution::QuickAction)
}

fn faq_selection(input: &str, ctx: &ConversationContext) -> Option<Resolution> {
    if ctx.last_action != LastAction::FaqList {
        return None;
    }
    vocab::parse_digits(input).map(Resolution::FaqSelection)
}

fn course_selection(input: &str, ctx: &ConversationContext) -> Option<Resolution> {
    if !ctx.last_action.is_course_listing() {
        return None;
    }
    vocab::parse_digits(input).map(Resolution::CourseSelection)
}

fn pagination(input: &str, ctx: &ConversationContext) -> Option<Resolution> {
    (ctx.has_open_list() && vocab::is_continuation(input)).then_some(Resolution::Pagination)
}

fn subsidy_follow_up(input: &str, ctx: &ConversationContext) -> Option<Resolution> {
    // A pending search prompt owns the next phrase.
    if ctx.last_action == LastAction::PromptSearch {
        return None;
    }
    let in_subsidy_flow = ctx.employment_status.is_known() || ctx.last_action.is_subsidy();
    (in_subsidy_flow && vocab::SUBSIDY_CONTEXT.is_match(input)).then_some(Resolution::Subsidy)
}

fn course_follow_up(input: &str, ctx: &ConversationContext) -> Option<Resolution> {
    let applies = ctx.last_course.is_some()
        && vocab::course_attribute(input).is_some()
        && !vocab::SUBSIDY_DOCUMENT.is_match(input);
    applies.then_some(Resolution::CourseFollowUp)
}

fn prompted_search(input: &str, ctx: &ConversationContext) -> Option<Resolution> {
    if ctx.last_action != LastAction::PromptSearch {
        return None;
    }
    let phrase = input.trim();
    let usable = !phrase.is_empty()
        && !vocab::is_pure_digits(phrase)
        && phrase.chars().count() <= MAX_SEARCH_PHRASE_CHARS;
    usable.then(|| Resolution::PromptedSearch(phrase.to_string()))
}

/// Tiers in priority order.
pub const TIERS: &[Tier] = &[
    Tier { name: "quick_action", check: quick_action },
    Tier { name: "faq_selection", check: faq_selection },
    Tier { name: "course_selection", check: course_selection },
    Tier { name: "pagination", check: pagination },
    Tier { name: "subsidy_follow_up", check: subsidy_follow_up },
    Tier { name: "course_follow_up", check: course_follow_up },
    Tier { name: "prompted_search", check: prompted_search },
];

/// Run the tiers; `None` means the classifier decides.
pub fn resolve(input: &str, ctx: &ConversationContext) -> Option<(&'static str, Resolution)> {
    let input = input.trim();
    let hit = TIERS
        .iter()
        .find_map(|tier| (tier.check)(input, ctx).map(|resolution| (tier.name, resolution)));

    if let Some((tier, resolution)) = &hit {
        debug!(tier, ?resolution, "Context tier matched");
    }
    hit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::course;
    use crate::context::EmploymentStatus;
    use crate::router::CourseRoute;

    fn listing(n: u32) -> ConversationContext {
        let mut ctx = ConversationContext::new();
        ctx.open_course_list(LastAction::CourseList, (1..=n).map(course).collect(), None);
        ctx
    }

    #[test]
    fn test_quick_action_outranks_context() {
        let ctx = listing(7);
        let (tier, resolution) = resolve("更多", &ctx).unwrap();
        assert_eq!(tier, "quick_action");
        assert_eq!(
            resolution,
            Resolution::QuickAction(RouteTarget::Course(CourseRoute::Pagination))
        );
    }

    #[test]
    fn test_digits_follow_last_action() {
        let ctx = listing(7);
        assert_eq!(resolve("3", &ctx).unwrap().1, Resolution::CourseSelection(3));

        let mut faq_ctx = ConversationContext::new();
        faq_ctx.last_action = LastAction::FaqList;
        assert_eq!(resolve("2", &faq_ctx).unwrap().1, Resolution::FaqSelection(2));

        assert!(resolve("3", &ConversationContext::new()).is_none());
    }

    #[test]
    fn test_only_ascii_digits_select() {
        let ctx = listing(7);
        assert!(resolve("３", &ctx).is_none());
        assert!(resolve("3號", &ctx).is_none());
        assert_eq!(
            resolve("99999999999999999999", &ctx).unwrap().1,
            Resolution::CourseSelection(usize::MAX)
        );
    }

    #[test]
    fn test_continuation_needs_open_list() {
        assert_eq!(resolve("還有嗎", &listing(7)).unwrap().1, Resolution::Pagination);
        assert!(resolve("還有嗎", &ConversationContext::new()).is_none());
    }

    #[test]
    fn test_subsidy_follow_up() {
        let mut ctx = ConversationContext::new();
        assert!(resolve("要帶什麼資料", &ctx).is_none());

        ctx.employment_status = EmploymentStatus::Employed;
        assert_eq!(resolve("要帶什麼資料", &ctx).unwrap().1, Resolution::Subsidy);

        let mut asked = ConversationContext::new();
        asked.last_action = LastAction::SubsidyQuestion;
        assert_eq!(resolve("我是原住民", &asked).unwrap().1, Resolution::Subsidy);
    }

    #[test]
    fn test_course_follow_up_excludes_documents() {
        let mut ctx = ConversationContext::new();
        ctx.last_course = Some(course(3));
        assert_eq!(resolve("費用多少", &ctx).unwrap().1, Resolution::CourseFollowUp);
        assert!(resolve("費用要準備什麼文件", &ctx).is_none());
        assert!(resolve("你好", &ctx).is_none());
    }

    #[test]
    fn test_prompted_search_phrase() {
        let mut ctx = ConversationContext::new();
        ctx.last_action = LastAction::PromptSearch;
        assert_eq!(
            resolve(" 影音剪輯 ", &ctx).unwrap().1,
            Resolution::PromptedSearch("影音剪輯".to_string())
        );
        assert!(resolve("42", &ctx).is_none());
        assert!(resolve(&"長".repeat(21), &ctx).is_none());
    }

    #[test]
    fn test_search_prompt_outranks_subsidy_vocabulary() {
        let mut ctx = ConversationContext::new();
        ctx.employment_status = EmploymentStatus::Employed;
        ctx.last_action = LastAction::PromptSearch;
        assert_eq!(
            resolve("資料分析", &ctx),
            Some((
                "prompted_search",
                Resolution::PromptedSearch("資料分析".to_string())
            ))
        );
    }
}
