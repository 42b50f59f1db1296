//! Quick-action router.
//!
//! Maps button labels (and utterances typed to look like them) to a fixed
//! destination. Lookup is exact first, then on a normalized form with
//! whitespace and punctuation removed. The first table entry that matches
//! wins.

use once_cell::sync::Lazy;
use regex::Regex;
use trainbot_kb::CourseType;

use crate::context::EmploymentStatus;

/// Handlers served without a domain agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalAction {
    ShowCourseMenu,
    ShowSubsidyMenu,
    ShowSubsidyHelp,
    ShowMainMenu,
    ShowFaqList,
    PromptCourseSearch,
}

/// Course agent entry points reachable from a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseRoute {
    List(CourseType),
    Featured,
    Keyword(&'static str),
    Pagination,
    FullContent,
    /// Let the course agent read the label itself.
    Passthrough,
}

/// Where a quick action leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTarget {
    Local(LocalAction),
    Course(CourseRoute),
    Subsidy {
        /// Written to context before the agent runs.
        status: Option<EmploymentStatus>,
        keyword: Option<&'static str>,
    },
    Faq {
        keyword: &'static str,
    },
    Enrollment {
        track: Option<CourseType>,
    },
    HumanService,
}

use CourseRoute as C;
use LocalAction as L;
use RouteTarget as R;

const fn subsidy(status: Option<EmploymentStatus>, keyword: Option<&'static str>) -> RouteTarget {
    R::Subsidy { status, keyword }
}

/// The route table, in match priority order.
const ROUTES: &[(&str, RouteTarget)] = &[
    // Menus
    ("課程查詢", R::Local(L::ShowCourseMenu)),
    ("查看課程清單", R::Local(L::ShowCourseMenu)),
    ("課程列表", R::Local(L::ShowCourseMenu)),
    ("查看課程", R::Local(L::ShowCourseMenu)),
    ("查看其他課程", R::Local(L::ShowCourseMenu)),
    ("查看所有課程", R::Local(L::ShowCourseMenu)),
    ("補助諮詢", R::Local(L::ShowSubsidyMenu)),
    ("補助資格確認", R::Local(L::ShowSubsidyMenu)),
    ("補助資格", R::Local(L::ShowSubsidyMenu)),
    ("不確定身份", R::Local(L::ShowSubsidyHelp)),
    ("不确定身份", R::Local(L::ShowSubsidyHelp)),
    ("回到主選單", R::Local(L::ShowMainMenu)),
    ("常見問題", R::Local(L::ShowFaqList)),
    ("其他問題", R::Local(L::ShowFaqList)),
    ("搜尋課程", R::Local(L::PromptCourseSearch)),
    ("其他關鍵字", R::Local(L::PromptCourseSearch)),
    // Course listings
    ("待業課程", R::Course(C::List(CourseType::Unemployed))),
    ("查看待業課程", R::Course(C::List(CourseType::Unemployed))),
    ("在職課程", R::Course(C::List(CourseType::Employed))),
    ("查看在職課程", R::Course(C::List(CourseType::Employed))),
    ("熱門課程", R::Course(C::Featured)),
    ("精選課程", R::Course(C::Featured)),
    ("更多課程", R::Course(C::Featured)),
    ("查看更多課程", R::Course(C::Featured)),
    ("更多", R::Course(C::Pagination)),
    ("查看更多", R::Course(C::Pagination)),
    ("查看完整內容", R::Course(C::FullContent)),
    ("課程內容", R::Course(C::FullContent)),
    ("課程內容詳情", R::Course(C::FullContent)),
    ("報名截止時間", R::Course(C::Passthrough)),
    ("上課地點", R::Course(C::Passthrough)),
    ("課程費用", R::Course(C::Passthrough)),
    // Keyword searches
    ("AI課程", R::Course(C::Keyword("AI"))),
    ("行銷課程", R::Course(C::Keyword("行銷"))),
    ("設計課程", R::Course(C::Keyword("設計"))),
    ("管理課程", R::Course(C::Keyword("管理"))),
    ("AI", R::Course(C::Keyword("AI"))),
    ("行銷", R::Course(C::Keyword("行銷"))),
    ("設計", R::Course(C::Keyword("設計"))),
    ("程式設計", R::Course(C::Keyword("程式設計"))),
    ("數位行銷", R::Course(C::Keyword("數位行銷"))),
    ("Python", R::Course(C::Keyword("Python"))),
    ("Java", R::Course(C::Keyword("Java"))),
    ("管理", R::Course(C::Keyword("管理"))),
    // Subsidy
    ("我是在職者", subsidy(Some(EmploymentStatus::Employed), None)),
    ("在職者", subsidy(Some(EmploymentStatus::Employed), None)),
    ("我是待業者", subsidy(Some(EmploymentStatus::Unemployed), None)),
    ("待業者", subsidy(Some(EmploymentStatus::Unemployed), None)),
    ("補助資訊", subsidy(None, None)),
    ("申請流程", subsidy(None, None)),
    ("需要什麼文件", subsidy(None, Some("證明"))),
    ("需要什麼證明文件", subsidy(None, Some("證明"))),
    ("我符合特定身份嗎", subsidy(None, Some("特定身份"))),
    ("我符合全額補助嗎", subsidy(None, Some("全額補助"))),
    // FAQ
    ("補助多少錢", R::Faq { keyword: "補助金額" }),
    ("何時撥款", R::Faq { keyword: "撥款" }),
    ("需要準備什麼", R::Faq { keyword: "準備" }),
    ("甄試流程", R::Faq { keyword: "甄試" }),
    ("甄試準備什麼", R::Faq { keyword: "甄試" }),
    ("錄取通知", R::Faq { keyword: "錄取" }),
    ("如何申請補助", R::Faq { keyword: "補助申請" }),
    // Enrollment
    ("報名流程", R::Enrollment { track: None }),
    ("如何報名", R::Enrollment { track: None }),
    ("報名方式", R::Enrollment { track: None }),
    ("待業課程報名", R::Enrollment { track: Some(CourseType::Unemployed) }),
    ("在職課程報名", R::Enrollment { track: Some(CourseType::Employed) }),
    // Human service
    ("聯絡客服", R::HumanService),
    ("聯絡真人客服", R::HumanService),
];

static STRIP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s\p{P}\p{S}]").expect("normalization pattern must compile"));

/// Remove whitespace and punctuation, fold ASCII case.
pub fn normalize(text: &str) -> String {
    STRIP.replace_all(text, "").to_lowercase()
}

static NORMALIZED_ROUTES: Lazy<Vec<(String, RouteTarget)>> = Lazy::new(|| {
    ROUTES
        .iter()
        .map(|(label, target)| (normalize(label), *target))
        .collect()
});

/// Look up a quick action.
pub fn match_label(input: &str) -> Option<RouteTarget> {
    let trimmed = input.trim();
    if let Some((_, target)) = ROUTES.iter().find(|(label, _)| *label == trimmed) {
        return Some(*target);
    }

    let normalized = normalize(trimmed);
    if normalized.is_empty() {
        return None;
    }
    NORMALIZED_ROUTES
        .iter()
        .find(|(label, _)| *label == normalized)
        .map(|(_, target)| *target)
}

/// Every label in the table.
pub fn labels() -> impl Iterator<Item = &'static str> {
    ROUTES.iter().map(|(label, _)| *label)
}
