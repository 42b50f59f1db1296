//! Keyword vocabularies used to read short utterances.
//!
//! Every pattern accepts both Traditional and Simplified spellings.

use once_cell::sync::Lazy;
use regex::Regex;
use trainbot_kb::CourseType;

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("vocabulary pattern must compile")
}

/// "More / remaining / continue / same as before".
pub static CONTINUATION: Lazy<Regex> =
    Lazy::new(|| pattern(r"更多|剩下|還有|还有|繼續|继续|同上|下一頁|下一页"));

/// Document or identity questions that belong to the subsidy flow.
pub static SUBSIDY_CONTEXT: Lazy<Regex> = Lazy::new(|| {
    pattern(
        r"證明|证明|文件|資料|资料|要準備|要准备|需要什麼|需要什么|要帶什麼|要带什么|檢附|检附|原住民|身心障礙|身心障碍|中高齡|中高龄|低收|獨力負擔|独力负担|新住民|更生人|二度就業|二度就业|長期失業|长期失业|身份|身分|特定對象|特定对象",
    )
});

/// Questions about paperwork.
pub static SUBSIDY_DOCUMENT: Lazy<Regex> = Lazy::new(|| {
    pattern(r"證明|证明|文件|資料|资料|要準備|要准备|要帶什麼|要带什么|申請資料|申请资料|檢附|检附")
});

/// Questions about special identities or full subsidy.
pub static SPECIAL_IDENTITY: Lazy<Regex> = Lazy::new(|| {
    pattern(
        r"特定身份|特定身分|全額補助|全额补助|100%|低收|原住民|身心障礙|身心障碍|中高齡|中高龄|獨力|独力|新住民|更生|二度就業|二度就业|長期失業|长期失业|特定對象|特定对象",
    )
});

static EMPLOYED: Lazy<Regex> = Lazy::new(|| pattern(r"在職|在职|有工作|上班|產投|产投"));

static UNEMPLOYED: Lazy<Regex> =
    Lazy::new(|| pattern(r"待業|待业|失業|失业|沒工作|没工作|沒有工作|没有工作|找工作|待轉|待转"));

static ENROLL_UNEMPLOYED: Lazy<Regex> = Lazy::new(|| pattern(r"待業|待业|失業|失业|全日"));

static ENROLL_EMPLOYED: Lazy<Regex> = Lazy::new(|| pattern(r"在職|在职|產投|产投|週末|周末"));

static UNEMPLOYED_LIST: Lazy<Regex> =
    Lazy::new(|| pattern(r"(待業|待业|失業|失业).*(課程|课程)|(課程|课程).*(待業|待业|失業|失业)"));

static EMPLOYED_LIST: Lazy<Regex> =
    Lazy::new(|| pattern(r"(在職|在职|產投|产投).*(課程|课程)|(課程|课程).*(在職|在职|產投|产投)"));

static FEATURED: Lazy<Regex> = Lazy::new(|| pattern(r"精選|精选|熱門|热门|推薦|推荐"));

static FULL_CONTENT: Lazy<Regex> =
    Lazy::new(|| pattern(r"完整內容|完整内容|詳細內容|详细内容|課程內容詳情|课程内容详情"));

static COURSE_NUMBER: Lazy<Regex> = Lazy::new(|| {
    pattern(r"^\s*(\d+)\s*$|(?:課程|课程|編號|编号)\s*(?:編號|编号)?\s*(\d+)|(\d+)\s*號|(\d+)\s*号")
});

static GENERAL_LIST: Lazy<Regex> = Lazy::new(|| {
    pattern(r"有哪些課程|有哪些课程|有什麼課程|有什么课程|課程列表|课程列表|課程清單|课程清单|所有課程|所有课程|全部課程|全部课程")
});

static GENERIC_LIST_WORDS: Lazy<Regex> =
    Lazy::new(|| pattern(r"有哪些|有什麼|有什么|列表|清單|清单|所有|全部"));

/// Course attributes a follow-up question can ask about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseAttribute {
    Deadline,
    Fee,
    Location,
    Interview,
    Capacity,
    Eligibility,
    Hours,
    Content,
}

static ATTRIBUTES: Lazy<Vec<(CourseAttribute, Regex)>> = Lazy::new(|| {
    vec![
        (CourseAttribute::Deadline, pattern(r"截止|報名期限|报名期限")),
        (
            CourseAttribute::Fee,
            pattern(r"費用|费用|多少錢|多少钱|學費|学费|價格|价格|收費|收费"),
        ),
        (CourseAttribute::Location, pattern(r"地點|地点|在哪|地址")),
        (
            CourseAttribute::Interview,
            pattern(r"甄試|甄试|面試|面试|考試|考试|筆試|笔试"),
        ),
        (CourseAttribute::Capacity, pattern(r"名額|名额|人數|人数")),
        (
            CourseAttribute::Eligibility,
            pattern(r"資格|资格|條件|条件|對象|对象|適合|适合|招生|需具備|需具备|基礎|基础|先備|先备|前置"),
        ),
        (
            CourseAttribute::Hours,
            pattern(r"時數|时数|時間|时间|幾點|几点|開課|开课|多久"),
        ),
        (
            CourseAttribute::Content,
            pattern(r"內容|内容|教什麼|教什么|學什麼|学什么"),
        ),
    ]
});

/// Recognized course topics as (aliases, canonical keyword), longest first.
const DOMAIN_KEYWORDS: &[(&[&str], &str)] = &[
    (&["人工智慧", "人工智能"], "人工智慧"),
    (&["程式設計", "程序设计", "编程"], "程式設計"),
    (&["數位行銷", "数字营销", "数位行销"], "數位行銷"),
    (&["資料分析", "数据分析"], "資料分析"),
    (&["專案管理", "项目管理"], "專案管理"),
    (&["室內設計", "室内设计"], "室內設計"),
    (&["短影音", "短视频"], "短影音"),
    (&["chatgpt"], "ChatGPT"),
    (&["python"], "Python"),
    (&["excel"], "Excel"),
    (&["java"], "Java"),
    (&["行銷", "营销", "行销"], "行銷"),
    (&["設計", "设计"], "設計"),
    (&["管理"], "管理"),
    (&["電商", "电商"], "電商"),
    (&["ai"], "AI"),
    (&["ui"], "UI"),
    (&["ux"], "UX"),
];

/// Whether `haystack` contains `needle`, requiring ASCII words to stand
/// alone so "ai" does not match inside "email".
fn contains_term(haystack: &str, needle: &str) -> bool {
    if !needle.is_ascii() {
        return haystack.contains(needle);
    }

    let bytes = haystack.as_bytes();
    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before = start.checked_sub(1).map(|i| bytes[i]);
        let after = bytes.get(end).copied();
        !before.map_or(false, |b| b.is_ascii_alphanumeric())
            && !after.map_or(false, |b| b.is_ascii_alphanumeric())
    })
}

pub fn is_continuation(text: &str) -> bool {
    CONTINUATION.is_match(text)
}

/// Employment status stated in free text. Unemployed phrases are checked
/// first because "沒有工作" contains "有工作".
pub fn employment_in(text: &str) -> Option<CourseType> {
    if UNEMPLOYED.is_match(text) {
        Some(CourseType::Unemployed)
    } else if EMPLOYED.is_match(text) {
        Some(CourseType::Employed)
    } else {
        None
    }
}

/// Enrollment track named in free text.
pub fn enrollment_track(text: &str) -> Option<CourseType> {
    if ENROLL_UNEMPLOYED.is_match(text) {
        Some(CourseType::Unemployed)
    } else if ENROLL_EMPLOYED.is_match(text) {
        Some(CourseType::Employed)
    } else {
        None
    }
}

/// Course track requested as a list ("待業課程有哪些").
pub fn course_list_type(text: &str) -> Option<CourseType> {
    if UNEMPLOYED_LIST.is_match(text) {
        Some(CourseType::Unemployed)
    } else if EMPLOYED_LIST.is_match(text) {
        Some(CourseType::Employed)
    } else {
        None
    }
}

pub fn asks_featured(text: &str) -> bool {
    FEATURED.is_match(text)
}

pub fn asks_full_content(text: &str) -> bool {
    FULL_CONTENT.is_match(text)
}

/// Number referenced by "3", "課程3" or "編號 3".
pub fn course_number(text: &str) -> Option<usize> {
    let caps = COURSE_NUMBER.captures(text)?;
    let digits = (1..=4).find_map(|i| caps.get(i))?;
    Some(digits.as_str().parse().unwrap_or(usize::MAX))
}

pub fn asks_general_list(text: &str) -> bool {
    GENERAL_LIST.is_match(text)
}

pub fn has_generic_list_words(text: &str) -> bool {
    GENERIC_LIST_WORDS.is_match(text)
}

/// First matching attribute, in fixed priority order.
pub fn course_attribute(text: &str) -> Option<CourseAttribute> {
    ATTRIBUTES
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map(|(attr, _)| *attr)
}

/// First recognized course topic, canonicalized.
pub fn domain_keyword(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    DOMAIN_KEYWORDS
        .iter()
        .find(|(aliases, _)| aliases.iter().any(|alias| contains_term(&lowered, alias)))
        .map(|(_, canonical)| *canonical)
}

/// Whether the input consists only of ASCII digits.
pub fn is_pure_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

/// Parse pure digits, saturating on overflow so out-of-range handling
/// applies.
pub fn parse_digits(text: &str) -> Option<usize> {
    is_pure_digits(text).then(|| text.parse().unwrap_or(usize::MAX))
}
