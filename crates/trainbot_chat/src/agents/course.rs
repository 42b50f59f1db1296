//! Course agent: listings, pagination, detail views and follow-up questions.
//!
//! Numbers typed by the user are page-relative: every page is labeled
//! 1..shown, and a label resolves against the page currently on screen.

use async_trait::async_trait;
use tracing::{debug, info, warn};
use trainbot_kb::{Course, CourseFilter, CourseType, MenuKind};

use super::{menu_or_default, preview, recover, AgentKind, AgentServices, DomainAgent};
use crate::context::{ConversationContext, LastAction};
use crate::error::ChatResult;
use crate::router::CourseRoute;
use crate::session::ConversationSession;
use crate::types::ChatReply;
use crate::vocab::{self, CourseAttribute};

const PERSONA: &str = "你是虹宇職訓的課程諮詢專員。你的職責是：
1. 協助學員了解課程資訊
2. 提供清晰、準確的課程說明
3. 引導學員找到適合的課程

虹宇職訓課程特色：
- 待業課程：政府全額或部分補助，全日制密集訓練
- 在職課程：週末上課，結訓後可申請80%補助
- 課程領域：AI、程式設計、行銷、設計、管理等

請用繁體中文回答，保持專業友善的語氣。";

/// Characters of course content shown in the detail view.
const CONTENT_PREVIEW_CHARS: usize = 150;

const COURSE_MENU_DEFAULTS: &[&str] = &["待業課程", "在職課程", "熱門課程", "搜尋課程"];

const NOT_ANNOUNCED: &str = "目前尚未公布，歡迎聯絡客服詢問";

/// What a free-text course question asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CourseQuery {
    Attribute(CourseAttribute),
    FullContent,
    Pagination,
    List(CourseType),
    Featured,
    Number(usize),
    GeneralList,
    Keyword(&'static str),
    General,
}

/// Decide what a course question asks for, in fixed priority order.
pub fn detect_query_type(utterance: &str, ctx: &ConversationContext) -> CourseQuery {
    if ctx.last_course.is_some() {
        if let Some(attribute) = vocab::course_attribute(utterance) {
            return CourseQuery::Attribute(attribute);
        }
    }
    if vocab::asks_full_content(utterance) {
        return CourseQuery::FullContent;
    }
    if vocab::is_continuation(utterance) {
        return CourseQuery::Pagination;
    }
    if let Some(course_type) = vocab::course_list_type(utterance) {
        return CourseQuery::List(course_type);
    }
    if vocab::asks_featured(utterance) {
        return CourseQuery::Featured;
    }
    if let Some(number) = vocab::course_number(utterance) {
        return CourseQuery::Number(number);
    }
    if vocab::asks_general_list(utterance) {
        return CourseQuery::GeneralList;
    }
    if !vocab::has_generic_list_words(utterance) {
        if let Some(keyword) = vocab::domain_keyword(utterance) {
            return CourseQuery::Keyword(keyword);
        }
    }
    CourseQuery::General
}

pub struct CourseAgent {
    services: AgentServices,
}

impl CourseAgent {
    pub fn new(services: AgentServices) -> Self {
        Self { services }
    }

    /// Serve a quick action.
    pub async fn route(
        &self,
        session: &mut ConversationSession,
        route: CourseRoute,
        utterance: &str,
    ) -> ChatReply {
        let ctx = &mut session.context;
        match route {
            CourseRoute::List(course_type) => {
                recover(self.kind(), self.list_by_type(ctx, course_type))
            }
            CourseRoute::Featured => recover(self.kind(), self.list_featured(ctx)),
            CourseRoute::Keyword(keyword) => recover(self.kind(), self.search(ctx, keyword)),
            CourseRoute::Pagination => self.paginate(ctx),
            CourseRoute::FullContent => self.full_content(ctx),
            CourseRoute::Passthrough => self.handle(session, utterance).await,
        }
    }

    /// The course-type menu.
    pub fn menu(&self) -> ChatReply {
        ChatReply::new(
            "📚 **課程查詢**\n\n虹宇職訓提供多元化的職業訓練課程，包括：\n\n\
             • **待業課程**：適合目前待業或失業者，政府提供80-100%補助\n\
             • **在職課程**：適合在職勞工進修，政府補助80-100%\n\
             • **熱門課程**：查看最受歡迎的精選課程\n\n\
             請選擇您想查看的課程類型：",
            self.course_menu_options(),
        )
    }

    fn course_menu_options(&self) -> Vec<String> {
        menu_or_default(&self.services.knowledge, MenuKind::Course, COURSE_MENU_DEFAULTS)
    }

    pub fn list_by_type(
        &self,
        ctx: &mut ConversationContext,
        course_type: CourseType,
    ) -> ChatResult<ChatReply> {
        let courses = self
            .services
            .knowledge
            .query_courses(&CourseFilter::by_type(course_type))?;

        if courses.is_empty() {
            return Ok(ChatReply::new(
                format!("目前沒有{}課程資料。", course_type.label()),
                ["查看其他課程", "聯絡客服"],
            ));
        }

        info!(course_type = course_type.label(), count = courses.len(), "Listing courses");
        ctx.open_course_list(LastAction::CourseList, courses, None);
        Ok(render_page(ctx))
    }

    pub fn list_featured(&self, ctx: &mut ConversationContext) -> ChatResult<ChatReply> {
        let courses = self.services.knowledge.query_courses(&CourseFilter::featured())?;

        if courses.is_empty() {
            return Ok(ChatReply::new(
                "目前沒有精選課程。",
                ["查看所有課程", "聯絡客服"],
            ));
        }

        ctx.open_course_list(LastAction::FeaturedList, courses, None);
        Ok(render_page(ctx))
    }

    pub fn search(&self, ctx: &mut ConversationContext, keyword: &str) -> ChatResult<ChatReply> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Ok(self.prompt_search(ctx));
        }

        let courses = self
            .services
            .knowledge
            .query_courses(&CourseFilter::keyword(keyword))?;

        if courses.is_empty() {
            return Ok(ChatReply::new(
                format!(
                    "很抱歉，找不到與「{}」相關的課程。\n\n您可以：\n• 嘗試其他關鍵字\n• 查看所有課程清單\n• 聯絡客服詢問",
                    keyword
                ),
                ["待業課程", "在職課程", "精選課程", "聯絡客服"],
            ));
        }

        info!(keyword, count = courses.len(), "Course search");
        ctx.open_course_list(LastAction::SearchResult, courses, Some(keyword.to_string()));
        Ok(render_page(ctx))
    }

    /// Ask for a search keyword; the next short phrase is searched.
    pub fn prompt_search(&self, ctx: &mut ConversationContext) -> ChatReply {
        ctx.last_action = LastAction::PromptSearch;
        ChatReply::new(
            "🔍 **課程搜尋**\n\n請輸入您想搜尋的關鍵字，或點選下方熱門類別：",
            ["AI", "行銷", "設計", "Python"],
        )
    }

    pub fn paginate(&self, ctx: &mut ConversationContext) -> ChatReply {
        if !ctx.has_open_list() {
            return ChatReply::new(
                "目前沒有正在瀏覽的課程清單，請先選擇想查看的課程類型：",
                self.course_menu_options(),
            );
        }

        if !ctx.advance_page() {
            debug!(offset = ctx.display_offset(), "Pagination past last page");
            return ChatReply::new(
                format!(
                    "📋 已經是最後一頁了，{} 門課程都已顯示。\n\n請輸入目前清單上的編號查看詳情，或選擇其他課程類型。",
                    ctx.course_list().len()
                ),
                ["待業課程", "在職課程", "搜尋課程", "回到主選單"],
            );
        }

        render_page(ctx)
    }

    /// Show the course at a page-relative label.
    pub fn select(&self, ctx: &mut ConversationContext, label: usize) -> ChatReply {
        if !ctx.has_open_list() {
            return ChatReply::new(
                "請先查看課程清單，再輸入清單上的編號查看課程詳情。",
                self.course_menu_options(),
            );
        }

        match ctx.course_on_page(label).cloned() {
            Some(course) => {
                debug!(label, course_id = course.id, "Course selected");
                let reply = render_detail(&course);
                ctx.last_course = Some(course);
                reply
            }
            None => {
                let shown = ctx.current_page().len();
                ChatReply::new(
                    format!("❌ 編號超出範圍，請輸入 1-{} 之間的編號查看課程詳情。", shown),
                    page_options(ctx),
                )
            }
        }
    }

    pub fn full_content(&self, ctx: &ConversationContext) -> ChatReply {
        let Some(course) = &ctx.last_course else {
            return ChatReply::new(
                "請先選擇一門課程，再查看完整內容。",
                ["待業課程", "在職課程", "熱門課程"],
            );
        };

        let mut content = format!("📖 **{} 完整課程內容**\n\n", course.course_name);
        if course.content.is_empty() {
            content.push_str(&format!("課程內容{}。", NOT_ANNOUNCED));
        } else {
            content.push_str(&course.content);
        }
        if let Some(url) = &course.url {
            content.push_str(&format!("\n\n🔗 詳細資訊：{}", url));
        }

        ChatReply::new(content, ["報名截止時間", "上課地點", "課程費用", "補助資訊"])
    }

    /// Answer a question about the course last shown in detail.
    pub fn answer_attribute(
        &self,
        ctx: &ConversationContext,
        attribute: CourseAttribute,
    ) -> ChatReply {
        let Some(course) = &ctx.last_course else {
            return self.menu();
        };
        ChatReply::new(
            attribute_answer(course, attribute),
            ["查看完整內容", "補助資格", "如何報名", "聯絡客服"],
        )
    }

    async fn general(&self, session: &ConversationSession, utterance: &str) -> ChatReply {
        let context = [(
            "課程資訊",
            "虹宇職訓提供待業和在職兩類課程，涵蓋AI、程式設計、行銷、設計等領域。".to_string(),
        )];
        let options = ["待業課程", "在職課程", "精選課程", "搜尋課程"];

        match self
            .services
            .generate(PERSONA, &context, session, utterance)
            .await
        {
            Ok(answer) => ChatReply::new(answer, options),
            Err(e) => {
                warn!(error = %e, "Course answer generation failed, using static menu");
                ChatReply::new(
                    "我可以協助您：\n\n1️⃣ 查看待業課程清單\n2️⃣ 查看在職課程清單\n3️⃣ 搜尋特定課程\n4️⃣ 查看精選課程\n\n請問您想了解什麼呢？",
                    options,
                )
            }
        }
    }
}

#[async_trait]
impl DomainAgent for CourseAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Course
    }

    async fn handle(&self, session: &mut ConversationSession, utterance: &str) -> ChatReply {
        let query = detect_query_type(utterance, &session.context);
        debug!(?query, "Course query detected");

        let ctx = &mut session.context;
        match query {
            CourseQuery::Attribute(attribute) => self.answer_attribute(ctx, attribute),
            CourseQuery::FullContent => self.full_content(ctx),
            CourseQuery::Pagination => self.paginate(ctx),
            CourseQuery::List(course_type) => {
                recover(self.kind(), self.list_by_type(ctx, course_type))
            }
            CourseQuery::Featured => recover(self.kind(), self.list_featured(ctx)),
            CourseQuery::Number(label) => self.select(ctx, label),
            CourseQuery::GeneralList => self.menu(),
            CourseQuery::Keyword(keyword) => recover(self.kind(), self.search(ctx, keyword)),
            CourseQuery::General => self.general(session, utterance).await,
        }
    }
}

fn list_title(ctx: &ConversationContext) -> String {
    match ctx.last_action {
        LastAction::FeaturedList => "⭐ **精選熱門課程**".to_string(),
        LastAction::SearchResult => format!("🔍 **搜尋結果：{}**", ctx.search_keyword()),
        _ => {
            let label = ctx
                .course_list()
                .first()
                .map(|course| course.course_type.label())
                .unwrap_or_default();
            format!("📚 **{}課程清單**", label)
        }
    }
}

/// Quick options for the page on screen: its labels, "更多" while courses
/// remain, then shortcuts.
fn page_options(ctx: &ConversationContext) -> Vec<String> {
    let mut options: Vec<String> = (1..=ctx.current_page().len())
        .map(|n| n.to_string())
        .collect();
    if ctx.has_more() {
        options.push("更多".to_string());
    }
    options.extend(["搜尋課程", "補助資格", "回到主選單"].map(String::from));
    options
}

/// Render the current page of the open list.
pub fn render_page(ctx: &ConversationContext) -> ChatReply {
    let total = ctx.course_list().len();
    let page = ctx.current_page();
    let start = ctx.display_offset();
    let show_type = ctx.last_action != LastAction::CourseList;

    let mut content = format!(
        "{}\n\n共 {} 門課程，目前顯示第 {}-{} 門：\n\n",
        list_title(ctx),
        total,
        start + 1,
        start + page.len()
    );

    for (index, course) in page.iter().enumerate() {
        let star = if course.featured { "⭐ " } else { "" };
        content.push_str(&format!("{}. {}{}", index + 1, star, course.course_name));
        if show_type {
            content.push_str(&format!(" ({})", course.course_type.label()));
        }
        content.push('\n');
        content.push_str(&format!("   時數：{}小時\n", course.schedule.total_hours));
        if let Some(start_date) = &course.schedule.start_date {
            content.push_str(&format!("   開課：{}\n", start_date));
        }
        content.push('\n');
    }

    content.push_str(&format!("💡 請輸入課程編號（1-{}）查看詳情", page.len()));

    let remaining = total - (start + page.len());
    if remaining > 0 {
        content.push_str(&format!(
            "\n\n...還有 {} 門課程，輸入「更多」繼續瀏覽",
            remaining
        ));
    }

    ChatReply::new(content, page_options(ctx))
}

/// Detail view of one course.
pub fn render_detail(course: &Course) -> ChatReply {
    let star = if course.featured { "⭐ " } else { "" };
    let mut content = format!("📚 **{}{}**\n\n", star, course.course_name);

    if let Some(full_name) = &course.full_name {
        content.push_str(&format!("{}\n\n", full_name));
    }
    if let Some(number) = course.global_number {
        content.push_str(&format!("**課程編號**：{}\n", number));
    }
    content.push_str(&format!("**課程類型**：{}課程\n\n", course.course_type.label()));

    content.push_str("**⏰ 時間資訊**\n");
    content.push_str(&format!("• 總時數：{}小時\n", course.schedule.total_hours));
    content.push_str(&format!("• 上課時間：{}\n", course.schedule.class_time));
    if let Some(start_date) = &course.schedule.start_date {
        content.push_str(&format!("• 開課日期：{}\n", start_date));
    }
    if let Some(deadline) = &course.schedule.enrollment_deadline {
        content.push_str(&format!("• 報名截止：{}\n", deadline));
    }

    content.push_str("\n**💰 費用資訊**\n");
    content.push_str(&format!("• {}\n", course.fee.amount));
    if let Some(note) = &course.fee.note {
        content.push_str(&format!("• {}\n", note));
    }

    content.push_str(&format!("\n**📍 上課地點**\n{}\n", course.location.address));

    let mut truncated = false;
    if !course.content.is_empty() {
        let (text, cut) = preview(&course.content, CONTENT_PREVIEW_CHARS);
        truncated = cut;
        content.push_str(&format!("\n**📖 課程內容**\n{}\n", text));
    }

    if let Some(url) = &course.url {
        content.push_str(&format!("\n🔗 詳細資訊：{}", url));
    }

    let mut options: Vec<String> = if course.related_questions.is_empty() {
        ["補助資格", "如何報名", "更多課程"].map(String::from).to_vec()
    } else {
        course.related_questions.clone()
    };
    if truncated {
        options.insert(0, "查看完整內容".to_string());
    }

    ChatReply::new(content.trim_end().to_string(), options)
}

fn attribute_answer(course: &Course, attribute: CourseAttribute) -> String {
    let name = &course.course_name;
    let missing = |what: &str| format!("**{}** 的{}{}。", name, what, NOT_ANNOUNCED);

    match attribute {
        CourseAttribute::Deadline => match &course.schedule.enrollment_deadline {
            Some(deadline) => format!("📅 **{}** 報名截止日期：{}", name, deadline),
            None => missing("報名截止日期"),
        },
        CourseAttribute::Fee => {
            let mut answer = format!("💰 **{}** 課程費用：{}", name, course.fee.amount);
            if let Some(note) = &course.fee.note {
                answer.push_str(&format!("\n{}", note));
            }
            answer
        }
        CourseAttribute::Location => {
            let mut answer = format!("📍 **{}** 上課地點：{}", name, course.location.address);
            if let Some(note) = &course.location.note {
                answer.push_str(&format!("\n{}", note));
            }
            answer
        }
        CourseAttribute::Interview => match &course.interview {
            Some(interview) => format!("📝 **{}** 甄試說明：{}", name, interview),
            None => missing("甄試資訊"),
        },
        CourseAttribute::Capacity => match course.capacity {
            Some(capacity) => format!("👥 **{}** 招生名額：{} 人", name, capacity),
            None => missing("招生名額"),
        },
        CourseAttribute::Eligibility => match &course.eligibility {
            Some(eligibility) => format!("✅ **{}** 招生對象：{}", name, eligibility),
            None => missing("招生資格"),
        },
        CourseAttribute::Hours => {
            let mut answer = format!(
                "⏰ **{}**\n• 總時數：{}小時\n• 上課時間：{}",
                name, course.schedule.total_hours, course.schedule.class_time
            );
            if let Some(start_date) = &course.schedule.start_date {
                answer.push_str(&format!("\n• 開課日期：{}", start_date));
            }
            answer
        }
        CourseAttribute::Content => {
            if course.content.is_empty() {
                missing("課程內容")
            } else {
                format!("📖 **{}** 課程內容：\n{}", name, course.content)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::course;

    fn open(n: u32) -> ConversationContext {
        let mut ctx = ConversationContext::new();
        ctx.open_course_list(LastAction::CourseList, (1..=n).map(course).collect(), None);
        ctx
    }

    #[test]
    fn test_detect_priority() {
        let mut ctx = ConversationContext::new();
        assert_eq!(
            detect_query_type("待業課程有哪些", &ctx),
            CourseQuery::List(CourseType::Unemployed)
        );
        assert_eq!(detect_query_type("推薦的課程", &ctx), CourseQuery::Featured);
        assert_eq!(detect_query_type("課程 3", &ctx), CourseQuery::Number(3));
        assert_eq!(detect_query_type("有哪些課程", &ctx), CourseQuery::GeneralList);
        assert_eq!(detect_query_type("想學Python", &ctx), CourseQuery::Keyword("Python"));
        assert_eq!(detect_query_type("全部的Python課", &ctx), CourseQuery::General);
        assert_eq!(detect_query_type("費用多少", &ctx), CourseQuery::General);

        ctx.last_course = Some(course(1));
        assert_eq!(
            detect_query_type("費用多少", &ctx),
            CourseQuery::Attribute(CourseAttribute::Fee)
        );
    }

    #[test]
    fn test_render_first_page() {
        let ctx = open(7);
        let reply = render_page(&ctx);
        assert_eq!(
            reply.quick_options[..6],
            ["1", "2", "3", "4", "5", "更多"].map(String::from)
        );
        assert!(reply.quick_options.len() <= 8);
        assert!(reply.content.contains("共 7 門課程"));
        assert!(reply.content.contains("（1-5）"));
        assert!(reply.content.contains("還有 2 門課程"));
    }

    #[test]
    fn test_render_last_page_labels_restart() {
        let mut ctx = open(7);
        assert!(ctx.advance_page());
        let reply = render_page(&ctx);
        assert_eq!(reply.quick_options[..2], ["1", "2"].map(String::from));
        assert!(!reply.quick_options.contains(&"更多".to_string()));
        assert!(reply.content.starts_with("📚 **待業課程清單**"));
        assert!(reply.content.contains("1. 課程6"));
    }

    #[test]
    fn test_detail_sets_options() {
        let mut detail = course(9);
        detail.content = "長".repeat(200);
        let reply = render_detail(&detail);
        assert!(reply.content.contains("**課程編號**：9"));
        assert!(reply.content.contains("..."));
        assert_eq!(reply.quick_options[0], "查看完整內容");
        assert_eq!(reply.quick_options[1], "補助資格");
    }

    #[test]
    fn test_missing_attribute_is_not_an_error() {
        let answer = attribute_answer(&course(1), CourseAttribute::Deadline);
        assert!(answer.contains(NOT_ANNOUNCED));
        let fee = attribute_answer(&course(1), CourseAttribute::Fee);
        assert!(fee.contains("免費"));
    }
}
