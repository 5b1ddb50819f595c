//! Per-user rollups: pagination and display rows.

use serde::Serialize;

use crate::core::formatter::{
    format_cost, format_last_activity, format_last_request, format_number,
};
use crate::core::models::feature::{DeepResearchUser, ScholarUser, WebSearchUser};
use crate::core::models::usage::{EmbeddingUser, UsageRecord};
use crate::core::table::Column;

pub const DEFAULT_ITEMS_PER_PAGE: usize = 10;
pub const ITEMS_PER_PAGE_OPTIONS: [usize; 4] = [5, 10, 25, 50];

/// Client-side pagination over a backend-ordered user list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Paginator {
    items_per_page: usize,
    current_page: usize,
}

impl Default for Paginator {
    fn default() -> Self {
        Self {
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            current_page: 1,
        }
    }
}

impl Paginator {
    /// `items_per_page` values outside the selectable set fall back to the
    /// default.
    pub fn new(items_per_page: usize) -> Self {
        let mut p = Self::default();
        p.set_items_per_page(items_per_page);
        p
    }

    pub fn items_per_page(&self) -> usize {
        self.items_per_page
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self, total_items: usize) -> usize {
        total_items.div_ceil(self.items_per_page)
    }

    /// Changing the page size always returns to page 1.
    pub fn set_items_per_page(&mut self, items_per_page: usize) {
        self.items_per_page = if ITEMS_PER_PAGE_OPTIONS.contains(&items_per_page) {
            items_per_page
        } else {
            tracing::debug!(items_per_page, "unsupported page size, using default");
            DEFAULT_ITEMS_PER_PAGE
        };
        self.current_page = 1;
    }

    /// Jump to `page`, clamped into `1..=total_pages`.
    pub fn go_to(&mut self, page: usize, total_items: usize) {
        let last = self.total_pages(total_items).max(1);
        self.current_page = page.clamp(1, last);
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self, total_items: usize) -> bool {
        self.current_page < self.total_pages(total_items)
    }

    /// Returns whether the page moved.
    pub fn next(&mut self, total_items: usize) -> bool {
        if self.has_next(total_items) {
            self.current_page += 1;
            true
        } else {
            false
        }
    }

    pub fn previous(&mut self) -> bool {
        if self.has_previous() {
            self.current_page -= 1;
            true
        } else {
            false
        }
    }

    /// Slice the current page out of `items`, clamping the page first.
    pub fn page<'a, T>(&self, items: &'a [T]) -> Page<&'a T> {
        let total_items = items.len();
        let total_pages = self.total_pages(total_items);
        let current_page = self.current_page.clamp(1, total_pages.max(1));
        let start = ((current_page - 1) * self.items_per_page).min(total_items);
        let end = (start + self.items_per_page).min(total_items);

        Page {
            rows: items[start..end].iter().collect(),
            current_page,
            total_pages,
            has_previous: current_page > 1,
            has_next: current_page < total_pages,
            first_index: if start < end { start + 1 } else { 0 },
            last_index: end,
            total_items,
        }
    }
}

/// One page of rows plus navigation state. Indices are 1-based for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub current_page: usize,
    pub total_pages: usize,
    pub has_previous: bool,
    pub has_next: bool,
    pub first_index: usize,
    pub last_index: usize,
    pub total_items: usize,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            rows: self.rows.into_iter().map(f).collect(),
            current_page: self.current_page,
            total_pages: self.total_pages,
            has_previous: self.has_previous,
            has_next: self.has_next,
            first_index: self.first_index,
            last_index: self.last_index,
            total_items: self.total_items,
        }
    }

    /// "Showing 11-20 of 25 users".
    pub fn range_label(&self) -> String {
        if self.total_items == 0 {
            "No users".to_string()
        } else {
            format!(
                "Showing {}-{} of {} users",
                self.first_index, self.last_index, self.total_items
            )
        }
    }
}

fn display_name(name: Option<&str>) -> String {
    match name {
        Some(n) if !n.trim().is_empty() => n.to_string(),
        _ => "Unknown".to_string(),
    }
}

/// Chat token usage row, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRow {
    pub user_id: String,
    pub user_name: String,
    pub total_tokens: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub request_count: u64,
    pub cached_count: u64,
    pub cache_hit_rate: String,
    pub last_request: String,
    pub activity: String,
}

impl From<&UsageRecord> for UserRow {
    fn from(r: &UsageRecord) -> Self {
        Self {
            user_id: r.user_id.clone(),
            user_name: display_name(r.user_name.as_deref()),
            total_tokens: r.tokens(),
            input_tokens: r.input_tokens,
            output_tokens: r.output_tokens,
            request_count: r.request_count,
            cached_count: r.cached_count,
            cache_hit_rate: r.cache_hit_rate.clone().unwrap_or_else(|| "N/A".to_string()),
            last_request: format_last_request(r.last_request.as_ref()),
            activity: format_last_activity(r.last_request.as_ref()),
        }
    }
}

impl UserRow {
    pub fn columns() -> Vec<Column<UserRow>> {
        vec![
            Column::left("User", |r: &Self| r.user_name.clone()),
            Column::right("Tokens", |r: &Self| format_number(r.total_tokens)),
            Column::right("Input", |r: &Self| format_number(r.input_tokens)),
            Column::right("Output", |r: &Self| format_number(r.output_tokens)),
            Column::right("Requests", |r: &Self| format_number(r.request_count)),
            Column::right("Cache Hit", |r: &Self| r.cache_hit_rate.clone()),
            Column::left("Last Request", |r: &Self| r.last_request.clone()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddingRow {
    pub user_id: String,
    pub user_name: String,
    pub total_tokens: u64,
    pub request_count: u64,
    pub avg_tokens_per_request: f64,
    pub total_cost: f64,
    pub last_request: String,
}

impl From<&EmbeddingUser> for EmbeddingRow {
    fn from(u: &EmbeddingUser) -> Self {
        Self {
            user_id: u.user_id.clone(),
            user_name: display_name(u.user_name.as_deref()),
            total_tokens: u.total_tokens,
            request_count: u.request_count,
            avg_tokens_per_request: u.avg_tokens_per_request,
            total_cost: u.total_cost,
            last_request: format_last_request(u.last_request.as_ref()),
        }
    }
}

impl EmbeddingRow {
    pub fn columns() -> Vec<Column<EmbeddingRow>> {
        vec![
            Column::left("User", |r: &Self| r.user_name.clone()),
            Column::right("Tokens", |r: &Self| format_number(r.total_tokens)),
            Column::right("Requests", |r: &Self| format_number(r.request_count)),
            Column::right("Avg/Request", |r: &Self| format!("{:.0}", r.avg_tokens_per_request)),
            Column::right("Cost", |r: &Self| format_cost(r.total_cost)),
            Column::left("Last Request", |r: &Self| r.last_request.clone()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeepResearchRow {
    pub user_id: String,
    pub user_name: String,
    pub total_queries: u64,
    pub openai_tokens: u64,
    pub claude_tokens: u64,
    pub cohere_searches: u64,
    pub total_cost: f64,
    pub last_query: String,
}

impl From<&DeepResearchUser> for DeepResearchRow {
    fn from(u: &DeepResearchUser) -> Self {
        Self {
            user_id: u.user_id.clone(),
            user_name: display_name(u.user_name.as_deref()),
            total_queries: u.total_queries,
            openai_tokens: u.openai_tokens,
            claude_tokens: u.claude_tokens,
            cohere_searches: u.cohere_searches,
            total_cost: u.total_cost,
            last_query: format_last_request(u.last_query.as_ref()),
        }
    }
}

impl DeepResearchRow {
    pub fn columns() -> Vec<Column<DeepResearchRow>> {
        vec![
            Column::left("User", |r: &Self| r.user_name.clone()),
            Column::right("Queries", |r: &Self| format_number(r.total_queries)),
            Column::right("OpenAI Tokens", |r: &Self| format_number(r.openai_tokens)),
            Column::right("Claude Tokens", |r: &Self| format_number(r.claude_tokens)),
            Column::right("Cohere Searches", |r: &Self| format_number(r.cohere_searches)),
            Column::right("Cost", |r: &Self| format_cost(r.total_cost)),
            Column::left("Last Query", |r: &Self| r.last_query.clone()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebSearchRow {
    pub user_id: String,
    pub user_name: String,
    pub total_searches: u64,
    pub tokens: u64,
    pub search_cost: f64,
    pub token_cost: f64,
    pub total_cost: f64,
    pub last_search: String,
}

impl From<&WebSearchUser> for WebSearchRow {
    fn from(u: &WebSearchUser) -> Self {
        Self {
            user_id: u.user_id.clone(),
            user_name: display_name(u.user_name.as_deref()),
            total_searches: u.total_searches,
            tokens: u.input_tokens + u.output_tokens,
            search_cost: u.search_cost,
            token_cost: u.token_cost,
            total_cost: u.total_cost,
            last_search: format_last_request(u.last_search.as_ref()),
        }
    }
}

impl WebSearchRow {
    pub fn columns() -> Vec<Column<WebSearchRow>> {
        vec![
            Column::left("User", |r: &Self| r.user_name.clone()),
            Column::right("Searches", |r: &Self| format_number(r.total_searches)),
            Column::right("Tokens", |r: &Self| format_number(r.tokens)),
            Column::right("Search Cost", |r: &Self| format_cost(r.search_cost)),
            Column::right("Token Cost", |r: &Self| format_cost(r.token_cost)),
            Column::right("Total", |r: &Self| format_cost(r.total_cost)),
            Column::left("Last Search", |r: &Self| r.last_search.clone()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScholarRow {
    pub user_id: String,
    pub user_name: String,
    pub total_queries: u64,
    pub tokens: u64,
    pub sources: u64,
    pub total_cost: f64,
    pub last_query: String,
}

impl From<&ScholarUser> for ScholarRow {
    fn from(u: &ScholarUser) -> Self {
        Self {
            user_id: u.user_id.clone(),
            user_name: display_name(u.user_name.as_deref()),
            total_queries: u.total_queries,
            tokens: u.input_tokens + u.output_tokens,
            sources: u.deep_research_sources + u.web_search_sources,
            total_cost: u.total_cost,
            last_query: format_last_request(u.last_query.as_ref()),
        }
    }
}

impl ScholarRow {
    pub fn columns() -> Vec<Column<ScholarRow>> {
        vec![
            Column::left("User", |r: &Self| r.user_name.clone()),
            Column::right("Queries", |r: &Self| format_number(r.total_queries)),
            Column::right("Tokens", |r: &Self| format_number(r.tokens)),
            Column::right("Sources", |r: &Self| format_number(r.sources)),
            Column::right("Cost", |r: &Self| format_cost(r.total_cost)),
            Column::left("Last Query", |r: &Self| r.last_query.clone()),
        ]
    }
}

/// Paginate `users` and convert the visible slice into display rows.
pub fn paginate_rows<'a, U, R>(paginator: &Paginator, users: &'a [U]) -> Page<R>
where
    R: From<&'a U>,
{
    paginator.page(users).map(R::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::table::render_rows;

    fn users(n: usize) -> Vec<UsageRecord> {
        (0..n)
            .map(|i| UsageRecord {
                user_id: format!("u{}", i),
                user_name: Some(format!("user {}", i)),
                request_count: i as u64,
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn twenty_five_users_ten_per_page() {
        let all = users(25);
        let mut p = Paginator::new(10);
        assert_eq!(p.total_pages(all.len()), 3);

        p.go_to(3, all.len());
        let page = p.page(&all);
        assert_eq!(page.rows.len(), 5);
        assert_eq!(page.current_page, 3);
        assert!(!page.has_next);
        assert!(page.has_previous);
        assert_eq!(page.first_index, 21);
        assert_eq!(page.last_index, 25);
        assert_eq!(page.range_label(), "Showing 21-25 of 25 users");
    }

    #[test]
    fn previous_disabled_on_first_page() {
        let all = users(25);
        let mut p = Paginator::default();
        let page = p.page(&all);
        assert!(!page.has_previous);
        assert!(page.has_next);
        assert!(!p.previous());
        assert_eq!(p.current_page(), 1);
    }

    #[test]
    fn next_disabled_on_last_page() {
        let all = users(25);
        let mut p = Paginator::default();
        assert!(p.next(all.len()));
        assert!(p.next(all.len()));
        assert!(!p.next(all.len()));
        assert_eq!(p.current_page(), 3);
    }

    #[test]
    fn empty_list_disables_next() {
        let all: Vec<UsageRecord> = Vec::new();
        let mut p = Paginator::default();
        let page = p.page(&all);
        assert_eq!(page.total_pages, 0);
        assert!(!page.has_next);
        assert!(!page.has_previous);
        assert!(page.rows.is_empty());
        assert_eq!(page.first_index, 0);
        assert!(!p.next(0));
        assert_eq!(page.range_label(), "No users");
    }

    #[test]
    fn out_of_range_page_is_clamped() {
        let all = users(12);
        let mut p = Paginator::new(5);
        p.go_to(99, all.len());
        assert_eq!(p.current_page(), 3);
        p.go_to(0, all.len());
        assert_eq!(p.current_page(), 1);
    }

    #[test]
    fn changing_page_size_resets_to_first_page() {
        let all = users(30);
        let mut p = Paginator::default();
        p.go_to(3, all.len());
        p.set_items_per_page(25);
        assert_eq!(p.current_page(), 1);
        assert_eq!(p.total_pages(all.len()), 2);
    }

    #[test]
    fn unsupported_page_size_uses_default() {
        assert_eq!(Paginator::new(7).items_per_page(), DEFAULT_ITEMS_PER_PAGE);
        assert_eq!(Paginator::new(50).items_per_page(), 50);
    }

    #[test]
    fn backend_order_is_preserved() {
        let all = users(8);
        let page: Page<UserRow> = paginate_rows(&Paginator::new(5), &all);
        let ids: Vec<_> = page.rows.iter().map(|r| r.user_id.as_str()).collect();
        assert_eq!(ids, vec!["u0", "u1", "u2", "u3", "u4"]);
    }

    #[test]
    fn missing_fields_render_placeholders() {
        let record = UsageRecord {
            user_id: "x".into(),
            ..Default::default()
        };
        let row = UserRow::from(&record);
        assert_eq!(row.user_name, "Unknown");
        assert_eq!(row.last_request, "N/A");
        assert_eq!(row.activity, "No recent activity");
        assert_eq!(row.cache_hit_rate, "N/A");
    }

    #[test]
    fn cache_hit_rate_passes_through() {
        let record = UsageRecord {
            cache_hit_rate: Some("33.3%".into()),
            request_count: 1234,
            ..Default::default()
        };
        let row = UserRow::from(&record);
        let cells = render_rows(&UserRow::columns(), &[row]);
        assert_eq!(cells[0][5], "33.3%");
        assert_eq!(cells[0][4], "1,234");
    }

    #[test]
    fn zero_total_falls_back_to_input_plus_output() {
        let record = UsageRecord {
            input_tokens: 700,
            output_tokens: 300,
            ..Default::default()
        };
        assert_eq!(UserRow::from(&record).total_tokens, 1000);

        let reported = UsageRecord {
            total_tokens: 1200,
            input_tokens: 700,
            output_tokens: 300,
            ..Default::default()
        };
        assert_eq!(UserRow::from(&reported).total_tokens, 1200);
    }

    #[test]
    fn feature_rows_combine_counts() {
        let user = ScholarUser {
            deep_research_sources: 4,
            web_search_sources: 6,
            input_tokens: 10,
            output_tokens: 5,
            ..Default::default()
        };
        let row = ScholarRow::from(&user);
        assert_eq!(row.sources, 10);
        assert_eq!(row.tokens, 15);
        assert_eq!(row.user_name, "Unknown");
    }
}
