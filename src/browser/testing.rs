//! In-memory stand-in for a browser, used by unit tests across the crate.
//!
//! A [`FakeSite`] maps URLs to scripted [`FakePage`]s. [`FakeSession`]
//! answers the selectors from [`ReviewSelectors`] and [`DiscoveryConfig`]
//! against that script, so pipeline code runs unchanged without Chrome.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::browser::{DomError, DomResult, Session, SessionFactory};
use crate::discover::DiscoveryConfig;
use crate::scraper::ReviewSelectors;

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeReview {
    pub title: Option<String>,
    pub content: Option<String>,
    /// Content is cut short until its "show more" control is clicked
    pub truncated: bool,
    pub show_more_intercepted: bool,
    /// Every lookup inside this container fails as stale
    pub stale: bool,
}

impl FakeReview {
    pub fn new(title: &str, content: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            content: Some(content.to_string()),
            ..Default::default()
        }
    }

    pub fn truncated(mut self) -> Self {
        self.truncated = true;
        self
    }

    pub fn intercepted(mut self) -> Self {
        self.show_more_intercepted = true;
        self
    }

    pub fn stale(mut self) -> Self {
        self.stale = true;
        self
    }

    pub fn without_title(mut self) -> Self {
        self.title = None;
        self
    }

    pub fn without_content(mut self) -> Self {
        self.content = None;
        self
    }

    fn shown_content(&self, expanded: bool) -> Option<String> {
        let full = self.content.as_ref()?;
        if self.truncated && !expanded {
            let half: String = full.chars().take(full.chars().count() / 2).collect();
            Some(format!("{}...", half))
        } else {
            Some(full.clone())
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct FakePage {
    pub review_pages: Vec<Vec<FakeReview>>,
    /// The last review page shows a next control marked disabled
    pub next_disabled_at_end: bool,
    /// Clicking next leaves the same reviews in place
    pub next_stalls: bool,
    /// 1-based review page on which the browser crashes
    pub crash_on_page: Option<usize>,
    pub has_main: bool,
    pub has_reviews_section: bool,
    pub popup: bool,
    pub product_links: Vec<String>,
    /// Extra product links revealed by each "load more" press
    pub load_more_batches: Vec<Vec<String>>,
    /// (heading text, hrefs) for each category block
    pub category_blocks: Vec<(String, Vec<String>)>,
}

impl Default for FakePage {
    fn default() -> Self {
        Self {
            review_pages: Vec::new(),
            next_disabled_at_end: false,
            next_stalls: false,
            crash_on_page: None,
            has_main: true,
            has_reviews_section: true,
            popup: false,
            product_links: Vec::new(),
            load_more_batches: Vec::new(),
            category_blocks: Vec::new(),
        }
    }
}

impl FakePage {
    /// A product page whose review widget has the given pages of (title, content).
    pub fn reviews(pages: Vec<Vec<(&str, &str)>>) -> Self {
        Self {
            review_pages: pages
                .into_iter()
                .map(|page| page.into_iter().map(|(t, c)| FakeReview::new(t, c)).collect())
                .collect(),
            ..Default::default()
        }
    }

    pub fn review_pages(pages: Vec<Vec<FakeReview>>) -> Self {
        Self {
            review_pages: pages,
            ..Default::default()
        }
    }

    pub fn disabled_next(mut self) -> Self {
        self.next_disabled_at_end = true;
        self
    }

    pub fn stalling_next(mut self) -> Self {
        self.next_stalls = true;
        self
    }

    pub fn crash_on(mut self, page: usize) -> Self {
        self.crash_on_page = Some(page);
        self
    }

    pub fn without_main(mut self) -> Self {
        self.has_main = false;
        self
    }

    pub fn without_reviews_section(mut self) -> Self {
        self.has_reviews_section = false;
        self
    }

    pub fn category(links: Vec<&str>) -> Self {
        Self {
            product_links: links.into_iter().map(String::from).collect(),
            ..Default::default()
        }
    }

    pub fn with_load_more(mut self, batches: Vec<Vec<&str>>) -> Self {
        self.load_more_batches = batches
            .into_iter()
            .map(|b| b.into_iter().map(String::from).collect())
            .collect();
        self
    }

    pub fn home(blocks: Vec<(&str, Vec<&str>)>) -> Self {
        Self {
            category_blocks: blocks
                .into_iter()
                .map(|(h, links)| (h.to_string(), links.into_iter().map(String::from).collect()))
                .collect(),
            ..Default::default()
        }
    }

    pub fn with_popup(mut self) -> Self {
        self.popup = true;
        self
    }
}

/// Scripted pages plus a log of every review page shown.
pub(crate) struct FakeSite {
    selectors: ReviewSelectors,
    discovery: DiscoveryConfig,
    pages: HashMap<String, FakePage>,
    visits: Mutex<Vec<(String, usize)>>,
}

impl FakeSite {
    pub fn new(selectors: ReviewSelectors) -> Self {
        Self {
            selectors,
            discovery: DiscoveryConfig::default(),
            pages: HashMap::new(),
            visits: Mutex::new(Vec::new()),
        }
    }

    pub fn with_discovery(mut self, discovery: DiscoveryConfig) -> Self {
        self.discovery = discovery;
        self
    }

    pub fn with_page(mut self, url: &str, page: FakePage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    /// (url, 1-based review page) in the order pages were shown.
    pub fn visits(&self) -> Vec<(String, usize)> {
        self.visits.lock().unwrap().clone()
    }

    pub fn visits_to(&self, url: &str) -> Vec<usize> {
        self.visits()
            .into_iter()
            .filter(|(u, _)| u == url)
            .map(|(_, page)| page)
            .collect()
    }

    fn record_visit(&self, url: &str, page: usize) {
        self.visits.lock().unwrap().push((url.to_string(), page));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FakeNode {
    Main,
    Section,
    Container { page: usize, index: usize },
    Title { page: usize, index: usize },
    Content { page: usize, index: usize },
    ShowMore { page: usize, index: usize },
    Next { page: usize, enabled: bool },
    ProductLink(String),
    LoadMore,
    PopupClose,
    Block(usize),
    Heading(usize),
    BlockLink { block: usize, link: usize },
}

#[derive(Default)]
struct FakeState {
    current: Option<String>,
    page: usize,
    expanded: HashSet<(usize, usize)>,
    popup_open: bool,
    load_more_pressed: usize,
    crashed: bool,
    closed: bool,
}

pub(crate) struct FakeSession {
    site: Arc<FakeSite>,
    state: Mutex<FakeState>,
    close_counter: Option<Arc<AtomicUsize>>,
}

impl FakeSession {
    pub fn new(site: impl Into<Arc<FakeSite>>) -> Self {
        Self {
            site: site.into(),
            state: Mutex::new(FakeState::default()),
            close_counter: None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    /// Lock the state after checking the session is usable. Reaching a page
    /// scripted to crash poisons the session for every later call.
    fn alive(&self) -> DomResult<std::sync::MutexGuard<'_, FakeState>> {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return Err(DomError::Session("session closed".into()));
        }
        let crash_here = self
            .page_of(&state)
            .is_some_and(|p| p.crash_on_page == Some(state.page + 1));
        if crash_here {
            state.crashed = true;
        }
        if state.crashed {
            return Err(DomError::Session("target crashed".into()));
        }
        Ok(state)
    }

    fn page_of(&self, state: &FakeState) -> Option<&FakePage> {
        state.current.as_ref().and_then(|url| self.site.pages.get(url))
    }

    fn review(&self, state: &FakeState, page: usize, index: usize) -> DomResult<FakeReview> {
        if page != state.page {
            return Err(DomError::Stale);
        }
        self.page_of(state)
            .and_then(|p| p.review_pages.get(page))
            .and_then(|reviews| reviews.get(index))
            .cloned()
            .ok_or(DomError::Stale)
    }

    fn reviews_on_page(&self, state: &FakeState) -> Vec<FakeReview> {
        self.page_of(state)
            .and_then(|p| p.review_pages.get(state.page))
            .cloned()
            .unwrap_or_default()
    }

    fn product_links(&self, state: &FakeState) -> Vec<String> {
        let Some(page) = self.page_of(state) else {
            return Vec::new();
        };
        let mut links = page.product_links.clone();
        for batch in page.load_more_batches.iter().take(state.load_more_pressed) {
            links.extend(batch.iter().cloned());
        }
        links
    }
}

#[async_trait]
impl Session for FakeSession {
    type Node = FakeNode;

    async fn navigate(&mut self, url: &str) -> DomResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.closed || state.crashed {
            return Err(DomError::Session("target crashed".into()));
        }
        let Some(page) = self.site.pages.get(url) else {
            return Err(DomError::Script("net::ERR_NAME_NOT_RESOLVED".into()));
        };
        state.popup_open = page.popup;
        state.current = Some(url.to_string());
        state.page = 0;
        state.expanded.clear();
        state.load_more_pressed = 0;
        self.site.record_visit(url, 1);
        Ok(())
    }

    async fn find_all(&self, selector: &str) -> DomResult<Vec<FakeNode>> {
        let state = self.alive()?;
        let Some(page) = self.page_of(&state) else {
            return Ok(Vec::new());
        };
        let sel = &self.site.selectors;
        let disc = &self.site.discovery;
        let current = state.page;

        let nodes = if selector == sel.page_loaded {
            if page.has_main { vec![FakeNode::Main] } else { Vec::new() }
        } else if selector == sel.reviews_section {
            if page.has_reviews_section { vec![FakeNode::Section] } else { Vec::new() }
        } else if selector == sel.container {
            (0..self.reviews_on_page(&state).len())
                .map(|index| FakeNode::Container { page: current, index })
                .collect()
        } else if selector == sel.show_more_in_content() {
            self.reviews_on_page(&state)
                .iter()
                .enumerate()
                .filter(|(index, r)| r.truncated && !state.expanded.contains(&(current, *index)))
                .map(|(index, _)| FakeNode::ShowMore { page: current, index })
                .collect()
        } else if selector == sel.next_page {
            let last = page.review_pages.len().saturating_sub(1);
            if current < last {
                vec![FakeNode::Next { page: current, enabled: true }]
            } else if page.next_disabled_at_end {
                vec![FakeNode::Next { page: current, enabled: false }]
            } else {
                Vec::new()
            }
        } else if selector == disc.product_link {
            self.product_links(&state)
                .into_iter()
                .map(FakeNode::ProductLink)
                .collect()
        } else if selector == disc.load_more {
            if state.load_more_pressed < page.load_more_batches.len() {
                vec![FakeNode::LoadMore]
            } else {
                Vec::new()
            }
        } else if selector == disc.popup_close {
            if state.popup_open { vec![FakeNode::PopupClose] } else { Vec::new() }
        } else if selector == disc.category_block {
            (0..page.category_blocks.len()).map(FakeNode::Block).collect()
        } else {
            Vec::new()
        };

        Ok(nodes)
    }

    async fn find_all_in(&self, node: &FakeNode, selector: &str) -> DomResult<Vec<FakeNode>> {
        let state = self.alive()?;
        let sel = &self.site.selectors;
        let disc = &self.site.discovery;

        match node {
            FakeNode::Container { page, index } => {
                let review = self.review(&state, *page, *index)?;
                if review.stale {
                    return Err(DomError::Stale);
                }
                let (page, index) = (*page, *index);
                if selector == sel.title && review.title.is_some() {
                    Ok(vec![FakeNode::Title { page, index }])
                } else if selector == sel.content && review.content.is_some() {
                    Ok(vec![FakeNode::Content { page, index }])
                } else {
                    Ok(Vec::new())
                }
            }
            FakeNode::Block(block) => {
                let Some((_, links)) = self
                    .page_of(&state)
                    .and_then(|p| p.category_blocks.get(*block))
                else {
                    return Err(DomError::Stale);
                };
                if selector == disc.category_heading {
                    Ok(vec![FakeNode::Heading(*block)])
                } else if selector == "a" {
                    Ok((0..links.len())
                        .map(|link| FakeNode::BlockLink { block: *block, link })
                        .collect())
                } else {
                    Ok(Vec::new())
                }
            }
            _ => Ok(Vec::new()),
        }
    }

    async fn text(&self, node: &FakeNode) -> DomResult<String> {
        let state = self.alive()?;
        match node {
            FakeNode::Title { page, index } => Ok(self
                .review(&state, *page, *index)?
                .title
                .unwrap_or_default()),
            FakeNode::Content { page, index } => {
                let expanded = state.expanded.contains(&(*page, *index));
                Ok(self
                    .review(&state, *page, *index)?
                    .shown_content(expanded)
                    .unwrap_or_default())
            }
            FakeNode::Container { page, index } => {
                let review = self.review(&state, *page, *index)?;
                let expanded = state.expanded.contains(&(*page, *index));
                Ok(format!(
                    "{}\n{}",
                    review.title.clone().unwrap_or_default(),
                    review.shown_content(expanded).unwrap_or_default()
                ))
            }
            FakeNode::Heading(block) => Ok(self
                .page_of(&state)
                .and_then(|p| p.category_blocks.get(*block))
                .map(|(heading, _)| heading.clone())
                .unwrap_or_default()),
            _ => Ok(String::new()),
        }
    }

    async fn attribute(&self, node: &FakeNode, name: &str) -> DomResult<Option<String>> {
        let state = self.alive()?;
        if name != "href" {
            return Ok(None);
        }
        match node {
            FakeNode::ProductLink(href) => Ok(Some(href.clone())),
            FakeNode::BlockLink { block, link } => Ok(self
                .page_of(&state)
                .and_then(|p| p.category_blocks.get(*block))
                .and_then(|(_, links)| links.get(*link))
                .cloned()),
            _ => Ok(None),
        }
    }

    async fn is_visible(&self, node: &FakeNode) -> DomResult<bool> {
        let state = self.alive()?;
        if let FakeNode::ShowMore { page, index } | FakeNode::Container { page, index } = node {
            self.review(&state, *page, *index)?;
        }
        Ok(true)
    }

    async fn is_enabled(&self, node: &FakeNode) -> DomResult<bool> {
        let _state = self.alive()?;
        match node {
            FakeNode::Next { enabled, .. } => Ok(*enabled),
            _ => Ok(true),
        }
    }

    async fn scroll_into_view(&self, node: &FakeNode) -> DomResult<()> {
        let state = self.alive()?;
        if let FakeNode::ShowMore { page, index } | FakeNode::Container { page, index } = node {
            self.review(&state, *page, *index)?;
        }
        Ok(())
    }

    async fn click(&self, node: &FakeNode) -> DomResult<()> {
        let mut state = self.alive()?;
        match node {
            FakeNode::ShowMore { page, index } => {
                let review = self.review(&state, *page, *index)?;
                if review.show_more_intercepted {
                    return Err(DomError::ClickIntercepted("overlay".into()));
                }
                state.expanded.insert((*page, *index));
            }
            FakeNode::Next { page, enabled } => {
                if *page != state.page {
                    return Err(DomError::Stale);
                }
                let stalls = self.page_of(&state).is_some_and(|p| p.next_stalls);
                if *enabled && !stalls {
                    state.page += 1;
                    if let Some(url) = state.current.clone() {
                        self.site.record_visit(&url, state.page + 1);
                    }
                }
            }
            FakeNode::PopupClose => state.popup_open = false,
            FakeNode::LoadMore => state.load_more_pressed += 1,
            _ => {}
        }
        Ok(())
    }

    async fn scroll_to_bottom(&self) -> DomResult<()> {
        self.alive().map(|_| ())
    }

    async fn close(&mut self) -> DomResult<()> {
        let mut state = self.state.lock().unwrap();
        if !state.closed {
            state.closed = true;
            if let Some(counter) = &self.close_counter {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        }
        Ok(())
    }
}

/// Hands out [`FakeSession`]s over one shared site and counts their lifecycle.
pub(crate) struct FakeFactory {
    site: Arc<FakeSite>,
    created: AtomicUsize,
    closed: Arc<AtomicUsize>,
    /// Creation attempts numbered from this value on fail
    fail_from: Option<usize>,
}

impl FakeFactory {
    pub fn new(site: Arc<FakeSite>) -> Self {
        Self {
            site,
            created: AtomicUsize::new(0),
            closed: Arc::new(AtomicUsize::new(0)),
            fail_from: None,
        }
    }

    pub fn failing_from(mut self, attempt: usize) -> Self {
        self.fail_from = Some(attempt);
        self
    }

    pub fn attempts(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFactory for FakeFactory {
    type Session = FakeSession;

    async fn create(&self) -> DomResult<FakeSession> {
        let attempt = self.created.fetch_add(1, Ordering::SeqCst);
        if self.fail_from.is_some_and(|from| attempt >= from) {
            return Err(DomError::Session("failed to launch browser".into()));
        }
        let mut session = FakeSession::new(self.site.clone());
        session.close_counter = Some(self.closed.clone());
        Ok(session)
    }
}
