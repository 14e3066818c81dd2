use std::fmt;

use tracing::{debug, info, warn};

use crate::browser::wait::{poll_until, wait_for, Condition};
use crate::browser::{DomError, DomResult, Session};
use crate::collector::CollectorConfig;
use crate::domain::{ReviewRecord, Task};
use crate::scraper::{PageExtractor, ReviewSelectors};

/// Why paging through a product stopped normally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEnd {
    /// The first page had no review containers
    NoReviews,
    /// A later page came up empty
    EmptyPage,
    /// No enabled next-page control within the wait
    LastPage,
    /// The next control was clicked but no new reviews appeared
    NextTimeout,
    /// Clicking the next control failed
    NextUnclickable(DomError),
    /// The configured page limit was reached
    PageLimit,
    /// Navigation failed without taking the session down
    Unreachable(DomError),
}

impl fmt::Display for PageEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageEnd::NoReviews => write!(f, "no reviews"),
            PageEnd::EmptyPage => write!(f, "empty page"),
            PageEnd::LastPage => write!(f, "last page"),
            PageEnd::NextTimeout => write!(f, "no new reviews after next"),
            PageEnd::NextUnclickable(e) => write!(f, "next not clickable ({})", e),
            PageEnd::PageLimit => write!(f, "page limit"),
            PageEnd::Unreachable(e) => write!(f, "unreachable ({})", e),
        }
    }
}

/// Terminal state of one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Done(PageEnd),
    /// The session broke; records gathered before the failure are kept
    Failed(DomError),
}

impl Outcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

/// Everything one task produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub records: Vec<ReviewRecord>,
    /// Review pages read, including empty ones
    pub pages: usize,
    pub outcome: Outcome,
}

enum State {
    Loading,
    Scrolled,
    HasReviews,
    NextPage,
    Done(PageEnd),
    Failed(DomError),
}

/// Drives one session through the review pages of one product.
pub struct Paginator {
    selectors: ReviewSelectors,
    config: CollectorConfig,
}

impl Paginator {
    pub fn new(selectors: ReviewSelectors, config: CollectorConfig) -> Self {
        Self { selectors, config }
    }

    /// Scrape every review page of `task.url`. Never returns an error: a
    /// broken session ends in [`Outcome::Failed`] with partial records.
    pub async fn run<S: Session>(&self, session: &mut S, task: &Task) -> TaskReport {
        let extractor = PageExtractor::new(&self.selectors, &self.config);
        let mut records = Vec::new();
        let mut page = 0usize;
        let mut state = State::Loading;

        loop {
            state = match state {
                State::Loading => match self.load(session, &task.url).await {
                    Ok(None) => State::Scrolled,
                    Ok(Some(end)) => State::Done(end),
                    Err(e) => State::Failed(e),
                },
                State::Scrolled => match self.scroll_to_reviews(session).await {
                    Ok(()) => {
                        page = 1;
                        State::HasReviews
                    }
                    Err(e) => State::Failed(e),
                },
                State::HasReviews => match extractor.expand_and_extract(session).await {
                    Ok(reviews) if reviews.is_empty() => {
                        State::Done(if page == 1 { PageEnd::NoReviews } else { PageEnd::EmptyPage })
                    }
                    Ok(reviews) => {
                        debug!("Page {} of {}: {} reviews", page, task.url, reviews.len());
                        records.extend(reviews.into_iter().map(|r| r.labelled(&task.label)));
                        if self.config.max_pages.is_some_and(|max| page >= max) {
                            State::Done(PageEnd::PageLimit)
                        } else {
                            State::NextPage
                        }
                    }
                    Err(e) => State::Failed(e),
                },
                State::NextPage => match self.next_page(session).await {
                    Ok(None) => {
                        page += 1;
                        tokio::time::sleep(self.config.page_settle()).await;
                        State::HasReviews
                    }
                    Ok(Some(end)) => State::Done(end),
                    Err(e) => State::Failed(e),
                },
                State::Done(end) => {
                    info!("{}: {} reviews over {} pages ({})", task.url, records.len(), page, end);
                    return TaskReport {
                        records,
                        pages: page,
                        outcome: Outcome::Done(end),
                    };
                }
                State::Failed(e) => {
                    warn!("{}: session failed after {} reviews: {}", task.url, records.len(), e);
                    return TaskReport {
                        records,
                        pages: page,
                        outcome: Outcome::Failed(e),
                    };
                }
            };
        }
    }

    /// Open `url`; `Some(end)` when it cannot be reached but the session is fine.
    async fn load<S: Session>(&self, session: &mut S, url: &str) -> DomResult<Option<PageEnd>> {
        match session.navigate(url).await {
            Ok(()) => {}
            Err(DomError::Timeout) => warn!("Navigation to {} timed out, continuing", url),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("Could not open {}: {}", url, e);
                return Ok(Some(PageEnd::Unreachable(e)));
            }
        }

        let loaded = wait_for(
            session,
            &self.selectors.page_loaded,
            Condition::Present,
            self.config.page_load_wait(),
        )
        .await?;
        if loaded.is_none() {
            warn!("Page {} did not finish loading, continuing", url);
        }
        Ok(None)
    }

    async fn scroll_to_reviews<S: Session>(&self, session: &S) -> DomResult<()> {
        let short = self.config.short_wait();

        match wait_for(session, &self.selectors.reviews_section, Condition::Present, short).await? {
            Some(section) => match session.scroll_into_view(&section).await {
                Ok(()) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!("Could not scroll to reviews: {}", e),
            },
            None => warn!("Reviews section not found, continuing"),
        }

        if wait_for(session, &self.selectors.container, Condition::Visible, short)
            .await?
            .is_none()
        {
            debug!("No visible review container after scrolling");
        }
        Ok(())
    }

    /// Advance to the next review page; `Some(end)` when there is none.
    async fn next_page<S: Session>(&self, session: &S) -> DomResult<Option<PageEnd>> {
        let before = self.page_mark(session).await?;

        let next = wait_for(
            session,
            &self.selectors.next_page,
            Condition::Clickable,
            self.config.short_wait(),
        )
        .await?;
        let Some(next) = next else {
            return Ok(Some(PageEnd::LastPage));
        };

        if let Err(e) = self.click_next(session, &next).await {
            if e.is_fatal() {
                return Err(e);
            }
            return Ok(Some(PageEnd::NextUnclickable(e)));
        }

        let before = &before;
        let advanced = poll_until(self.config.page_load_wait(), move || async move {
            let now = self.page_mark(session).await?;
            if now.texts.is_empty() {
                return Ok(None);
            }
            let moved = now.texts != before.texts
                || match &before.first {
                    Some(old) => is_gone(session, old).await?,
                    None => true,
                };
            Ok(moved.then_some(()))
        })
        .await?;
        if advanced.is_some() {
            return Ok(None);
        }

        // A page that rendered no reviews at all still counts as advanced
        if !before.texts.is_empty() && self.page_mark(session).await?.texts.is_empty() {
            return Ok(None);
        }
        Ok(Some(PageEnd::NextTimeout))
    }

    async fn click_next<S: Session>(&self, session: &S, next: &S::Node) -> DomResult<()> {
        session.scroll_into_view(next).await?;
        tokio::time::sleep(self.config.click_settle()).await;
        session.click(next).await
    }

    /// Review containers on screen and their texts, used to tell pages apart.
    async fn page_mark<S: Session>(&self, session: &S) -> DomResult<PageMark<S::Node>> {
        let containers = match session.find_all(&self.selectors.container).await {
            Ok(containers) => containers,
            Err(e) if e.is_fatal() => return Err(e),
            Err(_) => Vec::new(),
        };

        let mut texts = Vec::with_capacity(containers.len());
        for container in &containers {
            match session.text(container).await {
                Ok(text) => texts.push(text),
                Err(e) if e.is_fatal() => return Err(e),
                Err(_) => {}
            }
        }
        Ok(PageMark {
            first: containers.into_iter().next(),
            texts,
        })
    }
}

struct PageMark<N> {
    first: Option<N>,
    texts: Vec<String>,
}

/// Whether `node` left the rendered page, e.g. removed by a re-render.
/// A detached element has no layout, so it reads as not visible.
async fn is_gone<S: Session>(session: &S, node: &S::Node) -> DomResult<bool> {
    match session.is_visible(node).await {
        Ok(visible) => Ok(!visible),
        Err(DomError::Stale) => Ok(true),
        Err(e) if e.is_fatal() => Err(e),
        Err(_) => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::testing::{FakePage, FakeReview, FakeSession, FakeSite};
    use crate::domain::NOT_AVAILABLE;
    use std::sync::Arc;

    const URL: &str = "https://shop.test/product-1";

    fn paginator() -> Paginator {
        Paginator::new(ReviewSelectors::default(), CollectorConfig::for_tests())
    }

    fn site(page: FakePage) -> Arc<FakeSite> {
        Arc::new(FakeSite::new(ReviewSelectors::default()).with_page(URL, page))
    }

    async fn run(site: &Arc<FakeSite>, paginator: &Paginator, label: &str) -> TaskReport {
        let mut session = FakeSession::new(site.clone());
        paginator.run(&mut session, &Task::new(URL, label)).await
    }

    #[tokio::test]
    async fn test_walks_all_pages_and_labels_records() {
        let site = site(FakePage::reviews(vec![
            vec![("a", "1"), ("b", "2")],
            vec![("c", "3")],
            vec![("d", "4")],
        ]));

        let report = run(&site, &paginator(), "phones").await;

        assert_eq!(report.outcome, Outcome::Done(PageEnd::LastPage));
        assert_eq!(report.pages, 3);
        assert_eq!(report.records.len(), 4);
        assert!(report.records.iter().all(|r| r.label == "phones"));
        assert_eq!(site.visits_to(URL), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_empty_first_page_never_visits_page_two() {
        let site = site(FakePage::reviews(vec![vec![], vec![("late", "review")]]));

        let report = run(&site, &paginator(), "x").await;

        assert_eq!(report.outcome, Outcome::Done(PageEnd::NoReviews));
        assert!(report.records.is_empty());
        assert_eq!(site.visits_to(URL), vec![1]);
    }

    #[tokio::test]
    async fn test_disabled_next_ends_like_missing_next() {
        let disabled = site(FakePage::reviews(vec![vec![("a", "1")]]).disabled_next());
        let missing = site(FakePage::reviews(vec![vec![("a", "1")]]));

        let with_disabled = run(&disabled, &paginator(), "x").await;
        let with_missing = run(&missing, &paginator(), "x").await;

        assert_eq!(with_disabled, with_missing);
        assert_eq!(with_disabled.outcome, Outcome::Done(PageEnd::LastPage));
        assert_eq!(disabled.visits_to(URL), vec![1]);
    }

    #[tokio::test]
    async fn test_later_empty_page_ends_pagination() {
        let site = site(FakePage::reviews(vec![vec![("a", "1")], vec![]]));

        let report = run(&site, &paginator(), "x").await;

        assert_eq!(report.outcome, Outcome::Done(PageEnd::EmptyPage));
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.pages, 2);
    }

    #[tokio::test]
    async fn test_stalled_next_times_out() {
        let site = site(FakePage::reviews(vec![vec![("a", "1")], vec![("b", "2")]]).stalling_next());

        let report = run(&site, &paginator(), "x").await;

        assert_eq!(report.outcome, Outcome::Done(PageEnd::NextTimeout));
        assert_eq!(report.records.len(), 1);
    }

    #[tokio::test]
    async fn test_page_limit() {
        let site = site(FakePage::reviews(vec![vec![("a", "1")], vec![("b", "2")], vec![("c", "3")]]));
        let mut config = CollectorConfig::for_tests();
        config.max_pages = Some(2);
        let paginator = Paginator::new(ReviewSelectors::default(), config);

        let report = run(&site, &paginator, "x").await;

        assert_eq!(report.outcome, Outcome::Done(PageEnd::PageLimit));
        assert_eq!(report.records.len(), 2);
        assert_eq!(site.visits_to(URL), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_crash_keeps_partial_records() {
        let site = site(
            FakePage::reviews(vec![vec![("a", "1"), ("b", "2")], vec![("c", "3")]]).crash_on(2),
        );

        let report = run(&site, &paginator(), "x").await;

        assert!(report.outcome.is_failed());
        assert_eq!(report.records.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_markers_are_not_fatal() {
        let site = site(
            FakePage::reviews(vec![vec![("a", "1")]])
                .without_main()
                .without_reviews_section(),
        );

        let report = run(&site, &paginator(), "x").await;

        assert_eq!(report.outcome, Outcome::Done(PageEnd::LastPage));
        assert_eq!(report.records.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_fields_keep_record() {
        let site = site(FakePage::review_pages(vec![vec![
            FakeReview::new("t", "c").without_content(),
        ]]));

        let report = run(&site, &paginator(), "x").await;

        assert_eq!(report.records, vec![ReviewRecord::new("t", NOT_AVAILABLE, "x")]);
    }

    #[tokio::test]
    async fn test_unreachable_url_keeps_session() {
        let site = site(FakePage::reviews(vec![vec![("a", "1")]]));
        let mut session = FakeSession::new(site.clone());
        let paginator = paginator();

        let report = paginator
            .run(&mut session, &Task::new("https://shop.test/missing", "x"))
            .await;

        assert!(matches!(report.outcome, Outcome::Done(PageEnd::Unreachable(_))));
        assert!(report.records.is_empty());
        assert_eq!(report.pages, 0);

        let next = paginator.run(&mut session, &Task::new(URL, "x")).await;
        assert_eq!(next.records.len(), 1);
    }

    #[tokio::test]
    async fn test_repeated_first_review_still_advances() {
        let site = site(FakePage::reviews(vec![
            vec![("Hài lòng", "Tốt")],
            vec![("Hài lòng", "Tốt"), ("b", "2")],
            vec![("c", "3")],
        ]));

        let report = run(&site, &paginator(), "x").await;

        assert_eq!(report.outcome, Outcome::Done(PageEnd::LastPage));
        assert_eq!(report.records.len(), 4);
        assert_eq!(site.visits_to(URL), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_identical_pages_advance_on_rerender() {
        let site = site(FakePage::reviews(vec![vec![("Tốt", "")], vec![("Tốt", "")]]));

        let report = run(&site, &paginator(), "x").await;

        assert_eq!(report.outcome, Outcome::Done(PageEnd::LastPage));
        assert_eq!(report.pages, 2);
        assert_eq!(report.records.len(), 2);
    }
}
