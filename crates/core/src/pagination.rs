//! List pagination: splitting a fetched list into fixed-size pages, parsing
//! `[perPage] [page]` command arguments and deciding which navigation
//! controls a page shows.
//!
//! Everything here is pure. An empty list partitions into zero pages, and
//! asking for a page outside `1..=page_count` is a [`PaginationError`] rather
//! than a clamp.
//!
//! Pages are rendered as single Slack messages, which cap a message at 50
//! blocks and an actions row at 25 elements. [`MAX_PAGE_SIZE`] and
//! [`PAGE_BUTTON_WINDOW`] keep every page inside both limits.

use thiserror::Error;

pub const DEFAULT_PAGE_SIZE: usize = 3;
pub const DEFAULT_PAGE: i64 = 1;

/// One block per item plus five for the header, footer and navigation row.
pub const MAX_PAGE_SIZE: usize = 45;

/// Pages covered by the numbered buttons, the current page included. The
/// four fixed controls plus the other twenty pages fit one actions row.
pub const PAGE_BUTTON_WINDOW: usize = 21;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PaginationError {
    #[error("`{token}` is not a whole number")]
    InvalidArgument { token: String },
    #[error("page {requested} is out of range (valid pages: 1..={page_count})")]
    PageOutOfRange { requested: i64, page_count: usize },
    #[error("page size {requested} exceeds the maximum of {max}")]
    PageSizeTooLarge { requested: i64, max: usize },
}

/// Number of items per page. Always at least one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PageSize(usize);

impl PageSize {
    /// Non-positive sizes fall back to [`DEFAULT_PAGE_SIZE`].
    pub fn new(raw: i64) -> Self {
        usize::try_from(raw).ok().filter(|size| *size >= 1).map_or(Self::default(), Self)
    }

    /// Like [`PageSize::new`], but rejects sizes above [`MAX_PAGE_SIZE`].
    pub fn bounded(raw: i64) -> Result<Self, PaginationError> {
        let size = Self::new(raw);
        size.check_limit()?;
        Ok(size)
    }

    pub fn check_limit(self) -> Result<(), PaginationError> {
        if self.0 > MAX_PAGE_SIZE {
            return Err(PaginationError::PageSizeTooLarge {
                requested: i64::try_from(self.0).unwrap_or(i64::MAX),
                max: MAX_PAGE_SIZE,
            });
        }
        Ok(())
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(DEFAULT_PAGE_SIZE)
    }
}

impl std::fmt::Display for PageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageArgs {
    pub page_size: PageSize,
    pub page: i64,
}

impl Default for PageArgs {
    fn default() -> Self {
        Self { page_size: PageSize::default(), page: DEFAULT_PAGE }
    }
}

/// Parses the free text of a list command.
///
/// One token is `perPage`, two tokens are `perPage page`. Any other token
/// count yields the defaults. Tokens that are present but not integers are
/// rejected, as is a `perPage` above [`MAX_PAGE_SIZE`].
pub fn parse_page_args(text: &str) -> Result<PageArgs, PaginationError> {
    let tokens = text.split_whitespace().collect::<Vec<_>>();

    match tokens.as_slice() {
        [page_size] => Ok(PageArgs {
            page_size: PageSize::bounded(parse_integer(page_size)?)?,
            page: DEFAULT_PAGE,
        }),
        [page_size, page] => Ok(PageArgs {
            page_size: PageSize::bounded(parse_integer(page_size)?)?,
            page: parse_integer(page)?,
        }),
        _ => Ok(PageArgs::default()),
    }
}

fn parse_integer(token: &str) -> Result<i64, PaginationError> {
    token.parse::<i64>().map_err(|_| PaginationError::InvalidArgument { token: token.to_owned() })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partition<T> {
    pages: Vec<Vec<T>>,
    total_items: usize,
    page_size: PageSize,
}

/// Splits `items` into consecutive pages of `page_size`, preserving order.
/// The last page may be short.
pub fn partition<T>(items: Vec<T>, page_size: PageSize) -> Partition<T> {
    let total_items = items.len();
    let size = page_size.get();
    let mut pages = Vec::with_capacity(total_items.div_ceil(size));
    let mut remaining = items.into_iter();

    loop {
        let page = remaining.by_ref().take(size).collect::<Vec<_>>();
        if page.is_empty() {
            break;
        }
        pages.push(page);
    }

    Partition { pages, total_items, page_size }
}

impl<T> Partition<T> {
    pub fn pages(&self) -> &[Vec<T>] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn total_items(&self) -> usize {
        self.total_items
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Validates a 1-based page request against this partition.
    pub fn checked_page(&self, requested: i64) -> Result<usize, PaginationError> {
        usize::try_from(requested)
            .ok()
            .filter(|page| (1..=self.page_count()).contains(page))
            .ok_or(PaginationError::PageOutOfRange {
                requested,
                page_count: self.page_count(),
            })
    }

    /// Items on the 1-based `page`.
    pub fn page(&self, page: usize) -> Option<&[T]> {
        page.checked_sub(1).and_then(|index| self.pages.get(index)).map(Vec::as_slice)
    }
}

/// An interactive control in the navigation row of a paginated message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NavControl {
    First,
    Previous,
    Next,
    Last,
    Page(usize),
}

impl NavControl {
    /// The button value carried back by Slack when the control is clicked.
    pub fn value(&self) -> String {
        match self {
            Self::First => "first".to_owned(),
            Self::Previous => "prev".to_owned(),
            Self::Next => "next".to_owned(),
            Self::Last => "last".to_owned(),
            Self::Page(page) => format!("page_{page}"),
        }
    }

    pub fn from_value(value: &str) -> Option<Self> {
        match value {
            "first" => Some(Self::First),
            "prev" => Some(Self::Previous),
            "next" => Some(Self::Next),
            "last" => Some(Self::Last),
            other => other.strip_prefix("page_")?.parse().ok().map(Self::Page),
        }
    }

    /// Target page when clicked from `current`, clamped to `1..=page_count`.
    pub fn resolve(&self, current: usize, page_count: usize) -> usize {
        let target = match self {
            Self::First => 1,
            Self::Previous => current.saturating_sub(1),
            Self::Next => current.saturating_add(1),
            Self::Last => page_count,
            Self::Page(page) => *page,
        };
        target.clamp(1, page_count.max(1))
    }
}

/// Controls shown for `requested` out of `page_count` pages, or `None` when
/// everything fits on one page.
///
/// Previous only appears from page 3 and Next disappears on the penultimate
/// page; existing Slack messages rely on this layout. Numbered buttons cover
/// a window of [`PAGE_BUTTON_WINDOW`] pages around `requested`.
pub fn navigation_controls(requested: usize, page_count: usize) -> Option<Vec<NavControl>> {
    if page_count <= 1 {
        return None;
    }

    let window = PAGE_BUTTON_WINDOW.min(page_count);
    let first_numbered =
        requested.saturating_sub(window / 2).max(1).min(page_count + 1 - window);
    let last_numbered = first_numbered + window - 1;

    let mut controls = Vec::with_capacity(window + 3);
    if requested != 1 {
        controls.push(NavControl::First);
    }
    if requested > 2 {
        controls.push(NavControl::Previous);
    }
    if requested < page_count - 1 {
        controls.push(NavControl::Next);
    }
    if requested != page_count {
        controls.push(NavControl::Last);
    }
    controls.extend(
        (first_numbered..=last_numbered).filter(|page| *page != requested).map(NavControl::Page),
    );

    Some(controls)
}
