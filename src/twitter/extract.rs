use compact_str::CompactString;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

pub const CSV_HEADER: [&str; 7] = [
    "User",
    "Handle",
    "PostDate",
    "TweetText",
    "ReplyCount",
    "RetweetCount",
    "LikeCount",
];

/// One fully-populated post card. Counts keep the source-rendered text,
/// abbreviations like `3.4K` included.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Tweet {
    pub user: CompactString,
    pub handle: CompactString,
    pub post_date: CompactString,
    pub text: String,
    pub replies: CompactString,
    pub retweets: CompactString,
    pub likes: CompactString,
}

pub struct Extractor {
    sel_span: Selector,
    sel_time: Selector,
    sel_reply: Selector,
    sel_retweet: Selector,
    sel_like: Selector,
}

impl Extractor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sel_span: Selector::parse("span").unwrap(),
            sel_time: Selector::parse("time").unwrap(),
            sel_reply: Selector::parse(r#"div[data-testid="reply"]"#).unwrap(),
            sel_retweet: Selector::parse(r#"div[data-testid="retweet"]"#).unwrap(),
            sel_like: Selector::parse(r#"div[data-testid="like"]"#).unwrap(),
        }
    }

    /// Pull the seven fields out of one card's outer HTML. All-or-nothing: a
    /// single missing field discards the whole card.
    #[must_use]
    pub fn extract(&self, html: &str) -> Option<Tweet> {
        let fragment = Html::parse_fragment(html);
        let card = fragment.root_element().child_elements().next()?;

        let user = first_text(card, &self.sel_span)?;
        // The handle carries no marker of its own; the first span containing
        // an `@` wins, even when that is a mention inside earlier body text.
        let handle = card
            .select(&self.sel_span)
            .find(|span| span.text().any(|t| t.contains('@')))?
            .text()
            .map(str::trim)
            .collect();
        let post_date = card.select(&self.sel_time).next()?.attr("datetime")?.into();
        let text = body_text(card)?;
        let replies = first_text(card, &self.sel_reply)?;
        let retweets = first_text(card, &self.sel_retweet)?;
        let likes = first_text(card, &self.sel_like)?;

        Some(Tweet {
            user,
            handle,
            post_date,
            text,
            replies,
            retweets,
            likes,
        })
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

fn first_text(card: ElementRef<'_>, selector: &Selector) -> Option<CompactString> {
    Some(card.select(selector).next()?.text().map(str::trim).collect())
}

/// The body sits behind a fixed positional path: second div child of the
/// card, then its second div child. Any layout change invalidates this.
fn body_text(card: ElementRef<'_>) -> Option<String> {
    let outer = nth_div_child(card, 1)?;
    let inner = nth_div_child(outer, 1)?;
    Some(inner.text().collect::<String>().trim().to_owned())
}

fn nth_div_child(element: ElementRef<'_>, n: usize) -> Option<ElementRef<'_>> {
    element
        .child_elements()
        .filter(|child| child.value().name() == "div")
        .nth(n)
}
