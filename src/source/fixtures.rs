//! Built-in demo content: a few sections of invented articles served from memory.

use super::sections;
use super::ArticleSource;
use crate::article::{Article, FeedItem, Section};
use crate::error::FetchError;
use chrono::{Duration, TimeZone, Utc};
use std::collections::HashMap;

const DEMO_HOST: &str = "https://demo.broadsheet.invalid";

struct Fixture {
    slug: &'static str,
    title: &'static str,
    subtitle: &'static str,
    paragraphs: &'static [&'static str],
}

const LEADERS: &[Fixture] = &[
    Fixture {
        slug: "the-quiet-return-of-industrial-policy",
        title: "The quiet return of industrial policy",
        subtitle: "Governments everywhere are picking winners again. Most will pick badly",
        paragraphs: &[
            "For three decades the consensus held that states should set the rules and let markets choose the players. That consensus has cracked. Subsidies for chips, batteries and green steel now run to hundreds of billions of dollars, and every big economy is trying to outbid the others.",
            "Some of this spending will pay off. Supply chains that ran through a single port proved fragile, and a little redundancy is worth buying. But history suggests that most programmes will end up protecting incumbents rather than nurturing upstarts.",
            "The better approach is narrow and time-limited: fund research, build shared infrastructure, and publish the results. Handing cheques to firms with the best lobbyists is not a strategy.",
            "Industrial policy is back. The task now is to keep it modest.",
        ],
    },
    Fixture {
        slug: "why-cities-should-build-up",
        title: "Why cities should build up",
        subtitle: "Zoning rules are the hidden tax on young workers",
        paragraphs: &[
            "Rents in the most productive cities have risen far faster than wages. The cause is not a mystery: planning codes limit how many homes can be built on a plot, and existing owners have every reason to keep it that way.",
            "Places that loosened the rules have seen rents flatten within a few years. Taller buildings near transit lines bring more workers within reach of good jobs, and the extra tax base pays for the trains.",
            "Reform is politically hard because the costs of scarcity are spread thinly while the benefits are concentrated among voters who already own. Linking housing targets to central funding is one way to shift the balance.",
        ],
    },
    Fixture {
        slug: "a-fragile-truce-in-the-chip-wars",
        title: "A fragile truce in the chip wars",
        subtitle: "Export controls have bought time, not safety",
        paragraphs: &[
            "Restrictions on advanced semiconductors were meant to slow rivals' progress in artificial intelligence. They have done so, at a cost. Suppliers have lost customers, and the targeted countries are pouring money into home-grown alternatives.",
            "A truce that trades a pause in new controls for limits on military uses would be hard to verify. Yet the alternative is an escalating cycle that fragments the industry and raises prices for everyone.",
            "Diplomats should aim for transparency first: shared reporting on the largest training runs would be a modest, checkable start.",
        ],
    },
    Fixture {
        slug: "central-banks-and-the-last-mile",
        title: "Central banks and the last mile",
        subtitle: "Getting inflation from three per cent to two is the hardest part",
        paragraphs: &[
            "Headline inflation has fallen sharply from its peak, helped by cheaper energy and mended supply chains. The remaining stickiness is in services, where wages make up most of the cost.",
            "Cutting rates too early risks a second wave; holding them too long risks an unnecessary recession. Central bankers should say clearly which data would change their minds, and then follow the data.",
        ],
    },
];

const BUSINESS: &[Fixture] = &[
    Fixture {
        slug: "the-four-day-week-experiment",
        title: "The four-day week experiment",
        subtitle: "Trials look promising, but the firms that volunteer are not typical",
        paragraphs: &[
            "Companies that tried a shorter week report happier staff and little loss of output. Sceptics note that the firms signing up were already keen and mostly office-based.",
            "The real test will come in hospitals, warehouses and shops, where hours map directly onto output.",
        ],
    },
    Fixture {
        slug: "conglomerates-are-back-in-fashion",
        title: "Conglomerates are back in fashion",
        subtitle: "Investors once punished sprawl. Now they reward it, for a while",
        paragraphs: &[
            "A decade ago activist investors forced sprawling firms to break themselves up. Today several of the same firms are buying again, arguing that scale helps them ride out higher interest rates.",
            "Whether the discount returns depends on discipline. Diversification is cheap for shareholders to do themselves.",
        ],
    },
];

const FINANCE: &[Fixture] = &[Fixture {
    slug: "the-bond-market-wakes-up",
    title: "The bond market wakes up",
    subtitle: "Long-term yields are rising for reasons that have little to do with inflation",
    paragraphs: &[
        "Term premiums, the extra yield investors demand for holding long bonds, have climbed back after years near zero. Large fiscal deficits and quantitative tightening mean there are simply more bonds to absorb.",
        "For governments that borrowed heavily when money was cheap, refinancing will hurt. Treasuries should lengthen the maturity of their debt while they still can.",
    ],
}];

/// An [`ArticleSource`] backed by compiled-in fixtures.
///
/// Knows `leaders`, `business` and `finance`; any other section falls back to
/// `leaders` so section cycling keeps working in demos.
pub struct FixtureSource {
    sections: HashMap<&'static str, Section>,
    articles: HashMap<String, Article>,
}

impl FixtureSource {
    pub fn new() -> Self {
        let mut source = Self {
            sections: HashMap::new(),
            articles: HashMap::new(),
        };
        source.add("leaders", "Leaders (Demo)", "Leaders", LEADERS);
        source.add("business", "Business (Demo)", "Business", BUSINESS);
        source.add(
            "finance-and-economics",
            "Finance & economics (Demo)",
            "Finance & economics",
            FINANCE,
        );
        source
    }

    fn add(&mut self, path: &'static str, title: &str, overtitle: &str, fixtures: &[Fixture]) {
        let base = Utc.with_ymd_and_hms(2026, 1, 22, 9, 0, 0).single();
        let mut items = Vec::with_capacity(fixtures.len());

        for (i, fixture) in fixtures.iter().enumerate() {
            let url = format!("{}/{}/{}", DEMO_HOST, path, fixture.slug);
            let published = base.map(|b| b - Duration::days(i as i64));

            let mut item = FeedItem::new(fixture.title, fixture.subtitle, url.clone());
            if let Some(at) = published {
                item = item.with_published(at);
            }
            let date_line = item.formatted_date();
            items.push(item);

            self.articles.insert(
                url.clone(),
                Article {
                    overtitle: format!("{} | {}", overtitle, fixture.title),
                    title: fixture.title.to_string(),
                    subtitle: fixture.subtitle.to_string(),
                    date_line,
                    content: fixture.paragraphs.join("\n\n"),
                    url,
                    debug_artifact_path: None,
                },
            );
        }

        self.sections.insert(
            path,
            Section {
                title: title.to_string(),
                items,
            },
        );
    }
}

impl Default for FixtureSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ArticleSource for FixtureSource {
    async fn section(&self, name: &str) -> Result<Section, FetchError> {
        let path = sections::resolve(name);
        self.sections
            .get(path.as_str())
            .or_else(|| self.sections.get(sections::DEFAULT_SECTION))
            .cloned()
            .ok_or_else(|| FetchError::User("demo section not found".to_string()))
    }

    async fn article(&self, url: &str) -> Result<Article, FetchError> {
        self.articles
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::User(format!("demo article not found: {url}")))
    }
}
