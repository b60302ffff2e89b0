//! Flat-file description of a network.
//!
//! Two files describe a topology, both made of comma separated entries
//! whose fields are separated by `|`. Whitespace and line breaks between
//! tokens are ignored.
//!
//! * the **link file** (`connection_info.ri`) has one `a|b|bandwidth`
//!   entry per link, optionally followed by a `|5%` failure rate;
//! * the **router file** (`router_info.ri`) has one `max_queue_size`
//!   entry per router, in id order.
//!
//! ```text
//! 0|1|10, 1|2|10|5%,
//! 2|3|20
//! ```

use anyhow::Context as _;
use logos::{Lexer, Logos};
use routesim_core::{
    ConfigurationError, SimConfiguration,
    connection::ConnectionError,
    measure::{FailureRate, FailureRateParseError},
    network::{Network, RouterNotFound},
    router::RouterId,
};
use std::path::Path;
use thiserror::Error;

/// the link file of the demonstration network
pub const DEMONSTRATION_LINKS: &str = include_str!("../assets/connection_info.ri");

/// the router file of the demonstration network
pub const DEMONSTRATION_ROUTERS: &str = include_str!("../assets/router_info.ri");

/// A parsed network description, ready to [`build`](Topology::build).
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    num_routers: usize,
    max_queue_sizes: Vec<u64>,
    links: Vec<LinkSpec>,
}

/// One entry of the link file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkSpec {
    pub a: RouterId,
    pub b: RouterId,
    pub bandwidth: f64,
    /// [`FailureRate::NONE`] when the entry has no fourth field
    pub failure_rate: FailureRate,
}

/// Error returned when a topology cannot be parsed or built.
///
/// Entries are numbered from `0`, in file order.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("Entry {entry}: unexpected `{text}'")]
    Unexpected { entry: usize, text: String },
    #[error("Entry {entry}: unexpected end of input")]
    UnexpectedEnd { entry: usize },
    #[error("Entry {entry}: expected {expected} fields, found {found}")]
    FieldCount {
        entry: usize,
        expected: usize,
        found: usize,
    },
    #[error("Entry {entry}: invalid {field} `{text}'")]
    InvalidNumber {
        entry: usize,
        field: &'static str,
        text: String,
    },
    #[error("Entry {entry}: invalid failure rate `{text}'")]
    InvalidFailureRate {
        entry: usize,
        text: String,
        #[source]
        source: FailureRateParseError,
    },
    #[error("Link entry {entry}: {source}")]
    Link {
        entry: usize,
        #[source]
        source: ConnectionError,
    },
    #[error("{0}")]
    Router(#[from] RouterNotFound),
    #[error("Invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),
}

#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum Token {
    #[token(",")]
    Comma,
    #[token("|")]
    Pipe,

    #[regex(r"[0-9]+(\.[0-9]+)?")]
    Value,
    #[regex(r"[0-9]+(\.[0-9]+)?%")]
    Percentage,
}

impl Topology {
    /// Parse the router file and the link file.
    ///
    /// The number of routers is the largest of the number of entries of
    /// the router file and the highest router id of the link file plus
    /// one. Routers without an entry keep the default queue size of the
    /// [`SimConfiguration`].
    ///
    /// ```
    /// # use routesim::topology::Topology;
    /// let topology = Topology::parse("100, 50", "0|1|10, 1|2|20").unwrap();
    ///
    /// assert_eq!(topology.num_routers(), 3);
    /// assert_eq!(topology.max_queue_sizes(), &[100, 50]);
    /// assert_eq!(topology.links().len(), 2);
    /// ```
    pub fn parse(routers: &str, links: &str) -> Result<Self, TopologyError> {
        let max_queue_sizes = parse_routers(routers)?;
        let links = parse_links(links)?;

        let linked = links
            .iter()
            .flat_map(|link| [link.a, link.b])
            .map(|id| id.index() + 1)
            .max()
            .unwrap_or(0);

        Ok(Self {
            num_routers: max_queue_sizes.len().max(linked),
            max_queue_sizes,
            links,
        })
    }

    /// Read and parse the router file and the link file.
    pub fn load(routers: impl AsRef<Path>, links: impl AsRef<Path>) -> anyhow::Result<Self> {
        let routers = routers.as_ref();
        let links = links.as_ref();

        let router_file = std::fs::read_to_string(routers)
            .with_context(|| format!("Failed to read router file {}", routers.display()))?;
        let link_file = std::fs::read_to_string(links)
            .with_context(|| format!("Failed to read link file {}", links.display()))?;

        Self::parse(&router_file, &link_file)
            .with_context(|| format!("Invalid topology ({}, {})", routers.display(), links.display()))
    }

    /// the 16 routers network of the demonstration scenario
    pub fn demonstration() -> Result<Self, TopologyError> {
        Self::parse(DEMONSTRATION_ROUTERS, DEMONSTRATION_LINKS)
    }

    pub fn num_routers(&self) -> usize {
        self.num_routers
    }

    pub fn max_queue_sizes(&self) -> &[u64] {
        &self.max_queue_sizes
    }

    pub fn links(&self) -> &[LinkSpec] {
        &self.links
    }

    /// Create the network: every router with its queue size, every link
    /// as a pair of reciprocal connections.
    ///
    /// The configuration is validated first, see
    /// [`SimConfiguration::validate`].
    pub fn build<T>(&self, configuration: SimConfiguration) -> Result<Network<T>, TopologyError> {
        configuration.validate()?;
        let mut network = Network::with_configuration(self.num_routers, configuration);

        for (index, max_queue_size) in self.max_queue_sizes.iter().copied().enumerate() {
            network
                .configure_router(RouterId::from(index))
                .set_max_queue_size(max_queue_size)
                .apply()?;
        }

        for (entry, link) in self.links.iter().enumerate() {
            network
                .configure_link(link.a, link.b)
                .set_bandwidth(link.bandwidth)
                .set_failure_rate(link.failure_rate)
                .apply()
                .map_err(|source| TopologyError::Link { entry, source })?;
        }

        tracing::debug!(
            routers = self.num_routers,
            links = self.links.len(),
            "network built"
        );
        Ok(network)
    }
}

fn parse_routers(input: &str) -> Result<Vec<u64>, TopologyError> {
    entries(input)?
        .into_iter()
        .enumerate()
        .map(|(entry, fields)| match fields.as_slice() {
            [max_queue_size] => parse_number(entry, "max queue size", max_queue_size),
            _ => Err(TopologyError::FieldCount {
                entry,
                expected: 1,
                found: fields.len(),
            }),
        })
        .collect()
}

fn parse_links(input: &str) -> Result<Vec<LinkSpec>, TopologyError> {
    entries(input)?
        .into_iter()
        .enumerate()
        .map(|(entry, fields)| {
            let (a, b, bandwidth, failure_rate) = match fields.as_slice() {
                [a, b, bandwidth] => (a, b, bandwidth, None),
                [a, b, bandwidth, failure_rate] => (a, b, bandwidth, Some(failure_rate)),
                _ => {
                    return Err(TopologyError::FieldCount {
                        entry,
                        expected: 3,
                        found: fields.len(),
                    });
                }
            };

            let failure_rate = match failure_rate {
                Some(text) => {
                    text.parse()
                        .map_err(|source| TopologyError::InvalidFailureRate {
                            entry,
                            text: (*text).to_owned(),
                            source,
                        })?
                }
                None => FailureRate::NONE,
            };

            Ok(LinkSpec {
                a: RouterId::new(parse_number(entry, "router id", a)?),
                b: RouterId::new(parse_number(entry, "router id", b)?),
                bandwidth: parse_number(entry, "bandwidth", bandwidth)?,
                failure_rate,
            })
        })
        .collect()
}

fn parse_number<N: std::str::FromStr>(
    entry: usize,
    field: &'static str,
    text: &str,
) -> Result<N, TopologyError> {
    text.parse().map_err(|_| TopologyError::InvalidNumber {
        entry,
        field,
        text: text.to_owned(),
    })
}

/// Split the input into entries of `|` separated fields. A trailing
/// comma is accepted.
fn entries(input: &str) -> Result<Vec<Vec<&str>>, TopologyError> {
    let mut lex: Lexer<'_, Token> = Token::lexer(input);

    let mut entries = Vec::new();
    let mut fields = Vec::new();
    let mut expecting_value = true;

    while let Some(token) = lex.next() {
        let entry = entries.len();
        match token {
            Ok(Token::Value | Token::Percentage) if expecting_value => {
                fields.push(lex.slice());
                expecting_value = false;
            }
            Ok(Token::Pipe) if !expecting_value => expecting_value = true,
            Ok(Token::Comma) if !expecting_value => {
                entries.push(std::mem::take(&mut fields));
                expecting_value = true;
            }
            _ => {
                return Err(TopologyError::Unexpected {
                    entry,
                    text: lex.slice().to_owned(),
                });
            }
        }
    }

    if !fields.is_empty() {
        if expecting_value {
            return Err(TopologyError::UnexpectedEnd {
                entry: entries.len(),
            });
        }
        entries.push(fields);
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logos_lexer() {
        let mut lex = Token::lexer("12|3.5,");

        assert_eq!(lex.next(), Some(Ok(Token::Value)));
        assert_eq!(lex.slice(), "12");
        assert_eq!(lex.next(), Some(Ok(Token::Pipe)));
        assert_eq!(lex.next(), Some(Ok(Token::Value)));
        assert_eq!(lex.slice(), "3.5");
        assert_eq!(lex.next(), Some(Ok(Token::Comma)));
        assert_eq!(lex.next(), None);

        let mut lex = Token::lexer("12.5%");
        assert_eq!(lex.next(), Some(Ok(Token::Percentage)));
        assert_eq!(lex.slice(), "12.5%");
    }

    #[test]
    fn entries_ignore_line_breaks() {
        let entries = entries("0|1|10,\n1|2|10\n").unwrap();
        assert_eq!(entries, vec![vec!["0", "1", "10"], vec!["1", "2", "10"]]);
    }

    #[test]
    fn entries_accept_trailing_comma() {
        assert_eq!(entries("5,6,").unwrap(), vec![vec!["5"], vec!["6"]]);
        assert!(entries("").unwrap().is_empty());
    }

    #[test]
    fn entries_reject_garbage() {
        assert!(matches!(
            entries("0|1|x"),
            Err(TopologyError::Unexpected { entry: 0, .. })
        ));
        assert!(matches!(
            entries("1,,2"),
            Err(TopologyError::Unexpected { entry: 1, .. })
        ));
        assert!(matches!(
            entries("0|1|"),
            Err(TopologyError::UnexpectedEnd { entry: 0 })
        ));
    }

    #[test]
    fn parse_links() {
        let links = super::parse_links("0|1|10, 2|0|2.5").unwrap();

        assert_eq!(
            links,
            vec![
                LinkSpec {
                    a: RouterId::new(0),
                    b: RouterId::new(1),
                    bandwidth: 10.0,
                    failure_rate: FailureRate::NONE,
                },
                LinkSpec {
                    a: RouterId::new(2),
                    b: RouterId::new(0),
                    bandwidth: 2.5,
                    failure_rate: FailureRate::NONE,
                },
            ]
        );
    }

    #[test]
    fn link_entries_need_three_fields() {
        assert!(matches!(
            super::parse_links("0|1|10,0|1"),
            Err(TopologyError::FieldCount {
                entry: 1,
                expected: 3,
                found: 2
            })
        ));
    }

    #[test]
    fn link_failure_rate() {
        let links = super::parse_links("0|1|10|5%, 1|2|10").unwrap();

        assert_eq!(links[0].failure_rate, FailureRate::new(0.05).unwrap());
        assert_eq!(links[1].failure_rate, FailureRate::NONE);
    }

    #[test]
    fn link_failure_rate_is_a_percentage() {
        assert!(matches!(
            super::parse_links("0|1|10|0.5"),
            Err(TopologyError::InvalidFailureRate {
                entry: 0,
                source: FailureRateParseError::MissingSuffix,
                ..
            })
        ));
        assert!(matches!(
            super::parse_links("0|1|10|150%"),
            Err(TopologyError::InvalidFailureRate {
                source: FailureRateParseError::OutOfRange(_),
                ..
            })
        ));
        assert!(matches!(
            super::parse_links("0|1|10|5%|1"),
            Err(TopologyError::FieldCount { found: 5, .. })
        ));
    }

    #[test]
    fn build_applies_failure_rate() {
        let topology = Topology::parse("", "0|1|10|100%").unwrap();
        let mut network: Network<()> = topology.build(SimConfiguration::default()).unwrap();

        let (a, b) = (RouterId::new(0), RouterId::new(1));
        assert_eq!(network.sample_connection_success(a, b), Some(false));
        assert_eq!(network.sample_connection_success(b, a), Some(false));
    }

    #[test]
    fn router_ids_are_integers() {
        assert!(matches!(
            super::parse_links("0|1.5|10"),
            Err(TopologyError::InvalidNumber {
                field: "router id",
                ..
            })
        ));
    }

    #[test]
    fn router_entries_have_a_single_field() {
        assert!(matches!(
            parse_routers("100|5"),
            Err(TopologyError::FieldCount { expected: 1, .. })
        ));
    }

    #[test]
    fn router_count_covers_links() {
        let topology = Topology::parse("100", "0|4|10").unwrap();
        assert_eq!(topology.num_routers(), 5);

        let topology = Topology::parse("1,2,3,4,5,6", "0|1|10").unwrap();
        assert_eq!(topology.num_routers(), 6);
    }

    #[test]
    fn build() {
        let topology = Topology::parse("100, 50", "0|1|10, 1|2|20").unwrap();
        let network: Network<()> = topology.build(SimConfiguration::default()).unwrap();

        assert_eq!(network.num_routers(), 3);
        let r1 = network.router(RouterId::new(1)).unwrap();
        assert_eq!(r1.max_queue_size(), 50);
        assert_eq!(r1.connections().len(), 2);
        assert_eq!(r1.distance_to(RouterId::new(2)).into_f64(), 5.0);

        let r2 = network.router(RouterId::new(2)).unwrap();
        assert_eq!(r2.max_queue_size(), u64::MAX);
    }

    #[test]
    fn build_rejects_invalid_links() {
        let topology = Topology::parse("", "0|0|10").unwrap();
        let result = topology.build::<()>(SimConfiguration::default());

        assert!(matches!(
            result,
            Err(TopologyError::Link {
                entry: 0,
                source: ConnectionError::SelfConnection { .. }
            })
        ));
    }

    #[test]
    fn build_rejects_invalid_configuration() {
        let topology = Topology::parse("", "0|1|10").unwrap();
        let configuration = SimConfiguration {
            throttle_decay_rate: -2.0,
            ..SimConfiguration::default()
        };

        assert!(matches!(
            topology.build::<()>(configuration),
            Err(TopologyError::Configuration(ConfigurationError::DecayRate { .. }))
        ));
    }

    #[test]
    fn demonstration() {
        let topology = Topology::demonstration().unwrap();

        assert_eq!(topology.num_routers(), 16);
        assert_eq!(topology.max_queue_sizes().len(), 16);
        assert_eq!(topology.links().len(), 24);
    }
}
