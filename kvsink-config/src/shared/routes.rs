use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

use crate::shared::ValidationError;

/// Parses the compact route syntax `[topic:dest1,dest2],[topic2:dest3]`.
///
/// Whitespace around names is ignored. A topic listed in several groups keeps the destinations
/// of all of them, in order. An empty string yields an empty table.
pub fn parse_topic_to_destinations(
    routes: &str,
) -> Result<HashMap<String, Vec<String>>, ValidationError> {
    let mut table: HashMap<String, Vec<String>> = HashMap::new();
    let mut rest = routes.trim();

    while !rest.is_empty() {
        let Some(group) = rest.strip_prefix('[') else {
            return Err(invalid(rest, "expected `[` at the start of a route"));
        };
        let Some(end) = group.find(']') else {
            return Err(invalid(rest, "missing closing `]`"));
        };

        let (topic, destinations) = parse_group(&group[..end])?;
        table.entry(topic).or_default().extend(destinations);

        rest = group[end + 1..].trim_start();
        if let Some(next) = rest.strip_prefix(',') {
            rest = next.trim_start();
            if rest.is_empty() {
                return Err(invalid(routes, "trailing `,` after the last route"));
            }
        } else if !rest.is_empty() {
            return Err(invalid(rest, "routes must be separated by `,`"));
        }
    }

    Ok(table)
}

fn parse_group(group: &str) -> Result<(String, Vec<String>), ValidationError> {
    let Some((topic, destinations)) = group.split_once(':') else {
        return Err(invalid(group, "expected `topic:destination`"));
    };

    let topic = topic.trim();
    if topic.is_empty() {
        return Err(invalid(group, "empty topic name"));
    }

    let destinations = destinations
        .split(',')
        .map(str::trim)
        .map(|destination| {
            if destination.is_empty() {
                Err(invalid(group, "empty destination name"))
            } else {
                Ok(destination.to_owned())
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok((topic.to_owned(), destinations))
}

fn invalid(route: &str, reason: &'static str) -> ValidationError {
    ValidationError::InvalidRoute {
        route: route.to_owned(),
        reason,
    }
}

/// One route of a route list.
///
/// Topics are carried as values because configuration sources lowercase map keys, which would
/// change the topic a route matches.
#[derive(Deserialize)]
struct RouteEntry {
    topic: String,
    destinations: Vec<String>,
}

/// Deserializes a route table given either as a list of `{topic, destinations}` entries or as a
/// compact route string. Entries repeating a topic are merged.
pub(crate) fn deserialize_topic_to_destinations<'de, D>(
    deserializer: D,
) -> Result<HashMap<String, Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Routes {
        Entries(Vec<RouteEntry>),
        Compact(String),
    }

    match Routes::deserialize(deserializer)? {
        Routes::Entries(entries) => {
            let mut table: HashMap<String, Vec<String>> = HashMap::new();
            for entry in entries {
                table
                    .entry(entry.topic)
                    .or_default()
                    .extend(entry.destinations);
            }

            Ok(table)
        }
        Routes::Compact(routes) => {
            parse_topic_to_destinations(&routes).map_err(serde::de::Error::custom)
        }
    }
}
