use std::collections::{BTreeSet, HashMap};

/// Static mapping from source topics to destination names.
///
/// Built once when the task starts and read-only afterwards. A topic may fan out to several
/// destinations and a destination may be fed by several topics.
#[derive(Debug, Clone, Default)]
pub struct TopicRouter {
    routes: HashMap<String, Vec<String>>,
}

impl TopicRouter {
    /// Creates a router from a topic to destinations mapping.
    ///
    /// Duplicate destinations listed for the same topic are collapsed, keeping the first
    /// occurrence, so that a record is never folded twice into the same destination batch.
    pub fn new(routes: HashMap<String, Vec<String>>) -> Self {
        let routes = routes
            .into_iter()
            .map(|(topic, destinations)| {
                let mut seen = BTreeSet::new();
                let destinations = destinations
                    .into_iter()
                    .filter(|destination| seen.insert(destination.clone()))
                    .collect();

                (topic, destinations)
            })
            .collect();

        Self { routes }
    }

    /// Returns the destinations registered for `topic`.
    ///
    /// An unknown topic yields an empty slice.
    pub fn destinations_for(&self, topic: &str) -> &[String] {
        self.routes
            .get(topic)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns every destination name referenced by at least one route, sorted and without
    /// duplicates.
    pub fn destination_names(&self) -> BTreeSet<&str> {
        self.routes
            .values()
            .flatten()
            .map(String::as_str)
            .collect()
    }

    /// Returns the number of routed topics.
    pub fn topics_count(&self) -> usize {
        self.routes.len()
    }
}

impl From<HashMap<String, Vec<String>>> for TopicRouter {
    fn from(routes: HashMap<String, Vec<String>>) -> Self {
        Self::new(routes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router(routes: &[(&str, &[&str])]) -> TopicRouter {
        TopicRouter::new(
            routes
                .iter()
                .map(|(topic, destinations)| {
                    (
                        topic.to_string(),
                        destinations.iter().map(|d| d.to_string()).collect(),
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn test_single_destination() {
        let router = router(&[("t1", &["R"])]);
        assert_eq!(router.destinations_for("t1"), ["R".to_string()]);
    }

    #[test]
    fn test_fan_out_keeps_order() {
        let router = router(&[("t1", &["R2", "R1"])]);
        assert_eq!(
            router.destinations_for("t1"),
            ["R2".to_string(), "R1".to_string()]
        );
    }

    #[test]
    fn test_unknown_topic_has_no_destinations() {
        let router = router(&[("t1", &["R"])]);
        assert!(router.destinations_for("t2").is_empty());
    }

    #[test]
    fn test_duplicate_destinations_are_collapsed() {
        let router = router(&[("t1", &["R", "R", "S"])]);
        assert_eq!(
            router.destinations_for("t1"),
            ["R".to_string(), "S".to_string()]
        );
    }

    #[test]
    fn test_destination_names_are_deduplicated_across_topics() {
        let router = router(&[("t1", &["R1", "R2"]), ("t2", &["R2"]), ("t3", &[])]);
        assert_eq!(
            router.destination_names().into_iter().collect::<Vec<_>>(),
            vec!["R1", "R2"]
        );
        assert_eq!(router.topics_count(), 3);
    }
}
