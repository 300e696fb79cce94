use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// No topic is routed anywhere.
    #[error("`topic_to_destinations` must route at least one topic")]
    NoRoutes,
    /// A route has an empty topic name.
    #[error("`topic_to_destinations` contains an empty topic name")]
    EmptyTopicName,
    /// A topic is routed to no destination.
    #[error("topic `{topic}` is not routed to any destination")]
    NoDestinations { topic: String },
    /// A route has an empty destination name.
    #[error("topic `{topic}` is routed to an empty destination name")]
    EmptyDestinationName { topic: String },
    /// A compact route string could not be parsed.
    #[error("invalid route `{route}`: {reason}")]
    InvalidRoute { route: String, reason: &'static str },
    /// A field holds a value outside of its allowed range.
    #[error("invalid value for `{field}`: {constraint}")]
    InvalidFieldValue { field: String, constraint: String },
}
