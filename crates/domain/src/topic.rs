//! Topic router: maps an inbound broker topic to what it carries.
//!
//! | Topic | Route |
//! |-------|-------|
//! | `clients/{id}/sensor/sht3x` | [`Route::Telemetry`] |
//! | `clients/{id}/register` | [`Route::Register`] |
//! | `$SYS/broker/clients/connected` | [`Route::BrokerPresence`] |
//! | anything else | [`Route::Unrecognized`] |
//!
//! The client id is the segment right after the leading `clients/` and runs
//! up to the next `/`.

use crate::client::ClientId;
use crate::error::PayloadError;

/// Broker system topic carrying the number of connected clients.
pub const BROKER_PRESENCE_TOPIC: &str = "$SYS/broker/clients/connected";

/// Transport-level subscriptions the engine needs.
pub const SUBSCRIPTIONS: [&str; 3] = [
    "clients/+/sensor/sht3x",
    "clients/+/register",
    BROKER_PRESENCE_TOPIC,
];

const CLIENTS_PREFIX: &str = "clients/";
const TELEMETRY_SUFFIX: &str = "sensor/sht3x";
const REGISTER_SUFFIX: &str = "register";

/// What an inbound message is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Telemetry { client_id: ClientId },
    Register { client_id: ClientId },
    BrokerPresence,
    Unrecognized,
}

/// Classify `topic`. Never fails; unknown shapes are [`Route::Unrecognized`].
#[must_use]
pub fn route(topic: &str) -> Route {
    if topic == BROKER_PRESENCE_TOPIC {
        return Route::BrokerPresence;
    }
    let Some((client_id, rest)) = split_client_topic(topic) else {
        return Route::Unrecognized;
    };
    match rest {
        TELEMETRY_SUFFIX => Route::Telemetry { client_id },
        REGISTER_SUFFIX => Route::Register { client_id },
        _ => Route::Unrecognized,
    }
}

fn split_client_topic(topic: &str) -> Option<(ClientId, &str)> {
    let after_prefix = topic.strip_prefix(CLIENTS_PREFIX)?;
    let (id, rest) = after_prefix.split_once('/')?;
    let id = ClientId::new(id).ok()?;
    Some((id, rest))
}

/// Parse the decimal connected-client count of the presence topic.
///
/// # Errors
///
/// Returns [`PayloadError::InvalidCount`] when the payload is not a
/// non-negative integer.
pub fn parse_connected_count(payload: &str) -> Result<u32, PayloadError> {
    let trimmed = payload.trim();
    trimmed
        .parse()
        .map_err(|_| PayloadError::InvalidCount(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: &str) -> ClientId {
        ClientId::new(value).unwrap()
    }

    #[test]
    fn should_route_telemetry_topic() {
        assert_eq!(
            route("clients/mushroom1/sensor/sht3x"),
            Route::Telemetry {
                client_id: id("mushroom1")
            }
        );
    }

    #[test]
    fn should_route_register_topic() {
        assert_eq!(
            route("clients/tent-2/register"),
            Route::Register {
                client_id: id("tent-2")
            }
        );
    }

    #[test]
    fn should_route_broker_presence_topic() {
        assert_eq!(route("$SYS/broker/clients/connected"), Route::BrokerPresence);
    }

    #[test]
    fn should_not_route_unknown_shapes() {
        for topic in [
            "",
            "clients/",
            "clients//register",
            "clients/mushroom1",
            "clients/mushroom1/light",
            "clients/mushroom1/sensor/sht3x/extra",
            "clients/mushroom1/sensor/bme280",
            "other/mushroom1/register",
            "prefix/clients/mushroom1/register",
            "$SYS/broker/clients/total",
        ] {
            assert_eq!(route(topic), Route::Unrecognized, "{topic:?}");
        }
    }

    #[test]
    fn should_parse_connected_count() {
        assert_eq!(parse_connected_count("3\n"), Ok(3));
        assert_eq!(
            parse_connected_count("many"),
            Err(PayloadError::InvalidCount("many".to_string()))
        );
        assert!(parse_connected_count("-1").is_err());
    }
}
