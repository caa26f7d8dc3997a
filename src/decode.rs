//! Lossy per-entity decoding of the `response` array.
//!
//! Each array element is decoded on its own: one malformed record is logged and
//! dropped while its siblings still come through.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::model::{Coach, Fixture, LeagueEntry, PlayerProfile, Squad, TeamVenue};

pub fn entities<T: DeserializeOwned>(response: &Value, entity: &str) -> Vec<T> {
    let items: &[Value] = match response {
        Value::Array(items) => items,
        Value::Null => return Vec::new(),
        Value::Object(_) => std::slice::from_ref(response),
        other => {
            warn!(entity, kind = %json_kind(other), "unexpected response shape");
            return Vec::new();
        }
    };

    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match T::deserialize(item) {
            Ok(v) => out.push(v),
            Err(err) => warn!(entity, index, error = %err, "skipping undecodable record"),
        }
    }
    out
}

pub fn leagues(response: &Value) -> Vec<LeagueEntry> {
    entities(response, "league")
}

pub fn teams(response: &Value) -> Vec<TeamVenue> {
    entities(response, "team")
}

pub fn players(response: &Value) -> Vec<PlayerProfile> {
    entities(response, "player")
}

pub fn squads(response: &Value) -> Vec<Squad> {
    entities(response, "squad")
}

pub fn coaches(response: &Value) -> Vec<Coach> {
    entities(response, "coach")
}

pub fn fixtures(response: &Value) -> Vec<Fixture> {
    entities(response, "fixture")
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn bad_sibling_does_not_sink_the_batch() {
        let response = json!([
            {"id": 1, "name": "Ten Hag", "career": []},
            {"id": "not-a-number", "name": "Broken"},
            {"id": 3, "name": "Arteta", "career": null}
        ]);
        let coaches = coaches(&response);
        assert_eq!(coaches.len(), 2);
        assert_eq!(coaches[0].id, 1);
        assert_eq!(coaches[1].name, "Arteta");
        assert!(coaches[1].career.is_empty());
    }

    #[test]
    fn null_and_scalar_responses_are_empty() {
        assert!(fixtures(&Value::Null).is_empty());
        assert!(fixtures(&json!("oops")).is_empty());
    }
}
