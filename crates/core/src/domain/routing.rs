use serde_json::Value;

/// The action classified from one user turn. Produced fresh per turn and
/// never persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RoutingAction {
    #[default]
    None,
    ListFacilities,
    CheckFreePlaces,
    ReservePlace,
}

impl RoutingAction {
    pub fn from_label(label: &str) -> Self {
        match label {
            "list_facilities" => Self::ListFacilities,
            "check_free_places" => Self::CheckFreePlaces,
            "reserve_place" => Self::ReservePlace,
            _ => Self::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ListFacilities => "list_facilities",
            Self::CheckFreePlaces => "check_free_places",
            Self::ReservePlace => "reserve_place",
        }
    }
}

/// Classified intent plus extracted slots for one user turn. Slot fields are
/// populated only when the utterance named them unambiguously.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoutingDecision {
    pub action: RoutingAction,
    pub city: Option<String>,
    pub kennzahl: Option<i64>,
    pub parent_name: Option<String>,
    pub parent_email: Option<String>,
    pub child_name: Option<String>,
}

impl RoutingDecision {
    pub fn none() -> Self {
        Self::default()
    }

    /// Parse raw oracle output defensively. The oracle is asked for a bare
    /// JSON object but gives no strict-JSON guarantee, so this tolerates
    /// surrounding prose by extracting the first balanced `{...}` block.
    /// Anything unparseable, and any object without an `action` key,
    /// degrades to the no-action decision.
    pub fn parse_oracle_output(raw: &str) -> Self {
        if let Ok(value) = serde_json::from_str::<Value>(raw) {
            if let Some(decision) = Self::from_json(&value) {
                return decision;
            }
        }
        if let Some(snippet) = first_json_object(raw) {
            if let Ok(value) = serde_json::from_str::<Value>(snippet) {
                if let Some(decision) = Self::from_json(&value) {
                    return decision;
                }
            }
        }
        Self::none()
    }

    fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let action_label = object.get("action")?.as_str()?;

        Some(Self {
            action: RoutingAction::from_label(action_label),
            city: string_slot(object.get("city")),
            kennzahl: integer_slot(object.get("kennzahl")),
            parent_name: string_slot(object.get("parent_name")),
            parent_email: string_slot(object.get("parent_email")),
            child_name: string_slot(object.get("child_name")),
        })
    }
}

fn string_slot(value: Option<&Value>) -> Option<String> {
    let text = value?.as_str()?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// The Kennzahl arrives as a JSON number in the happy path, but smaller
/// models occasionally quote it.
fn integer_slot(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Locates the first balanced `{...}` block, skipping braces that occur
/// inside JSON string literals.
fn first_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in raw[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::{first_json_object, RoutingAction, RoutingDecision};

    #[test]
    fn parses_strict_json_object() {
        let decision = RoutingDecision::parse_oracle_output(
            r#"{"action": "check_free_places", "city": null, "kennzahl": 401007,
                "parent_name": null, "parent_email": null, "child_name": null}"#,
        );
        assert_eq!(decision.action, RoutingAction::CheckFreePlaces);
        assert_eq!(decision.kennzahl, Some(401007));
        assert_eq!(decision.city, None);
    }

    #[test]
    fn extracts_object_embedded_in_prose() {
        let decision = RoutingDecision::parse_oracle_output(
            "here is your answer: {\"action\": \"list_facilities\", \"city\": \"Wels\"}",
        );
        assert_eq!(decision.action, RoutingAction::ListFacilities);
        assert_eq!(decision.city.as_deref(), Some("Wels"));
    }

    #[test]
    fn garbage_degrades_to_no_action() {
        let decision = RoutingDecision::parse_oracle_output("I cannot decide, sorry.");
        assert_eq!(decision, RoutingDecision::none());
    }

    #[test]
    fn object_without_action_key_degrades_to_no_action() {
        let decision = RoutingDecision::parse_oracle_output(r#"{"city": "Linz"}"#);
        assert_eq!(decision, RoutingDecision::none());
    }

    #[test]
    fn non_string_action_degrades_to_no_action() {
        let decision = RoutingDecision::parse_oracle_output(r#"{"action": 3}"#);
        assert_eq!(decision, RoutingDecision::none());
    }

    #[test]
    fn unknown_action_label_maps_to_none_action() {
        let decision =
            RoutingDecision::parse_oracle_output(r#"{"action": "drop_table", "city": "Linz"}"#);
        assert_eq!(decision.action, RoutingAction::None);
    }

    #[test]
    fn quoted_kennzahl_is_accepted() {
        let decision = RoutingDecision::parse_oracle_output(
            r#"{"action": "check_free_places", "kennzahl": "401007"}"#,
        );
        assert_eq!(decision.kennzahl, Some(401007));
    }

    #[test]
    fn blank_slots_are_dropped() {
        let decision = RoutingDecision::parse_oracle_output(
            r#"{"action": "reserve_place", "parent_name": "  ", "child_name": "Mia"}"#,
        );
        assert_eq!(decision.parent_name, None);
        assert_eq!(decision.child_name.as_deref(), Some("Mia"));
    }

    #[test]
    fn balanced_extraction_ignores_braces_inside_strings() {
        let raw = r#"note {"action": "none", "city": "Linz {Urfahr}"} trailing"#;
        assert_eq!(
            first_json_object(raw),
            Some(r#"{"action": "none", "city": "Linz {Urfahr}"}"#)
        );
    }

    #[test]
    fn unterminated_object_yields_no_action() {
        let decision = RoutingDecision::parse_oracle_output(r#"{"action": "list_facilities""#);
        assert_eq!(decision, RoutingDecision::none());
    }
}
