use platzbot_core::domain::facility::{Facility, FacilityId};
use platzbot_core::domain::routing::{RoutingAction, RoutingDecision};
use platzbot_db::repositories::{FacilityStore, RepositoryError};

/// Turns one routing decision into at most one capacity-store action and a
/// German context fragment for the generation step. A decision with missing
/// required slots produces no fragment; that is the steady-state "nothing to
/// add" case, not an error.
pub struct ActionExecutor<S> {
    store: S,
}

impl<S> ActionExecutor<S>
where
    S: FacilityStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn execute(
        &self,
        decision: &RoutingDecision,
    ) -> Result<Option<String>, RepositoryError> {
        match decision.action {
            RoutingAction::ListFacilities => {
                let Some(city) = decision.city.as_deref() else {
                    return Ok(None);
                };
                let facilities = self.store.find_facilities(city).await?;
                Ok(Some(format_facilities(&facilities, city)))
            }
            RoutingAction::CheckFreePlaces => {
                let Some(kennzahl) = decision.kennzahl.map(FacilityId) else {
                    return Ok(None);
                };
                let facility = self.store.facility_by_id(kennzahl).await?;
                let free = self.store.free_places(kennzahl).await?;
                let name = facility_label(facility.as_ref(), kennzahl);
                Ok(Some(render_free_places(&name, kennzahl, free)))
            }
            RoutingAction::ReservePlace => {
                let (Some(kennzahl), Some(parent_name), Some(parent_email), Some(child_name)) = (
                    decision.kennzahl.map(FacilityId),
                    decision.parent_name.as_deref(),
                    decision.parent_email.as_deref(),
                    decision.child_name.as_deref(),
                ) else {
                    return Ok(None);
                };
                let facility = self.store.facility_by_id(kennzahl).await?;
                let stored =
                    self.store.reserve(kennzahl, parent_name, parent_email, child_name).await?;
                let name = facility_label(facility.as_ref(), kennzahl);
                Ok(Some(render_reservation(&name, kennzahl, child_name, stored)))
            }
            RoutingAction::None => Ok(None),
        }
    }
}

/// Unknown facility ids get a fallback label instead of failing the turn.
fn facility_label(facility: Option<&Facility>, kennzahl: FacilityId) -> String {
    match facility {
        Some(facility) => facility.name.clone(),
        None => format!("Einrichtung mit Kennzahl {kennzahl}"),
    }
}

pub fn format_facilities(facilities: &[Facility], city: &str) -> String {
    if facilities.is_empty() {
        return format!(
            "Ich habe in der Datenbank keine Kinderbetreuungseinrichtungen in {city} gefunden."
        );
    }

    let mut lines =
        vec![format!("Ich habe folgende Kinderbetreuungseinrichtungen in {city} gefunden:\n")];
    for facility in facilities {
        let mut line = format!("- **{}**", facility.name);
        let mut contact_parts = Vec::new();
        if let Some(phone) = &facility.phone {
            contact_parts.push(format!("Tel.: {phone}"));
        }
        if let Some(email) = &facility.email {
            contact_parts.push(format!("E-Mail: {email}"));
        }
        if let Some(website) = &facility.website {
            contact_parts.push(format!("Web: {website}"));
        }
        if !contact_parts.is_empty() {
            line.push_str(" — ");
            line.push_str(&contact_parts.join(" | "));
        }
        lines.push(line);
    }

    lines.join("\n")
}

fn render_free_places(name: &str, kennzahl: FacilityId, free: Option<i64>) -> String {
    match free {
        None => format!(
            "Für die Einrichtung **{name}** (Kennzahl {kennzahl}) liegen \
             keine Kapazitätsinformationen vor."
        ),
        Some(free) if free > 0 => format!(
            "Für die Einrichtung **{name}** (Kennzahl {kennzahl}) sind nach den aktuellen \
             Daten noch ungefähr **{free} Plätze** verfügbar."
        ),
        Some(_) => format!(
            "Für die Einrichtung **{name}** (Kennzahl {kennzahl}) sind nach den aktuellen \
             Daten derzeit keine Plätze mehr frei."
        ),
    }
}

fn render_reservation(name: &str, kennzahl: FacilityId, child_name: &str, stored: bool) -> String {
    if stored {
        format!(
            "Die Vormerkung für das Kind **{child_name}** bei **{name}** (Kennzahl {kennzahl}) \
             wurde in der Datenbank gespeichert. Die Einrichtung bzw. der Träger kann sich nun \
             bei Bedarf mit den angegebenen Kontaktdaten melden.\n\n\
             Hinweis: Die Vormerkung ist noch keine verbindliche Platzzusage."
        )
    } else {
        format!(
            "Für die Einrichtung **{name}** (Kennzahl {kennzahl}) konnte keine Vormerkung \
             mehr gespeichert werden (vermutlich keine freien Plätze mehr oder Einrichtung \
             nicht gefunden)."
        )
    }
}

#[cfg(test)]
mod tests {
    use platzbot_core::domain::facility::{CapacityLedger, Facility, FacilityId};
    use platzbot_core::domain::routing::{RoutingAction, RoutingDecision};
    use platzbot_db::repositories::{FacilityStore, InMemoryFacilityStore};

    use super::ActionExecutor;

    fn facility(kennzahl: i64, name: &str, city: &str, capacity: i64, occupied: i64) -> Facility {
        Facility {
            kennzahl: FacilityId(kennzahl),
            name: name.to_string(),
            city: Some(city.to_string()),
            postal_code: Some("4020".to_string()),
            phone: Some("+43 732 1234".to_string()),
            email: None,
            website: None,
            ledger: CapacityLedger {
                capacity_estimate: Some(capacity),
                current_occupancy: Some(occupied),
                pre_registrations: Some(0),
            },
        }
    }

    async fn store_with(facilities: Vec<Facility>) -> InMemoryFacilityStore {
        let store = InMemoryFacilityStore::default();
        for facility in facilities {
            store.insert(facility).await;
        }
        store
    }

    fn reserve_decision(kennzahl: i64) -> RoutingDecision {
        RoutingDecision {
            action: RoutingAction::ReservePlace,
            kennzahl: Some(kennzahl),
            parent_name: Some("Anna Huber".to_string()),
            parent_email: Some("anna@example.at".to_string()),
            child_name: Some("Mia".to_string()),
            ..RoutingDecision::default()
        }
    }

    #[tokio::test]
    async fn list_facilities_renders_bullet_list_with_contacts() {
        let store = store_with(vec![facility(1, "KG Zentrum", "Linz", 10, 5)]).await;
        let executor = ActionExecutor::new(store);

        let decision = RoutingDecision {
            action: RoutingAction::ListFacilities,
            city: Some("Linz".to_string()),
            ..RoutingDecision::default()
        };
        let fragment = executor.execute(&decision).await.expect("execute").expect("fragment");

        assert!(fragment.contains("folgende Kinderbetreuungseinrichtungen in Linz"));
        assert!(fragment.contains("- **KG Zentrum** — Tel.: +43 732 1234"));
    }

    #[tokio::test]
    async fn list_facilities_with_no_match_renders_none_found_sentence() {
        let store = store_with(Vec::new()).await;
        let executor = ActionExecutor::new(store);

        let decision = RoutingDecision {
            action: RoutingAction::ListFacilities,
            city: Some("Gmunden".to_string()),
            ..RoutingDecision::default()
        };
        let fragment = executor.execute(&decision).await.expect("execute").expect("fragment");
        assert!(fragment.contains("keine Kinderbetreuungseinrichtungen in Gmunden"));
    }

    #[tokio::test]
    async fn list_facilities_without_city_produces_no_fragment() {
        let store = store_with(Vec::new()).await;
        let executor = ActionExecutor::new(store);

        let decision = RoutingDecision {
            action: RoutingAction::ListFacilities,
            ..RoutingDecision::default()
        };
        assert_eq!(executor.execute(&decision).await.expect("execute"), None);
    }

    #[tokio::test]
    async fn check_free_places_renders_one_of_three_sentences() {
        let store = store_with(vec![
            facility(1, "KG Frei", "Linz", 10, 6),
            facility(2, "KG Voll", "Linz", 10, 10),
        ])
        .await;
        let executor = ActionExecutor::new(store);

        let with_capacity = RoutingDecision {
            action: RoutingAction::CheckFreePlaces,
            kennzahl: Some(1),
            ..RoutingDecision::default()
        };
        let fragment =
            executor.execute(&with_capacity).await.expect("execute").expect("fragment");
        assert!(fragment.contains("**KG Frei**"));
        assert!(fragment.contains("ungefähr **4 Plätze**"));

        let exhausted = RoutingDecision {
            action: RoutingAction::CheckFreePlaces,
            kennzahl: Some(2),
            ..RoutingDecision::default()
        };
        let fragment = executor.execute(&exhausted).await.expect("execute").expect("fragment");
        assert!(fragment.contains("keine Plätze mehr frei"));

        let unknown = RoutingDecision {
            action: RoutingAction::CheckFreePlaces,
            kennzahl: Some(99),
            ..RoutingDecision::default()
        };
        let fragment = executor.execute(&unknown).await.expect("execute").expect("fragment");
        assert!(fragment.contains("Einrichtung mit Kennzahl 99"));
        assert!(fragment.contains("keine Kapazitätsinformationen"));
    }

    #[tokio::test]
    async fn successful_reservation_renders_confirmation_with_disclaimer() {
        let store = store_with(vec![facility(1, "KG Zentrum", "Linz", 10, 5)]).await;
        let executor = ActionExecutor::new(store);

        let fragment = executor
            .execute(&reserve_decision(1))
            .await
            .expect("execute")
            .expect("fragment");
        assert!(fragment.contains("Vormerkung für das Kind **Mia** bei **KG Zentrum**"));
        assert!(fragment.contains("keine verbindliche Platzzusage"));
    }

    #[tokio::test]
    async fn exhausted_capacity_renders_failure_fragment_without_mutation() {
        let store = store_with(vec![facility(1, "KG Voll", "Linz", 10, 10)]).await;
        let executor = ActionExecutor::new(store);

        let fragment = executor
            .execute(&reserve_decision(1))
            .await
            .expect("execute")
            .expect("fragment");
        assert!(fragment.contains("konnte keine Vormerkung"));

        // The ledger is untouched and no detail record was written.
        let store = executor.store;
        assert_eq!(store.free_places(FacilityId(1)).await.expect("query"), Some(0));
        assert!(store.records().await.is_empty());
    }

    #[tokio::test]
    async fn reservation_with_missing_contact_slots_produces_no_fragment() {
        let store = store_with(vec![facility(1, "KG Zentrum", "Linz", 10, 5)]).await;
        let executor = ActionExecutor::new(store);

        let mut decision = reserve_decision(1);
        decision.parent_email = None;
        assert_eq!(executor.execute(&decision).await.expect("execute"), None);
    }

    #[tokio::test]
    async fn no_action_produces_no_fragment() {
        let store = store_with(Vec::new()).await;
        let executor = ActionExecutor::new(store);
        assert_eq!(executor.execute(&RoutingDecision::none()).await.expect("execute"), None);
    }
}
