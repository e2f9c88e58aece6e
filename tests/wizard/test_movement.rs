use paddock::core::config::WizardConfig;
use paddock::core::wizard::movement::steps;
use paddock::core::wizard::movement::{HousingChoice, MovementPatch, MovementType, MovementWizard};
use paddock::core::wizard::{CommitWarning, WizardServices};
use paddock_backend::{MemoryObjectStorage, MemoryRecordService, SequentialIds};
use paddock_types::{HousingUnit, OccupancyPolicy, RecordService, Row};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

const TENANT: u128 = 1;
const HORSE: u128 = 20;
const BARN: u128 = 30;
const PASTURE: u128 = 31;
const FREE_STALL: u128 = 40;
const FULL_STALL: u128 = 41;
const GROUP_PADDOCK: u128 = 42;

fn as_row(value: Value) -> Row {
    value.as_object().cloned().unwrap()
}

async fn seeded() -> (Arc<MemoryRecordService>, MovementWizard) {
    let records = Arc::new(MemoryRecordService::new());
    records
        .create(
            "horses",
            as_row(json!({
                "id": Uuid::from_u128(HORSE).to_string(),
                "tenant_id": Uuid::from_u128(TENANT).to_string(),
                "name": "Comet",
                "location_id": Uuid::from_u128(PASTURE).to_string(),
            })),
        )
        .await
        .unwrap();

    let units = [
        (FREE_STALL, "B-1", OccupancyPolicy::Single, 1, 0, BARN),
        (FULL_STALL, "B-2", OccupancyPolicy::Single, 1, 1, BARN),
        (GROUP_PADDOCK, "P-1", OccupancyPolicy::Multi, 6, 2, PASTURE),
    ];
    for (id, code, policy, capacity, occupants, location) in units {
        let unit = HousingUnit {
            id: Uuid::from_u128(id),
            code: code.to_string(),
            location_id: Uuid::from_u128(location),
            occupancy_policy: policy,
            capacity,
            current_occupant_count: occupants,
        };
        records
            .create("housing_units", as_row(serde_json::to_value(unit).unwrap()))
            .await
            .unwrap();
    }

    let services = WizardServices::new(
        records.clone(),
        Arc::new(MemoryObjectStorage::new()),
        Arc::new(SequentialIds::new()),
    );
    let wizard =
        MovementWizard::open(services, &WizardConfig::default(), Uuid::from_u128(TENANT)).unwrap();
    (records, wizard)
}

fn fill(wizard: &mut MovementWizard, kind: MovementType, from: Option<u128>, to: Option<u128>) {
    wizard.apply(MovementPatch::MovementType(Some(kind))).unwrap();
    wizard.next().unwrap();
    wizard
        .apply(MovementPatch::SubjectId(Some(Uuid::from_u128(HORSE))))
        .unwrap();
    wizard.next().unwrap();
    wizard
        .apply(MovementPatch::FromLocationId(from.map(Uuid::from_u128)))
        .unwrap();
    wizard
        .apply(MovementPatch::ToLocationId(to.map(Uuid::from_u128)))
        .unwrap();
}

fn single_movement(records: &[Row]) -> &Row {
    assert_eq!(records.len(), 1);
    &records[0]
}

#[tokio::test]
async fn test_arrival_with_assigned_stall() {
    let (records, mut wizard) = seeded().await;
    fill(&mut wizard, MovementType::In, None, Some(BARN));
    assert_eq!(wizard.next().unwrap(), steps::HOUSING);

    let units = wizard.load_housing().await.unwrap();
    assert_eq!(units.len(), 2);
    let selectable: Vec<&str> = wizard
        .selectable_housing()
        .iter()
        .map(|unit| unit.code.as_str())
        .collect();
    assert_eq!(selectable, vec!["B-1"]);

    let full = wizard.select_housing(Uuid::from_u128(FULL_STALL)).unwrap_err();
    assert_eq!(full.code, "WIZ-HOUSING-002");
    let elsewhere = wizard.select_housing(Uuid::from_u128(GROUP_PADDOCK)).unwrap_err();
    assert_eq!(elsewhere.code, "WIZ-HOUSING-001");
    wizard.select_housing(Uuid::from_u128(FREE_STALL)).unwrap();

    assert_eq!(wizard.next().unwrap(), steps::DETAILS);
    wizard
        .apply(MovementPatch::Reason(Some("purchase".to_string())))
        .unwrap();
    assert_eq!(wizard.next().unwrap(), steps::REVIEW);

    let outcome = wizard.commit().await.unwrap();
    assert!(outcome.is_clean());
    assert!(!wizard.is_open());

    let rows = records.rows("horse_movements").await;
    let movement = single_movement(&rows);
    assert_eq!(movement["movement_type"], json!("in"));
    assert_eq!(movement["from_location_id"], Value::Null);
    assert_eq!(movement["to_location_id"], json!(Uuid::from_u128(BARN).to_string()));
    assert_eq!(movement["housing_unit_id"], json!(Uuid::from_u128(FREE_STALL).to_string()));
    assert_eq!(movement["housing_status"], json!("assigned"));
    assert_eq!(movement["reason"], json!("purchase"));
    assert_eq!(movement["justification"], Value::Null);
    assert!(movement["moved_at"].is_string());

    let horse = records.get("horses", Uuid::from_u128(HORSE)).await.unwrap();
    assert_eq!(horse["location_id"], json!(Uuid::from_u128(BARN).to_string()));
    assert_eq!(horse["housing_unit_id"], json!(Uuid::from_u128(FREE_STALL).to_string()));
    assert_eq!(horse["name"], json!("Comet"));
}

#[tokio::test]
async fn test_departure_skips_housing_and_clears_location() {
    let (records, mut wizard) = seeded().await;
    fill(&mut wizard, MovementType::Out, Some(PASTURE), None);
    assert!(!wizard.effective_steps().contains(&steps::HOUSING));
    assert_eq!(wizard.next().unwrap(), steps::DETAILS);
    assert_eq!(wizard.next().unwrap(), steps::REVIEW);
    assert_eq!(wizard.progress().total, 5);

    wizard.commit().await.unwrap();
    let rows = records.rows("horse_movements").await;
    let movement = single_movement(&rows);
    assert_eq!(movement["movement_type"], json!("out"));
    assert_eq!(movement["housing_status"], Value::Null);
    assert_eq!(movement["to_location_id"], Value::Null);

    let horse = records.get("horses", Uuid::from_u128(HORSE)).await.unwrap();
    assert_eq!(horse["location_id"], Value::Null);
    assert_eq!(horse["housing_unit_id"], Value::Null);
}

#[tokio::test]
async fn test_same_location_transfer_needs_justification() {
    let (records, mut wizard) = seeded().await;
    fill(&mut wizard, MovementType::Transfer, Some(PASTURE), Some(PASTURE));

    let blocked = wizard.next().unwrap_err();
    assert_eq!(blocked.code, "WIZ-NAV-001");
    assert!(blocked.message.contains("justification"));

    wizard
        .apply(MovementPatch::Justification("   ".to_string()))
        .unwrap();
    assert!(wizard.next().is_err());
    wizard
        .apply(MovementPatch::Justification(" box rotation ".to_string()))
        .unwrap();
    assert_eq!(wizard.next().unwrap(), steps::HOUSING);

    assert_eq!(wizard.skip_housing().unwrap(), steps::DETAILS);
    assert_eq!(wizard.draft().housing, HousingChoice::Skipped);
    wizard.next().unwrap();
    wizard.commit().await.unwrap();

    let rows = records.rows("horse_movements").await;
    let movement = single_movement(&rows);
    assert_eq!(movement["justification"], json!("box rotation"));
    assert_eq!(movement["housing_status"], json!("skipped"));
    assert_eq!(movement["housing_unit_id"], Value::Null);
}

#[tokio::test]
async fn test_switching_to_out_drops_assigned_housing() {
    let (_records, mut wizard) = seeded().await;
    fill(&mut wizard, MovementType::In, None, Some(BARN));
    wizard.next().unwrap();
    wizard.load_housing().await.unwrap();
    wizard.select_housing(Uuid::from_u128(FREE_STALL)).unwrap();

    wizard.go_to(steps::TYPE).unwrap();
    wizard
        .apply(MovementPatch::MovementType(Some(MovementType::Out)))
        .unwrap();
    assert_eq!(wizard.draft().housing, HousingChoice::Undecided);
    assert!(wizard.selectable_housing().is_empty());
    assert_eq!(
        wizard.effective_steps(),
        vec![steps::TYPE, steps::SUBJECT, steps::LOCATION, steps::DETAILS, steps::REVIEW]
    );
}

#[tokio::test]
async fn test_undecided_housing_commits_as_undecided() {
    let (records, mut wizard) = seeded().await;
    fill(&mut wizard, MovementType::In, None, Some(PASTURE));
    while !wizard.is_terminal() {
        wizard.next().unwrap();
    }
    wizard.commit().await.unwrap();
    let rows = records.rows("horse_movements").await;
    assert_eq!(single_movement(&rows)["housing_status"], json!("undecided"));
}

#[tokio::test]
async fn test_unknown_subject_degrades_to_warning() {
    let (records, mut wizard) = seeded().await;
    wizard
        .apply(MovementPatch::MovementType(Some(MovementType::In)))
        .unwrap();
    wizard.next().unwrap();
    let stranger = Uuid::from_u128(99);
    wizard.apply(MovementPatch::SubjectId(Some(stranger))).unwrap();
    wizard.next().unwrap();
    wizard
        .apply(MovementPatch::ToLocationId(Some(Uuid::from_u128(BARN))))
        .unwrap();
    while !wizard.is_terminal() {
        wizard.next().unwrap();
    }

    let outcome = wizard.commit().await.unwrap();
    match outcome.warnings() {
        [warning @ CommitWarning::SubjectUpdateFailed { subject_id, .. }] => {
            assert_eq!(*subject_id, stranger);
            assert_eq!(warning.code(), "WIZ-COMMIT-006");
        }
        other => panic!("unexpected warnings: {:?}", other),
    }
    assert_eq!(records.count("horse_movements").await, 1);
}

#[tokio::test]
async fn test_housing_requires_destination() {
    let (_records, mut wizard) = seeded().await;
    let error = wizard.load_housing().await.unwrap_err();
    assert_eq!(error.code, "WIZ-HOUSING-003");
}

#[tokio::test]
async fn test_full_stall_cannot_be_patched_in() {
    let (records, mut wizard) = seeded().await;
    fill(&mut wizard, MovementType::In, None, Some(BARN));
    wizard.next().unwrap();
    wizard.load_housing().await.unwrap();

    let full = Uuid::from_u128(FULL_STALL);
    assert_eq!(wizard.select_housing(full).unwrap_err().code, "WIZ-HOUSING-002");
    let error = wizard
        .apply(MovementPatch::Housing(HousingChoice::Assigned(full)))
        .unwrap_err();
    assert_eq!(error.code, "WIZ-HOUSING-003");
    assert_eq!(wizard.draft().housing, HousingChoice::Undecided);

    while !wizard.is_terminal() {
        wizard.next().unwrap();
    }
    wizard.commit().await.unwrap();
    let horse = records.get("horses", Uuid::from_u128(HORSE)).await.unwrap();
    assert_eq!(horse["housing_unit_id"], Value::Null);
}

#[tokio::test]
async fn test_commit_rejects_stall_filled_since_selection() {
    let (records, mut wizard) = seeded().await;
    fill(&mut wizard, MovementType::In, None, Some(BARN));
    wizard.next().unwrap();
    wizard.load_housing().await.unwrap();
    wizard.select_housing(Uuid::from_u128(FREE_STALL)).unwrap();
    while !wizard.is_terminal() {
        wizard.next().unwrap();
    }

    records
        .update(
            "housing_units",
            Uuid::from_u128(FREE_STALL),
            as_row(json!({"current_occupant_count": 1})),
        )
        .await
        .unwrap();

    let error = wizard.commit().await.unwrap_err();
    assert_eq!(error.code, "WIZ-HOUSING-002");
    assert!(wizard.is_open());
    assert_eq!(records.count("horse_movements").await, 0);
}

#[tokio::test]
async fn test_undoing_destination_change_restores_its_stall() {
    let (records, mut wizard) = seeded().await;
    fill(&mut wizard, MovementType::In, None, Some(BARN));
    wizard.next().unwrap();
    wizard.load_housing().await.unwrap();
    wizard.select_housing(Uuid::from_u128(FREE_STALL)).unwrap();

    wizard.go_to(steps::LOCATION).unwrap();
    wizard
        .apply(MovementPatch::ToLocationId(Some(Uuid::from_u128(PASTURE))))
        .unwrap();
    assert_eq!(wizard.draft().housing, HousingChoice::Undecided);

    let undone = wizard.undo().unwrap();
    assert_eq!(
        undone,
        Some(MovementPatch::ToLocationId(Some(Uuid::from_u128(PASTURE))))
    );
    assert_eq!(wizard.draft().to_location_id, Some(Uuid::from_u128(BARN)));
    assert_eq!(
        wizard.draft().housing,
        HousingChoice::Assigned(Uuid::from_u128(FREE_STALL))
    );

    while !wizard.is_terminal() {
        wizard.next().unwrap();
    }
    wizard.commit().await.unwrap();
    let rows = records.rows("horse_movements").await;
    let movement = single_movement(&rows);
    assert_eq!(movement["to_location_id"], json!(Uuid::from_u128(BARN).to_string()));
    assert_eq!(movement["housing_unit_id"], json!(Uuid::from_u128(FREE_STALL).to_string()));
}

#[tokio::test]
async fn test_undo_of_stall_choice_returns_to_undecided() {
    let (_records, mut wizard) = seeded().await;
    fill(&mut wizard, MovementType::In, None, Some(BARN));
    wizard.next().unwrap();
    wizard.load_housing().await.unwrap();
    wizard.select_housing(Uuid::from_u128(FREE_STALL)).unwrap();

    wizard.undo().unwrap();
    assert_eq!(wizard.draft().housing, HousingChoice::Undecided);
    assert_eq!(wizard.selectable_housing().len(), 1);
}
