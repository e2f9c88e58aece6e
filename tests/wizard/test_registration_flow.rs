use paddock::core::config::WizardConfig;
use paddock::core::types::WizardMode;
use paddock::core::wizard::registration::steps;
use paddock::core::wizard::registration::{HorseCategory, HorsePatch, RegistrationWizard};
use paddock::core::wizard::staging::UploadFile;
use paddock::core::wizard::{CommitOutcome, WizardServices};
use paddock_backend::{MemoryObjectStorage, MemoryRecordService, SequentialIds};
use paddock_types::{Filter, RecordService};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

struct Harness {
    records: Arc<MemoryRecordService>,
    storage: Arc<MemoryObjectStorage>,
    services: WizardServices,
    config: WizardConfig,
    tenant: Uuid,
}

fn harness() -> Harness {
    let records = Arc::new(MemoryRecordService::new());
    let storage = Arc::new(MemoryObjectStorage::new());
    let services = WizardServices::new(
        records.clone(),
        storage.clone(),
        Arc::new(SequentialIds::starting_at(500)),
    );
    Harness {
        records,
        storage,
        services,
        config: WizardConfig::default(),
        tenant: Uuid::from_u128(1),
    }
}

fn photo(name: &str) -> UploadFile {
    UploadFile::new(name, "image/jpeg", b"jpeg bytes".to_vec())
}

fn fill_identity(wizard: &mut RegistrationWizard) {
    wizard.apply(HorsePatch::Name("Comet".to_string())).unwrap();
    wizard
        .apply(HorsePatch::Category(Some(HorseCategory::Sport)))
        .unwrap();
}

fn advance_to_review(wizard: &mut RegistrationWizard) {
    while !wizard.is_terminal() {
        wizard.next().unwrap();
    }
    assert_eq!(wizard.current_step(), steps::REVIEW);
}

#[tokio::test]
async fn test_create_flow_commits_and_migrates_assets() {
    let h = harness();
    let mut wizard = RegistrationWizard::open_create(h.services.clone(), &h.config, h.tenant).unwrap();
    let provisional = wizard.provisional_id();

    assert_eq!(wizard.current_step(), steps::DUPLICATE_CHECK);
    wizard.next().unwrap();
    assert_eq!(wizard.current_step(), steps::IDENTITY);

    let blocked = wizard.next().unwrap_err();
    assert_eq!(blocked.code, "WIZ-NAV-001");

    fill_identity(&mut wizard);
    wizard.add_owner(Uuid::from_u128(10)).unwrap();
    wizard.add_owner(Uuid::from_u128(11)).unwrap();
    wizard.add_owner(Uuid::from_u128(12)).unwrap();
    let shares: Vec<u8> = wizard.draft().allocations.iter().map(|a| a.percentage).collect();
    assert_eq!(shares, vec![34, 33, 33]);

    let report = wizard.upload(vec![photo("front.jpg"), photo("side.jpg")]).await.unwrap();
    assert!(report.is_clean());
    assert_eq!(wizard.draft().media.len(), 2);

    advance_to_review(&mut wizard);
    let outcome = wizard.commit().await.unwrap();
    let id = match &outcome {
        CommitOutcome::Committed { entity } => {
            assert_eq!(entity.mode, WizardMode::Create);
            entity.id
        }
        other => panic!("expected a clean commit, got {:?}", other),
    };
    assert!(!wizard.is_open());
    assert!(wizard.draft().profile.name.is_empty());

    let horse = h.records.get("horses", id).await.unwrap();
    assert_eq!(horse["name"], json!("Comet"));
    assert_eq!(horse["category"], json!("sport"));
    assert_eq!(horse["tenant_id"], json!(h.tenant.to_string()));

    let left_behind = h
        .records
        .list_where(
            "media_assets",
            &Filter::new()
                .eq("tenant_id", h.tenant.to_string())
                .eq("entity_type", "horse")
                .eq("entity_id", provisional.to_string()),
        )
        .await
        .unwrap();
    assert!(left_behind.is_empty());

    let migrated = h.records.rows("media_assets").await;
    assert_eq!(migrated.len(), 2);
    for row in migrated {
        assert_eq!(row["entity_id"], json!(id.to_string()));
        assert_eq!(row["provisional"], Value::Bool(false));
    }

    let owners = h.records.rows("horse_owners").await;
    assert_eq!(owners.len(), 3);
    assert_eq!(owners.iter().filter(|row| row["is_primary"] == json!(true)).count(), 1);
}

#[tokio::test]
async fn test_possible_duplicates_match_trimmed_name_within_tenant() {
    let h = harness();
    for (tenant, name) in [(h.tenant, "  comet "), (h.tenant, "Blaze"), (Uuid::from_u128(2), "Comet")] {
        let row = json!({"tenant_id": tenant.to_string(), "name": name});
        h.records
            .create("horses", row.as_object().cloned().unwrap())
            .await
            .unwrap();
    }

    let mut wizard = RegistrationWizard::open_create(h.services.clone(), &h.config, h.tenant).unwrap();
    assert!(wizard.find_possible_duplicates().await.unwrap().is_empty());
    wizard.apply(HorsePatch::Name("COMET".to_string())).unwrap();
    let candidates = wizard.find_possible_duplicates().await.unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].name, "  comet ");
}

#[tokio::test]
async fn test_edit_mode_starts_at_identity_with_seeded_draft() {
    let h = harness();
    let mut create = RegistrationWizard::open_create(h.services.clone(), &h.config, h.tenant).unwrap();
    fill_identity(&mut create);
    create.add_owner(Uuid::from_u128(10)).unwrap();
    create.add_owner(Uuid::from_u128(11)).unwrap();
    create.upload(vec![photo("front.jpg")]).await.unwrap();
    advance_to_review(&mut create);
    let id = create.commit().await.unwrap().entity().id;

    let mut edit = RegistrationWizard::open_edit(h.services.clone(), &h.config, h.tenant, id)
        .await
        .unwrap();
    assert_eq!(edit.mode(), WizardMode::Edit);
    assert_eq!(edit.current_step(), steps::IDENTITY);
    assert!(!edit.effective_steps().contains(&steps::DUPLICATE_CHECK));
    assert_eq!(edit.draft().profile.name, "Comet");
    assert_eq!(edit.draft().allocations.len(), 2);
    assert_eq!(edit.draft().media.len(), 1);
    assert_eq!(edit.staging_key().entity_id, id);

    edit.upload(vec![photo("late.jpg")]).await.unwrap();
    let late = h
        .records
        .list_where("media_assets", &Filter::new().eq("filename", "late.jpg"))
        .await
        .unwrap();
    assert_eq!(late[0]["entity_id"], json!(id.to_string()));
    assert_eq!(late[0]["provisional"], Value::Bool(false));

    edit.remove_owner(0).unwrap();
    edit.apply(HorsePatch::Breed(Some("Hanoverian".to_string()))).unwrap();
    advance_to_review(&mut edit);
    let outcome = edit.commit().await.unwrap();
    assert!(outcome.is_clean());

    let owners = h.records.rows("horse_owners").await;
    assert_eq!(owners.len(), 1);
    assert_eq!(owners[0]["holder_id"], json!(Uuid::from_u128(11).to_string()));
    assert_eq!(owners[0]["percentage"], json!(100));
    let horse = h.records.get("horses", id).await.unwrap();
    assert_eq!(horse["breed"], json!("Hanoverian"));
    assert_eq!(h.records.count("horses").await, 1);
}

#[tokio::test]
async fn test_edit_of_unknown_horse_fails() {
    let h = harness();
    let error = RegistrationWizard::open_edit(h.services.clone(), &h.config, h.tenant, Uuid::from_u128(404))
        .await
        .unwrap_err();
    assert_eq!(error.code, "WIZ-LOAD-001");
}

#[tokio::test]
async fn test_closing_with_staged_assets_reports_orphans_and_reopen_rekeys() {
    let h = harness();
    let mut wizard = RegistrationWizard::open_create(h.services.clone(), &h.config, h.tenant).unwrap();
    let first = wizard.provisional_id();
    wizard.upload(vec![photo("front.jpg")]).await.unwrap();

    let report = wizard.close().await;
    let orphan = report.pending_orphans.unwrap();
    assert_eq!(orphan.entity_id, first);
    assert_eq!(h.storage.object_count().await, 1);

    wizard.reopen_create().unwrap();
    assert_ne!(wizard.provisional_id(), first);
    assert!(wizard.draft().media.is_empty());
    assert_eq!(wizard.current_step(), steps::DUPLICATE_CHECK);
}

#[tokio::test]
async fn test_review_edits_are_rechecked_at_commit() {
    let h = harness();
    let mut wizard = RegistrationWizard::open_create(h.services.clone(), &h.config, h.tenant).unwrap();
    fill_identity(&mut wizard);
    wizard.add_owner(Uuid::from_u128(10)).unwrap();
    wizard.add_owner(Uuid::from_u128(11)).unwrap();
    advance_to_review(&mut wizard);

    wizard.set_owner_percentage(0, 90).unwrap();
    let error = wizard.commit().await.unwrap_err();
    assert_eq!(error.code, "WIZ-COMMIT-001");
    assert!(error.message.contains("sum to 140"));
    assert!(wizard.is_open());
    assert_eq!(h.records.count("horses").await, 0);

    wizard.go_to(steps::OWNERSHIP).unwrap();
    wizard.set_owner_percentage(1, 10).unwrap();
    advance_to_review(&mut wizard);
    assert!(wizard.commit().await.is_ok());
}

#[tokio::test]
async fn test_progress_tracks_effective_steps() {
    let h = harness();
    let mut wizard = RegistrationWizard::open_create(h.services.clone(), &h.config, h.tenant).unwrap();
    let progress = wizard.progress();
    assert_eq!((progress.position, progress.total), (1, 8));
    wizard.next().unwrap();
    fill_identity(&mut wizard);
    wizard.next().unwrap();
    let progress = wizard.progress();
    assert_eq!(progress.step, steps::CLASSIFICATION);
    assert_eq!(progress.percent, 37);
}

#[tokio::test]
async fn test_media_of_another_session_cannot_be_injected() {
    let h = harness();
    let mut owner = RegistrationWizard::open_create(h.services.clone(), &h.config, h.tenant).unwrap();
    let foreign = owner.upload(vec![photo("other.jpg")]).await.unwrap().uploaded;

    let mut intruder = RegistrationWizard::open_create(h.services.clone(), &h.config, h.tenant).unwrap();
    let error = intruder.apply(HorsePatch::Media(foreign.clone())).unwrap_err();
    assert_eq!(error.code, "WIZ-DRAFT-001");
    assert!(intruder.draft().media.is_empty());
    assert_eq!(intruder.remove_media(0).await.unwrap_err().code, "WIZ-STAGE-006");

    assert!(h.records.get("media_assets", foreign[0].id).await.is_some());
    assert!(h.storage.contains("horse-media", &foreign[0].storage_path).await);
    assert_eq!(owner.draft().media, foreign);
}

#[tokio::test]
async fn test_undo_skips_uploads_and_close_still_reports_them() {
    let h = harness();
    let mut wizard = RegistrationWizard::open_create(h.services.clone(), &h.config, h.tenant).unwrap();
    let provisional = wizard.provisional_id();
    wizard.upload(vec![photo("a.jpg")]).await.unwrap();
    wizard.apply(HorsePatch::Name("Comet".to_string())).unwrap();

    assert_eq!(
        wizard.undo().unwrap(),
        Some(HorsePatch::Name("Comet".to_string()))
    );
    assert_eq!(wizard.undo().unwrap(), None);
    assert_eq!(wizard.draft().media.len(), 1);

    let report = wizard.close().await;
    assert_eq!(report.pending_orphans.unwrap().entity_id, provisional);
    assert_eq!(h.records.count("media_assets").await, 1);
    assert_eq!(h.storage.object_count().await, 1);
}

#[tokio::test]
async fn test_close_after_removing_every_upload_reports_no_orphans() {
    let h = harness();
    let mut wizard = RegistrationWizard::open_create(h.services.clone(), &h.config, h.tenant).unwrap();
    wizard.upload(vec![photo("a.jpg")]).await.unwrap();
    wizard.remove_media(0).await.unwrap();

    let report = wizard.close().await;
    assert!(report.pending_orphans.is_none());
    assert_eq!(h.storage.object_count().await, 0);
}
