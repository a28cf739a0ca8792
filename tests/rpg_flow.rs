//! End-to-end command flows through the router and the RPG service.

mod common;

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use common::{allowed_hosts, seeded_store, FakeSource, FakeVoice, RecordingNotices};
use punktune::bot::{Caller, Router};
use punktune::config::Config;
use punktune::music::PlaybackManager;
use punktune::rpg::{RpgCommand, RpgError, RpgService, UserRecord};
use punktune::storage::UserRepository;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn caller(id: &str, guild: Option<&str>) -> Caller {
    Caller {
        user_id: id.to_string(),
        display_name: id.to_string(),
        guild_id: guild.map(str::to_string),
        voice_channel: guild.map(|_| "lounge".to_string()),
    }
}

fn setup_router(store: Arc<dyn UserRepository>) -> Router {
    let (music, _events) = PlaybackManager::new(
        Arc::new(FakeSource::default()),
        Arc::new(FakeVoice::default()),
        Arc::new(RecordingNotices::default()),
        allowed_hosts(),
    );
    Router::new(&Config::default(), store, music)
}

#[tokio::test]
async fn test_new_user_flow_through_router() {
    let (_tmp, store) = seeded_store(&[]);
    let mut router = setup_router(store.clone());
    let kuro = caller("kuro", Some("g1"));

    let reply = router.handle(&kuro, "/rpg hunt").await.unwrap();
    assert!(reply.ephemeral);
    assert!(reply.text.contains("Chat first"));

    assert!(router.handle(&kuro, "hey everyone").await.is_none());
    assert!(store.load().contains_key("kuro"));

    let reply = router.handle(&kuro, "/rpg hunt").await.unwrap();
    assert!(reply.text.to_lowercase().contains("class"), "{}", reply.text);

    let reply = router.handle(&kuro, "/rpg setclass Punk").await.unwrap();
    assert!(reply.text.contains("You are now The Punk"));
    let reply = router.handle(&kuro, "/rpg setclass idol").await.unwrap();
    assert!(reply.ephemeral);

    let reply = router.handle(&kuro, "/rpg hunt").await.unwrap();
    assert!(!reply.ephemeral);
    assert!(reply.text.contains("Whispering Marsh"));

    let reply = router.handle(&kuro, "/rpg hunt").await.unwrap();
    assert!(reply.text.starts_with("Chill out"));

    let record = &store.load()["kuro"];
    assert_eq!(record.rpg.stats.class, "punk");
    assert_eq!(record.meta.monsters_hunted, 1);
}

#[tokio::test]
async fn test_router_validation_replies() {
    let (_tmp, store) = seeded_store(&[("kuro", UserRecord::new("kuro", 0))]);
    let mut router = setup_router(store);
    let kuro = caller("kuro", None);

    let reply = router.handle(&kuro, "/rpg convert amount:-5").await.unwrap();
    assert!(reply.ephemeral);
    assert!(reply.text.starts_with("You have to convert"));

    let reply = router.handle(&kuro, "/rpg shop buy item:nope").await.unwrap();
    assert!(reply.ephemeral);

    let reply = router.handle(&kuro, "/music play https://youtu.be/abc").await.unwrap();
    assert_eq!(reply.text, "Music only works inside a server.");

    let reply = router.handle(&kuro, "/dance").await.unwrap();
    assert!(reply.text.contains("/dance"));

    let reply = router.handle(&kuro, "/rpg shop").await.unwrap();
    assert!(reply.text.contains("vivi_serum"));

    let reply = router.handle(&kuro, "/ping").await.unwrap();
    assert!(!reply.ephemeral);
    assert!(reply.text.contains("Pong!"));
}

#[tokio::test]
async fn test_music_through_router() {
    let (_tmp, store) = seeded_store(&[]);
    let mut router = setup_router(store);
    let kuro = caller("kuro", Some("g1"));

    let reply = router
        .handle(&kuro, "/music play https://www.youtube.com/watch?v=abc")
        .await
        .unwrap();
    assert_eq!(reply.text, "Now playing: Song abc by Test Channel [2:05]");

    let reply = router
        .handle(&kuro, "/music play url:https://youtu.be/xyz")
        .await
        .unwrap();
    assert_eq!(reply.text, "Queued: Song xyz [2:05] at position 1");

    let reply = router.handle(&kuro, "/music queue").await.unwrap();
    assert!(reply.text.starts_with("Queue (2 track(s), 4:10)"));

    let reply = router.handle(&kuro, "/music stop").await.unwrap();
    assert!(reply.text.contains("cleared 2"));
    let reply = router.handle(&kuro, "/music skip").await.unwrap();
    assert_eq!(reply.text, "Nothing is playing right now");
}

#[tokio::test]
async fn test_music_needs_voice_channel() {
    let (_tmp, store) = seeded_store(&[]);
    let mut router = setup_router(store);
    let kuro = caller("kuro", Some("g1"));
    router
        .handle(&kuro, "/music play https://youtu.be/abc")
        .await
        .unwrap();

    let outside = Caller { voice_channel: None, ..kuro.clone() };
    for line in ["/music skip", "/music stop", "/music play https://youtu.be/xyz"] {
        let reply = router.handle(&outside, line).await.unwrap();
        assert!(reply.ephemeral);
        assert_eq!(reply.text, "You need to be in a voice channel first", "{}", line);
    }

    let reply = router.handle(&outside, "/music queue").await.unwrap();
    assert!(reply.text.starts_with("Queue (1 track(s)"));
}

#[test]
fn test_convert_scenario() {
    let mut record = UserRecord::new("kuro", 0);
    record.economy.black_musical_notes = 250;
    let (_tmp, store) = seeded_store(&[("1", record)]);
    let service = RpgService::new(store.clone());

    let reply = service
        .execute("1", "kuro", RpgCommand::Convert { amount: 250 }, Utc::now())
        .unwrap();
    assert!(reply.text.contains("converted 200 BMN into 2 BB"));

    let economy = store.load()["1"].economy.clone();
    assert_eq!(economy.baddie_bucks, 2);
    assert_eq!(economy.black_musical_notes, 50);
}

#[test]
fn test_ruins_quest_scenario() {
    let (_tmp, store) = seeded_store(&[("1", UserRecord::new("kuro", 0))]);
    let service = RpgService::new(store.clone());
    let mut rng = StdRng::seed_from_u64(11);
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();

    service
        .execute_with_rng(
            "1",
            "kuro",
            RpgCommand::QuestAccept { id: "q01_ruins".into() },
            start,
            &mut rng,
        )
        .unwrap();

    let err = service
        .execute_with_rng("1", "kuro", RpgCommand::QuestComplete, start, &mut rng)
        .unwrap_err();
    assert!(matches!(err, RpgError::InvalidInput(_)));

    let mut explored_bb = 0;
    for i in 0..3 {
        let at = start + Duration::seconds(601 * i);
        let before = store.load()["1"].economy.baddie_bucks;
        let reply = service
            .execute_with_rng("1", "kuro", RpgCommand::Explore, at, &mut rng)
            .unwrap();
        assert!(reply.text.contains(&format!("[Quest Progress: {}/3]", i + 1)));
        explored_bb += store.load()["1"].economy.baddie_bucks - before;
    }
    assert_eq!(store.load()["1"].rpg.quest_progress, 3);

    let reply = service
        .execute_with_rng("1", "kuro", RpgCommand::QuestComplete, start, &mut rng)
        .unwrap();
    assert!(reply.text.contains("MISSION COMPLETE: Mission: Ancient Ruins"));

    let record = &store.load()["1"];
    assert_eq!(record.rpg.active_quest_id, None);
    assert_eq!(record.rpg.quest_progress, 0);
    assert!(record.rpg.completed_quests.contains("q01_ruins"));
    assert_eq!(record.economy.baddie_bucks, explored_bb + 500);
    assert_eq!(record.rpg.xp, 200);
    assert!(record.rpg.xp < u64::from(record.rpg.level) * 250);

    let err = service
        .execute_with_rng(
            "1",
            "kuro",
            RpgCommand::QuestAccept { id: "q01_ruins".into() },
            start,
            &mut rng,
        )
        .unwrap_err();
    assert!(matches!(err, RpgError::InvalidInput(_)));
}

#[tokio::test]
async fn test_shop_buy_with_positional_amount() {
    let mut record = UserRecord::new("kuro", 0);
    record.economy.baddie_bucks = 1200;
    let (_tmp, store) = seeded_store(&[("kuro", record)]);
    let mut router = setup_router(store.clone());
    let kuro = caller("kuro", None);

    let reply = router.handle(&kuro, "/rpg shop buy vivi_serum 2").await.unwrap();
    assert!(reply.text.contains("You bought 2x Vivi's Recovery Serum for 1000 BB"), "{}", reply.text);

    let record = &store.load()["kuro"];
    assert_eq!(record.economy.baddie_bucks, 200);
    assert_eq!(
        record.inventory.items.iter().filter(|i| i.id == "vivi_serum").count(),
        2
    );
}
