use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use quill_core::{Config, Core, Error, HashParams, ImageUpload, ManualClock, MemoryStore};
use quill_db::Database;
use quill_types::models::NotificationKind;

fn core() -> (Core, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()));
    let config = Config {
        hash: HashParams::cheapest(),
        ..Config::default()
    };
    let core = Core::new(
        Arc::new(Database::open_in_memory().unwrap()),
        clock.clone(),
        Arc::new(MemoryStore::default()),
        config,
    )
    .unwrap();
    (core, clock)
}

#[test]
fn social_blogging_walkthrough() {
    let (core, _clock) = core();

    core.register("alice", "alice@example.com", "Abcd1234!", "travel", "first pet?", "Rex")
        .unwrap();
    let weak = core
        .register("bob", "bob@example.com", "abcdefgh", "", "first pet?", "Fido")
        .unwrap_err();
    assert!(matches!(weak, Error::WeakPassword(_)));
    core.register("bob", "bob@example.com", "Bobpass12", "", "first pet?", "Fido")
        .unwrap();

    core.follow("alice", "bob").unwrap();
    assert!(core.is_following("alice", "bob").unwrap());
    let bob_notes = core.list_notifications("bob", None).unwrap();
    assert_eq!(bob_notes.len(), 1);
    assert_eq!(bob_notes[0].kind, NotificationKind::Follow);

    let blog = core
        .create_blog(
            "alice",
            "My Trip",
            "We walked for days.",
            &[ImageUpload::new("beach.jpg", vec![0xff, 0xd8])],
        )
        .unwrap();
    assert_eq!(blog.channel, "travel");

    core.like("bob", blog.id).unwrap();
    assert_eq!(core.likes_count(blog.id).unwrap(), 1);
    let alice_notes = core.list_notifications("alice", None).unwrap();
    assert_eq!(alice_notes.len(), 1);
    assert_eq!(alice_notes[0].kind, NotificationKind::Like);
    assert_eq!(alice_notes[0].message, "bob liked your blog \"My Trip...\"");

    let t1 = core.request_password_reset("alice", "alice@example.com").unwrap();
    let t2 = core.request_password_reset("alice", "alice@example.com").unwrap();
    assert_eq!(core.verify_reset_token(&t1).unwrap(), None);
    assert_eq!(core.verify_reset_token(&t2).unwrap().as_deref(), Some("alice"));
}

#[test]
fn likes_count_tracks_distinct_likers() {
    let (core, _clock) = core();
    let names = ["ann", "ben", "cat", "dan"];
    for name in names {
        core.register(name, &format!("{name}@example.com"), "Passw0rd!", "", "q?", "aa")
            .unwrap();
    }
    let blog = core
        .create_blog("ann", "Counting", "likes and unlikes", &[ImageUpload::new("x.gif", vec![1])])
        .unwrap();

    let steps: [(&str, bool); 8] = [
        ("ben", true),
        ("cat", true),
        ("ben", false),
        ("dan", true),
        ("ann", true),
        ("cat", false),
        ("ben", true),
        ("dan", false),
    ];
    for (who, like) in steps {
        if like {
            core.like(who, blog.id).unwrap();
        } else {
            core.unlike(who, blog.id).unwrap();
        }

        let likers = names
            .iter()
            .filter(|name| core.is_liked(name, blog.id).unwrap())
            .count() as u64;
        assert_eq!(core.likes_count(blog.id).unwrap(), likers);
        assert_eq!(core.get_blog(blog.id).unwrap().likes_count, likers);
    }
}

#[test]
fn reset_token_full_lifecycle() {
    let (core, clock) = core();
    core.register("alice", "alice@example.com", "Abcd1234!", "", "first pet?", "Rex")
        .unwrap();

    let stale = core.issue_reset_token("alice").unwrap();
    clock.advance(Duration::minutes(31));
    assert_eq!(core.verify_reset_token(&stale).unwrap(), None);
    assert_eq!(core.consume_reset_token(&stale).unwrap(), None);

    let token = core.recover_with_security_answer("alice", "rex").unwrap();
    core.reset_password(&token, "Fresh5tart").unwrap();
    assert!(core.authenticate("alice", "Fresh5tart").is_ok());
    assert!(matches!(
        core.reset_password(&token, "Again5tart"),
        Err(Error::InvalidToken)
    ));
}

#[test]
fn conversation_is_shared_by_both_directions() {
    let (core, clock) = core();
    for name in ["alice", "bob"] {
        core.register(name, &format!("{name}@example.com"), "Abcd1234!", "", "q?", "aa")
            .unwrap();
    }

    core.send("alice", "bob", "ping").unwrap();
    clock.advance(Duration::seconds(1));
    core.send("bob", "alice", "pong").unwrap();

    assert_eq!(core.conversations("alice").unwrap().len(), 1);
    assert_eq!(core.conversations("bob").unwrap().len(), 1);
    assert_eq!(
        core.conversation("alice", "bob").unwrap().unwrap().id,
        core.conversation("bob", "alice").unwrap().unwrap().id
    );
}
