// tests/registry_resolution.rs

use std::error::Error;
use std::fs;

use el_listen::errors::ListenError;
use el_listen::registry::{self, Resolver, Tier};
use el_listen_test_utils::fixtures::{write_plain, RegistryFixture};
use el_listen_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn user_tier_wins_and_lower_tiers_are_marked_shadowed() -> TestResult {
    init_tracing();
    let fx = RegistryFixture::new();

    fx.builtin("ci", "echo builtin");
    fx.discovered("market", "other-plugin", "ci", "echo discovered");
    let script = fx.script("ci.sh", "echo user");
    registry::register(&fx.config, &script, None)?;

    let resolver = Resolver::new(fx.config.clone());
    let resolved = resolver.resolve("ci")?;
    assert_eq!(resolved.tier, Tier::User);
    assert_eq!(resolved.executable_path, script.canonicalize()?);

    let listing: Vec<_> = resolver
        .list()
        .into_iter()
        .filter(|e| e.source.name == "ci")
        .map(|e| (e.source.tier, e.shadowed))
        .collect();
    assert_eq!(
        listing,
        vec![
            (Tier::User, false),
            (Tier::BuiltIn, true),
            (Tier::Discovered, true),
        ]
    );

    Ok(())
}

#[test]
fn unregister_unshadows_the_builtin() -> TestResult {
    let fx = RegistryFixture::new();
    let builtin = fx.builtin("ci", "echo builtin");
    let script = fx.script("ci.sh", "echo user");
    registry::register(&fx.config, &script, None)?;

    let resolver = Resolver::new(fx.config.clone());
    assert_eq!(resolver.resolve("ci")?.tier, Tier::User);

    registry::unregister(&fx.config, "ci")?;

    let resolved = resolver.resolve("ci")?;
    assert_eq!(resolved.tier, Tier::BuiltIn);
    assert_eq!(resolved.executable_path, builtin);
    assert!(resolver.list().iter().all(|e| !e.shadowed));

    Ok(())
}

#[test]
fn builtin_beats_discovered() -> TestResult {
    let fx = RegistryFixture::new();
    fx.builtin("file-change", "echo builtin");
    fx.discovered("market", "other-plugin", "file-change", "echo discovered");
    fx.discovered("market", "other-plugin", "slack", "echo slack");

    let resolver = Resolver::new(fx.config.clone());
    assert_eq!(resolver.resolve("file-change")?.tier, Tier::BuiltIn);
    assert_eq!(resolver.resolve("slack")?.tier, Tier::Discovered);

    Ok(())
}

#[test]
fn registering_twice_leaves_a_single_alias() -> TestResult {
    let fx = RegistryFixture::new();
    let script = fx.script("watch-ci.sh", "echo hi");

    let first = registry::register(&fx.config, &script, None)?;
    let second = registry::register(&fx.config, &script, None)?;

    assert_eq!(first, second);
    assert_eq!(first.name, "watch-ci");
    assert_eq!(fx.user_dir_entries(), 1);

    let link = fs::read_link(fx.config.user_dir.join("watch-ci"))?;
    assert_eq!(link, script.canonicalize()?);

    Ok(())
}

#[test]
fn registering_a_new_target_under_the_same_name_replaces_the_alias() -> TestResult {
    let fx = RegistryFixture::new();
    let old = fx.script("watch.sh", "echo old");
    let new_dir = fx.scratch().join("v2");
    let new = el_listen_test_utils::fixtures::write_script(&new_dir, "watch.sh", "echo new");

    registry::register(&fx.config, &old, None)?;
    registry::register(&fx.config, &new, None)?;

    let resolver = Resolver::new(fx.config.clone());
    assert_eq!(resolver.resolve("watch")?.executable_path, new.canonicalize()?);
    assert_eq!(fx.user_dir_entries(), 1);

    Ok(())
}

#[test]
fn unregister_without_alias_fails_and_changes_nothing() -> TestResult {
    let fx = RegistryFixture::new();

    let err = registry::unregister(&fx.config, "nope").unwrap_err();
    assert!(matches!(err, ListenError::RegistryConflict(_)), "got {err:?}");
    assert!(!fx.config.user_dir.exists());

    fs::create_dir_all(&fx.config.user_dir)?;
    let err = registry::unregister(&fx.config, "nope").unwrap_err();
    assert!(matches!(err, ListenError::RegistryConflict(_)), "got {err:?}");
    assert_eq!(fx.user_dir_entries(), 0);

    Ok(())
}

#[test]
fn unregister_does_not_touch_builtins() -> TestResult {
    let fx = RegistryFixture::new();
    let builtin = fx.builtin("heartbeat", "echo hb");

    let err = registry::unregister(&fx.config, "heartbeat").unwrap_err();
    assert!(matches!(err, ListenError::RegistryConflict(_)));
    assert!(builtin.exists());

    Ok(())
}

#[test]
fn register_rejects_missing_and_non_executable_targets() -> TestResult {
    let fx = RegistryFixture::new();

    let missing = fx.scratch().join("missing.sh");
    let err = registry::register(&fx.config, &missing, None).unwrap_err();
    assert!(matches!(err, ListenError::RegistryConflict(_)), "got {err:?}");

    let plain = write_plain(&fx.scratch(), "notes.txt", "hello");
    let err = registry::register(&fx.config, &plain, None).unwrap_err();
    assert!(matches!(err, ListenError::RegistryConflict(_)), "got {err:?}");

    assert_eq!(fx.user_dir_entries(), 0);
    Ok(())
}

#[test]
fn register_rejects_reserved_names() -> TestResult {
    let fx = RegistryFixture::new();
    let script = fx.script("list.sh", "echo");

    let err = registry::register(&fx.config, &script, None).unwrap_err();
    assert!(matches!(err, ListenError::RegistryConflict(_)));

    let named = registry::register(&fx.config, &script, Some("lister"))?;
    assert_eq!(named.name, "lister");

    Ok(())
}

#[test]
fn discovery_skips_this_plugins_own_sources() -> TestResult {
    let fx = RegistryFixture::new();
    fx.discovered("official", "el", "tick", "echo self");
    fx.discovered("official", "friend", "tock", "echo friend");

    let resolver = Resolver::new(fx.config.clone());
    assert!(matches!(
        resolver.resolve("tick"),
        Err(ListenError::UnknownSource { .. })
    ));
    assert_eq!(resolver.resolve("tock")?.tier, Tier::Discovered);

    Ok(())
}

#[test]
fn discovered_duplicates_resolve_to_the_first_path() -> TestResult {
    let fx = RegistryFixture::new();
    let first = fx.discovered("a-market", "zeta", "ci", "echo a");
    fx.discovered("b-market", "alpha", "ci", "echo b");

    let resolver = Resolver::new(fx.config.clone());
    assert_eq!(resolver.resolve("ci")?.executable_path, first);
    assert_eq!(
        resolver
            .list()
            .iter()
            .filter(|e| e.source.tier == Tier::Discovered)
            .count(),
        1
    );

    Ok(())
}

#[test]
fn unknown_source_reports_known_names() -> TestResult {
    let fx = RegistryFixture::new();
    fx.builtin("poll", "echo");
    fx.builtin("heartbeat", "echo");
    fx.builtin("dispatch", "echo");
    write_plain(&fx.config.builtin_dir, "README", "not a source");

    let resolver = Resolver::new(fx.config.clone());
    match resolver.resolve("slack") {
        Err(ListenError::UnknownSource { name, known }) => {
            assert_eq!(name, "slack");
            assert_eq!(known, vec!["heartbeat".to_string(), "poll".to_string()]);
        }
        other => panic!("expected UnknownSource, got {other:?}"),
    }

    Ok(())
}

#[test]
fn dangling_user_alias_falls_through_to_lower_tier() -> TestResult {
    let fx = RegistryFixture::new();
    fx.builtin("ci", "echo builtin");
    let script = fx.script("ci.sh", "echo user");
    registry::register(&fx.config, &script, None)?;
    fs::remove_file(&script)?;

    let resolver = Resolver::new(fx.config.clone());
    assert_eq!(resolver.resolve("ci")?.tier, Tier::BuiltIn);

    Ok(())
}

#[test]
fn registered_script_shadows_lower_tiers_shipping_the_same_file() -> TestResult {
    let fx = RegistryFixture::new();
    fx.builtin("watch-ci.sh", "echo builtin");
    fx.discovered("market", "other-plugin", "watch-ci.sh", "echo discovered");
    let script = fx.script("watch-ci.sh", "echo user");

    let registered = registry::register(&fx.config, &script, None)?;
    assert_eq!(registered.name, "watch-ci");

    let resolver = Resolver::new(fx.config.clone());
    assert_eq!(resolver.resolve("watch-ci")?.tier, Tier::User);
    assert!(matches!(
        resolver.resolve("watch-ci.sh"),
        Err(ListenError::UnknownSource { .. })
    ));

    let listing: Vec<_> = resolver
        .list()
        .into_iter()
        .map(|e| (e.source.name, e.source.tier, e.shadowed))
        .collect();
    assert_eq!(
        listing,
        vec![
            ("watch-ci".to_string(), Tier::User, false),
            ("watch-ci".to_string(), Tier::BuiltIn, true),
            ("watch-ci".to_string(), Tier::Discovered, true),
        ]
    );

    Ok(())
}

#[test]
fn builtin_names_drop_the_extension_and_keep_one_per_name() -> TestResult {
    let fx = RegistryFixture::new();
    let bare = fx.builtin("slack", "echo bare");
    fx.builtin("slack.sh", "echo ext");
    fx.builtin("list.sh", "echo reserved");

    let resolver = Resolver::new(fx.config.clone());
    assert_eq!(resolver.resolve("slack")?.executable_path, bare);
    assert_eq!(resolver.known_names(), vec!["slack".to_string()]);

    Ok(())
}
