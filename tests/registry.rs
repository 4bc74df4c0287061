mod support;

use survival_games::game::{GameRegistry, GameSettings, GameState, RegistryError};
use tokio_test::{assert_err, assert_ok};

fn registry() -> GameRegistry {
    let (_recorder, hooks) = support::hooks();
    GameRegistry::new(hooks)
}

fn settings() -> GameSettings {
    support::settings(4, support::short_timings())
}

#[tokio::test]
async fn game_names_are_case_insensitive() {
    let registry = registry();
    let game = assert_ok!(registry.create_game("Arena", settings()));

    assert_eq!(
        registry.create_game("arena", settings()).err(),
        Some(RegistryError::GameExists("arena".to_string()))
    );
    assert_eq!(registry.get("ARENA").as_ref(), Some(&game));
    assert_eq!(registry.active_games(), 1);
}

#[tokio::test]
async fn player_is_in_one_game_at_most() {
    let registry = registry();
    assert_ok!(registry.create_game("north", settings()));
    assert_ok!(registry.create_game("south", settings()));

    let north = assert_ok!(registry.join("north", "alice"));
    assert_eq!(north.name(), "north");

    let err = assert_err!(registry.join("south", "alice"));
    assert_eq!(
        err,
        RegistryError::AlreadyInGame {
            player: "alice".to_string(),
            game: "north".to_string(),
        }
    );

    assert_eq!(
        registry.game_of("alice").map(|g| g.name().to_string()),
        Some("north".to_string())
    );
    assert_eq!(registry.total_players(), 1);
}

#[tokio::test]
async fn unknown_games_and_players_are_reported() {
    let registry = registry();

    let err = assert_err!(registry.join("nowhere", "alice"));
    assert_eq!(err, RegistryError::UnknownGame("nowhere".to_string()));

    let err = assert_err!(registry.quit("alice"));
    assert_eq!(err, RegistryError::NotInGame("alice".to_string()));

    let err = assert_err!(registry.close_game("nowhere"));
    assert_eq!(err, RegistryError::UnknownGame("nowhere".to_string()));

    assert!(!registry.on_death("alice"));
}

#[tokio::test]
async fn refused_join_is_not_tracked() {
    let registry = registry();
    let game = assert_ok!(registry.create_game("arena", settings()));
    assert!(game.join("alice"));

    let err = assert_err!(registry.join("arena", "alice"));
    assert_eq!(
        err,
        RegistryError::JoinRefused {
            player: "alice".to_string(),
            game: "arena".to_string(),
        }
    );
    assert!(registry.game_of("alice").is_none());
}

#[tokio::test(start_paused = true)]
async fn deaths_and_quits_reach_the_game() {
    let registry = registry();
    let game = assert_ok!(registry.create_game("arena", settings()));
    for player in ["alice", "bob", "carol"] {
        assert_ok!(registry.join("arena", player));
    }
    assert_ok!(game.start());
    support::sleep_secs(31).await;

    assert!(registry.on_death("alice"));
    assert!(!registry.on_death("alice"));

    assert_ok!(registry.quit("bob"));
    assert!(registry.game_of("bob").is_none());
    assert_eq!(game.state(), GameState::End);
    assert_eq!(game.lock().roster().sole_competitor(), Some("carol"));
}

#[tokio::test]
async fn closing_forgets_game_and_players() {
    let registry = registry();
    let game = assert_ok!(registry.create_game("arena", settings()));
    assert_ok!(registry.create_game("other", settings()));
    assert_ok!(registry.join("arena", "alice"));
    assert_ok!(registry.join("other", "bob"));

    assert_ok!(registry.close_game("Arena"));
    assert!(game.lock().is_closed());
    assert!(registry.get("arena").is_none());
    assert!(registry.game_of("alice").is_none());
    assert_eq!(registry.total_players(), 1);

    registry.close_all();
    assert_eq!(registry.active_games(), 0);
    assert_eq!(registry.total_players(), 0);
}
