//! Dispatcher-level tests: drive the command/callback surface the way a
//! chat transport would, against an in-memory store and a small catalog.

use std::sync::Arc;

use wasteland_bot::catalog::Catalog;
use wasteland_bot::config::Config;
use wasteland_bot::dispatch::{parse_callback, parse_command, Callback, Command, Dispatcher};
use wasteland_bot::model::item::{Item, ItemKind};
use wasteland_bot::model::WorldState;
use wasteland_bot::store::{MemoryStore, Store};

fn catalog() -> Catalog {
    Catalog::load(vec![
        Item { dmg: Some(15), ..Item::new("Rusty Pipe", ItemKind::Weapon, 1.0) },
        Item { hp: Some(30), ..Item::new("Scrap Armor", ItemKind::Armor, 1.0) },
    ])
}

fn dispatcher_with_admin(admin_id: i64) -> Dispatcher {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let mut config = Config::from_env();
    config.admin_ids.insert(admin_id);
    Dispatcher::new(WorldState::new(), store, catalog, config)
}

#[tokio::test]
async fn ensure_player_creates_once_and_refreshes_identity_on_repeat() {
    let d = dispatcher_with_admin(999);
    d.ensure_player(1, Some("fox".to_string()), "Fox".to_string(), None).await;
    d.ensure_player(1, Some("fox2".to_string()), "Foxy".to_string(), None).await;

    let world = d.world.lock().await;
    let p = world.players.get(&1).unwrap();
    assert_eq!(p.username.as_deref(), Some("fox2"));
    assert_eq!(p.name, "Foxy");
    assert_eq!(world.players.len(), 1);
}

#[tokio::test]
async fn referral_grants_the_referrer_an_invite_case_once() {
    let d = dispatcher_with_admin(999);
    d.ensure_player(1, None, "referrer".to_string(), None).await;
    d.ensure_player(2, None, "newbie".to_string(), Some(1)).await;
    // A second /start with the same referral does not double-grant.
    d.ensure_player(2, None, "newbie".to_string(), Some(1)).await;

    let world = d.world.lock().await;
    assert_eq!(world.players[&1].invite_cases_available, 1);
}

#[tokio::test]
async fn inventory_command_reports_empty_slots_for_a_fresh_player() {
    let d = dispatcher_with_admin(999);
    d.ensure_player(1, None, "Fox".to_string(), None).await;
    let reply = d.handle_command(1, 1, 0, false, 10, Command::Inventory).await;
    assert!(reply.contains("Weapon: empty"));
}

#[tokio::test]
async fn admin_give_requires_both_admin_flag_and_admin_id() {
    let d = dispatcher_with_admin(999);
    d.ensure_player(999, None, "Admin".to_string(), None).await;
    d.ensure_player(1, None, "Plain".to_string(), None).await;

    // Not flagged as admin by the transport layer: rejected.
    let reply = d
    .handle_command(999, 999, 0, false, 10, Command::AdminGive { item_name: "Rusty Pipe".to_string() })
    .await;
    assert!(reply.contains("not authorized"));

    // A non-admin player, even if the transport incorrectly flags them: still rejected.
    let reply = d
    .handle_command(1, 1, 0, true, 10, Command::AdminGive { item_name: "Rusty Pipe".to_string() })
    .await;
    assert!(reply.contains("not authorized"));

    // The real admin, correctly flagged: succeeds and equips the item.
    let reply = d
    .handle_command(999, 999, 0, true, 10, Command::AdminGive { item_name: "Rusty Pipe".to_string() })
    .await;
    assert!(reply.contains("Gave Rusty Pipe"));
    let world = d.world.lock().await;
    assert_eq!(world.players[&999].inventory.weapon.as_ref().map(|i| i.name.as_str()), Some("Rusty Pipe"));
}

#[tokio::test]
async fn giveto_an_unknown_item_reports_unknown_item() {
    let d = dispatcher_with_admin(999);
    d.ensure_player(999, None, "Admin".to_string(), None).await;
    d.ensure_player(1, None, "Plain".to_string(), None).await;
    let reply = d
    .handle_command(999, 999, 0, true, 10, Command::GiveTo { target_id: 1, item_name: "Nonexistent Thing".to_string() })
    .await;
    assert!(reply.contains("unknown item"));
}

#[tokio::test]
async fn clan_create_then_clan_top_lists_the_new_clan() {
    let d = dispatcher_with_admin(999);
    d.ensure_player(1, None, "Founder".to_string(), None).await;
    let reply = d.handle_command(1, 1, 0, false, 10, Command::ClanCreate { name: "Wanderers".to_string() }).await;
    assert_eq!(reply, "Clan created.");

    let reply = d.handle_command(1, 1, 0, false, 10, Command::ClanTop).await;
    assert!(reply.contains("Wanderers"));
}

#[tokio::test]
async fn assault_rejects_small_chat_with_a_friendly_message() {
    let d = dispatcher_with_admin(999);
    d.ensure_player(1, None, "Founder".to_string(), None).await;
    d.handle_command(1, 1, 0, false, 10, Command::ClanCreate { name: "Wanderers".to_string() }).await;

    let reply = d.handle_command(1, 1, 0, false, 2, Command::Assault).await;
    assert!(reply.contains("enough members"));
}

#[tokio::test]
async fn group_chat_callback_outside_pvp_or_clan_scope_is_redirected_to_dm() {
    let d = dispatcher_with_admin(999);
    d.ensure_player(1, None, "Fox".to_string(), None).await;
    let reply = d.handle_callback(1, false, Callback::Hunt).await;
    assert!(reply.contains("direct message"));
}

#[test]
fn parse_command_accepts_both_underscore_and_compact_clan_aliases() {
    assert_eq!(parse_command("/clan_create Foo"), parse_command("/clancreate Foo"));
    assert_eq!(parse_command("/clan_leave"), Some(Command::ClanLeave));
    assert_eq!(parse_command("/clanleave"), Some(Command::ClanLeave));
}

#[test]
fn parse_callback_assault_attack_splits_three_fields() {
    let cb = parse_callback("assault_attack:555:clan-a:exp-9").unwrap();
    assert_eq!(cb, Callback::AssaultAttack { chat_id: 555, clan_id: "clan-a".to_string(), expedition_id: "exp-9".to_string() });
}
