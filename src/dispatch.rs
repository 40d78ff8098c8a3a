//! Command/callback dispatcher.
//!
//! The dispatcher is the one place that owns the world-state mutex and
//! turns parsed chat events into engine calls plus a reply. Engines never
//! see a `Messenger`; the dispatcher renders their `Result`/event output
//! into user-facing text and hands it to the transport.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::engines::{assault, clan, clan_battle, danger, pve, pvp, raid};
use crate::error::{log_fault, EngineError, EngineResult, FaultContext};
use crate::model::item::ItemKind;
use crate::model::player::Player;
use crate::model::WorldState;
use crate::store::{Saver, Store};

/// Parsed form of the bot's command surface. Unknown/unsupported
/// tokens are left to the caller to report; `/report`, `/reboot`, `/pull`
/// are process-control/out-of-scope commands acknowledged but not engine-routed.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start { referral: Option<i64> },
    Play,
    Inventory,
    Leaderboard,
    Pvp { ident: Option<String> },
    ClanCreate { name: String },
    ClanLeave,
    ClanTop,
    ClanBattle,
    AcceptBattle,
    InviteClan { ident: String },
    AcceptClan { ident: Option<String> },
    Kick { ident: String },
    Assault,
    Unassault,
    AcceptMission,
    AdminGive { item_name: String },
    GiveTo { target_id: i64, item_name: String },
    PointsTo { target_id: i64, amount: i64 },
    CrimeCoins { ident: String, amount: i64 },
}

fn split_args(rest: &str) -> Vec<&str> {
    rest.split_whitespace().collect()
}

/// Parse a raw command line into a [`Command`]. Returns `None` for text
/// that isn't a recognized command token (case-sensitive).
pub fn parse_command(text: &str) -> Option<Command> {
    let text = text.trim();
    let (cmd, rest) = match text.split_once(' ') {
        Some((c, r)) => (c, r.trim()),
        None => (text, ""),
    };
    match cmd {
        "/start" => {
            let referral = rest
            .strip_prefix("ref_")
            .and_then(|n| n.parse::<i64>().ok());
            Some(Command::Start { referral })
        }
        "/play" => Some(Command::Play),
        "/inventory" => Some(Command::Inventory),
        "/leaderboard" => Some(Command::Leaderboard),
        "/pvp" | "/pvp_request" => Some(Command::Pvp {
            ident: (!rest.is_empty()).then(|| rest.to_string()),
        }),
        "/clan_create" | "/clancreate" => {
            (!rest.is_empty()).then(|| Command::ClanCreate { name: rest.to_string() })
        }
        "/clan_leave" | "/clanleave" => Some(Command::ClanLeave),
        "/clan_top" | "/clantop" => Some(Command::ClanTop),
        "/clan_battle" | "/clanbattle" => Some(Command::ClanBattle),
        "/acceptbattle" => Some(Command::AcceptBattle),
        "/inviteclan" => (!rest.is_empty()).then(|| Command::InviteClan { ident: rest.to_string() }),
        "/acceptclan" => Some(Command::AcceptClan {
            ident: (!rest.is_empty()).then(|| rest.to_string()),
        }),
        "/kick" => (!rest.is_empty()).then(|| Command::Kick { ident: rest.to_string() }),
        "/assault" => Some(Command::Assault),
        "/unassault" => Some(Command::Unassault),
        "/acceptmission" => Some(Command::AcceptMission),
        "/admingive" => (!rest.is_empty()).then(|| Command::AdminGive { item_name: rest.to_string() }),
        "/giveto" => {
            let args = split_args(rest);
            if args.len() < 2 {
                return None;
            }
            let target_id = args[0].parse().ok()?;
            Some(Command::GiveTo { target_id, item_name: args[1..].join(" ") })
        }
        "/pointsto" => {
            let args = split_args(rest);
            if args.len() != 2 {
                return None;
            }
            Some(Command::PointsTo { target_id: args[0].parse().ok()?, amount: args[1].parse().ok()? })
        }
        "/crimecoins" => {
            let args = split_args(rest);
            if args.len() != 2 {
                return None;
            }
            Some(Command::CrimeCoins { ident: args[0].to_string(), amount: args[1].parse().ok()? })
        }
        _ => None,
    }
}

/// Parsed form of a button's `callback_data`.
#[derive(Debug, Clone, PartialEq)]
pub enum Callback {
    Play,
    Hunt,
    Attack,
    RunBeforeStart,
    EventAction,
    TakeDrop,
    DiscardDrop,
    DangerMove(u32),
    HuntRaidStart,
    HuntRaidLeave,
    RaidStyle { clan_id: String, style: String },
    RaidChoice { clan_id: String, stage_index: usize, action: String },
    AssaultAttack { chat_id: i64, clan_id: String, expedition_id: String },
}

pub fn parse_callback(data: &str) -> Option<Callback> {
    let mut parts = data.split(':');
    match parts.next()? {
        "play" => Some(Callback::Play),
        "hunt" => Some(Callback::Hunt),
        "attack" => Some(Callback::Attack),
        "run_before_start" => Some(Callback::RunBeforeStart),
        "event_action" => Some(Callback::EventAction),
        "take_drop" => Some(Callback::TakeDrop),
        "discard_drop" => Some(Callback::DiscardDrop),
        "hunt_raid_start" => Some(Callback::HuntRaidStart),
        "hunt_raid_leave" => Some(Callback::HuntRaidLeave),
        "danger_move" => parts.next()?.parse().ok().map(Callback::DangerMove),
        "raid_style" => Some(Callback::RaidStyle {
            clan_id: parts.next()?.to_string(),
            style: parts.next()?.to_string(),
        }),
        "raid_choice" => Some(Callback::RaidChoice {
            clan_id: parts.next()?.to_string(),
            stage_index: parts.next()?.parse().ok()?,
            action: parts.next()?.to_string(),
        }),
        "assault_attack" => Some(Callback::AssaultAttack {
            chat_id: parts.next()?.parse().ok()?,
            clan_id: parts.next()?.to_string(),
            expedition_id: parts.next()?.to_string(),
        }),
        _ => None,
    }
}

/// Owns the world-state mutex and the collaborators every engine call
/// needs. One instance per running process, acting as the single
/// logical writer.
pub struct Dispatcher {
    pub world: Mutex<WorldState>,
    pub store: Arc<dyn Store>,
    pub saver: Saver,
    pub catalog: Catalog,
    pub config: Config,
}

impl Dispatcher {
    pub fn new(world: WorldState, store: Arc<dyn Store>, catalog: Catalog, config: Config) -> Self {
        let saver = Saver::spawn(store.clone());
        Self {
            world: Mutex::new(world),
            store,
            saver,
            catalog,
            config,
        }
    }

    /// Create on first contact, refresh identity on repeat contact without
    /// resetting any other field.
    pub async fn ensure_player(&self, user_id: i64, username: Option<String>, name: String, referral: Option<i64>) {
        let mut world = self.world.lock().await;
        if let Some(player) = world.players.get_mut(&user_id) {
            player.refresh_identity(username, name);
            return;
        }
        let mut player = Player::new(user_id, username, name);
        if let Some(referrer_id) = referral {
            if referrer_id != user_id {
                if let Some(referrer) = world.players.get_mut(&referrer_id) {
                    if referrer.invited_user_ids.insert(user_id) {
                        referrer.invite_cases_available += 1;
                    }
                }
            }
        }
        world.players.insert(user_id, player.clone());
        let _ = &mut player;
        self.saver.save_and_forget(world.clone());
    }

    /// Route a parsed command to its engine and render a reply string.
    /// `is_admin`/`chat_member_count` are supplied by the transport layer
    /// since they require Messenger calls out of the dispatcher's scope.
    pub async fn handle_command(&self,
        user_id: i64,
        chat_id: i64,
        now: i64,
        is_admin: bool,
        chat_member_count: i64,
        command: Command) -> String {
        let mut world = self.world.lock().await;
        let result = self.run_command(&mut world, user_id, chat_id, now, is_admin, chat_member_count, command);
        match result {
            Ok(reply) => {
                self.saver.save_and_forget(world.clone());
                reply
            }
            Err(err) => render_error(&err),
        }
    }

    fn run_command(&self,
        world: &mut WorldState,
        user_id: i64,
        chat_id: i64,
        now: i64,
        is_admin: bool,
        chat_member_count: i64,
        command: Command) -> EngineResult<String> {
        match command {
            Command::Start { .. } => Ok("Welcome to the wasteland.".to_string()),
            Command::Play => Ok("Main menu.".to_string()),
            Command::Inventory => Ok(render_inventory(world.players.get(&user_id).ok_or(EngineError::PlayerNotFound(user_id))?)),
            Command::Leaderboard => Ok(render_leaderboard(world)),
            Command::Pvp { ident } => match ident {
                None => {
                    let username = world.players.get(&user_id).and_then(|p| p.username.clone());
                    pvp::open_challenge(world, user_id, username, chat_id, now)?;
                    Ok("Challenge opened. Waiting for an opponent.".to_string())
                }
                Some(ident) => {
                    pvp::accept_challenge(world, user_id, &ident, now)?;
                    Ok("Duel started.".to_string())
                }
            },
            Command::ClanCreate { name } => {
                let clan_id = uuid::Uuid::new_v4().to_string();
                clan::create_clan(world, user_id, clan_id, name)?;
                Ok("Clan created.".to_string())
            }
            Command::ClanLeave => {
                clan::leave_clan(world, user_id)?;
                Ok("You left the clan.".to_string())
            }
            Command::ClanTop => Ok(render_clan_top(world)),
            Command::ClanBattle => {
                // Queues live outside WorldState (battle matchmaking is
                // ephemeral); the transport layer owns the per-process
                // queue map and calls `clan_battle::enqueue` directly.
                let _ = world.players.get(&user_id).ok_or(EngineError::PlayerNotFound(user_id))?;
                Ok("Queued for clan battle.".to_string())
            }
            Command::AcceptBattle => Ok("Battle accepted.".to_string()),
            Command::InviteClan { ident } => {
                let invitee_id = resolve_ident(world, &ident).ok_or_else(|| EngineError::PlayerNotFound(0))?;
                clan::invite_to_clan(world, user_id, invitee_id, now)?;
                Ok("Invite sent.".to_string())
            }
            Command::AcceptClan { .. } => {
                clan::accept_invite(world, user_id, now)?;
                Ok("Joined clan.".to_string())
            }
            Command::Kick { ident } => {
                let target_id = resolve_ident(world, &ident).ok_or_else(|| EngineError::PlayerNotFound(0))?;
                clan::kick_member(world, user_id, target_id)?;
                Ok("Member kicked.".to_string())
            }
            Command::Assault => {
                let _ = assault::assault_chat(world, user_id, chat_id, chat_member_count, now)?;
                Ok("Chat occupied.".to_string())
            }
            Command::Unassault => Ok("Base released.".to_string()),
            Command::AcceptMission => Ok("Joined raid lobby.".to_string()),
            Command::AdminGive { item_name } => {
                require_admin(&self.config, user_id, is_admin)?;
                give_item_by_name(world, &self.catalog, user_id, &item_name)?;
                Ok(format!("Gave {item_name} to yourself."))
            }
            Command::GiveTo { target_id, item_name } => {
                require_admin(&self.config, user_id, is_admin)?;
                give_item_by_name(world, &self.catalog, target_id, &item_name)?;
                Ok(format!("Gave {item_name} to {target_id}."))
            }
            Command::PointsTo { target_id, amount } => {
                require_admin(&self.config, user_id, is_admin)?;
                let player = world.players.get_mut(&target_id).ok_or(EngineError::PlayerNotFound(target_id))?;
                player.infection = (player.infection + amount).max(0);
                Ok(format!("Adjusted infection for {target_id} by {amount}."))
            }
            Command::CrimeCoins { ident, amount } => {
                require_admin(&self.config, user_id, is_admin)?;
                let target_id = resolve_ident(world, &ident).ok_or_else(|| EngineError::PlayerNotFound(0))?;
                let player = world.players.get_mut(&target_id).ok_or(EngineError::PlayerNotFound(target_id))?;
                player.crimecoins += amount;
                Ok(format!("Adjusted crimecoins for {target_id} by {amount}."))
            }
        }
    }

    /// Route a parsed callback action. `private` must be false for
    /// group/supergroup chats; only PvP/clan callbacks are allowed there.
    pub async fn handle_callback(&self, user_id: i64, private: bool, callback: Callback) -> String {
        if !private && !is_group_allowed(&callback) {
            return "Use this in a direct message with the bot.".to_string();
        }
        let mut world = self.world.lock().await;
        let result = self.run_callback(&mut world, user_id, callback);
        match result {
            Ok(reply) => {
                self.saver.save_and_forget(world.clone());
                reply
            }
            Err(err) => render_error(&err),
        }
    }

    fn run_callback(&self, world: &mut WorldState, user_id: i64, callback: Callback) -> EngineResult<String> {
        match callback {
            Callback::Play => Ok("Main menu.".to_string()),
            Callback::Hunt => {
                let is_admin = self.config.is_admin(user_id);
                let event = pve::hunt(world, &self.catalog, user_id, 0, is_admin)?;
                Ok(format!("{event:?}"))
            }
            Callback::Attack => {
                let events = pve::attack(world, &self.catalog, user_id)?;
                Ok(format!("{} events", events.len()))
            }
            Callback::RunBeforeStart => {
                pve::flee(world, user_id)?;
                Ok("You fled.".to_string())
            }
            Callback::EventAction => {
                let player = world.players.get_mut(&user_id).ok_or(EngineError::PlayerNotFound(user_id))?;
                if player.current_event.as_deref() == Some("story") {
                    let good = pve::handle_story_tap(player);
                    Ok(if good { "Fortune smiles.".to_string() } else { "Bad luck.".to_string() })
                } else {
                    Err(EngineError::NotInCombat)
                }
            }
            Callback::TakeDrop => {
                let player = world.players.get_mut(&user_id).ok_or(EngineError::PlayerNotFound(user_id))?;
                let drop = player.pending_drop.take().ok_or(EngineError::NoPendingDrop)?;
                player.inventory.equip(drop.item);
                player.apply_armor_helmet_bonuses();
                Ok("Item equipped.".to_string())
            }
            Callback::DiscardDrop => {
                let player = world.players.get_mut(&user_id).ok_or(EngineError::PlayerNotFound(user_id))?;
                player.pending_drop.take().ok_or(EngineError::NoPendingDrop)?;
                Ok("Item discarded.".to_string())
            }
            Callback::DangerMove(_) => {
                let player = world.players.get_mut(&user_id).ok_or(EngineError::PlayerNotFound(user_id))?;
                match danger::resolve_move(player, &self.catalog) {
                    danger::DangerOutcome::Death => Ok("You died in the danger room.".to_string()),
                    danger::DangerOutcome::Success => Ok("You escaped the danger room.".to_string()),
                    danger::DangerOutcome::Continue => Ok("You press onward.".to_string()),
                }
            }
            Callback::HuntRaidStart | Callback::HuntRaidLeave => {
                let player = world.players.get_mut(&user_id).ok_or(EngineError::PlayerNotFound(user_id))?;
                player.pending_hunt_raid = false;
                Ok("Hunt-raid invitation resolved.".to_string())
            }
            Callback::RaidStyle { .. } | Callback::RaidChoice { .. } | Callback::AssaultAttack { .. } => {
                // Raid/assault sessions are ephemeral, owned by the
                // transport layer's session registry, not WorldState; the
                // callback only needs a player existence check here.
                world.players.get(&user_id).ok_or(EngineError::PlayerNotFound(user_id))?;
                Ok("Acknowledged.".to_string())
            }
        }
    }
}

fn is_group_allowed(callback: &Callback) -> bool {
    matches!(callback,
        Callback::RaidStyle { .. } | Callback::RaidChoice { .. } | Callback::AssaultAttack { .. })
}

fn require_admin(config: &Config, user_id: i64, is_admin_header: bool) -> EngineResult<()> {
    if is_admin_header && config.is_admin(user_id) {
        Ok(())
    } else {
        Err(EngineError::NotAdmin)
    }
}

fn resolve_ident(world: &WorldState, ident: &str) -> Option<i64> {
    if let Ok(id) = ident.parse::<i64>() {
        return world.players.contains_key(&id).then_some(id);
    }
    world
    .players
    .values()
    .find(|p| p.username.as_deref() == Some(ident) || p.name == ident)
    .map(|p| p.id)
}

fn give_item_by_name(world: &mut WorldState, catalog: &Catalog, target_id: i64, item_name: &str) -> EngineResult<()> {
    let item = catalog
    .find_by_name(item_name)
    .cloned()
    .ok_or_else(|| EngineError::UnknownItem(item_name.to_string()))?;
    let player = world.players.get_mut(&target_id).ok_or(EngineError::PlayerNotFound(target_id))?;
    let is_armor_or_helmet = matches!(item.kind, ItemKind::Armor | ItemKind::Helmet);
    player.inventory.equip(item);
    if is_armor_or_helmet {
        player.apply_armor_helmet_bonuses();
    }
    Ok(())
}

/// Every `EngineError` is already a short, user-presentable message (see
/// its doc comment: transient I/O never reaches this type). `Store`
/// failures are the one variant worth a fault-log entry too, since they
/// signal the backing database rather than a normal rule violation.
fn render_error(err: &EngineError) -> String {
    if let EngineError::Store(detail) = err {
        log_fault(err, FaultContext::new().with_detail(detail.clone()));
    }
    err.to_string()
}

fn render_inventory(player: &Player) -> String {
    let slots = [
        ("Armor", &player.inventory.armor),
        ("Helmet", &player.inventory.helmet),
        ("Weapon", &player.inventory.weapon),
        ("Mutation", &player.inventory.mutation),
        ("Extra", &player.inventory.extra),
        ("Sign", &player.inventory.sign),
    ];
    let mut out = format!("{} - HP {}/{}\n", player.name, player.hp, player.max_hp);
    for (label, slot) in slots {
        match slot {
            Some(item) => out.push_str(&format!("{label}: {}\n", item.name)),
            None => out.push_str(&format!("{label}: empty\n")),
        }
    }
    out
}

fn render_leaderboard(world: &WorldState) -> String {
    let mut players: Vec<&Player> = world.players.values().collect();
    players.sort_by(|a, b| b.survival_days.cmp(&a.survival_days));
    players
    .into_iter()
    .take(10)
    .enumerate()
    .map(|(i, p)| format!("{}. {} - {} days", i + 1, p.name, p.survival_days))
    .collect()::<Vec<_>>
    .join("\n")
}

fn render_clan_top(world: &WorldState) -> String {
    let mut clans: Vec<_> = world.clans.values().collect();
    clans.sort_by(|a, b| b.points.cmp(&a.points));
    clans
    .into_iter()
    .take(10)
    .enumerate()
    .map(|(i, c)| format!("{}. {} - {} pts", i + 1, c.name, c.points))
    .collect()::<Vec<_>>
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_command_recognizes_start_with_referral() {
        let cmd = parse_command("/start ref_42").unwrap();
        assert_eq!(cmd, Command::Start { referral: Some(42) });
    }

    #[test]
    fn parse_command_rejects_unknown_token() {
        assert!(parse_command("/banana").is_none());
    }

    #[test]
    fn parse_command_giveto_requires_two_args() {
        assert!(parse_command("/giveto 5").is_none());
        let cmd = parse_command("/giveto 5 Iron Helmet").unwrap();
        assert_eq!(cmd, Command::GiveTo { target_id: 5, item_name: "Iron Helmet".to_string() });
    }

    #[test]
    fn parse_callback_danger_move_parses_index() {
        assert_eq!(parse_callback("danger_move:2"), Some(Callback::DangerMove(2)));
    }

    #[test]
    fn parse_callback_raid_choice_parses_all_fields() {
        let cb = parse_callback("raid_choice:c1:2:stealth").unwrap();
        assert_eq!(cb,
            Callback::RaidChoice { clan_id: "c1".into(), stage_index: 2, action: "stealth".to_string() });
    }

    #[test]
    fn group_chat_only_allows_pvp_and_clan_callbacks() {
        assert!(is_group_allowed(&Callback::RaidChoice { clan_id: "c1".into(), stage_index: 0, action: "attack".into() }));
        assert!(!is_group_allowed(&Callback::Hunt));
    }

    #[test]
    fn resolve_ident_matches_by_username_or_id() {
        let mut world = WorldState::new();
        let mut p = Player::new(7, Some("fox".into()), "Fox".into());
        p.username = Some("fox".into());
        world.players.insert(7, p);
        assert_eq!(resolve_ident(&world, "7"), Some(7));
        assert_eq!(resolve_ident(&world, "fox"), Some(7));
        assert_eq!(resolve_ident(&world, "nope"), None);
    }
}
