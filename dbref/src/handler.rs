use crate::entry::FlagEntry;
use crate::error::FlagError;
use crate::set::FlagSet;
use crate::Dbref;

/// Privilege and identity facts about the actor performing a mutation.
/// Supplied by the embedding game; this crate never looks these up.
#[derive(Debug, Clone, Copy)]
pub struct ActorInfo {
    /// The actor's own object id.
    pub dbref: Dbref,
    /// GOD flag set.
    pub is_god: bool,
    /// WIZARD flag set.
    pub is_wizard: bool,
    /// ROYALTY flag set.
    pub is_royalty: bool,
    /// STAFF flag set.
    pub is_staff: bool,
    /// INHERIT flag set.
    pub has_inherit: bool,
    /// Actor may hide their own connection status (has the "hide" power).
    pub can_hide: bool,
    /// Actor may set MONITOR on players (has the "monitor" power).
    pub can_monitor: bool,
    /// Actor is a player who owns themselves (not a robot/puppet).
    pub owns_self: bool,
}

/// Identity facts about the mutation target.
#[derive(Debug, Clone, Copy)]
pub struct TargetInfo {
    /// The target's own object id.
    pub dbref: Dbref,
    /// Target is a player object.
    pub is_player: bool,
    /// Target currently has the GOING flag set.
    pub is_going: bool,
    /// Target's type is GARBAGE (already being recycled).
    pub is_garbage: bool,
    /// Target is the GOD object itself.
    pub is_god: bool,
    /// Target was a "hearer" before this mutation, per the embedder's
    /// own notion of hearability (PUPPET, flags, etc). Used by
    /// [`FlagHandler::HearBit`] to detect a change worth notifying.
    pub was_hearer: bool,
    /// Target is a hearer after this mutation would apply. Supplied by
    /// the caller since only the embedder's object model can compute it.
    pub will_be_hearer: bool,
}

/// The canonical dbrefs `fh_going_bit` refuses to condemn even for GOD.
#[derive(Debug, Clone, Copy)]
pub struct ProtectedDbrefs {
    /// Dbref 0, the conventional "nothing"/root object.
    pub root: Dbref,
    pub start_home: Dbref,
    pub start_room: Dbref,
    pub default_home: Dbref,
    pub master_room: Dbref,
}

impl ProtectedDbrefs {
    fn protects(&self, target: Dbref, target_is_god: bool) -> bool {
        target == self.root
            || target_is_god
            || target == self.start_home
            || target == self.start_room
            || target == self.default_home
            || target == self.master_room
    }
}

/// Result of a successful mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationOutcome {
    /// A message to relay to the actor beyond the usual "Set."/"Cleared.",
    /// e.g. the going-bit reprieve notice.
    pub message: Option<&'static str>,
    /// Set when `HearBit` changed the target's hearability, so the
    /// embedder can notify the object-ear subsystem.
    pub hearability_changed: Option<bool>,
}

impl MutationOutcome {
    fn plain() -> Self {
        Self {
            message: None,
            hearability_changed: None,
        }
    }
}

/// Per-flag mutation policy, enumerated so the permission model stays
/// introspectable (a requirement for runtime handler reassignment).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagHandler {
    /// Always permitted.
    Any,
    /// Only GOD.
    God,
    /// WIZARD or GOD.
    Wiz,
    /// WIZARD, ROYALTY, or GOD.
    WizRoy,
    /// STAFF, WIZARD, or GOD.
    Staff,
    /// Actor must have INHERIT.
    Inherit,
    /// Anyone may set on non-players; only WIZARD may set on players.
    RestrictPlayer,
    /// GOD unconditionally; otherwise actor must be a self-owned player
    /// already holding the flag, and the target must not be a player.
    Privileged,
    /// The DARK bit: refuses on another player unless actor is WIZARD or
    /// is the target themselves with hide privilege.
    DarkBit,
    /// The GOING bit: clearing spares the object from destruction; setting
    /// requires GOD and refuses the protected fixtures.
    GoingBit,
    /// Bits that affect hearing (HEARTHRU, MONITOR, PUPPET): notifies the
    /// object-ear subsystem on a hearability change.
    HearBit,
    /// Refuses if the target is a player.
    PlayerBit,
}

impl FlagHandler {
    /// Only these handlers may be reassigned at runtime via configuration
    /// (`cf_flag_access`); the gating handlers encode structural safety
    /// invariants and must not be loosened.
    pub fn is_reassignable(self) -> bool {
        matches!(
            self,
            FlagHandler::Any
                | FlagHandler::WizRoy
                | FlagHandler::Wiz
                | FlagHandler::God
                | FlagHandler::RestrictPlayer
                | FlagHandler::Privileged
                | FlagHandler::Staff
        )
    }

    /// Attempt to set (`reset == false`) or clear (`reset == true`) the
    /// flag named by `entry` on a target described by `target`, performed
    /// by `actor`. On success, the bit has already been mutated in `set`.
    pub fn apply(
        self,
        set: &mut FlagSet,
        entry: &FlagEntry,
        actor: &ActorInfo,
        target: &TargetInfo,
        protected: &ProtectedDbrefs,
        reset: bool,
    ) -> Result<MutationOutcome, FlagError> {
        match self {
            FlagHandler::Any => any(set, entry, actor, target, reset),
            FlagHandler::God => {
                require(actor.is_god)?;
                any(set, entry, actor, target, reset)
            }
            FlagHandler::Wiz => {
                require(actor.is_wizard || actor.is_god)?;
                any(set, entry, actor, target, reset)
            }
            FlagHandler::WizRoy => {
                require(actor.is_wizard || actor.is_royalty || actor.is_god)?;
                any(set, entry, actor, target, reset)
            }
            FlagHandler::Staff => {
                require(actor.is_staff || actor.is_wizard || actor.is_god)?;
                any(set, entry, actor, target, reset)
            }
            FlagHandler::Inherit => {
                require(actor.has_inherit)?;
                any(set, entry, actor, target, reset)
            }
            FlagHandler::RestrictPlayer => {
                require(!target.is_player || actor.is_wizard || actor.is_god)?;
                any(set, entry, actor, target, reset)
            }
            FlagHandler::Privileged => {
                if !actor.is_god {
                    let holds_it = set.is_set(entry.word, entry.mask);
                    require(
                        actor.owns_self && !target.is_player && holds_it,
                    )?;
                }
                any(set, entry, actor, target, reset)
            }
            FlagHandler::DarkBit => {
                if !reset
                    && target.is_player
                    && !(target.dbref == actor.dbref && actor.can_hide)
                    && !(actor.is_wizard || actor.is_god)
                {
                    return Err(FlagError::PermissionDenied);
                }
                any(set, entry, actor, target, reset)
            }
            FlagHandler::GoingBit => going_bit(set, entry, actor, target, protected, reset),
            FlagHandler::HearBit => hear_bit(set, entry, actor, target, reset),
            FlagHandler::PlayerBit => {
                require(!target.is_player)?;
                any(set, entry, actor, target, reset)
            }
        }
    }
}

fn require(ok: bool) -> Result<(), FlagError> {
    if ok {
        Ok(())
    } else {
        Err(FlagError::PermissionDenied)
    }
}

fn any(
    set: &mut FlagSet,
    entry: &FlagEntry,
    actor: &ActorInfo,
    target: &TargetInfo,
    reset: bool,
) -> Result<MutationOutcome, FlagError> {
    if entry.is_wizard_flag && reset && target.dbref == actor.dbref && actor.is_god {
        return Err(FlagError::CannotMakeGodMortal);
    }
    if reset {
        set.clear(entry.word, entry.mask);
    } else {
        set.set(entry.word, entry.mask);
    }
    Ok(MutationOutcome::plain())
}

fn going_bit(
    set: &mut FlagSet,
    entry: &FlagEntry,
    actor: &ActorInfo,
    target: &TargetInfo,
    protected: &ProtectedDbrefs,
    reset: bool,
) -> Result<MutationOutcome, FlagError> {
    if target.is_going && reset && !target.is_garbage {
        any(set, entry, actor, target, reset)?;
        return Ok(MutationOutcome {
            message: Some("Your object has been spared from destruction."),
            hearability_changed: None,
        });
    }
    require(actor.is_god)?;
    if !reset && protected.protects(target.dbref, target.is_god) {
        return Err(FlagError::PermissionDenied);
    }
    any(set, entry, actor, target, reset)
}

fn hear_bit(
    set: &mut FlagSet,
    entry: &FlagEntry,
    actor: &ActorInfo,
    target: &TargetInfo,
    reset: bool,
) -> Result<MutationOutcome, FlagError> {
    if target.is_player && entry.is_monitor_flag {
        require(actor.can_monitor)?;
    }
    any(set, entry, actor, target, reset)?;
    let changed = target.was_hearer != target.will_be_hearer;
    Ok(MutationOutcome {
        message: None,
        hearability_changed: changed.then_some(target.will_be_hearer),
    })
}
