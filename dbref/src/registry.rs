use std::collections::HashMap;

use crate::entry::{FlagEntry, ListPermission};
use crate::error::FlagError;
use crate::handler::{ActorInfo, FlagHandler};
use crate::set::{FlagSet, FlagWord};

/// Case-insensitive name/letter table over a fixed collection of
/// [`FlagEntry`] values, plus the encode/decode logic between a
/// [`FlagSet`] and the short letter strings used in object listings
/// (e.g. `"WHc"`).
#[derive(Debug, Clone)]
pub struct FlagRegistry {
    entries: Vec<FlagEntry>,
    by_name: HashMap<String, usize>,
    by_letter: HashMap<char, usize>,
}

impl FlagRegistry {
    /// An empty registry with nothing registered.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            by_name: HashMap::new(),
            by_letter: HashMap::new(),
        }
    }

    /// The standard flag table, grounded in TinyMUX's `FLAGBITENT` array.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        for entry in standard_table() {
            registry.register(entry);
        }
        registry
    }

    /// Register a new flag. Panics on a duplicate name or letter: the
    /// standard table is built once at startup and a collision there is
    /// a programming error, not a runtime condition.
    pub fn register(&mut self, entry: FlagEntry) {
        let name_key = entry.name.to_ascii_lowercase();
        assert!(
            !self.by_name.contains_key(&name_key),
            "duplicate flag name {:?}",
            entry.name
        );
        assert!(
            !self.by_letter.contains_key(&entry.letter),
            "duplicate flag letter {:?}",
            entry.letter
        );
        let index = self.entries.len();
        self.by_name.insert(name_key, index);
        self.by_letter.insert(entry.letter, index);
        self.entries.push(entry);
    }

    /// Look a flag up by its full name, case-insensitively.
    pub fn by_name(&self, name: &str) -> Option<&FlagEntry> {
        self.by_name
            .get(&name.to_ascii_lowercase())
            .map(|&i| &self.entries[i])
    }

    /// Look a flag up by its single display letter.
    pub fn by_letter(&self, letter: char) -> Option<&FlagEntry> {
        self.by_letter.get(&letter).map(|&i| &self.entries[i])
    }

    /// All registered entries, in registration order.
    pub fn entries(&self) -> impl Iterator<Item = &FlagEntry> {
        self.entries.iter()
    }

    /// Reassign the handler bound to a named flag. Only permitted when
    /// the flag's *current* handler is one of the reassignable kinds
    /// (`FlagHandler::is_reassignable`), mirroring `cf_flag_access`'s own
    /// restriction against loosening structural gating handlers such as
    /// `GoingBit` or `DarkBit` via configuration.
    pub fn set_handler(&mut self, name: &str, handler: FlagHandler) -> Result<(), FlagError> {
        let index = *self
            .by_name
            .get(&name.to_ascii_lowercase())
            .ok_or(FlagError::UnknownFlag)?;
        if !self.entries[index].handler.is_reassignable() {
            return Err(FlagError::HandlerNotReassignable);
        }
        self.entries[index].handler = handler;
        Ok(())
    }

    /// Render a flag set as a letter string: the object-type letter
    /// first (unconditionally, bypassing `list_permission`), then the
    /// remaining set flags in table order, restricted to those visible
    /// at `viewer_permission`. A leading digit gets a `:` prefix since a
    /// bare digit can't start a flag-letter string; CONNECTED never
    /// shows on a dark wizard to a viewer below `Wizard`.
    pub fn decode_flags(&self, set: &FlagSet, viewer_permission: ListPermission) -> String {
        let mut out = String::new();
        let mut need_colon = true;

        if let Some(type_entry) = self
            .entries
            .iter()
            .find(|entry| entry.is_object_type && set.is_set(entry.word, entry.mask))
        {
            out.push(type_entry.letter);
            need_colon = false;
        }

        let suppress_connected =
            self.is_dark_wizard(set) && viewer_permission < ListPermission::Wizard;

        for entry in &self.entries {
            if entry.is_object_type || !set.is_set(entry.word, entry.mask) {
                continue;
            }
            if !entry.visible_to(viewer_permission) {
                continue;
            }
            if entry.is_connected_flag && suppress_connected {
                continue;
            }
            if need_colon && entry.letter.is_ascii_digit() {
                out.push(':');
            }
            out.push(entry.letter);
            need_colon = false;
        }
        out
    }

    /// Whether `set` has both WIZARD and DARK, i.e. is a dark wizard
    /// (only meaningful, and only checked, on a player).
    fn is_dark_wizard(&self, set: &FlagSet) -> bool {
        let bit = |name: &str| {
            self.by_name(name)
                .is_some_and(|entry| set.is_set(entry.word, entry.mask))
        };
        bit("player") && bit("wizard") && bit("dark")
    }

    /// Parse a letter string (as given to `@set object=ABC` letter-form,
    /// or a database import) into a [`FlagSet`]. Refuses an unknown
    /// letter, more than one object-type letter, or a letter `actor`
    /// isn't permitted to see.
    pub fn convert_flags(&self, actor: &ActorInfo, letters: &str) -> Result<FlagSet, FlagError> {
        let viewer_permission = actor_permission(actor);
        let mut set = FlagSet::empty();
        let mut object_type_seen = false;
        for letter in letters.chars() {
            let entry = self.by_letter(letter).ok_or(FlagError::UnknownFlag)?;
            if entry.is_object_type {
                if object_type_seen {
                    return Err(FlagError::ConflictingType);
                }
                object_type_seen = true;
            } else if !entry.visible_to(viewer_permission) {
                return Err(FlagError::NotVisible);
            }
            set.set(entry.word, entry.mask);
        }
        Ok(set)
    }
}

/// The `ListPermission` tier an actor's privileges satisfy, mirroring
/// TinyMUX's `CA_STAFF`/`CA_ADMIN` (`WizRoy`)/`CA_WIZARD`/`CA_GOD` ladder.
fn actor_permission(actor: &ActorInfo) -> ListPermission {
    if actor.is_god {
        ListPermission::God
    } else if actor.is_wizard {
        ListPermission::Wizard
    } else if actor.is_royalty {
        ListPermission::Admin
    } else if actor.is_staff {
        ListPermission::Staff
    } else {
        ListPermission::Public
    }
}

impl Default for FlagRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

fn standard_table() -> Vec<FlagEntry> {
    use FlagHandler::*;
    use FlagWord::*;
    use ListPermission as LP;

    vec![
        FlagEntry::new("player", 'P', Word1, 1 << 0, LP::NoDecomp, God).with_object_type(),
        FlagEntry::new("room", 'R', Word1, 1 << 1, LP::NoDecomp, God).with_object_type(),
        FlagEntry::new("thing", 'T', Word1, 1 << 2, LP::NoDecomp, God).with_object_type(),
        FlagEntry::new("exit", 'X', Word1, 1 << 3, LP::NoDecomp, God).with_object_type(),
        FlagEntry::new("wizard", 'W', Word1, 1 << 4, LP::Wizard, God).with_wizard_flag(),
        FlagEntry::new("royalty", 'r', Word1, 1 << 5, LP::Staff, Wiz),
        FlagEntry::new("staff", 'z', Word1, 1 << 6, LP::Staff, Wiz),
        FlagEntry::new("dark", 'D', Word1, 1 << 7, LP::Public, DarkBit),
        FlagEntry::new("going", 'G', Word1, 1 << 8, LP::Public, GoingBit),
        FlagEntry::new("haven", 'H', Word1, 1 << 9, LP::Public, Any),
        FlagEntry::new("trust", 'Z', Word1, 1 << 10, LP::Staff, WizRoy),
        FlagEntry::new("inherit", 'I', Word1, 1 << 11, LP::Public, Inherit),
        FlagEntry::new("robot", 'o', Word1, 1 << 12, LP::Public, RestrictPlayer),
        FlagEntry::new("gagged", 'g', Word1, 1 << 13, LP::Staff, WizRoy),
        FlagEntry::new("suspect", 's', Word1, 1 << 14, LP::Staff, Staff),
        FlagEntry::new("quiet", 'Q', Word1, 1 << 15, LP::Public, Any),
        FlagEntry::new("monitor", 'M', Word2, 1 << 0, LP::Public, HearBit).with_monitor_flag(),
        FlagEntry::new("puppet", 'p', Word2, 1 << 1, LP::Public, HearBit),
        FlagEntry::new("hearthru", 'h', Word2, 1 << 2, LP::Public, HearBit),
        FlagEntry::new("opaque", 'O', Word2, 1 << 3, LP::Public, Any),
        FlagEntry::new("sticky", 'S', Word2, 1 << 4, LP::Public, Any),
        FlagEntry::new("chown_ok", 'C', Word2, 1 << 5, LP::Public, Any),
        FlagEntry::new("link_ok", 'L', Word2, 1 << 6, LP::Public, Any),
        FlagEntry::new("enter_ok", 'e', Word2, 1 << 7, LP::Public, Any),
        FlagEntry::new("destroy_ok", 'd', Word2, 1 << 8, LP::Public, Any),
        FlagEntry::new("jump_ok", 'J', Word2, 1 << 9, LP::Public, PlayerBit),
        FlagEntry::new("no_command", 'n', Word2, 1 << 10, LP::Public, Any),
        FlagEntry::new("unfindable", 'U', Word2, 1 << 11, LP::Public, Any),
        FlagEntry::new("key", 'K', Word2, 1 << 12, LP::Public, Any),
        FlagEntry::new("ansi", 'A', Word2, 1 << 13, LP::Public, Any),
        FlagEntry::new("connected", 'c', Word2, 1 << 14, LP::Public, God).with_connected_flag(),
        FlagEntry::new("terse", 't', Word3, 1 << 0, LP::Public, Any),
        FlagEntry::new("privileged", 'w', Word3, 1 << 1, LP::Public, Privileged),
        FlagEntry::new("examined", 'x', Word3, 1 << 2, LP::NoDecomp, God),
    ]
}
