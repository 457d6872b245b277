use crate::handler::FlagHandler;
use crate::set::FlagWord;

/// Who may see a flag is set when listing an object's flags, independent
/// of who may set/clear it (that's [`FlagHandler`]'s job).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ListPermission {
    /// Visible to everyone.
    Public,
    /// Visible to STAFF and above.
    Staff,
    /// Visible to ADMIN and above.
    Admin,
    /// Visible only to WIZARD and GOD.
    Wizard,
    /// Visible only to GOD.
    God,
    /// Never shown in a decoded flag listing, even to GOD (internal
    /// bookkeeping bits such as the "has been examined" markers).
    NoDecomp,
}

/// A single named flag: its storage location, its display letter, who may
/// see it set, and the policy gating who may set or clear it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagEntry {
    pub name: &'static str,
    pub letter: char,
    pub word: FlagWord,
    pub mask: u32,
    pub list_permission: ListPermission,
    pub handler: FlagHandler,
    /// True for exactly the WIZARD flag; `fh_any` special-cases it to
    /// refuse letting God clear their own WIZARD bit.
    pub(crate) is_wizard_flag: bool,
    /// True for exactly the MONITOR flag; `HearBit` gates setting it on
    /// a player behind the actor's monitor privilege.
    pub(crate) is_monitor_flag: bool,
    /// True for the handful of flags that encode an object's fundamental
    /// type (PLAYER/ROOM/THING/EXIT); `FlagRegistry::convert_flags`
    /// refuses a letter string naming more than one of these.
    pub(crate) is_object_type: bool,
    /// True for exactly the CONNECTED flag; `FlagRegistry::decode_flags`
    /// hides it on a dark wizard from a viewer who isn't themselves
    /// wizard or above, regardless of `list_permission`.
    pub(crate) is_connected_flag: bool,
}

impl FlagEntry {
    pub const fn new(
        name: &'static str,
        letter: char,
        word: FlagWord,
        mask: u32,
        list_permission: ListPermission,
        handler: FlagHandler,
    ) -> Self {
        Self {
            name,
            letter,
            word,
            mask,
            list_permission,
            handler,
            is_wizard_flag: false,
            is_monitor_flag: false,
            is_object_type: false,
            is_connected_flag: false,
        }
    }

    /// Mark this entry as the WIZARD flag.
    pub const fn with_wizard_flag(mut self) -> Self {
        self.is_wizard_flag = true;
        self
    }

    /// Mark this entry as the MONITOR flag.
    pub const fn with_monitor_flag(mut self) -> Self {
        self.is_monitor_flag = true;
        self
    }

    /// Mark this entry as one of the object-type flags.
    pub const fn with_object_type(mut self) -> Self {
        self.is_object_type = true;
        self
    }

    /// Mark this entry as the CONNECTED flag.
    pub const fn with_connected_flag(mut self) -> Self {
        self.is_connected_flag = true;
        self
    }

    /// Whether a viewer cleared to `viewer_permission` may see this flag
    /// listed. `NoDecomp` flags never show, even to `God`.
    pub fn visible_to(&self, viewer_permission: ListPermission) -> bool {
        if self.list_permission == ListPermission::NoDecomp {
            return false;
        }
        viewer_permission >= self.list_permission
    }
}
