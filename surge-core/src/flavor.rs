//! Narration emoted when a healing surge is spent.

/// Each line is emoted as the character, so it reads after their name.
pub const EXHAUST_LINES: &[&str] = &[
    "takes a deep breath and feels the last of their second wind fade.",
    "wipes the sweat from their brow; that surge of vigor is spent for now.",
    "steadies their footing, tired but still standing.",
    "grits their teeth as the rush of renewed strength ebbs away.",
    "lets out a long breath. They will need a proper rest before pushing that hard again.",
    "rolls their shoulders, patched up as well as they can manage for now.",
    "feels their heartbeat slow as the healing surge runs its course.",
    "mutters that this will have to do until the next rest.",
];

/// Emoted by every rest, before or after recovery depending on the rest.
pub const INVIGORATED: &str = "feels invigorated.";
