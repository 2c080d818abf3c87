//! Title-keyed patch sets
//!
//! Each rule pairs a title id prefix with a patch set. Full six-byte ids pin a
//! single release; shorter prefixes cover every region of a game. When more
//! than one rule matches, the longest prefix wins.

use super::{PatchInstruction, PatchSet};
use crate::types::TitleId;

/// Title id prefix and the patch set it selects
#[derive(Debug, Clone, Copy)]
pub struct TitleRule {
    /// Alternative prefixes; any one matching selects the rule
    pub prefixes: &'static [&'static [u8]],
    /// Patch set for matching titles
    pub set: PatchSet<'static>,
}

impl TitleRule {
    /// Length of the longest prefix of this rule matching `title`
    fn match_len(&self, title: &TitleId) -> Option<usize> {
        self.prefixes
            .iter()
            .filter(|p| title.starts_with(p))
            .map(|p| p.len())
            .max()
    }
}

/// Prince of Persia: The Forgotten Sands, all regions
const PRINCE_OF_PERSIA: &[PatchInstruction] = &[
    PatchInstruction::new(0x007A_AC6A, 0x7A6B_6F6A, 0x6F6A_7A6B),
    PatchInstruction::new(0x007A_AC75, 0x7C7A_6939, 0x6939_7C7A),
    PatchInstruction::new(0x007A_AC82, 0x7376_686B, 0x686B_7376),
    PatchInstruction::new(0x007A_AC92, 0x8071_7570, 0x7570_8071),
    PatchInstruction::new(0x007A_AC9D, 0x8280_6F3F, 0x6F3F_8280),
];

/// New Super Mario Bros. Wii (NTSC-U)
const NSMB_USA: &[PatchInstruction] = &[
    PatchInstruction::new(0x001A_B610, 0x9421_FFD0, 0x4E80_0020),
    PatchInstruction::new(0x001C_ED53, 0xDA00_0000, 0x7100_0000),
    PatchInstruction::new(0x001C_ED6B, 0xDA00_0000, 0x7100_0000),
];

/// New Super Mario Bros. Wii (PAL)
const NSMB_PAL: &[PatchInstruction] = &[
    PatchInstruction::new(0x001A_B750, 0x9421_FFD0, 0x4E80_0020),
    PatchInstruction::new(0x001C_EE90, 0x38A0_00DA, 0x38A0_0071),
    PatchInstruction::new(0x001C_EEA8, 0x3880_00DA, 0x3880_0071),
];

/// New Super Mario Bros. Wii (NTSC-J)
const NSMB_JPN: &[PatchInstruction] = &[
    PatchInstruction::new(0x001A_B420, 0x9421_FFD0, 0x4E80_0020),
    PatchInstruction::new(0x001C_EB63, 0xDA00_0000, 0x7100_0000),
    PatchInstruction::new(0x001C_EB7B, 0xDA00_0000, 0x7100_0000),
];

/// Built-in rules
pub const RULES: &[TitleRule] = &[
    TitleRule {
        prefixes: &[b"SPX", b"RPW"],
        set: PatchSet::new("Prince of Persia", PRINCE_OF_PERSIA),
    },
    TitleRule {
        prefixes: &[b"SMNE01"],
        set: PatchSet::new("New Super Mario Bros. Wii (USA)", NSMB_USA),
    },
    TitleRule {
        prefixes: &[b"SMNP01"],
        set: PatchSet::new("New Super Mario Bros. Wii (PAL)", NSMB_PAL),
    },
    TitleRule {
        prefixes: &[b"SMNJ01"],
        set: PatchSet::new("New Super Mario Bros. Wii (JPN)", NSMB_JPN),
    },
];

/// Select from the built-in rules
pub fn select(title: &TitleId) -> Option<PatchSet<'static>> {
    select_from(RULES, title)
}

/// Select from `rules`; the longest matching prefix wins, earlier rules win ties
pub fn select_from(rules: &[TitleRule], title: &TitleId) -> Option<PatchSet<'static>> {
    let mut best: Option<(usize, PatchSet<'static>)> = None;

    for rule in rules {
        if let Some(len) = rule.match_len(title) {
            if best.map_or(true, |(best_len, _)| len > best_len) {
                best = Some((len, rule.set));
            }
        }
    }

    match best {
        Some((_, set)) => {
            log::info!("{}: using patch set '{}' ({} patches)", title, set.name, set.len());
            Some(set)
        }
        None => None,
    }
}
