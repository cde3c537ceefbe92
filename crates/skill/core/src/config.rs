/// Skill system constants and tunable defaults.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SkillConfig;

impl SkillConfig {
    // ===== level bounds =====
    pub const MIN_LEVEL: u32 = 1;
    pub const MAX_LEVEL: u32 = 100;

    // ===== block defaults =====
    /// Half-width of the uniform jitter window applied to damage and healing.
    pub const OUTPUT_JITTER: f32 = 0.10;
    pub const DEFAULT_CRIT_MULTIPLIER: f32 = 2.0;
    /// Overheal cap when a heal block does not allow overhealing (percent of max).
    pub const BASE_HEAL_CAP_PERCENT: f32 = 100.0;

    // ===== composition limits =====
    /// Maximum depth of ForEachTarget nesting before a nested run is refused.
    pub const MAX_NESTING_DEPTH: u32 = 8;
    /// Upper bound on `Repeated` counts accepted at validation time.
    pub const MAX_REPETITIONS: u32 = 1_000;
}
