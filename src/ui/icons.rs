pub struct Icons;

impl Icons {
    pub const ROCKET: &str = "🚀";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const STATS: &str = "📊";
    pub const NEW: &str = "✨";
    pub const SKIP: &str = "⏭️";
    pub const DEL: &str = "🗑️";
    pub const IMPORT: &str = "📥";
    pub const EXPORT: &str = "📤";
    pub const SHIELD: &str = "🛡️";
    pub const GLOBE: &str = "🌍";
}
