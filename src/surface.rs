use crate::models::chat::UsageStats;

/// Rendering seam. The core hands plain data across it and never learns
/// how (or whether) anything is displayed.
pub trait Surface: Send + Sync {
    fn show_user(&self, text: &str);
    fn show_bot(&self, text: &str);
    fn set_busy(&self, busy: bool);
    fn show_stats(&self, stats: &UsageStats);
    fn notify(&self, message: &str);
}
