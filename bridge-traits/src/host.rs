//! Host Activity Integration

use crate::error::Result;

/// Control over the host application's foreground activity.
///
/// - **Android**: `Activity.moveTaskToBack`
/// - **Desktop**: minimise / hide the main window
pub trait HostActivity: Send + Sync {
    /// Send the application to the background after a share was handled.
    fn move_to_background(&self) -> Result<()>;
}
