//! Open a directory in the desktop file browser

use crate::tools::{Invocation, ToolInvoker};
use std::path::Path;

#[cfg(windows)]
const FILE_BROWSER: &str = "explorer";

#[cfg(target_os = "macos")]
const FILE_BROWSER: &str = "open";

#[cfg(not(any(windows, target_os = "macos")))]
const FILE_BROWSER: &str = "xdg-open";

/// Show `dir` in the file browser
///
/// Purely a convenience: any failure is logged and ignored. Returns
/// whether the browser reported success.
pub fn open_in_file_browser<I: ToolInvoker + ?Sized>(invoker: &I, dir: &Path) -> bool {
    let invocation = Invocation::new(FILE_BROWSER).arg(dir.to_string_lossy());

    match invoker.invoke(&invocation) {
        // explorer.exe exits with 1 even when it opened the window
        Ok(out) if out.success() || cfg!(windows) => true,
        Ok(out) => {
            log::warn!("{} exited with {:?} for {:?}", FILE_BROWSER, out.code, dir);
            false
        }
        Err(e) => {
            log::warn!("Could not open {:?} in the file browser: {}", dir, e);
            false
        }
    }
}
