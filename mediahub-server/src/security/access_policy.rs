//! Locator access policy
//!
//! Pure decision over (security context, locator). Rules are evaluated in
//! order and the first match wins. Matching is by substring anywhere in the
//! locator, so a path that merely mentions an allowed fragment passes.

use tracing::debug;

/// Context of processes that run without confinement
pub const UNCONFINED: &str = "unconfined";

const CLICK_INSTALL_ROOT: &str = "opt/click.ubuntu.com/";
const SYSTEM_UI_SOUNDS: &[&str] = &["/system/media/audio/ui/", "/android/system/media/audio/ui/"];
const CAMERA_PACKAGE: &str = "com.ubuntu.camera";
const MEDIA_LIBRARY_PACKAGES: &[&str] = &["com.ubuntu.music", "com.ubuntu.gallery"];
const MEDIA_LIBRARY_DIRS: &[&str] = &["Music/", "Videos/", "/media"];
const SYSTEM_SOUNDS: &str = "/usr/share/sounds";
const STREAMING_SCHEMES: &[&str] = &["http://", "https://", "rtsp://"];

/// Whether a client with `context` may open `locator`
pub fn decide(context: &str, locator: &str) -> bool {
    if context.is_empty() || locator.is_empty() {
        debug!("Access denied: empty context or locator");
        return false;
    }

    if context == UNCONFINED {
        debug!("Access granted: unconfined client opening {}", locator);
        return true;
    }

    let Some((package, _)) = context.split_once('_') else {
        debug!("Access denied: no package name in context {}", context);
        return false;
    };

    if locator.contains(&format!(".local/share/{}/", package))
        || locator.contains(&format!(".cache/{}/", package))
    {
        debug!("Access granted: {} opening its own data {}", package, locator);
        return true;
    }

    if locator.contains(CLICK_INSTALL_ROOT) && locator.contains(package) {
        debug!("Access granted: {} opening its install dir {}", package, locator);
        return true;
    }

    if package == CAMERA_PACKAGE && SYSTEM_UI_SOUNDS.iter().any(|dir| locator.contains(dir)) {
        debug!("Access granted: camera opening UI sound {}", locator);
        return true;
    }

    if MEDIA_LIBRARY_PACKAGES.contains(&package)
        && MEDIA_LIBRARY_DIRS.iter().any(|dir| locator.contains(dir))
    {
        debug!("Access granted: {} opening media library {}", package, locator);
        return true;
    }

    if locator.contains(SYSTEM_SOUNDS) {
        debug!("Access granted: system sound {}", locator);
        return true;
    }

    if STREAMING_SCHEMES.iter().any(|scheme| locator.contains(scheme)) {
        debug!("Access granted: stream {}", locator);
        return true;
    }

    debug!("Access denied: {} may not open {}", package, locator);
    false
}
