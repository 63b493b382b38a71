mod session;

#[cfg(feature = "headless")]
mod chrome_session;
#[cfg(feature = "headless")]
mod stealth;

pub use session::{AdvanceOutcome, BrowserSession, SessionLauncher};

#[cfg(feature = "headless")]
pub use chrome_session::{ChromeLauncher, ChromeSession};
