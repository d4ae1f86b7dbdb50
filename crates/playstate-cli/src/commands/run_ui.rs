use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::sync::Mutex;
use std::time::Duration;

/// Spinner currently drawn on the terminal, if any
static ACTIVE_SPINNER: Mutex<Option<ProgressBar>> = Mutex::new(None);

/// Run `f` with the active spinner cleared from the terminal, then redraw it.
/// Anything printing to the console while a run is in progress goes through here.
pub fn suspend_spinner<R>(f: impl FnOnce() -> R) -> R {
    let spinner = ACTIVE_SPINNER.lock().ok().and_then(|active| active.clone());
    match spinner {
        Some(spinner) => spinner.suspend(f),
        None => f(),
    }
}

fn set_active(spinner: Option<ProgressBar>) {
    if let Ok(mut active) = ACTIVE_SPINNER.lock() {
        *active = spinner;
    }
}

/// Spinner shown while the server is enumerated. Disabled when not attached
/// to a terminal or when output is quiet/JSON; progress then only goes to the log.
pub struct RunUi {
    spinner: Option<ProgressBar>,
}

impl RunUi {
    pub fn new(enabled: bool) -> Self {
        if !enabled || !is_interactive() {
            return Self { spinner: None };
        }
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed}] {msg}")
        {
            spinner.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }
        spinner.enable_steady_tick(Duration::from_millis(100));
        Self::with_spinner(spinner)
    }

    fn with_spinner(spinner: ProgressBar) -> Self {
        set_active(Some(spinner.clone()));
        Self { spinner: Some(spinner) }
    }

    pub fn set_message(&self, msg: impl Into<String>) {
        let msg = msg.into();
        match &self.spinner {
            Some(spinner) => spinner.set_message(msg),
            None => tracing::info!(operation = "progress", message = %msg, "Progress update"),
        }
    }

    pub fn finish(&self) {
        if let Some(spinner) = &self.spinner {
            spinner.finish_and_clear();
            set_active(None);
        }
    }
}

impl Drop for RunUi {
    fn drop(&mut self) {
        self.finish();
    }
}

pub fn is_interactive() -> bool {
    std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_writes_pass_through_active_spinner() {
        assert_eq!(suspend_spinner(|| 1), 1);

        let ui = RunUi::with_spinner(ProgressBar::hidden());
        assert!(ACTIVE_SPINNER.lock().unwrap().is_some());
        assert_eq!(suspend_spinner(|| "warning line"), "warning line");

        drop(ui);
        assert!(ACTIVE_SPINNER.lock().unwrap().is_none());
        assert_eq!(suspend_spinner(|| 2), 2);
    }
}
