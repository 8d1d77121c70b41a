use anyhow::Result;

use crate::store::{SaveOutcome, Store};
use crate::ui::{flash_message, input_prompt, password_prompt, Term};
use crate::view::Page;

// ── Sign up ───────────────────────────────────────────────────────────────────

pub fn signup_screen(terminal: &mut Term, store: &mut Store) -> Result<Page> {
    loop {
        let username = match input_prompt(terminal, "Choose a username (Esc to go back):")? {
            Some(u) => u,
            None => return Ok(Page::Landing),
        };
        let password = match password_prompt(terminal, "Choose a password:")? {
            Some(p) => p,
            None => return Ok(Page::Landing),
        };

        match store.signup(&username, &password) {
            Ok(SaveOutcome::Saved) => {
                flash_message(terminal, &format!("Welcome, {username}!"), 800)?;
                return Ok(Page::Dashboard);
            }
            Ok(SaveOutcome::WriteFailed(e)) => {
                // Account is live in memory; the blob just didn't land.
                flash_message(terminal, &format!("Account created, but saving failed: {e}"), 1500)?;
                return Ok(Page::Dashboard);
            }
            Err(e) => flash_message(terminal, &e.to_string(), 1200)?,
        }
    }
}

// ── Log in ────────────────────────────────────────────────────────────────────

pub fn login_screen(terminal: &mut Term, store: &mut Store) -> Result<Page> {
    loop {
        let username = match input_prompt(terminal, "Username (Esc to go back):")? {
            Some(u) => u,
            None => return Ok(Page::Landing),
        };
        let password = match password_prompt(terminal, "Password:")? {
            Some(p) => p,
            None => return Ok(Page::Landing),
        };

        match store.login(&username, &password) {
            Ok(()) => {
                flash_message(terminal, &format!("Welcome back, {username}."), 800)?;
                return Ok(Page::Dashboard);
            }
            Err(e) => flash_message(terminal, &e.to_string(), 1200)?,
        }
    }
}
