use anyhow::Result;

use crate::store::Store;
use crate::ui::{image_caption, run_menu, MenuResult, Term};
use crate::view::Page;

/// Up to this many feed entries on the landing page, freshly shuffled on
/// every visit.
pub const FEED_LIMIT: usize = 12;

pub fn landing(terminal: &mut Term, store: &mut Store) -> Result<Page> {
    let sample = store.sample_feed(FEED_LIMIT);

    let mut labels: Vec<String> = sample
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            format!(
                "{:>2}. {}  {}",
                i + 1,
                entry.username,
                image_caption(&entry.uploaded_at, entry.data.len())
            )
        })
        .collect();
    if labels.is_empty() {
        labels.push("No images yet. Sign up and share something.".to_string());
        labels.push("---".to_string());
    } else {
        labels.push("---".to_string());
    }
    if store.is_logged_in() {
        labels.push("My Dashboard".to_string());
        labels.push("Log Out".to_string());
    } else {
        labels.push("Log In".to_string());
        labels.push("Sign Up".to_string());
    }
    labels.push("Exit".to_string());
    let opts: Vec<&str> = labels.iter().map(String::as_str).collect();

    let who = match store.current_user() {
        Some(u) => format!("Logged in as {u}"),
        None => "Browsing as guest".to_string(),
    };
    let subtitle = format!(
        "{who}. {} artists, {} images. Pick one to visit its gallery.",
        store.user_count(),
        store.feed().len()
    );

    match run_menu(terminal, "Latest From Everyone", &opts, Some(&subtitle))? {
        MenuResult::Back => Ok(Page::Exit),
        MenuResult::Selected(sel) => match sel.as_str() {
            "My Dashboard" => Ok(Page::Dashboard),
            "Log Out" => {
                store.logout();
                Ok(Page::Landing)
            }
            "Log In" => Ok(Page::Login),
            "Sign Up" => Ok(Page::Signup),
            "Exit" => Ok(Page::Exit),
            _ => {
                // A feed entry: jump to the owner's public gallery.
                let idx = labels.iter().position(|l| *l == sel);
                match idx.and_then(|i| sample.get(i)) {
                    Some(entry) => Ok(Page::Profile(entry.username.clone())),
                    None => Ok(Page::Landing),
                }
            }
        },
    }
}
