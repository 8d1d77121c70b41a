use anyhow::Result;

use crate::store::Store;
use crate::ui::{flash_message, human_size, image_caption, run_menu, MenuResult, Term};
use crate::view::Page;

/// Public gallery of one user, in upload order. Anyone can view it;
/// editing happens only on the owner's dashboard.
pub fn profile(terminal: &mut Term, store: &mut Store, username: &str) -> Result<Page> {
    loop {
        let Some(user) = store.user(username) else {
            flash_message(terminal, &format!("No such user: {username}"), 1200)?;
            return Ok(Page::Landing);
        };
        let images = user.images.clone();

        let mut labels: Vec<String> = images
            .iter()
            .enumerate()
            .map(|(i, img)| format!("{:>2}. {}", i + 1, image_caption(&img.uploaded_at, img.data.len())))
            .collect();
        if labels.is_empty() {
            labels.push("Nothing here yet.".to_string());
        }
        labels.push("---".to_string());
        if store.current_user() == Some(username) {
            labels.push("Open Dashboard".to_string());
        }
        labels.push("Back to Landing".to_string());
        let opts: Vec<&str> = labels.iter().map(String::as_str).collect();

        let title = format!("{username}'s Gallery");
        let subtitle = format!("{} images", images.len());

        match run_menu(terminal, &title, &opts, Some(&subtitle))? {
            MenuResult::Back => return Ok(Page::Landing),
            MenuResult::Selected(sel) => match sel.as_str() {
                "Open Dashboard" => return Ok(Page::Dashboard),
                "Back to Landing" => return Ok(Page::Landing),
                "Nothing here yet." => {}
                _ => {
                    let idx = labels.iter().position(|l| *l == sel);
                    if let Some(img) = idx.and_then(|i| images.get(i)) {
                        let kind = img
                            .data
                            .split_once(';')
                            .map(|(head, _)| head.trim_start_matches("data:").to_string())
                            .unwrap_or_else(|| "unknown".to_string());
                        let detail = format!(
                            "Image #{id}\nUploaded {at}\nType {kind}\nPayload {size}",
                            id = img.id,
                            at = img.uploaded_at,
                            size = human_size(img.data.len()),
                        );
                        flash_message(terminal, &detail, 1800)?;
                    }
                }
            },
        }
    }
}
