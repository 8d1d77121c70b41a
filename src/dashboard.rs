use anyhow::Result;

use crate::picker::{pick_image, StagedUpload};
use crate::store::{SaveOutcome, Store, StoreError};
use crate::ui::{confirm, flash_message, image_caption, run_menu, MenuResult, Term};
use crate::view::Page;

/// The authenticated user's own gallery: stage and upload images, delete
/// their own, jump to their public page, or log out.
pub fn dashboard(terminal: &mut Term, store: &mut Store) -> Result<Page> {
    let mut staged: Option<StagedUpload> = None;

    loop {
        let Some(username) = store.current_user().map(str::to_string) else {
            return Ok(Page::Login);
        };
        let images = store
            .user(&username)
            .map(|u| u.images.clone())
            .unwrap_or_default();

        let mut labels: Vec<String> = images
            .iter()
            .enumerate()
            .map(|(i, img)| format!("{:>2}. {}", i + 1, image_caption(&img.uploaded_at, img.data.len())))
            .collect();
        if !labels.is_empty() {
            labels.push("---".to_string());
        }
        labels.push("Choose Image...".to_string());
        labels.push("Upload Staged Image".to_string());
        if staged.is_some() {
            labels.push("Discard Staged Image".to_string());
        }
        labels.push("---".to_string());
        labels.push("My Public Page".to_string());
        labels.push("Log Out".to_string());
        labels.push("Back to Landing".to_string());
        let opts: Vec<&str> = labels.iter().map(String::as_str).collect();

        let subtitle = match &staged {
            Some(s) => format!("{username}: {} images. Staged: {}", images.len(), s.summary()),
            None => format!("{username}: {} images. Nothing staged.", images.len()),
        };

        match run_menu(terminal, "My Gallery", &opts, Some(&subtitle))? {
            MenuResult::Back => return Ok(Page::Landing),
            MenuResult::Selected(sel) => match sel.as_str() {
                "Choose Image..." => {
                    if let Some(picked) = pick_image(terminal)? {
                        flash_message(terminal, &format!("Staged {}", picked.summary()), 800)?;
                        staged = Some(picked);
                    }
                }
                "Upload Staged Image" => {
                    let payload = staged.as_ref().map(|s| s.data_url.as_str());
                    match store.upload_image(payload) {
                        Ok(SaveOutcome::Saved) => {
                            staged = None;
                            flash_message(terminal, "Uploaded.", 800)?;
                        }
                        Ok(SaveOutcome::WriteFailed(e)) => {
                            staged = None;
                            flash_message(terminal, &format!("Uploaded, but saving failed: {e}"), 1500)?;
                        }
                        Err(StoreError::NotLoggedIn) => return Ok(Page::Login),
                        Err(e) => flash_message(terminal, &e.to_string(), 1200)?,
                    }
                }
                "Discard Staged Image" => {
                    staged = None;
                }
                "My Public Page" => return Ok(Page::Profile(username)),
                "Log Out" => {
                    store.logout();
                    flash_message(terminal, "Logged out.", 800)?;
                    return Ok(Page::Landing);
                }
                "Back to Landing" => return Ok(Page::Landing),
                _ => {
                    // An image row: offer deletion.
                    let idx = labels.iter().position(|l| *l == sel);
                    if let Some(img) = idx.and_then(|i| images.get(i)) {
                        if confirm(terminal, "Delete this image from your gallery?")? {
                            if let SaveOutcome::WriteFailed(e) = store.delete_image(img.id) {
                                flash_message(terminal, &format!("Deleted, but saving failed: {e}"), 1500)?;
                            }
                        }
                    }
                }
            },
        }
    }
}
