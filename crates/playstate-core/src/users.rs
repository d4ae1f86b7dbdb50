use playstate_config::InputProvider;
use playstate_models::{BackupDocument, ServerUser};
use std::path::Path;
use tracing::debug;
use crate::error::Error;

/// Pick a user by name or ID, or ask `input` to choose from `users` when
/// nothing was given.
pub fn select_user(
    users: &[ServerUser],
    name_or_id: Option<&str>,
    prompt: &str,
    input: &mut dyn InputProvider,
) -> Result<ServerUser, Error> {
    if users.is_empty() {
        return Err(Error::NoUsers);
    }

    if let Some(wanted) = name_or_id.map(str::trim).filter(|w| !w.is_empty()) {
        return users
            .iter()
            .find(|user| user.matches(wanted))
            .cloned()
            .ok_or_else(|| Error::UserNotFound(wanted.to_string()));
    }

    let options: Vec<String> = users.iter().map(|user| user.name.clone()).collect();
    let choice = input.select(prompt, &options)?;
    let user = users
        .get(choice)
        .cloned()
        .ok_or_else(|| Error::UserNotFound(format!("selection #{}", choice + 1)))?;
    debug!(user = %user.name, user_id = %user.id, "Selected user");
    Ok(user)
}

/// Pick the document of one backed-up user from a file holding several.
///
/// A file with a single document needs no choice; otherwise `source_user`
/// (name or ID) decides, or `input` is asked.
pub fn select_document(
    path: &Path,
    mut documents: Vec<BackupDocument>,
    source_user: Option<&str>,
    input: &mut dyn InputProvider,
) -> Result<BackupDocument, Error> {
    if documents.is_empty() {
        return Err(Error::EmptyBackup(path.to_path_buf()));
    }
    if documents.len() == 1 && source_user.is_none() {
        return Ok(documents.remove(0));
    }

    let users: Vec<ServerUser> = documents.iter().map(|doc| doc.source_user().clone()).collect();
    let chosen = select_user(&users, source_user, "Backup user to restore from", input).map_err(|err| match err {
        Error::UserNotFound(name) => Error::SourceUserNotFound(name),
        other => other,
    })?;
    let position = users
        .iter()
        .position(|user| *user == chosen)
        .ok_or_else(|| Error::SourceUserNotFound(chosen.name.clone()))?;
    Ok(documents.swap_remove(position))
}
