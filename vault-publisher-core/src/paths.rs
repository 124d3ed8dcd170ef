//! Remote path resolution. Pure and deterministic: no I/O, no clock.

use serde_yaml::Value;

use crate::contract::NoteMeta;
use crate::frontmatter::Frontmatter;
use crate::settings::{Placement, PublisherSettings};

/// Resolve the remote path for a note. The default is
/// `<default_folder>/<file_name>`; in frontmatter placement mode the folder
/// key, when present, picks the subfolder under the root prefix.
pub fn note_path(
    fm: Option<&Frontmatter>,
    note: &NoteMeta,
    settings: &PublisherSettings,
) -> String {
    if settings.placement == Placement::Frontmatter {
        let folder = fm
            .and_then(|f| f.get(&settings.folder_key))
            .and_then(Value::as_str);
        if let Some(folder) = folder {
            let mut root = settings.root_folder.trim_matches('/').to_string();
            if !root.is_empty() {
                root.push('/');
            }
            return format!("{root}{}/{}", folder.trim_matches('/'), note.name);
        }
    }
    join_folder(&settings.default_folder, &note.name)
}

/// Resolve the remote path for an embedded attachment. Independent of the
/// owning note's path: the image folder override wins when configured.
pub fn image_path(image: &NoteMeta, settings: &PublisherSettings) -> String {
    let folder = if settings.image_folder.trim().is_empty() {
        &settings.default_folder
    } else {
        &settings.image_folder
    };
    join_folder(folder, &image.name)
}

fn join_folder(folder: &str, name: &str) -> String {
    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{folder}/{name}")
    }
}
