//! Filesystem-backed implementation of the core [`Vault`] trait.
//!
//! Notes live under a root directory; paths handed to the core are always
//! root-relative with forward slashes. Embed references are scanned from the
//! note text (`![[wiki]]` and `![](link)` forms) and resolved against the
//! full file listing by exact path, path suffix or bare file name.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, error};
use vault_publisher_core::contract::{NoteMeta, Vault, VaultError};
use vault_publisher_core::frontmatter::{parse_frontmatter, Frontmatter};

pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsVault { root: root.into() }
    }

    fn absolute(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    fn meta_for(&self, path: &Path) -> Option<NoteMeta> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let name = path.file_name()?.to_string_lossy().into_owned();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        Some(NoteMeta {
            path: rel.to_string_lossy().replace('\\', "/"),
            name,
            extension,
        })
    }

    fn all_files(&self) -> Result<Vec<NoteMeta>, VaultError> {
        fn visit_dir(dir: &Path, results: &mut Vec<PathBuf>) -> std::io::Result<()> {
            for entry_res in fs::read_dir(dir)? {
                let entry = entry_res?;
                let path = entry.path();
                if path.is_dir() {
                    // Skip hidden directories like .git and .obsidian.
                    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
                    if file_name.starts_with('.') {
                        debug!(path = %path.display(), "Skipping directory");
                        continue;
                    }
                    visit_dir(&path, results)?;
                } else if path.is_file() {
                    results.push(path);
                }
            }
            Ok(())
        }

        let mut paths = Vec::new();
        visit_dir(&self.root, &mut paths)?;
        Ok(paths
            .iter()
            .filter_map(|p| self.meta_for(p))
            .collect())
    }
}

#[async_trait]
impl Vault for FsVault {
    async fn list_notes(&self) -> Result<Vec<NoteMeta>, VaultError> {
        let mut notes: Vec<NoteMeta> = self
            .all_files()?
            .into_iter()
            .filter(|f| f.extension == "md")
            .collect();
        notes.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(notes)
    }

    async fn read_text(&self, path: &str) -> Result<String, VaultError> {
        Ok(fs::read_to_string(self.absolute(path))?)
    }

    async fn read_binary(&self, path: &str) -> Result<Vec<u8>, VaultError> {
        Ok(fs::read(self.absolute(path))?)
    }

    async fn frontmatter(&self, path: &str) -> Option<Frontmatter> {
        match fs::read_to_string(self.absolute(path)) {
            Ok(text) => parse_frontmatter(&text),
            Err(e) => {
                error!(path, error = %e, "failed to read note for frontmatter");
                None
            }
        }
    }

    async fn embeds(&self, path: &str) -> Vec<String> {
        let Ok(text) = fs::read_to_string(self.absolute(path)) else {
            return Vec::new();
        };
        // `![[file]]` and `![[file|alias]]` wiki embeds, `![alt](file)` markdown embeds.
        let wiki = Regex::new(r"!\[\[([^\]|]+)(?:\|[^\]]*)?\]\]").expect("static regex");
        let markdown = Regex::new(r"!\[[^\]]*\]\(([^)\s]+)\)").expect("static regex");
        let mut links = Vec::new();
        for caps in wiki.captures_iter(&text) {
            links.push(caps[1].trim().to_string());
        }
        for caps in markdown.captures_iter(&text) {
            links.push(caps[1].trim().to_string());
        }
        links
    }

    async fn resolve_embed(&self, link: &str, _from: &str) -> Option<NoteMeta> {
        let files = match self.all_files() {
            Ok(files) => files,
            Err(e) => {
                error!(link, error = %e, "failed to walk vault while resolving embed");
                return None;
            }
        };
        files
            .iter()
            .find(|f| f.path == link)
            .or_else(|| files.iter().find(|f| f.path.ends_with(&format!("/{link}"))))
            .or_else(|| files.iter().find(|f| f.name == link))
            .cloned()
    }
}
