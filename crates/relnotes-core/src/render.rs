//! Markdown rendering of release notes

use crate::notes::ReleaseNotes;
use crate::opsfile::FileStatus;
use crate::release::ChangeSet;
use crate::variable::VariableChanges;

const RELEASE_NOTES_WARNING: &str = "_Warning: The Release Notes column only highlights \
noteworthy updates for each release bump. However, it is not exhaustive and we recommend \
you visit the actual release notes below before every upgrade._";

const RELEASE_TABLE_HEADER: &str = "\
| Release | Old Version | New Version | Release Notes |
| ------- | ----------- | ----------- | ------------- |
";

const VARIABLE_TABLE_HEADER: &str = "\
| Variable | Type | Change |
| -------- | ---- | ------ |
";

/// Renders the release notes template
#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, notes: &ReleaseNotes) -> String {
        let mut out = String::new();

        out.push_str("## Notices\n");
        let removed = bullet_list(notes.ops_files_with(FileStatus::Deleted).map(|f| &f.path));
        if !removed.is_empty() {
            out.push_str("### Removed Ops-files\n");
            out.push_str(&removed);
        }
        out.push('\n');

        out.push_str("## Manifest Updates\n");
        if !notes.variables.is_empty() {
            out.push_str("### Variable Updates\n");
            out.push_str(&render_variables(&notes.variables));
        }
        out.push('\n');

        out.push_str("## Ops-files\n");
        out.push_str("### New Ops-files\n");
        out.push_str(&bullet_list(
            notes.ops_files_with(FileStatus::Added).map(|f| &f.path),
        ));
        out.push_str("### Updated Ops-files\n");
        out.push_str(&bullet_list(
            notes.ops_files_with(FileStatus::Modified).map(|f| &f.path),
        ));
        out.push('\n');

        out.push_str("## Other Updates\n\n");

        out.push_str("## Release Updates\n");
        out.push_str(RELEASE_NOTES_WARNING);
        out.push('\n');
        out.push_str(&self.render_table(&notes.releases));

        out
    }

    /// The release table alone, header included
    pub fn render_table(&self, releases: &ChangeSet) -> String {
        let mut table = String::from(RELEASE_TABLE_HEADER);
        for record in releases.iter() {
            table.push_str(&format!(
                "| {} | {} | {} | |\n",
                record.name,
                render_version(record.old_version.as_deref(), record.old_url.as_deref()),
                render_version(record.new_version.as_deref(), record.new_url.as_deref()),
            ));
        }
        table
    }
}

fn render_version(version: Option<&str>, url: Option<&str>) -> String {
    match (version, url) {
        (Some(version), Some(url)) => format!("[{}]({})", version, url),
        (Some(version), None) => version.to_string(),
        (None, _) => String::new(),
    }
}

fn render_variables(variables: &VariableChanges) -> String {
    let mut table = String::from(VARIABLE_TABLE_HEADER);
    for update in variables.iter() {
        table.push_str(&format!(
            "| {} | {} | {} |\n",
            update.name,
            update.var_type.as_deref().unwrap_or_default(),
            update.state,
        ));
    }
    table
}

fn bullet_list<'a>(items: impl Iterator<Item = &'a String>) -> String {
    items.map(|item| format!("- `{}`\n", item)).collect()
}
