//! Terminal rendering for explorer snapshots
//!
//! Clears nothing and owns no state: every snapshot is rendered from scratch,
//! the same way a host view would rebuild its tree.

use treeline_core::ExplorerViewState;

/// Render one snapshot as an indented tree, picking the loading / error /
/// empty / populated mode from the snapshot fields.
pub fn render_state(state: &ExplorerViewState) -> String {
    let mut out = String::new();
    if state.loading {
        out.push_str("(refreshing...)\n");
    }
    if let Some(error) = &state.error {
        out.push_str(&format!("! {}\n", error));
    }
    if state.entries.is_empty() {
        if !state.loading && state.error.is_none() {
            out.push_str("(empty)\n");
        }
        return out;
    }
    for entry in &state.entries {
        let depth = entry.path.matches('/').count();
        let marker = if entry.is_directory {
            if state.is_expanded(&entry.path) {
                "v "
            } else {
                "> "
            }
        } else {
            "  "
        };
        let selected = state.selected_path.as_deref() == Some(entry.path.as_str());
        out.push_str(&format!(
            "{}{}{}{}\n",
            "  ".repeat(depth),
            marker,
            entry.name,
            if selected { "  *" } else { "" }
        ));
    }
    out
}

pub fn render_help() -> &'static str {
    "commands:\n\
     \x20 ls                      print the current tree\n\
     \x20 expand <path>           toggle a folder open/closed\n\
     \x20 collapse-all            close every folder\n\
     \x20 select <path>           select an entry (no argument clears)\n\
     \x20 new <dir> <name>        create a file ('.' is the root)\n\
     \x20 mkdir <dir> <name>      create a folder\n\
     \x20 mv <path> <new-name>    rename an entry\n\
     \x20 rm <path>               move an entry to trash\n\
     \x20 open <path>             open with the system app\n\
     \x20 reveal <path>           show in the file manager\n\
     \x20 refresh                 re-read from disk\n\
     \x20 quit"
}
