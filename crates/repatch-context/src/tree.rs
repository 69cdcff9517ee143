//! Repository tree construction and rendering.

use repatch_core::{EntryKind, TreeEntry, TreeNode};

/// Nest flat tree entries under their immediate parents.
///
/// Entries are sorted lexicographically by path first, which guarantees
/// parents are visited before children. An entry whose parent directory has
/// no entry of its own attaches at the root.
pub fn build_tree(mut entries: Vec<TreeEntry>) -> Vec<TreeNode> {
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    entries.dedup_by(|a, b| a.path == b.path);

    let mut roots: Vec<TreeNode> = Vec::new();
    for entry in entries {
        insert_node(&mut roots, TreeNode::from_entry(entry));
    }
    roots
}

fn insert_node(nodes: &mut Vec<TreeNode>, node: TreeNode) {
    let parent = node.path.parent().to_string();
    if parent.is_empty() {
        nodes.push(node);
        return;
    }
    match find_directory(nodes, &parent) {
        Some(directory) => directory.children.push(node),
        None => nodes.push(node),
    }
}

fn find_directory<'a>(nodes: &'a mut [TreeNode], dir: &str) -> Option<&'a mut TreeNode> {
    for node in nodes.iter_mut() {
        if node.kind != EntryKind::Directory {
            continue;
        }
        if node.path.as_str() == dir {
            return Some(node);
        }
        if dir.starts_with(&format!("{}/", node.path.as_str())) {
            return find_directory(&mut node.children, dir);
        }
    }
    None
}

/// Indented textual rendering, directories marked with a trailing `/`.
pub fn render_tree(nodes: &[TreeNode]) -> String {
    let mut out = String::new();
    render_level(nodes, 0, &mut out);
    out
}

fn render_level(nodes: &[TreeNode], depth: usize, out: &mut String) {
    for node in nodes {
        for _ in 0..depth {
            out.push_str("  ");
        }
        out.push_str(node.path.file_name());
        if node.kind == EntryKind::Directory {
            out.push('/');
        }
        out.push('\n');
        render_level(&node.children, depth + 1, out);
    }
}
