//! Project tree assembly
//!
//! Builds the nested assembly view of a project from a flat list of records.
//! Traversal is iterative and tracks visited ids, so corrupt ancestry shows
//! up as warnings instead of unbounded recursion.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::core::identity::{PartId, PartType};
use crate::store::{Part, Project};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    pub id: PartId,
    pub part_number: String,
    pub name: String,
    #[serde(rename = "type")]
    pub part_type: PartType,
    pub status: String,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    fn leaf(part: &Part) -> Self {
        Self {
            id: part.id,
            part_number: part.part_number.clone(),
            name: part.name.clone(),
            part_type: part.part_type,
            status: part.status.clone(),
            quantity: part.quantity,
            children: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including itself
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectTree {
    pub project: String,
    pub name: String,
    pub roots: Vec<TreeNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ProjectTree {
    /// Build the tree for `project` from all of its parts.
    ///
    /// Siblings are ordered by name, then numeric id. Parts whose parent is
    /// not among `parts` are shown at the top level with a warning, and parts
    /// unreachable from any root (a parent loop) are reported and left out.
    pub fn build(project: &Project, parts: &[Part]) -> Self {
        let by_id: HashMap<PartId, &Part> = parts.iter().map(|p| (p.id, p)).collect();
        let mut warnings = Vec::new();

        let mut roots: Vec<&Part> = Vec::new();
        let mut children: HashMap<PartId, Vec<&Part>> = HashMap::new();
        for part in parts {
            match part.parent_id {
                Some(parent_id) if by_id.contains_key(&parent_id) => {
                    children.entry(parent_id).or_default().push(part)
                }
                Some(parent_id) => {
                    warnings.push(format!(
                        "{} references missing parent {}",
                        part.part_number, parent_id
                    ));
                    roots.push(part);
                }
                None => roots.push(part),
            }
        }

        let by_name = |a: &&Part, b: &&Part| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.numeric_id.cmp(&b.numeric_id))
        };
        roots.sort_by(by_name);
        for siblings in children.values_mut() {
            siblings.sort_by(by_name);
        }

        // Pre-order walk; every reachable id is entered exactly once
        let mut visited: HashSet<PartId> = HashSet::new();
        let mut order: Vec<&Part> = Vec::new();
        let mut stack: Vec<&Part> = roots.iter().rev().copied().collect();
        while let Some(part) = stack.pop() {
            if !visited.insert(part.id) {
                warnings.push(format!("{} reached twice, skipping", part.part_number));
                continue;
            }
            order.push(part);
            if let Some(kids) = children.get(&part.id) {
                stack.extend(kids.iter().rev().copied());
            }
        }

        for part in parts {
            if !visited.contains(&part.id) {
                warnings.push(format!(
                    "{} is not reachable from a top-level item (cyclic ancestry)",
                    part.part_number
                ));
            }
        }

        // Assemble bottom-up: children always follow their parent in `order`
        let mut built: HashMap<PartId, TreeNode> = HashMap::new();
        for part in order.iter().rev() {
            let mut node = TreeNode::leaf(part);
            if let Some(kids) = children.get(&part.id) {
                node.children = kids.iter().filter_map(|k| built.remove(&k.id)).collect();
            }
            built.insert(part.id, node);
        }
        let roots = roots.iter().filter_map(|r| built.remove(&r.id)).collect();

        Self {
            project: project.prefix.clone(),
            name: project.name.clone(),
            roots,
            warnings,
        }
    }

    /// Restrict the tree to the subtree rooted at `id`
    pub fn focus(&self, id: PartId) -> Option<Self> {
        let mut stack: Vec<&TreeNode> = self.roots.iter().collect();
        while let Some(node) = stack.pop() {
            if node.id == id {
                return Some(Self {
                    project: self.project.clone(),
                    name: self.name.clone(),
                    roots: vec![node.clone()],
                    warnings: Vec::new(),
                });
            }
            stack.extend(node.children.iter());
        }
        None
    }

    /// Total number of nodes in the tree
    pub fn size(&self) -> usize {
        self.roots.iter().map(TreeNode::size).sum()
    }

    /// Render as indented text lines using box-drawing branches
    pub fn render(&self) -> Vec<String> {
        let mut lines = Vec::new();
        // (node, indent prefix, is last sibling, is top level)
        let mut stack: Vec<(&TreeNode, String, bool, bool)> = Vec::new();
        let count = self.roots.len();
        for (i, root) in self.roots.iter().enumerate().rev() {
            stack.push((root, String::new(), i + 1 == count, true));
        }

        while let Some((node, indent, is_last, top)) = stack.pop() {
            let branch = match (top, is_last) {
                (true, _) => "",
                (false, true) => "└─ ",
                (false, false) => "├─ ",
            };
            lines.push(format!(
                "{}{}{}  {}",
                indent, branch, node.part_number, node.name
            ));

            let child_indent = match (top, is_last) {
                (true, _) => String::new(),
                (false, true) => format!("{indent}   "),
                (false, false) => format!("{indent}│  "),
            };
            let count = node.children.len();
            for (i, child) in node.children.iter().enumerate().rev() {
                stack.push((child, child_indent.clone(), i + 1 == count, false));
            }
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::Arena;

    #[test]
    fn test_build_orders_by_name() {
        let mut arena = Arena::new("BP25");
        let tla = arena.named("TLA", PartType::Assembly, None, 0);
        arena.named("Suspension", PartType::Assembly, Some(tla), 100);
        let chassis = arena.named("Chassis", PartType::Assembly, Some(tla), 200);
        arena.named("Pedal", PartType::Part, Some(chassis), 201);
        arena.named("Aero", PartType::Assembly, None, 300);

        let tree = ProjectTree::build(&arena.project, &arena.parts());
        assert!(tree.warnings.is_empty());
        assert_eq!(tree.size(), 5);

        let names: Vec<&str> = tree.roots.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["Aero", "TLA"]);

        let tla_node = &tree.roots[1];
        let names: Vec<&str> = tla_node.children.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["Chassis", "Suspension"]);
        assert_eq!(tla_node.children[0].children[0].part_number, "BP25-P-0201");
    }

    #[test]
    fn test_cycle_is_reported_not_followed() {
        let mut arena = Arena::new("BP25");
        let root = arena.named("Root", PartType::Assembly, None, 0);
        let a = arena.named("A", PartType::Assembly, None, 100);
        let b = arena.named("B", PartType::Assembly, Some(a), 200);
        arena.set_parent(a, Some(b));

        let tree = ProjectTree::build(&arena.project, &arena.parts());
        assert_eq!(tree.roots.len(), 1);
        assert_eq!(tree.roots[0].id, root);
        assert_eq!(tree.warnings.len(), 2);
        assert!(tree.warnings.iter().all(|w| w.contains("cyclic")));
    }

    #[test]
    fn test_render() {
        let mut arena = Arena::new("BP25");
        let tla = arena.named("TLA", PartType::Assembly, None, 0);
        let chassis = arena.named("Chassis", PartType::Assembly, Some(tla), 100);
        arena.named("Bracket", PartType::Part, Some(chassis), 101);
        arena.named("Wing", PartType::Part, Some(tla), 1);

        let lines = ProjectTree::build(&arena.project, &arena.parts()).render();
        assert_eq!(
            lines,
            [
                "BP25-A-0000  TLA",
                "├─ BP25-A-0100  Chassis",
                "│  └─ BP25-P-0101  Bracket",
                "└─ BP25-P-0001  Wing",
            ]
        );
    }

    #[test]
    fn test_focus() {
        let mut arena = Arena::new("BP25");
        let tla = arena.named("TLA", PartType::Assembly, None, 0);
        let chassis = arena.named("Chassis", PartType::Assembly, Some(tla), 100);
        arena.named("Bracket", PartType::Part, Some(chassis), 101);

        let tree = ProjectTree::build(&arena.project, &arena.parts());
        let focused = tree.focus(chassis).unwrap();
        assert_eq!(focused.roots.len(), 1);
        assert_eq!(focused.size(), 2);
        assert_eq!(focused.render()[0], "BP25-A-0100  Chassis");
        assert!(tree.focus(PartId(999)).is_none());
    }
}
