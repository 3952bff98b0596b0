use crate::geom::{toggle_id, Bounds};
use crate::state::{Node, NodeKind};

/// Multi-selection over the two kinds that participate in it. Insights and
/// annotations are never multi-selected; they interact one node at a time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selection {
    pub code_ids: Vec<String>,
    pub theme_ids: Vec<String>,
}

/// World bounding box of a selection, used to place derived cards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SelectionBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub center_x: f64,
    pub center_y: f64,
}

impl Selection {
    pub fn clear(&mut self) {
        self.code_ids.clear();
        self.theme_ids.clear();
    }

    pub fn has_selection(&self) -> bool {
        !self.code_ids.is_empty() || !self.theme_ids.is_empty()
    }

    pub fn contains(&self, kind: NodeKind, id: &str) -> bool {
        match kind {
            NodeKind::Code => self.code_ids.iter().any(|existing| existing == id),
            NodeKind::Theme => self.theme_ids.iter().any(|existing| existing == id),
            NodeKind::Insight | NodeKind::Annotation => false,
        }
    }

    /// Click-selection rule. Additive clicks toggle membership within the
    /// kind and leave the other kind alone. Plain clicks replace the kind's
    /// set and clear the other kind, except that re-clicking an already
    /// selected node keeps the current selection so a group drag can start
    /// from any member.
    pub fn toggle(&mut self, kind: NodeKind, id: &str, additive: bool) {
        let (own, other) = match kind {
            NodeKind::Code => (&mut self.code_ids, &mut self.theme_ids),
            NodeKind::Theme => (&mut self.theme_ids, &mut self.code_ids),
            // Clicking an unselectable kind dissolves the multi-selection.
            NodeKind::Insight | NodeKind::Annotation => {
                if !additive {
                    self.clear();
                }
                return;
            }
        };

        if additive {
            toggle_id(own, id);
        } else if !own.iter().any(|existing| existing == id) {
            own.clear();
            own.push(id.to_string());
            other.clear();
        }
    }

    /// Replace membership for one kind wholesale (marquee completion).
    pub fn replace_kind(&mut self, kind: NodeKind, ids: Vec<String>) {
        match kind {
            NodeKind::Code => self.code_ids = ids,
            NodeKind::Theme => self.theme_ids = ids,
            NodeKind::Insight | NodeKind::Annotation => {}
        }
    }

    /// The contextual popup shows once a theme could be derived (two or more
    /// codes) or an insight could be derived (any theme).
    pub fn show_context_popup(&self) -> bool {
        self.code_ids.len() >= 2 || !self.theme_ids.is_empty()
    }

    /// Bounding box over the selected nodes whose kind is in `kinds`, or
    /// `None` when nothing matches. Callers must handle `None` before using
    /// the box for placement.
    pub fn bounding_box(&self, kinds: &[NodeKind], nodes: &[Node]) -> Option<SelectionBounds> {
        let rects: Vec<_> = nodes
            .iter()
            .filter(|node| kinds.contains(&node.kind()) && self.contains(node.kind(), &node.key.id))
            .map(|node| node.rect)
            .collect();
        let bounds = Bounds::of(&rects)?;
        let (center_x, center_y) = bounds.center();
        Some(SelectionBounds {
            min_x: bounds.min_x,
            min_y: bounds.min_y,
            max_x: bounds.max_x,
            max_y: bounds.max_y,
            center_x,
            center_y,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Rect;

    fn node(kind: NodeKind, id: &str, x: f64, y: f64) -> Node {
        Node::new(kind, id, Rect::new(x, y, 100.0, 50.0), id)
    }

    mod toggle_tests {
        use super::*;

        #[test]
        fn plain_click_selects_one_code() {
            let mut sel = Selection::default();
            sel.toggle(NodeKind::Code, "c1", false);
            assert_eq!(sel.code_ids, vec!["c1".to_string()]);
            assert!(sel.theme_ids.is_empty());
        }

        #[test]
        fn plain_code_click_clears_theme_selection() {
            let mut sel = Selection {
                theme_ids: vec!["t1".to_string(), "t2".to_string()],
                ..Default::default()
            };
            sel.toggle(NodeKind::Code, "c1", false);
            assert_eq!(sel.code_ids, vec!["c1".to_string()]);
            assert!(sel.theme_ids.is_empty());
        }

        #[test]
        fn plain_theme_click_clears_code_selection() {
            let mut sel = Selection {
                code_ids: vec!["c1".to_string()],
                ..Default::default()
            };
            sel.toggle(NodeKind::Theme, "t1", false);
            assert_eq!(sel.theme_ids, vec!["t1".to_string()]);
            assert!(sel.code_ids.is_empty());
        }

        #[test]
        fn additive_click_toggles_within_kind_only() {
            let mut sel = Selection {
                code_ids: vec!["c1".to_string()],
                theme_ids: vec!["t1".to_string()],
            };
            sel.toggle(NodeKind::Code, "c2", true);
            assert_eq!(sel.code_ids, vec!["c1".to_string(), "c2".to_string()]);
            assert_eq!(sel.theme_ids, vec!["t1".to_string()]);

            sel.toggle(NodeKind::Code, "c1", true);
            assert_eq!(sel.code_ids, vec!["c2".to_string()]);
            assert_eq!(sel.theme_ids, vec!["t1".to_string()]);
        }

        #[test]
        fn reselecting_a_selected_member_keeps_the_group() {
            let mut sel = Selection {
                code_ids: vec!["c1".to_string(), "c2".to_string(), "c3".to_string()],
                ..Default::default()
            };
            sel.toggle(NodeKind::Code, "c2", false);
            assert_eq!(
                sel.code_ids,
                vec!["c1".to_string(), "c2".to_string(), "c3".to_string()]
            );
        }

        #[test]
        fn plain_click_on_insight_clears_everything() {
            let mut sel = Selection {
                code_ids: vec!["c1".to_string()],
                theme_ids: vec!["t1".to_string()],
            };
            sel.toggle(NodeKind::Insight, "i1", false);
            assert!(!sel.has_selection());
        }

        #[test]
        fn additive_click_on_annotation_changes_nothing() {
            let mut sel = Selection {
                code_ids: vec!["c1".to_string()],
                ..Default::default()
            };
            sel.toggle(NodeKind::Annotation, "a1", true);
            assert_eq!(sel.code_ids, vec!["c1".to_string()]);
        }
    }

    mod popup_tests {
        use super::*;

        #[test]
        fn popup_needs_two_codes_or_one_theme() {
            let mut sel = Selection::default();
            assert!(!sel.show_context_popup());

            sel.code_ids = vec!["c1".to_string()];
            assert!(!sel.show_context_popup());

            sel.code_ids.push("c2".to_string());
            assert!(sel.show_context_popup());

            sel.code_ids.clear();
            sel.theme_ids = vec!["t1".to_string()];
            assert!(sel.show_context_popup());
        }
    }

    mod bounding_box_tests {
        use super::*;

        #[test]
        fn empty_selection_has_no_box() {
            let sel = Selection::default();
            let nodes = vec![node(NodeKind::Code, "c1", 0.0, 0.0)];
            assert!(sel
                .bounding_box(&[NodeKind::Code, NodeKind::Theme], &nodes)
                .is_none());
        }

        #[test]
        fn box_spans_selected_nodes_only() {
            let sel = Selection {
                code_ids: vec!["c1".to_string(), "c2".to_string()],
                ..Default::default()
            };
            let nodes = vec![
                node(NodeKind::Code, "c1", 0.0, 0.0),
                node(NodeKind::Code, "c2", 300.0, 100.0),
                node(NodeKind::Code, "c3", 900.0, 900.0),
            ];
            let bounds = sel.bounding_box(&[NodeKind::Code], &nodes).unwrap();
            assert_eq!(bounds.min_x, 0.0);
            assert_eq!(bounds.min_y, 0.0);
            assert_eq!(bounds.max_x, 400.0);
            assert_eq!(bounds.max_y, 150.0);
            assert_eq!(bounds.center_x, 200.0);
            assert_eq!(bounds.center_y, 75.0);
        }

        #[test]
        fn kind_filter_excludes_other_kinds() {
            let sel = Selection {
                code_ids: vec!["c1".to_string()],
                theme_ids: vec!["t1".to_string()],
            };
            let nodes = vec![
                node(NodeKind::Code, "c1", 0.0, 0.0),
                node(NodeKind::Theme, "t1", 500.0, 500.0),
            ];
            let bounds = sel.bounding_box(&[NodeKind::Theme], &nodes).unwrap();
            assert_eq!(bounds.min_x, 500.0);
            assert_eq!(bounds.max_x, 600.0);
        }

        #[test]
        fn selected_id_without_node_yields_none() {
            let sel = Selection {
                code_ids: vec!["ghost".to_string()],
                ..Default::default()
            };
            let nodes = vec![node(NodeKind::Code, "c1", 0.0, 0.0)];
            assert!(sel.bounding_box(&[NodeKind::Code], &nodes).is_none());
        }
    }

    mod misc_tests {
        use super::*;

        #[test]
        fn clear_empties_both_sets() {
            let mut sel = Selection {
                code_ids: vec!["c1".to_string()],
                theme_ids: vec!["t1".to_string()],
            };
            sel.clear();
            assert!(!sel.has_selection());
        }

        #[test]
        fn contains_only_tracks_codes_and_themes() {
            let sel = Selection {
                code_ids: vec!["x".to_string()],
                theme_ids: vec!["x".to_string()],
            };
            assert!(sel.contains(NodeKind::Code, "x"));
            assert!(sel.contains(NodeKind::Theme, "x"));
            assert!(!sel.contains(NodeKind::Insight, "x"));
            assert!(!sel.contains(NodeKind::Annotation, "x"));
        }
    }
}
