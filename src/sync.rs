//! Builds each render pass's node list from the host's entity lists while
//! keeping the live canvas arrangement authoritative across refreshes.

use std::collections::HashMap;

use crate::geom::Rect;
use crate::state::{Node, NodeKey, NodeKind, ProjectData};

/// Per-kind default card size and placement grid. Each kind tiles its own
/// horizontal band so fresh entities never stack at the origin and denser
/// kinds pack tighter.
struct KindLayout {
    default_w: f64,
    default_h: f64,
    per_row: usize,
    stride_x: f64,
    stride_y: f64,
    origin_x: f64,
    origin_y: f64,
}

const fn layout_for(kind: NodeKind) -> KindLayout {
    match kind {
        NodeKind::Code => KindLayout {
            default_w: 160.0,
            default_h: 60.0,
            per_row: 8,
            stride_x: 180.0,
            stride_y: 80.0,
            origin_x: 40.0,
            origin_y: 40.0,
        },
        NodeKind::Theme => KindLayout {
            default_w: 200.0,
            default_h: 84.0,
            per_row: 5,
            stride_x: 230.0,
            stride_y: 110.0,
            origin_x: 40.0,
            origin_y: 420.0,
        },
        NodeKind::Insight => KindLayout {
            default_w: 240.0,
            default_h: 100.0,
            per_row: 4,
            stride_x: 270.0,
            stride_y: 130.0,
            origin_x: 40.0,
            origin_y: 860.0,
        },
        NodeKind::Annotation => KindLayout {
            default_w: 200.0,
            default_h: 140.0,
            per_row: 5,
            stride_x: 230.0,
            stride_y: 160.0,
            origin_x: 40.0,
            origin_y: 1240.0,
        },
    }
}

/// Deterministic default rect for the `index`-th entity of a kind.
pub fn default_rect(kind: NodeKind, index: usize) -> Rect {
    let layout = layout_for(kind);
    let row = index / layout.per_row;
    let col = index % layout.per_row;
    Rect::new(
        layout.origin_x + col as f64 * layout.stride_x,
        layout.origin_y + row as f64 * layout.stride_y,
        layout.default_w,
        layout.default_h,
    )
}

/// Default size used when an entity stores no explicit size.
pub fn default_size(kind: NodeKind) -> (f64, f64) {
    let layout = layout_for(kind);
    (layout.default_w, layout.default_h)
}

fn entity_rect(
    kind: NodeKind,
    index: usize,
    x: Option<f64>,
    y: Option<f64>,
    w: Option<f64>,
    h: Option<f64>,
) -> Rect {
    let fallback = default_rect(kind, index);
    match (x, y) {
        (Some(x), Some(y)) => Rect::new(
            x,
            y,
            w.unwrap_or(fallback.w),
            h.unwrap_or(fallback.h),
        ),
        _ => fallback,
    }
}

/// Produce the node list for this pass. Entities already on the canvas keep
/// their previous geometry (user-adjusted state wins over anything the feed
/// says); new entities take their stored position or a grid default; nodes
/// whose entity vanished are dropped.
pub fn sync_nodes(prev: &[Node], data: &ProjectData) -> Vec<Node> {
    let prev_by_key: HashMap<&NodeKey, &Node> =
        prev.iter().map(|node| (&node.key, node)).collect();

    let mut out = Vec::with_capacity(
        data.codes.len() + data.themes.len() + data.insights.len() + data.annotations.len(),
    );

    let mut push = |kind: NodeKind, id: &str, label: &str, rect: Rect| {
        let key = NodeKey::new(kind, id);
        let rect = match prev_by_key.get(&key) {
            Some(existing) => existing.rect,
            None => rect,
        };
        out.push(Node {
            key,
            rect,
            label: label.to_string(),
        });
    };

    for (i, code) in data.codes.iter().enumerate() {
        let rect = entity_rect(NodeKind::Code, i, code.x, code.y, code.width, code.height);
        push(NodeKind::Code, &code.id, &code.name, rect);
    }
    for (i, theme) in data.themes.iter().enumerate() {
        let rect = entity_rect(NodeKind::Theme, i, theme.x, theme.y, theme.width, theme.height);
        push(NodeKind::Theme, &theme.id, &theme.name, rect);
    }
    for (i, insight) in data.insights.iter().enumerate() {
        let rect = entity_rect(
            NodeKind::Insight,
            i,
            insight.x,
            insight.y,
            insight.width,
            insight.height,
        );
        push(NodeKind::Insight, &insight.id, &insight.name, rect);
    }
    for (i, annotation) in data.annotations.iter().enumerate() {
        let rect = entity_rect(
            NodeKind::Annotation,
            i,
            annotation.x,
            annotation.y,
            annotation.width,
            annotation.height,
        );
        push(NodeKind::Annotation, &annotation.id, &annotation.text, rect);
    }

    out
}

/// `(kind, id) -> index` lookup over a node list, rebuilt once per pass so
/// hit-testing, merging and edge drawing share one map.
pub fn index_nodes(nodes: &[Node]) -> HashMap<NodeKey, usize> {
    nodes
        .iter()
        .enumerate()
        .map(|(i, node)| (node.key.clone(), i))
        .collect()
}

/// Fold live canvas geometry back into the entity payloads, so a wholesale
/// snapshot (browser localStorage mode) reloads with the same arrangement.
pub fn apply_layout(data: &mut ProjectData, nodes: &[Node]) {
    let by_key: HashMap<&NodeKey, &Node> = nodes.iter().map(|n| (&n.key, n)).collect();

    let mut stamp = |kind: NodeKind,
                     id: &str,
                     x: &mut Option<f64>,
                     y: &mut Option<f64>,
                     w: &mut Option<f64>,
                     h: &mut Option<f64>| {
        if let Some(node) = by_key.get(&NodeKey::new(kind, id)) {
            *x = Some(node.rect.x);
            *y = Some(node.rect.y);
            *w = Some(node.rect.w);
            *h = Some(node.rect.h);
        }
    };

    for code in &mut data.codes {
        stamp(
            NodeKind::Code,
            &code.id,
            &mut code.x,
            &mut code.y,
            &mut code.width,
            &mut code.height,
        );
    }
    for theme in &mut data.themes {
        stamp(
            NodeKind::Theme,
            &theme.id,
            &mut theme.x,
            &mut theme.y,
            &mut theme.width,
            &mut theme.height,
        );
    }
    for insight in &mut data.insights {
        stamp(
            NodeKind::Insight,
            &insight.id,
            &mut insight.x,
            &mut insight.y,
            &mut insight.width,
            &mut insight.height,
        );
    }
    for annotation in &mut data.annotations {
        stamp(
            NodeKind::Annotation,
            &annotation.id,
            &mut annotation.x,
            &mut annotation.y,
            &mut annotation.width,
            &mut annotation.height,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Annotation, Code, Theme};

    fn code(id: &str, name: &str) -> Code {
        Code {
            id: id.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    mod default_grid_tests {
        use super::*;

        #[test]
        fn defaults_are_deterministic() {
            assert_eq!(default_rect(NodeKind::Code, 3), default_rect(NodeKind::Code, 3));
            assert_eq!(default_rect(NodeKind::Theme, 0), default_rect(NodeKind::Theme, 0));
        }

        #[test]
        fn codes_tile_left_to_right_then_wrap() {
            let first = default_rect(NodeKind::Code, 0);
            let second = default_rect(NodeKind::Code, 1);
            let next_row = default_rect(NodeKind::Code, 8);
            assert_eq!(first.x, 40.0);
            assert_eq!(second.x - first.x, 180.0);
            assert_eq!(second.y, first.y);
            assert_eq!(next_row.x, first.x);
            assert_eq!(next_row.y - first.y, 80.0);
        }

        #[test]
        fn default_rects_within_a_kind_never_collide() {
            for kind in [
                NodeKind::Code,
                NodeKind::Theme,
                NodeKind::Insight,
                NodeKind::Annotation,
            ] {
                let rects: Vec<Rect> = (0..24).map(|i| default_rect(kind, i)).collect();
                for (i, a) in rects.iter().enumerate() {
                    for b in rects.iter().skip(i + 1) {
                        assert!(!a.intersects(b), "{:?} defaults collide", kind);
                    }
                }
            }
        }

        #[test]
        fn kinds_tile_separate_bands() {
            // One row of each kind stays inside its own band.
            let code = default_rect(NodeKind::Code, 7);
            let theme = default_rect(NodeKind::Theme, 4);
            let insight = default_rect(NodeKind::Insight, 3);
            let annotation = default_rect(NodeKind::Annotation, 4);
            assert!(code.y + code.h <= theme.y);
            assert!(theme.y + theme.h <= insight.y);
            assert!(insight.y + insight.h <= annotation.y);
        }
    }

    mod merge_tests {
        use super::*;

        #[test]
        fn new_entities_get_grid_defaults() {
            let data = ProjectData {
                codes: vec![code("c1", "One"), code("c2", "Two")],
                ..Default::default()
            };
            let nodes = sync_nodes(&[], &data);
            assert_eq!(nodes.len(), 2);
            assert_eq!(nodes[0].rect, default_rect(NodeKind::Code, 0));
            assert_eq!(nodes[1].rect, default_rect(NodeKind::Code, 1));
            assert_eq!(nodes[0].label, "One");
        }

        #[test]
        fn stored_entity_geometry_wins_on_first_appearance() {
            let data = ProjectData {
                codes: vec![Code {
                    x: Some(900.0),
                    y: Some(700.0),
                    width: Some(120.0),
                    height: Some(50.0),
                    ..code("c1", "Stored")
                }],
                ..Default::default()
            };
            let nodes = sync_nodes(&[], &data);
            assert_eq!(nodes[0].rect, Rect::new(900.0, 700.0, 120.0, 50.0));
        }

        #[test]
        fn stored_position_without_size_uses_default_size() {
            let data = ProjectData {
                codes: vec![Code {
                    x: Some(900.0),
                    y: Some(700.0),
                    ..code("c1", "Stored")
                }],
                ..Default::default()
            };
            let nodes = sync_nodes(&[], &data);
            let (w, h) = default_size(NodeKind::Code);
            assert_eq!(nodes[0].rect, Rect::new(900.0, 700.0, w, h));
        }

        #[test]
        fn previous_geometry_survives_resync() {
            let data = ProjectData {
                codes: vec![code("c1", "One")],
                ..Default::default()
            };
            let mut nodes = sync_nodes(&[], &data);
            nodes[0].rect = Rect::new(555.0, 444.0, 300.0, 80.0);

            // Feed now claims a different stored position; the canvas wins.
            let refreshed = ProjectData {
                codes: vec![Code {
                    x: Some(0.0),
                    y: Some(0.0),
                    ..code("c1", "One")
                }],
                ..Default::default()
            };
            let merged = sync_nodes(&nodes, &refreshed);
            assert_eq!(merged[0].rect, Rect::new(555.0, 444.0, 300.0, 80.0));
        }

        #[test]
        fn resync_with_unchanged_data_is_stable() {
            let data = ProjectData {
                codes: vec![code("c1", "One"), code("c2", "Two")],
                themes: vec![Theme {
                    id: "t1".to_string(),
                    name: "Theme".to_string(),
                    ..Default::default()
                }],
                ..Default::default()
            };
            let first = sync_nodes(&[], &data);
            let second = sync_nodes(&first, &data);
            assert_eq!(first, second);
        }

        #[test]
        fn vanished_entities_drop_their_nodes() {
            let data = ProjectData {
                codes: vec![code("c1", "One"), code("c2", "Two")],
                ..Default::default()
            };
            let nodes = sync_nodes(&[], &data);

            let shrunk = ProjectData {
                codes: vec![code("c2", "Two")],
                ..Default::default()
            };
            let merged = sync_nodes(&nodes, &shrunk);
            assert_eq!(merged.len(), 1);
            assert_eq!(merged[0].key, NodeKey::new(NodeKind::Code, "c2"));
            // c2 keeps the geometry it had as the second code.
            assert_eq!(merged[0].rect, default_rect(NodeKind::Code, 1));
        }

        #[test]
        fn same_id_different_kind_are_distinct_nodes() {
            let data = ProjectData {
                codes: vec![code("x", "A code")],
                themes: vec![Theme {
                    id: "x".to_string(),
                    name: "A theme".to_string(),
                    ..Default::default()
                }],
                ..Default::default()
            };
            let nodes = sync_nodes(&[], &data);
            assert_eq!(nodes.len(), 2);
            assert_ne!(nodes[0].rect, nodes[1].rect);
        }

        #[test]
        fn labels_refresh_even_when_geometry_survives() {
            let data = ProjectData {
                codes: vec![code("c1", "Old name")],
                ..Default::default()
            };
            let nodes = sync_nodes(&[], &data);

            let renamed = ProjectData {
                codes: vec![code("c1", "New name")],
                ..Default::default()
            };
            let merged = sync_nodes(&nodes, &renamed);
            assert_eq!(merged[0].label, "New name");
            assert_eq!(merged[0].rect, nodes[0].rect);
        }

        #[test]
        fn annotations_use_text_as_label() {
            let data = ProjectData {
                annotations: vec![Annotation {
                    id: "a1".to_string(),
                    text: "Follow up with P4".to_string(),
                    ..Default::default()
                }],
                ..Default::default()
            };
            let nodes = sync_nodes(&[], &data);
            assert_eq!(nodes[0].label, "Follow up with P4");
            assert_eq!(nodes[0].kind(), NodeKind::Annotation);
        }
    }

    mod layout_tests {
        use super::*;

        #[test]
        fn apply_layout_stamps_node_geometry_onto_entities() {
            let mut data = ProjectData {
                codes: vec![code("c1", "One")],
                ..Default::default()
            };
            let mut nodes = sync_nodes(&[], &data);
            nodes[0].rect = Rect::new(321.0, 123.0, 150.0, 70.0);

            apply_layout(&mut data, &nodes);
            assert_eq!(data.codes[0].x, Some(321.0));
            assert_eq!(data.codes[0].y, Some(123.0));
            assert_eq!(data.codes[0].width, Some(150.0));
            assert_eq!(data.codes[0].height, Some(70.0));
        }

        #[test]
        fn apply_layout_then_sync_round_trips_the_arrangement() {
            let mut data = ProjectData {
                codes: vec![code("c1", "One")],
                themes: vec![Theme {
                    id: "t1".to_string(),
                    name: "T".to_string(),
                    ..Default::default()
                }],
                ..Default::default()
            };
            let mut nodes = sync_nodes(&[], &data);
            nodes[0].rect = Rect::new(10.0, 20.0, 30.0, 40.0);
            nodes[1].rect = Rect::new(50.0, 60.0, 70.0, 80.0);

            apply_layout(&mut data, &nodes);
            let reloaded = sync_nodes(&[], &data);
            assert_eq!(reloaded[0].rect, nodes[0].rect);
            assert_eq!(reloaded[1].rect, nodes[1].rect);
        }

        #[test]
        fn entities_without_nodes_keep_their_stored_geometry() {
            let mut data = ProjectData {
                codes: vec![Code {
                    x: Some(7.0),
                    y: Some(8.0),
                    ..code("orphan", "O")
                }],
                ..Default::default()
            };
            apply_layout(&mut data, &[]);
            assert_eq!(data.codes[0].x, Some(7.0));
            assert_eq!(data.codes[0].y, Some(8.0));
        }
    }

    mod index_tests {
        use super::*;

        #[test]
        fn index_maps_every_key() {
            let data = ProjectData {
                codes: vec![code("c1", "One")],
                themes: vec![Theme {
                    id: "t1".to_string(),
                    name: "T".to_string(),
                    ..Default::default()
                }],
                ..Default::default()
            };
            let nodes = sync_nodes(&[], &data);
            let index = index_nodes(&nodes);
            assert_eq!(index.len(), 2);
            assert_eq!(index[&NodeKey::new(NodeKind::Code, "c1")], 0);
            assert_eq!(index[&NodeKey::new(NodeKind::Theme, "t1")], 1);
        }
    }
}
