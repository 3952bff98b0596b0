use crate::geom::Bounds;

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 5.0;
/// Fit-to-content never zooms in past this, so tiny content stays readable.
pub const MAX_FIT_ZOOM: f64 = 1.5;
pub const FIT_PADDING: f64 = 40.0;
pub const ZOOM_STEP: f64 = 1.2;

/// Immutable snapshot of the world→screen mapping:
/// `screen = world * zoom + offset`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub zoom: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

impl Viewport {
    pub fn world_to_screen(&self, wx: f64, wy: f64) -> (f64, f64) {
        (wx * self.zoom + self.offset_x, wy * self.zoom + self.offset_y)
    }

    pub fn screen_to_world(&self, sx: f64, sy: f64) -> (f64, f64) {
        ((sx - self.offset_x) / self.zoom, (sy - self.offset_y) / self.zoom)
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * ZOOM_STEP).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / ZOOM_STEP).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Rescale about a screen anchor so the world point under it stays put.
    /// This is the wheel-zoom path; `factor` > 1 zooms in.
    pub fn zoom_about(&mut self, sx: f64, sy: f64, factor: f64) {
        let (wx, wy) = self.screen_to_world(sx, sy);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.offset_x = sx - wx * self.zoom;
        self.offset_y = sy - wy * self.zoom;
    }

    /// Frame `content` inside a `surface_w` × `surface_h` surface with
    /// `FIT_PADDING` on each side, centering the content midpoint. No-op when
    /// there is no content or the surface has no area.
    pub fn fit_to_content(&mut self, content: Option<Bounds>, surface_w: f64, surface_h: f64) {
        let Some(bounds) = content else {
            return;
        };
        if surface_w <= 0.0 || surface_h <= 0.0 {
            return;
        }

        let content_w = bounds.width().max(1.0);
        let content_h = bounds.height().max(1.0);
        let zoom_x = (surface_w - 2.0 * FIT_PADDING) / content_w;
        let zoom_y = (surface_h - 2.0 * FIT_PADDING) / content_h;
        self.zoom = zoom_x.min(zoom_y).clamp(MIN_ZOOM, MAX_FIT_ZOOM);

        let (cx, cy) = bounds.center();
        self.offset_x = surface_w / 2.0 - cx * self.zoom;
        self.offset_y = surface_h / 2.0 - cy * self.zoom;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Rect;

    mod transform_tests {
        use super::*;

        #[test]
        fn identity_at_default() {
            let vp = Viewport::default();
            assert_eq!(vp.world_to_screen(100.0, 200.0), (100.0, 200.0));
            assert_eq!(vp.screen_to_world(100.0, 200.0), (100.0, 200.0));
        }

        #[test]
        fn world_to_screen_applies_zoom_then_offset() {
            let vp = Viewport {
                zoom: 2.0,
                offset_x: 10.0,
                offset_y: -20.0,
            };
            assert_eq!(vp.world_to_screen(100.0, 50.0), (210.0, 80.0));
        }

        #[test]
        fn screen_to_world_inverts_exactly() {
            let vp = Viewport {
                zoom: 1.5,
                offset_x: 123.0,
                offset_y: 456.0,
            };
            let (wx, wy) = vp.screen_to_world(300.0, 400.0);
            let (sx, sy) = vp.world_to_screen(wx, wy);
            assert!((sx - 300.0).abs() < 1e-10);
            assert!((sy - 400.0).abs() < 1e-10);
        }

        #[test]
        fn round_trip_world_screen_world() {
            let vp = Viewport {
                zoom: 0.35,
                offset_x: -80.0,
                offset_y: 17.0,
            };
            let (sx, sy) = vp.world_to_screen(500.0, -600.0);
            let (wx, wy) = vp.screen_to_world(sx, sy);
            assert!((wx - 500.0).abs() < 1e-9);
            assert!((wy + 600.0).abs() < 1e-9);
        }

        #[test]
        fn round_trip_at_extreme_zooms() {
            for zoom in [MIN_ZOOM, 0.5, 1.0, 2.5, MAX_ZOOM] {
                let vp = Viewport {
                    zoom,
                    offset_x: 33.0,
                    offset_y: -77.0,
                };
                let (wx, wy) = vp.screen_to_world(640.0, 360.0);
                let (sx, sy) = vp.world_to_screen(wx, wy);
                assert!((sx - 640.0).abs() < 1e-9, "zoom {}", zoom);
                assert!((sy - 360.0).abs() < 1e-9, "zoom {}", zoom);
            }
        }
    }

    mod zoom_tests {
        use super::*;

        #[test]
        fn zoom_in_and_out_step() {
            let mut vp = Viewport::default();
            vp.zoom_in();
            assert!((vp.zoom - 1.2).abs() < 1e-12);
            vp.zoom_out();
            assert!((vp.zoom - 1.0).abs() < 1e-12);
        }

        #[test]
        fn zoom_clamps_at_bounds() {
            let mut vp = Viewport {
                zoom: MAX_ZOOM,
                ..Default::default()
            };
            vp.zoom_in();
            assert_eq!(vp.zoom, MAX_ZOOM);

            vp.zoom = MIN_ZOOM;
            vp.zoom_out();
            assert_eq!(vp.zoom, MIN_ZOOM);
        }

        #[test]
        fn zoom_about_keeps_anchor_world_point_fixed() {
            let mut vp = Viewport {
                zoom: 1.0,
                offset_x: 50.0,
                offset_y: 60.0,
            };
            let anchor = (400.0, 300.0);
            let (wx, wy) = vp.screen_to_world(anchor.0, anchor.1);

            vp.zoom_about(anchor.0, anchor.1, 1.1);

            let (sx, sy) = vp.world_to_screen(wx, wy);
            assert!((sx - anchor.0).abs() < 1e-9);
            assert!((sy - anchor.1).abs() < 1e-9);
            assert!((vp.zoom - 1.1).abs() < 1e-12);
        }

        #[test]
        fn zoom_about_respects_clamp() {
            let mut vp = Viewport {
                zoom: MAX_ZOOM,
                ..Default::default()
            };
            vp.zoom_about(100.0, 100.0, 2.0);
            assert_eq!(vp.zoom, MAX_ZOOM);
        }
    }

    mod fit_tests {
        use super::*;

        fn bounds(x: f64, y: f64, w: f64, h: f64) -> Option<Bounds> {
            Bounds::of(&[Rect::new(x, y, w, h)])
        }

        #[test]
        fn fit_matches_worked_example() {
            // Content (0,0)-(1000,500) on an 800x600 surface with pad 40:
            // zoom = min(720/1000, 520/500) = 0.72, content center (500,250)
            // lands on the surface center (400,300).
            let mut vp = Viewport::default();
            vp.fit_to_content(bounds(0.0, 0.0, 1000.0, 500.0), 800.0, 600.0);

            assert!((vp.zoom - 0.72).abs() < 1e-12);
            let (sx, sy) = vp.world_to_screen(500.0, 250.0);
            assert!((sx - 400.0).abs() < 1e-9);
            assert!((sy - 300.0).abs() < 1e-9);
        }

        #[test]
        fn fit_caps_zoom_for_tiny_content() {
            let mut vp = Viewport::default();
            vp.fit_to_content(bounds(0.0, 0.0, 10.0, 10.0), 800.0, 600.0);
            assert_eq!(vp.zoom, MAX_FIT_ZOOM);
        }

        #[test]
        fn fit_clamps_zoom_for_huge_content() {
            let mut vp = Viewport::default();
            vp.fit_to_content(bounds(0.0, 0.0, 1_000_000.0, 10.0), 800.0, 600.0);
            assert_eq!(vp.zoom, MIN_ZOOM);
        }

        #[test]
        fn fit_without_content_is_noop() {
            let mut vp = Viewport {
                zoom: 2.0,
                offset_x: 5.0,
                offset_y: 6.0,
            };
            let before = vp;
            vp.fit_to_content(None, 800.0, 600.0);
            assert_eq!(vp, before);
        }

        #[test]
        fn fit_on_zero_area_surface_is_noop() {
            let mut vp = Viewport::default();
            let before = vp;
            vp.fit_to_content(bounds(0.0, 0.0, 100.0, 100.0), 0.0, 600.0);
            assert_eq!(vp, before);
            vp.fit_to_content(bounds(0.0, 0.0, 100.0, 100.0), 800.0, 0.0);
            assert_eq!(vp, before);
        }

        #[test]
        fn fit_centers_offset_content() {
            let mut vp = Viewport::default();
            vp.fit_to_content(bounds(-300.0, -200.0, 200.0, 100.0), 1000.0, 800.0);
            let (sx, sy) = vp.world_to_screen(-200.0, -150.0);
            assert!((sx - 500.0).abs() < 1e-9);
            assert!((sy - 400.0).abs() < 1e-9);
        }
    }
}
