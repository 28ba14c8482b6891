//! Top-down XY view of the robot workspace.
//!
//! One screen point covers `mm_per_point` millimetres so the marker tracks
//! the cursor at the controller's pointer scale. Screen Y grows downward.

use eframe::egui;
use shared::domain::{Point2, Point3};

const GRID_SPACING_MM: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneView {
    mm_per_point: f64,
    center_mm: Option<Point2>,
}

impl SceneView {
    pub fn new(mm_per_point: f64) -> Self {
        Self {
            mm_per_point,
            center_mm: None,
        }
    }

    /// The first position seen becomes the view centre.
    pub fn anchor(&mut self, position: Point3) {
        if self.center_mm.is_none() {
            self.center_mm = Some(Point2::new(position.x, position.y));
        }
    }

    pub fn recenter(&mut self, position: Point3) {
        self.center_mm = Some(Point2::new(position.x, position.y));
    }

    fn center(&self) -> Point2 {
        self.center_mm.unwrap_or_default()
    }

    pub fn to_screen(&self, rect: egui::Rect, position: Point3) -> egui::Pos2 {
        let center = self.center();
        let dx = (position.x - center.x) / self.mm_per_point;
        let dy = -(position.y - center.y) / self.mm_per_point;
        rect.center() + egui::vec2(dx as f32, dy as f32)
    }

    pub fn to_local(rect: egui::Rect, pos: egui::Pos2) -> Point2 {
        let local = pos - rect.min;
        Point2::new(local.x as f64, local.y as f64)
    }

    /// Grid line offsets in millimetres that fall inside `rect`, as
    /// (vertical x positions, horizontal y positions).
    pub fn grid_lines(&self, rect: egui::Rect) -> (Vec<f64>, Vec<f64>) {
        let center = self.center();
        let half_w = rect.width() as f64 * 0.5 * self.mm_per_point;
        let half_h = rect.height() as f64 * 0.5 * self.mm_per_point;
        (
            grid_range(center.x - half_w, center.x + half_w),
            grid_range(center.y - half_h, center.y + half_h),
        )
    }

    pub fn paint(
        &self,
        painter: &egui::Painter,
        rect: egui::Rect,
        marker: Point3,
        robot: Option<Point3>,
        dragging: bool,
    ) {
        let visuals = painter.ctx().style().visuals.clone();
        painter.rect_filled(rect, egui::CornerRadius::same(4), visuals.extreme_bg_color);

        let grid = egui::Stroke::new(1.0, visuals.faint_bg_color);
        let axis = egui::Stroke::new(1.0, visuals.weak_text_color());
        let (xs, ys) = self.grid_lines(rect);
        for x in xs {
            let screen_x = self.to_screen(rect, Point3::new(x, 0.0, 0.0)).x;
            let stroke = if x == 0.0 { axis } else { grid };
            painter.line_segment(
                [
                    egui::pos2(screen_x, rect.top()),
                    egui::pos2(screen_x, rect.bottom()),
                ],
                stroke,
            );
        }
        for y in ys {
            let screen_y = self.to_screen(rect, Point3::new(0.0, y, 0.0)).y;
            let stroke = if y == 0.0 { axis } else { grid };
            painter.line_segment(
                [
                    egui::pos2(rect.left(), screen_y),
                    egui::pos2(rect.right(), screen_y),
                ],
                stroke,
            );
        }

        if let Some(robot) = robot {
            let center = self.to_screen(rect, robot);
            painter.circle_stroke(
                center,
                9.0,
                egui::Stroke::new(2.0, egui::Color32::from_rgb(150, 150, 160)),
            );
            painter.line_segment(
                [center, self.to_screen(rect, marker)],
                egui::Stroke::new(1.0, egui::Color32::from_rgb(110, 110, 120)),
            );
        }

        let marker_color = if dragging {
            egui::Color32::from_rgb(67, 181, 129)
        } else {
            egui::Color32::from_rgb(88, 101, 242)
        };
        painter.circle_filled(self.to_screen(rect, marker), 6.0, marker_color);
        painter.text(
            rect.left_top() + egui::vec2(8.0, 6.0),
            egui::Align2::LEFT_TOP,
            format!("grid {GRID_SPACING_MM:.0} mm, +Y up"),
            egui::FontId::monospace(11.0),
            visuals.weak_text_color(),
        );
    }
}

fn grid_range(from: f64, to: f64) -> Vec<f64> {
    let first = (from / GRID_SPACING_MM).ceil() as i64;
    let last = (to / GRID_SPACING_MM).floor() as i64;
    (first..=last)
        .map(|step| step as f64 * GRID_SPACING_MM)
        .collect()
}
