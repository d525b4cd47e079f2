use eframe::egui;

use putimage_core::NO_IMAGE;

use crate::app::{NodeView, PutImageApp, NODE_CANVAS_SIZE, NODE_GAP};

const TITLE_HEIGHT: f32 = 20.0;
const BACKGROUND: egui::Color32 = egui::Color32::from_gray(24);
const FOCUS_STROKE: egui::Color32 = egui::Color32::from_rgb(90, 160, 255);

impl PutImageApp {
    /// The host canvas: every node's editor laid out in a row, scaled by
    /// `host_scale` and shifted by `host_pan`.
    pub(crate) fn draw_host_canvas(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE.fill(egui::Color32::from_gray(12)))
            .show(ctx, |ui| {
                let area = ui.max_rect();
                let background =
                    ui.interact(area, egui::Id::new("host_canvas"), egui::Sense::drag());
                if self.space_held && background.dragged() {
                    self.host_pan += background.drag_delta();
                }

                let scale = self.host_scale;
                let side = NODE_CANVAS_SIZE * scale;
                for (i, id) in self.node_ids().into_iter().enumerate() {
                    let offset = egui::vec2(
                        NODE_GAP + i as f32 * (NODE_CANVAS_SIZE + NODE_GAP),
                        NODE_GAP + TITLE_HEIGHT,
                    ) * scale;
                    let rect = egui::Rect::from_min_size(
                        area.min + self.host_pan + offset,
                        egui::vec2(side, side),
                    );
                    let response = ui.interact(
                        rect,
                        egui::Id::new(("node_canvas", id)),
                        egui::Sense::click_and_drag(),
                    );
                    self.handle_node_pointer(ctx, id, rect, &response);

                    if let Some(view) = self.view(id) {
                        let focused = self.focused == Some(id);
                        paint_node(ui, view, rect, scale, focused, self.preferences.mask_opacity);
                    }
                }

                if self.space_held {
                    ctx.set_cursor_icon(egui::CursorIcon::Grab);
                }
            });
    }
}

fn paint_node(
    ui: &egui::Ui,
    view: &NodeView,
    rect: egui::Rect,
    scale: f32,
    focused: bool,
    mask_opacity: f32,
) {
    let navigator = view.node.navigator();
    ui.painter().text(
        rect.left_top() - egui::vec2(0.0, 4.0),
        egui::Align2::LEFT_BOTTOM,
        format!("#{} {}", view.node.id(), navigator.filename()),
        egui::FontId::proportional(14.0),
        egui::Color32::LIGHT_GRAY,
    );

    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, BACKGROUND);
    if focused {
        ui.painter().rect_stroke(
            rect,
            0.0,
            egui::Stroke::new(2.0, FOCUS_STROKE),
            egui::StrokeKind::Outside,
        );
    }

    let Some(editor) = view.node.editor() else {
        return;
    };
    let Some(textures) = &view.textures else {
        let message = if navigator.filename() == NO_IMAGE {
            NO_IMAGE
        } else {
            "Loading…"
        };
        painter.text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            message,
            egui::FontId::proportional(16.0),
            egui::Color32::GRAY,
        );
        return;
    };

    let p = editor.placement();
    let layers = egui::Rect::from_min_size(
        rect.min + egui::vec2(p.left as f32, p.top as f32) * scale,
        egui::vec2(p.width as f32, p.height as f32) * scale,
    );
    let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
    let mask_alpha = (mask_opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    let mask_tint = egui::Color32::from_white_alpha(mask_alpha);
    painter.image(textures.original.id(), layers, uv, egui::Color32::WHITE);
    painter.image(textures.draw.id(), layers, uv, egui::Color32::WHITE);
    painter.image(textures.mask.id(), layers, uv, mask_tint);

    if let Some(cursor) = editor.brush_cursor(f64::from(scale)) {
        let [r, g, b, a] = cursor.color;
        let center =
            rect.min + egui::vec2(cursor.center.x as f32, cursor.center.y as f32) * scale;
        painter.circle(
            center,
            cursor.radius as f32,
            egui::Color32::from_rgba_unmultiplied(r, g, b, a),
            egui::Stroke::new(1.0, egui::Color32::WHITE),
        );
    }
}
