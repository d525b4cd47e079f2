use eframe::egui;
use tracing::info;

use putimage_core::Navigation;

use crate::app::PutImageApp;
use crate::preferences::NodePrefs;

impl PutImageApp {
    /// Draw the top menu bar. Must run before the side and central panels.
    pub(crate) fn draw_menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                self.menu_file(ui, ctx);
                self.menu_view(ui);
                if ui.button("Queue").on_hover_text("Run one generation cycle").clicked() {
                    self.queue_generation();
                }
            });
        });
    }

    fn menu_file(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.menu_button("File", |ui| {
            if ui.button("Add Node").clicked() {
                ui.close();
                self.add_node(NodePrefs::default());
            }
            if ui
                .add_enabled(self.focused.is_some(), egui::Button::new("Open Image…"))
                .clicked()
            {
                ui.close();
                if let (Some(id), Some(file)) = (self.focused, image_dialog().pick_file()) {
                    let path = file.to_string_lossy().to_string();
                    info!("Opening {path} in node #{id}");
                    self.navigate(id, Navigation::LoadByOriginalName(path));
                }
            }
            ui.separator();
            if ui.button("Store Folder…").clicked() {
                ui.close();
                let mut dialog = rfd::FileDialog::new();
                let start = self.preferences.store_root();
                if start.is_dir() {
                    dialog = dialog.set_directory(start);
                }
                if let Some(folder) = dialog.pick_folder() {
                    self.set_store_root(folder.to_string_lossy().to_string());
                }
            }
            ui.separator();
            if ui.button("Quit").clicked() {
                ui.close();
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        });
    }

    fn menu_view(&mut self, ui: &mut egui::Ui) {
        ui.menu_button("View", |ui| {
            if ui.button("Reset Canvas").clicked() {
                ui.close();
                self.host_scale = 1.0;
                self.host_pan = egui::Vec2::ZERO;
            }
            ui.separator();
            ui.label("Mask opacity");
            ui.add(egui::Slider::new(&mut self.preferences.mask_opacity, 0.0..=1.0));
        });
    }
}

fn image_dialog() -> rfd::FileDialog {
    rfd::FileDialog::new().add_filter("Images", &putimage_editor::fs_store::IMAGE_EXTENSIONS)
}
