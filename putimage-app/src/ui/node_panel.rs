use eframe::egui;

use putimage_core::{AdvanceMode, DirectoryLabel, Navigation};
use putimage_editor::EditorMode;

use crate::app::{NodeAction, NodeView, PutImageApp};

const PANEL_WIDTH: f32 = 300.0;

impl PutImageApp {
    /// Left panel with one control group per node.
    pub(crate) fn draw_node_panel(&mut self, ctx: &egui::Context) {
        let mut actions: Vec<(u32, NodeAction)> = Vec::new();
        let focused = self.focused;
        let targets = self.node_ids();

        egui::SidePanel::left("nodes")
            .resizable(true)
            .default_width(PANEL_WIDTH)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    for view in &mut self.nodes {
                        let id = view.node.id();
                        node_controls(ui, view, focused == Some(id), &targets, &mut actions);
                        ui.separator();
                    }
                });
            });

        for (id, action) in actions {
            self.apply_action(id, action);
        }
    }

    pub(crate) fn draw_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("{:.0}%", self.host_scale * 100.0));
                ui.separator();
                ui.label(&self.status);
            });
        });
    }
}

fn node_controls(
    ui: &mut egui::Ui,
    view: &mut NodeView,
    focused: bool,
    targets: &[u32],
    actions: &mut Vec<(u32, NodeAction)>,
) {
    use egui_material_icons::icons::*;

    let id = view.node.id();
    let mut push = |action| actions.push((id, action));
    let icon = |i: &str| egui::RichText::new(i).size(18.0);

    let title = egui::RichText::new(format!("Node #{id}")).strong();
    let header = ui.selectable_label(focused, title);
    if header.clicked() {
        push(NodeAction::Focus);
    }
    header.context_menu(|ui| {
        if ui.button("Send to input").clicked() {
            ui.close();
            push(NodeAction::SendTo(DirectoryLabel::Input));
        }
        if ui.button("Send to output").clicked() {
            ui.close();
            push(NodeAction::SendTo(DirectoryLabel::Output));
        }
        ui.menu_button("Load into", |ui| {
            for &target in targets.iter().filter(|&&t| t != id) {
                if ui.button(format!("Node #{target}")).clicked() {
                    ui.close();
                    push(NodeAction::LoadInto(target));
                }
            }
        });
        ui.separator();
        if ui.button("Remove node").clicked() {
            ui.close();
            push(NodeAction::Remove);
        }
    });

    ui.label("Directory:");
    let dir_resp = ui.add(
        egui::TextEdit::singleline(&mut view.directory_buf).desired_width(ui.available_width()),
    );
    if dir_resp.lost_focus() {
        push(NodeAction::Navigate(Navigation::SetDirectory(
            view.directory_buf.trim().to_string(),
        )));
    }
    if ui.small_button("Browse…").clicked() {
        let start = std::path::Path::new(view.directory_buf.trim());
        let mut dialog = rfd::FileDialog::new();
        if start.is_dir() {
            dialog = dialog.set_directory(start);
        }
        if let Some(folder) = dialog.pick_folder() {
            let mut dir = folder.to_string_lossy().to_string();
            if !dir.ends_with(['/', '\\']) {
                dir.push('/');
            }
            view.directory_buf = dir.clone();
            push(NodeAction::Navigate(Navigation::SetDirectory(dir)));
        }
    }

    let navigator = view.node.navigator();

    // Display-only: edits are bounced back by the node.
    let mut filename = navigator.filename().to_string();
    if ui.add(egui::TextEdit::singleline(&mut filename)).changed() {
        push(NodeAction::EditFilename(filename));
    }

    ui.horizontal(|ui| {
        if ui.button(icon(ICON_ARROW_BACK)).on_hover_text("Previous image").clicked() {
            push(NodeAction::Navigate(Navigation::Step(-1)));
        }
        let mut index = navigator.index();
        let count = navigator.images().len() as i64;
        let index_resp = ui.add(egui::DragValue::new(&mut index).speed(0.1));
        if index_resp.changed() {
            push(NodeAction::Navigate(Navigation::SetIndex(index)));
        }
        ui.label(format!("/ {count}"));
        if ui.button(icon(ICON_ARROW_FORWARD)).on_hover_text("Next image").clicked() {
            push(NodeAction::Navigate(Navigation::Step(1)));
        }
        if ui.button(icon(ICON_REFRESH)).on_hover_text("Reload directory").clicked() {
            push(NodeAction::Navigate(Navigation::Reload));
        }
    });

    let mut mode = navigator.mode();
    egui::ComboBox::from_id_salt(("advance_mode", id))
        .selected_text(mode.label())
        .show_ui(ui, |ui| {
            for m in AdvanceMode::ALL {
                ui.selectable_value(&mut mode, m, m.label());
            }
        });
    if mode != navigator.mode() {
        push(NodeAction::SetMode(mode));
    }

    let counters = navigator.counters();
    ui.label(
        egui::RichText::new(format!(
            "queues {}  loops {}  errors {}",
            counters.queues, counters.loops, counters.errors
        ))
        .weak(),
    );

    if let Some(editor) = view.node.editor() {
        let mut editor_mode = editor.mode();
        ui.horizontal(|ui| {
            for m in EditorMode::ALL {
                ui.selectable_value(&mut editor_mode, m, m.label());
            }
        });
        if editor_mode != editor.mode() {
            push(NodeAction::SetEditorMode(editor_mode));
        }
        ui.horizontal(|ui| {
            let [r, g, b] = editor.draw_color();
            let (rect, _) = ui.allocate_exact_size(egui::vec2(14.0, 14.0), egui::Sense::hover());
            ui.painter().rect_filled(rect, 2.0, egui::Color32::from_rgb(r, g, b));
            ui.label(format!("brush {:.0}px", editor.brush_size()));
            if ui
                .add_enabled(editor.is_ready(), egui::Button::new("Clear layers"))
                .clicked()
            {
                push(NodeAction::Clear);
            }
        });
    }

    if let Some(output) = &view.output {
        ui.label(egui::RichText::new(format!("output: {output}")).weak());
    }
}
