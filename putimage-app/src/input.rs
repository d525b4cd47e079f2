use eframe::egui;

use putimage_core::{Navigation, Point};
use putimage_editor::{Modifiers, PointerButton, PointerInput, PointerKind, StrokeStart};

use crate::app::{PutImageApp, MAX_HOST_SCALE, MIN_HOST_SCALE};

/// Step the host scale by `delta`, rounded to one decimal and clamped to the
/// supported range.
pub(crate) fn next_host_scale(current: f32, delta: f32) -> f32 {
    let stepped = ((current + delta) * 10.0).round() / 10.0;
    stepped.clamp(MIN_HOST_SCALE, MAX_HOST_SCALE)
}

fn modifiers(m: egui::Modifiers) -> Modifiers {
    Modifiers {
        ctrl: m.ctrl,
        meta: m.mac_cmd,
        alt: m.alt,
        shift: m.shift,
    }
}

fn pressed_button(pointer: &egui::PointerState) -> Option<PointerButton> {
    if pointer.button_pressed(egui::PointerButton::Primary) {
        Some(PointerButton::Primary)
    } else if pointer.button_pressed(egui::PointerButton::Secondary) {
        Some(PointerButton::Secondary)
    } else if pointer.button_pressed(egui::PointerButton::Middle) {
        Some(PointerButton::Other)
    } else {
        None
    }
}

/// Force of the first touch event this frame, if any. Devices that do not
/// report force count as full pressure.
fn touch_force(events: &[egui::Event]) -> Option<f64> {
    events.iter().find_map(|e| match e {
        egui::Event::Touch { force, .. } => Some(force.map_or(1.0, f64::from)),
        _ => None,
    })
}

/// Pointer state sampled once per frame.
struct Sample {
    pos: Option<egui::Pos2>,
    moved: bool,
    pressed: Option<PointerButton>,
    modifiers: Modifiers,
    touch: Option<f64>,
    scroll_y: f32,
    time_ms: f64,
}

impl PutImageApp {
    /// Route this frame's pointer activity to the node whose canvas occupies
    /// `rect` (screen space).
    pub(crate) fn handle_node_pointer(
        &mut self,
        ctx: &egui::Context,
        id: u32,
        rect: egui::Rect,
        response: &egui::Response,
    ) {
        if self.space_held {
            if response.dragged() {
                self.host_pan += response.drag_delta();
            }
            return;
        }

        let sample = ctx.input(|i| Sample {
            pos: i.pointer.latest_pos(),
            moved: i.pointer.is_moving(),
            pressed: pressed_button(&i.pointer),
            modifiers: modifiers(i.modifiers),
            touch: touch_force(&i.events),
            scroll_y: i.raw_scroll_delta.y,
            time_ms: i.time * 1000.0,
        });
        let scale = self.host_scale;
        let to_container = |p: egui::Pos2| {
            Point::new(
                f64::from((p.x - rect.min.x) / scale),
                f64::from((p.y - rect.min.y) / scale),
            )
        };
        let input_at = |p: egui::Pos2| {
            let input = PointerInput::mouse(to_container(p), sample.time_ms)
                .with_modifiers(sample.modifiers);
            match sample.touch {
                Some(force) => input.with_kind(PointerKind::Touch, force),
                None => input,
            }
        };

        let active = self.dispatcher.is_active(id);
        let hovered = response.hovered();

        if hovered && sample.pressed.is_some() {
            self.focused = Some(id);
        }

        let Some(view) = self.nodes.iter_mut().find(|v| v.node.id() == id) else {
            return;
        };
        let Ok(editor) = view.node.editor_mut() else {
            return;
        };

        match sample.pos {
            Some(pos) if hovered || active => editor.hover(to_container(pos)),
            _ => editor.leave(),
        }

        if hovered && sample.scroll_y != 0.0 {
            editor.handle_wheel(-f64::from(sample.scroll_y), sample.modifiers);
        }

        let Some(pos) = sample.pos else {
            return;
        };

        if let (true, Some(button)) = (hovered, sample.pressed) {
            let input = input_at(pos).with_button(button);
            let result = view.node.begin_stroke(&input, &mut self.dispatcher);
            if let Ok(StrokeStart::PickedColor(rgb)) = result {
                let [r, g, b] = rgb;
                self.status = format!("#{id}: picked #{r:02x}{g:02x}{b:02x}");
            }
        } else if active && sample.moved {
            // Errors here only mean the editor went away mid-stroke.
            let _ = view.node.continue_stroke(&input_at(pos));
        }
    }

    pub(crate) fn handle_keyboard(&mut self, ctx: &egui::Context) {
        let text_editing = ctx.memory(|m| m.focused().is_some());
        self.space_held = !text_editing && ctx.input(|i| i.key_down(egui::Key::Space));
        if text_editing {
            return;
        }

        let (back, forward, reload, shrink, grow) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::ArrowLeft),
                i.key_pressed(egui::Key::ArrowRight),
                (i.modifiers.command && i.key_pressed(egui::Key::R))
                    || i.key_pressed(egui::Key::F5),
                i.key_pressed(egui::Key::Minus),
                i.key_pressed(egui::Key::Equals) || i.key_pressed(egui::Key::Plus),
            )
        });

        if shrink {
            self.host_scale = next_host_scale(self.host_scale, -1.0);
        }
        if grow {
            self.host_scale = next_host_scale(self.host_scale, 1.0);
        }

        let Some(id) = self.focused else {
            return;
        };
        if back {
            self.navigate(id, Navigation::Step(-1));
        }
        if forward {
            self.navigate(id, Navigation::Step(1));
        }
        if reload {
            self.navigate(id, Navigation::Reload);
        }
    }
}
